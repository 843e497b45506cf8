use super::types::{Column, ColumnDatatype, NewColumn, Page};
use super::{AdverityClient, AdverityError};

impl AdverityClient {
    /// All columns of a datastream, following `next` until the last page
    pub async fn read_columns(&self, datastream_id: i64) -> Result<Vec<Column>, AdverityError> {
        let mut columns = Vec::new();
        let mut page = 1;
        loop {
            let url = self.url("columns/")?;
            let params = [
                ("datastream_id".to_string(), datastream_id.to_string()),
                ("page".to_string(), page.to_string()),
            ];
            let answer: Page<Column> = self.query(url, &params, "reading columns").await?;
            columns.extend(answer.results);
            match answer.next {
                Some(next) if !next.is_empty() => page += 1,
                _ => break,
            }
        }
        Ok(columns)
    }

    /// Replace the column list of a datastream; an empty list removes them all
    pub async fn create_columns(
        &self,
        datastream_id: i64,
        columns: &[NewColumn],
    ) -> Result<Vec<Column>, AdverityError> {
        let created: Option<Vec<Column>> = self
            .create(
                &format!("datastreams/{}/columns/", datastream_id),
                columns,
                "creating columns",
            )
            .await?;
        Ok(created.unwrap_or_default())
    }

    pub async fn set_column_datatype(&self, id: i64, datatype: &str) -> Result<(), AdverityError> {
        let body = ColumnDatatype {
            datatype: datatype.to_string(),
        };
        self.update(&format!("columns/{}/", id), &body, "updating column")
            .await
    }
}
