use log::info;

use super::types::{FetchRequest, FetchResponse, Job};
use super::{AdverityClient, AdverityError};
use crate::fetch_window::FetchWindow;

impl AdverityClient {
    /// Start a fixed-range fetch and return the id of the first job it created
    pub async fn fetch_fixed(
        &self,
        datastream_id: i64,
        window: &FetchWindow,
    ) -> Result<i64, AdverityError> {
        let request = FetchRequest {
            start: window.start_string(),
            end: window.end_string(),
        };
        let response: FetchResponse = self
            .create(
                &format!("datastreams/{}/fetch_fixed/", datastream_id),
                &request,
                "doing fetch",
            )
            .await?;
        let job = response.jobs.first().ok_or_else(|| {
            AdverityError::Invalid(format!(
                "Fetch for datastream {} did not return any job",
                datastream_id
            ))
        })?;
        info!(
            "Started fetch job {} for datastream {} ({} to {})",
            job.id, datastream_id, request.start, request.end
        );
        Ok(job.id)
    }

    pub async fn read_job(&self, id: i64) -> Result<Job, AdverityError> {
        self.read(&format!("jobs/{}/", id), "reading job").await
    }
}
