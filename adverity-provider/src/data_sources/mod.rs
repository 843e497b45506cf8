//! Data sources
//!
//! Data sources are read on every plan. Their state is the declared inputs
//! plus the computed outputs; nothing is recorded remotely.

pub mod auth_url;
pub mod connection_app;
pub mod lookup;
pub mod type_search;
pub mod workspace;

use adverity_core::provider::ResourceType;
use adverity_core::schema::ResourceSchema;

/// Data source backed by a module with `TYPE` and `schema()`
macro_rules! define_data_source {
    ($name:ident, $module:ident) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $module::TYPE
            }
            fn schema(&self) -> ResourceSchema {
                $module::schema()
            }
            fn is_data_source(&self) -> bool {
                true
            }
        }
    };
}

define_data_source!(WorkspaceSource, workspace);
define_data_source!(AuthUrlSource, auth_url);
define_data_source!(LookupSource, lookup);
define_data_source!(ConnectionAppSource, connection_app);

/// One of the three type searches
pub struct TypeSearchSource(&'static str);

impl ResourceType for TypeSearchSource {
    fn name(&self) -> &'static str {
        self.0
    }
    fn schema(&self) -> ResourceSchema {
        type_search::schema(self.0)
    }
    fn is_data_source(&self) -> bool {
        true
    }
}

pub fn data_source_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(WorkspaceSource),
        Box::new(AuthUrlSource),
        Box::new(LookupSource),
        Box::new(ConnectionAppSource),
        Box::new(TypeSearchSource(type_search::CONNECTION_TYPE)),
        Box::new(TypeSearchSource(type_search::DATASTREAM_TYPE)),
        Box::new(TypeSearchSource(type_search::DESTINATION_TYPE)),
    ]
}
