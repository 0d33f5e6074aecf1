pub mod sample_storage;
pub mod schema;

pub use sample_storage::{SampleStore, SqliteSampleStore, StoreError};
