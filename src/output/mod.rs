//! Output module for reporting on ingested data

pub mod stats;

pub use stats::{load_statistics, print_statistics, IngestStatistics};
