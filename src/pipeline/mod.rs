//! The crawl/dedup/lineage pipeline
//!
//! This module contains the orchestration logic, including:
//! - The dedup oracle consulted before every crawl attempt
//! - The candidate query over aged source records
//! - Root and child phases of a run
//! - The per-run report that collects successes and isolated failures

mod dedup;
mod orchestrator;
mod report;

pub use dedup::{unprocessed_links, DedupOracle};
pub use orchestrator::{LinkError, Orchestrator};
pub use report::{LinkDepth, LinkFailure, RunReport};
