//! Statistics generation from the ingest database
//!
//! This module provides functionality for extracting and displaying
//! ingestion statistics from the storage layer.

use crate::storage::Storage;
use crate::Result;

/// Ingestion statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStatistics {
    /// Source records on file
    pub sources: u64,

    /// Documents of any depth
    pub documents: u64,

    /// Documents created directly from candidate links
    pub roots: u64,

    /// Distinct crawl sessions
    pub sessions: u64,
}

impl IngestStatistics {
    pub fn children(&self) -> u64 {
        self.documents.saturating_sub(self.roots)
    }

    /// Average number of children stored per root
    pub fn children_per_root(&self) -> f64 {
        if self.roots == 0 {
            0.0
        } else {
            self.children() as f64 / self.roots as f64
        }
    }
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> Result<IngestStatistics> {
    Ok(IngestStatistics {
        sources: storage.count_sources()?,
        documents: storage.count_documents()?,
        roots: storage.count_root_documents()?,
        sessions: storage.count_sessions()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IngestStatistics) {
    println!("=== Ingest Statistics ===\n");

    println!("Overview:");
    println!("  Source records: {}", stats.sources);
    println!("  Documents: {}", stats.documents);
    println!("  Crawl sessions: {}", stats.sessions);
    println!();

    println!("Documents by Depth:");
    println!("  Root: {}", stats.roots);
    println!("  Child: {}", stats.children());
    println!();

    println!("Children per root: {:.2}", stats.children_per_root());
}
