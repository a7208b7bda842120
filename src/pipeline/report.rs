use serde::Serialize;

/// Whether a link was a top-level candidate or a child of one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkDepth {
    Root,
    Child,
}

/// A link that failed and was skipped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkFailure {
    pub url: String,
    pub depth: LinkDepth,
    pub error: String,
}

/// Outcome of one orchestration run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// Candidates returned by the candidate query
    pub candidates: usize,
    pub roots_persisted: usize,
    pub children_persisted: usize,
    /// Child links taken from root pages, after the per-root cap
    pub children_attempted: usize,
    pub skipped_empty: usize,
    pub skipped_existing: usize,
    pub failures: Vec<LinkFailure>,
}

impl RunReport {
    /// Root documents persisted; children are not counted
    pub fn processed_count(&self) -> usize {
        self.roots_persisted
    }

    pub fn record_failure(&mut self, url: &str, depth: LinkDepth, error: impl ToString) {
        self.failures.push(LinkFailure {
            url: url.to_string(),
            depth,
            error: error.to_string(),
        });
    }

    pub fn failures_at(&self, depth: LinkDepth) -> usize {
        self.failures.iter().filter(|f| f.depth == depth).count()
    }
}
