//! Crawl tree reconstruction
//!
//! Documents only carry back-pointers, so a tree is rebuilt by looking up a
//! document's root and then every document pointing at that root.

use crate::storage::{Document, Storage, StorageResult};

/// A root document and the children stored under it
#[derive(Debug, Clone)]
pub struct LineageTree {
    pub root: Document,
    pub children: Vec<Document>,
}

/// A broken lineage rule found in stored documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineageViolation {
    /// A child document has children of its own
    TooDeep { document_id: String },
    /// A child's root URL or session differs from its parent's
    Inconsistent { document_id: String },
}

/// Builds the tree containing `url`, whether `url` is a root or a child
///
/// If a child's parent has been removed, the child is returned as the root
/// of its own tree.
pub fn build_tree<S: Storage + ?Sized>(
    storage: &S,
    url: &str,
) -> StorageResult<Option<LineageTree>> {
    let Some(document) = storage.get_document_by_url(url)? else {
        return Ok(None);
    };

    let parent = match &document.parent_document_id {
        Some(parent_id) => storage.get_document(parent_id)?,
        None => None,
    };
    let root = parent.unwrap_or(document);

    let children = storage.get_children(&root.document_id)?;
    Ok(Some(LineageTree { root, children }))
}

/// Checks the depth and consistency rules for every document in a session
pub fn check_session<S: Storage + ?Sized>(
    storage: &S,
    crawl_session_id: &str,
) -> StorageResult<Vec<LineageViolation>> {
    let documents = storage.get_session_documents(crawl_session_id)?;
    let mut violations = Vec::new();

    for document in &documents {
        let Some(parent_id) = &document.parent_document_id else {
            continue;
        };

        if !storage.get_children(&document.document_id)?.is_empty() {
            violations.push(LineageViolation::TooDeep {
                document_id: document.document_id.clone(),
            });
        }

        if let Some(parent) = storage.get_document(parent_id)? {
            if document.root_url != parent.url
                || document.crawl_session_id != parent.crawl_session_id
            {
                violations.push(LineageViolation::Inconsistent {
                    document_id: document.document_id.clone(),
                });
            }
        }
    }

    Ok(violations)
}

/// Prints a tree to stdout
pub fn print_tree(tree: &LineageTree) {
    println!("Session: {}", tree.root.crawl_session_id);
    println!("Source:  {}", tree.root.source_id);
    println!();
    println!("{} ({})", tree.root.url, tree.root.title);
    for child in &tree.children {
        println!("  └─ {} ({})", child.url, child.title);
    }
}
