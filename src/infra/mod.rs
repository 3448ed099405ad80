//! Infrastructure layer for SimpleVB
//!
//! Workspace discovery and the edit debounce table.

pub mod debounce;
pub mod file_filter;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash content for change detection
#[inline]
pub fn hash_content(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}
