//! Duplicate groups and their similarity scores.
//!
//! A [`Grouping`] is rebuilt in full on every grouping call. The only
//! in-place change allowed afterwards is pruning trashed paths through
//! [`Grouping::without_paths`], which drops any group left with fewer than
//! two members.
//!
//! # Example
//!
//! ```
//! use photosift::duplicates::{DuplicateGroup, Grouping};
//! use std::collections::{HashMap, HashSet};
//! use std::path::PathBuf;
//!
//! let group = DuplicateGroup::new(vec![PathBuf::from("/a.jpg"), PathBuf::from("/b.jpg")]);
//! let scores = HashMap::from([
//!     (PathBuf::from("/a.jpg"), 1.0),
//!     (PathBuf::from("/b.jpg"), 0.97),
//! ]);
//! let grouping = Grouping::new(0.95, vec![group], scores);
//! assert_eq!(grouping.duplicate_count(), 1);
//!
//! let removed: HashSet<PathBuf> = [PathBuf::from("/b.jpg")].into();
//! assert!(grouping.without_paths(&removed).groups.is_empty());
//! ```

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Near-duplicate images. `members[0]` is the original (first encountered).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    /// Group members in discovery order, original first
    pub members: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a group from its members, original first.
    #[must_use]
    pub fn new(members: Vec<PathBuf>) -> Self {
        Self { members }
    }

    /// The designated original.
    #[must_use]
    pub fn original(&self) -> Option<&Path> {
        self.members.first().map(PathBuf::as_path)
    }

    /// Every member except the original.
    #[must_use]
    pub fn duplicates(&self) -> &[PathBuf] {
        self.members.get(1..).unwrap_or(&[])
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of duplicates (members minus the original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Whether `path` is a member.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.members.iter().any(|m| m == path)
    }
}

/// Result of one grouping pass.
#[derive(Debug, Clone, Serialize)]
pub struct Grouping {
    /// Similarity threshold the groups were built with
    pub threshold: f32,
    /// Pairwise disjoint groups, in anchor discovery order
    pub groups: Vec<DuplicateGroup>,
    /// Similarity of each member to its group's original (originals score 1.0)
    pub scores: HashMap<PathBuf, f32>,
}

impl Grouping {
    /// Assemble a grouping.
    #[must_use]
    pub fn new(threshold: f32, groups: Vec<DuplicateGroup>, scores: HashMap<PathBuf, f32>) -> Self {
        Self {
            threshold,
            groups,
            scores,
        }
    }

    /// Grouping with no groups.
    #[must_use]
    pub fn empty(threshold: f32) -> Self {
        Self::new(threshold, Vec::new(), HashMap::new())
    }

    /// Total duplicates across all groups.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }

    /// Similarity score of a grouped path.
    #[must_use]
    pub fn score(&self, path: &Path) -> Option<f32> {
        self.scores.get(path).copied()
    }

    /// Every non-original member, in group order. The usual trash selection.
    #[must_use]
    pub fn duplicate_paths(&self) -> Vec<PathBuf> {
        self.groups
            .iter()
            .flat_map(|g| g.duplicates().iter().cloned())
            .collect()
    }

    /// Copy with `removed` paths pruned from every group.
    ///
    /// Groups left with fewer than two members are dropped. When an original
    /// is removed the next member takes its place; scores stay relative to
    /// the anchor the group was built around.
    #[must_use]
    pub fn without_paths(&self, removed: &HashSet<PathBuf>) -> Self {
        let groups: Vec<DuplicateGroup> = self
            .groups
            .iter()
            .map(|g| {
                DuplicateGroup::new(
                    g.members
                        .iter()
                        .filter(|p| !removed.contains(*p))
                        .cloned()
                        .collect(),
                )
            })
            .filter(|g| g.len() >= 2)
            .collect();

        let scores = groups
            .iter()
            .flat_map(|g| g.members.iter())
            .filter_map(|p| self.scores.get(p).map(|s| (p.clone(), *s)))
            .collect();

        Self::new(self.threshold, groups, scores)
    }
}
