//! Static inspection of the declared dependency graph.
//!
//! Recipes name their dependencies explicitly, so the graph reachable from
//! an identity can be walked without resolving anything. Useful for auditing
//! a recipe before resolving it: declared dependencies cannot form a cycle
//! (an identity digests its own dependency list), but they can be missing.

use std::collections::{HashSet, VecDeque};

use cadb_types::ObjectId;

use crate::traits::Database;

/// Result of walking the declared dependencies of a root identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyReport {
    /// Present identities reachable from the root (root included), in BFS
    /// order.
    pub reachable: Vec<ObjectId>,
    /// Referenced identities with no entry.
    pub missing: Vec<ObjectId>,
}

impl DependencyReport {
    /// Returns `true` if every referenced identity is present.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Walk the declared dependency graph below `root` (BFS, each identity
/// visited once).
pub fn dependency_report(database: &dyn Database, root: &ObjectId) -> DependencyReport {
    let mut report = DependencyReport::default();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(*root);
    queue.push_back(*root);

    while let Some(current) = queue.pop_front() {
        let Some(deps) = database.dependencies(&current) else {
            report.missing.push(current);
            continue;
        };
        report.reachable.push(current);
        for dep in deps {
            if visited.insert(dep) {
                queue.push_back(dep);
            }
        }
    }
    report
}
