//! Many-to-many edge bookkeeping.
//!
//! # Invariants
//! - `current` is the only source for both collection views of an
//!   association, so the views cannot disagree.
//! - `persisted` mirrors the join rows written by the last successful
//!   commit; the difference between the two sets is the pending work.

use super::EntityKey;
use std::collections::BTreeSet;

type Edge<L, R> = (EntityKey<L>, EntityKey<R>);

pub struct EdgeSet<L, R> {
    current: BTreeSet<Edge<L, R>>,
    persisted: BTreeSet<Edge<L, R>>,
}

impl<L, R> EdgeSet<L, R> {
    pub(crate) fn new() -> Self {
        Self {
            current: BTreeSet::new(),
            persisted: BTreeSet::new(),
        }
    }

    /// Returns `false` when the edge already exists.
    pub(crate) fn link(&mut self, left: EntityKey<L>, right: EntityKey<R>) -> bool {
        self.current.insert((left, right))
    }

    /// Records an edge that already has a join row in the store.
    pub(crate) fn seed_persisted(&mut self, left: EntityKey<L>, right: EntityKey<R>) {
        self.current.insert((left, right));
        self.persisted.insert((left, right));
    }

    /// Returns `false` when there was no such edge.
    pub(crate) fn unlink(&mut self, left: EntityKey<L>, right: EntityKey<R>) -> bool {
        self.current.remove(&(left, right))
    }

    pub(crate) fn rights_of(&self, left: EntityKey<L>) -> Vec<EntityKey<R>> {
        self.current
            .iter()
            .filter(|(l, _)| *l == left)
            .map(|(_, r)| *r)
            .collect()
    }

    pub(crate) fn lefts_of(&self, right: EntityKey<R>) -> Vec<EntityKey<L>> {
        self.current
            .iter()
            .filter(|(_, r)| *r == right)
            .map(|(l, _)| *l)
            .collect()
    }

    /// Edges present now but not yet written.
    pub(crate) fn added(&self) -> impl Iterator<Item = &Edge<L, R>> {
        self.current.difference(&self.persisted)
    }

    /// Written edges that have since been removed.
    pub(crate) fn removed(&self) -> impl Iterator<Item = &Edge<L, R>> {
        self.persisted.difference(&self.current)
    }

    pub(crate) fn is_synced(&self) -> bool {
        self.current == self.persisted
    }

    pub(crate) fn mark_synced(&mut self) {
        self.persisted = self.current.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::EdgeSet;
    use crate::session::EntityKey;

    struct Left;
    struct Right;

    fn keys(l: usize, r: usize) -> (EntityKey<Left>, EntityKey<Right>) {
        (EntityKey::new(1, l), EntityKey::new(1, r))
    }

    #[test]
    fn both_views_reflect_one_link() {
        let mut edges = EdgeSet::new();
        let (l, r) = keys(0, 3);
        assert!(edges.link(l, r));
        assert!(!edges.link(l, r));
        assert_eq!(edges.rights_of(l), vec![r]);
        assert_eq!(edges.lefts_of(r), vec![l]);
    }

    #[test]
    fn pending_work_is_the_set_difference() {
        let mut edges = EdgeSet::new();
        let (l0, r0) = keys(0, 0);
        let (l1, r1) = keys(1, 1);
        edges.link(l0, r0);
        edges.mark_synced();
        assert!(edges.is_synced());

        edges.unlink(l0, r0);
        edges.link(l1, r1);
        assert_eq!(edges.added().copied().collect::<Vec<_>>(), vec![(l1, r1)]);
        assert_eq!(edges.removed().copied().collect::<Vec<_>>(), vec![(l0, r0)]);
    }

    #[test]
    fn seeded_edge_is_synced_until_unlinked() {
        let mut edges = EdgeSet::new();
        let (l, r) = keys(4, 1);
        edges.seed_persisted(l, r);
        assert!(edges.is_synced());
        assert_eq!(edges.lefts_of(r), vec![l]);

        edges.unlink(l, r);
        assert_eq!(edges.removed().copied().collect::<Vec<_>>(), vec![(l, r)]);
    }

    #[test]
    fn link_then_unlink_before_sync_leaves_no_work() {
        let mut edges = EdgeSet::new();
        let (l, r) = keys(2, 5);
        edges.link(l, r);
        assert!(edges.unlink(l, r));
        assert!(edges.is_synced());
        assert_eq!(edges.added().count(), 0);
        assert_eq!(edges.removed().count(), 0);
    }
}
