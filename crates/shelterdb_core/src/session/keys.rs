//! Typed handles to records staged in a session.

use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// In-memory identity of one staged record.
///
/// A key is only meaningful for the session that issued it. Two keys are
/// equal when they address the same staged object, before and after the
/// object acquires a primary key.
pub struct EntityKey<T> {
    session: u64,
    index: usize,
    _entity: PhantomData<fn() -> T>,
}

impl<T> EntityKey<T> {
    pub(crate) fn new(session: u64, index: usize) -> Self {
        Self {
            session,
            index,
            _entity: PhantomData,
        }
    }

    pub(crate) fn session(&self) -> u64 {
        self.session
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for EntityKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityKey<T> {}

impl<T> PartialEq for EntityKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.session == other.session && self.index == other.index
    }
}

impl<T> Eq for EntityKey<T> {}

impl<T> PartialOrd for EntityKey<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for EntityKey<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.session, self.index).cmp(&(other.session, other.index))
    }
}

impl<T> Hash for EntityKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.session.hash(state);
        self.index.hash(state);
    }
}

impl<T> Debug for EntityKey<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "EntityKey({}:{})", self.session, self.index)
    }
}
