//! Unit-of-work flush.
//!
//! # Responsibility
//! - Translate the staged graph into SQL writes inside one transaction.
//! - Hand store-assigned ids back only after the transaction commits.
//!
//! # Invariants
//! - Parents are inserted before children, so every foreign key resolves
//!   to an id assigned earlier in the same flush or by a prior commit.
//! - Join-row deletions run before insertions; a deletion or update that
//!   matches no row aborts the flush.
//! - A failed flush leaves the graph untouched; the transaction rolls back
//!   on drop.

use super::graph::{Entity, Graph};
use super::links::EdgeSet;
use super::{EntityKey, FlushStats, SessionError, SessionResult};
use crate::model::breed::Breed;
use crate::model::breed_trait::BreedTrait;
use crate::model::person::Person;
use crate::model::pet::Pet;
use crate::model::shelter::Shelter;
use crate::model::species::Species;
use crate::repo::writes::{LinkTable, Persist, BREED_TRAIT_LINKS, PET_PERSON_LINKS};
use rusqlite::{Connection, Transaction};
use std::collections::HashMap;

/// Primary keys known during a flush, keyed by `(entity kind, row index)`.
pub(crate) struct PendingIds {
    session: u64,
    ids: HashMap<(&'static str, usize), i64>,
}

impl PendingIds {
    fn from_graph(graph: &Graph) -> Self {
        let mut pending = Self {
            session: graph.session(),
            ids: HashMap::new(),
        };
        pending.collect::<Species>(graph);
        pending.collect::<Shelter>(graph);
        pending.collect::<BreedTrait>(graph);
        pending.collect::<Person>(graph);
        pending.collect::<Breed>(graph);
        pending.collect::<Pet>(graph);
        pending
    }

    fn collect<T: Entity>(&mut self, graph: &Graph) {
        for (index, row) in T::table(graph).iter() {
            if let Some(id) = row.id {
                self.ids.insert((T::KIND, index), id);
            }
        }
    }

    /// Resolves a key to its primary key, failing for rows not yet written.
    pub(crate) fn id_of<T: Entity>(&self, key: EntityKey<T>) -> SessionResult<i64> {
        if key.session() != self.session {
            return Err(SessionError::ForeignKey { entity: T::KIND });
        }
        self.assigned::<T>(key.index())
            .ok_or(SessionError::UnknownKey { entity: T::KIND })
    }

    pub(crate) fn assigned<T: Entity>(&self, index: usize) -> Option<i64> {
        self.ids.get(&(T::KIND, index)).copied()
    }

    fn assign<T: Entity>(&mut self, index: usize, id: i64) {
        self.ids.insert((T::KIND, index), id);
    }
}

/// Writes all pending changes of `graph` and commits.
///
/// Returns the ids to adopt into the graph together with write counts.
pub(crate) fn flush(
    conn: &mut Connection,
    graph: &Graph,
) -> SessionResult<(PendingIds, FlushStats)> {
    let tx = conn.transaction()?;
    let mut ids = PendingIds::from_graph(graph);
    let mut stats = FlushStats::default();

    insert_new::<Species>(&tx, graph, &mut ids, &mut stats)?;
    insert_new::<Shelter>(&tx, graph, &mut ids, &mut stats)?;
    insert_new::<BreedTrait>(&tx, graph, &mut ids, &mut stats)?;
    insert_new::<Person>(&tx, graph, &mut ids, &mut stats)?;
    insert_new::<Breed>(&tx, graph, &mut ids, &mut stats)?;
    insert_new::<Pet>(&tx, graph, &mut ids, &mut stats)?;

    update_dirty::<Species>(&tx, graph, &ids, &mut stats)?;
    update_dirty::<Shelter>(&tx, graph, &ids, &mut stats)?;
    update_dirty::<BreedTrait>(&tx, graph, &ids, &mut stats)?;
    update_dirty::<Person>(&tx, graph, &ids, &mut stats)?;
    update_dirty::<Breed>(&tx, graph, &ids, &mut stats)?;
    update_dirty::<Pet>(&tx, graph, &ids, &mut stats)?;

    sync_links(&tx, &graph.breed_trait_links, &BREED_TRAIT_LINKS, &ids, &mut stats)?;
    sync_links(&tx, &graph.pet_people, &PET_PERSON_LINKS, &ids, &mut stats)?;

    tx.commit()?;
    Ok((ids, stats))
}

fn insert_new<T: Persist>(
    tx: &Transaction<'_>,
    graph: &Graph,
    ids: &mut PendingIds,
    stats: &mut FlushStats,
) -> SessionResult<()> {
    for (index, row) in T::table(graph).iter() {
        if row.id.is_some() {
            continue;
        }
        let id = row.record.insert(tx, ids)?;
        ids.assign::<T>(index, id);
        stats.inserted += 1;
    }
    Ok(())
}

fn update_dirty<T: Persist>(
    tx: &Transaction<'_>,
    graph: &Graph,
    ids: &PendingIds,
    stats: &mut FlushStats,
) -> SessionResult<()> {
    for (_, row) in T::table(graph).iter() {
        let Some(id) = row.id else {
            continue;
        };
        if !row.dirty {
            continue;
        }
        row.record.update(tx, id, ids)?;
        stats.updated += 1;
    }
    Ok(())
}

fn sync_links<L: Entity, R: Entity>(
    tx: &Transaction<'_>,
    edges: &EdgeSet<L, R>,
    table: &LinkTable,
    ids: &PendingIds,
    stats: &mut FlushStats,
) -> SessionResult<()> {
    for (left, right) in edges.removed() {
        table.delete(tx, ids.id_of(*left)?, ids.id_of(*right)?)?;
        stats.links_removed += 1;
    }
    for (left, right) in edges.added() {
        table.insert(tx, ids.id_of(*left)?, ids.id_of(*right)?)?;
        stats.links_added += 1;
    }
    Ok(())
}
