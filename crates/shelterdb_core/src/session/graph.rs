//! Staged object graph owned by one session.
//!
//! # Invariants
//! - Row indices are stable for the life of the session; rows are never
//!   removed.
//! - `id` stays `None` until a commit that inserted the row succeeds.

use super::flush::PendingIds;
use super::links::EdgeSet;
use super::{EntityKey, SessionError, SessionResult};
use crate::model::breed::Breed;
use crate::model::breed_trait::BreedTrait;
use crate::model::person::Person;
use crate::model::pet::Pet;
use crate::model::shelter::Shelter;
use crate::model::species::Species;

/// Record type that can be staged in a session.
pub trait Entity: Sized + 'static {
    /// Short name used in errors and log events.
    const KIND: &'static str;

    #[doc(hidden)]
    fn table(graph: &Graph) -> &Table<Self>;

    #[doc(hidden)]
    fn table_mut(graph: &mut Graph) -> &mut Table<Self>;

    /// Verifies that every key held by the record belongs to `graph`.
    #[doc(hidden)]
    fn check_refs(&self, graph: &Graph) -> SessionResult<()> {
        let _ = graph;
        Ok(())
    }
}

pub struct Tracked<T> {
    pub(crate) record: T,
    pub(crate) id: Option<i64>,
    pub(crate) dirty: bool,
}

pub struct Table<T> {
    rows: Vec<Tracked<T>>,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self { rows: Vec::new() }
    }

    fn push(&mut self, record: T, id: Option<i64>) -> usize {
        self.rows.push(Tracked {
            record,
            id,
            dirty: false,
        });
        self.rows.len() - 1
    }

    fn position_of(&self, id: i64) -> Option<usize> {
        self.rows.iter().position(|row| row.id == Some(id))
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Tracked<T>> {
        self.rows.get(index)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut Tracked<T>> {
        self.rows.get_mut(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &Tracked<T>)> {
        self.rows.iter().enumerate()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Tracked<T>)> {
        self.rows.iter_mut().enumerate()
    }

    fn has_pending(&self) -> bool {
        self.rows.iter().any(|row| row.id.is_none() || row.dirty)
    }
}

pub struct Graph {
    session: u64,
    species: Table<Species>,
    shelters: Table<Shelter>,
    breed_traits: Table<BreedTrait>,
    people: Table<Person>,
    breeds: Table<Breed>,
    pets: Table<Pet>,
    pub(crate) pet_people: EdgeSet<Pet, Person>,
    pub(crate) breed_trait_links: EdgeSet<Breed, BreedTrait>,
}

impl Graph {
    pub(crate) fn new(session: u64) -> Self {
        Self {
            session,
            species: Table::new(),
            shelters: Table::new(),
            breed_traits: Table::new(),
            people: Table::new(),
            breeds: Table::new(),
            pets: Table::new(),
            pet_people: EdgeSet::new(),
            breed_trait_links: EdgeSet::new(),
        }
    }

    pub(crate) fn session(&self) -> u64 {
        self.session
    }

    pub(crate) fn stage<T: Entity>(&mut self, record: T) -> SessionResult<EntityKey<T>> {
        record.check_refs(self)?;
        let index = T::table_mut(self).push(record, None);
        Ok(EntityKey::new(self.session, index))
    }

    /// Stages a record read back from the store as clean and persisted.
    pub(crate) fn adopt<T: Entity>(&mut self, record: T, id: i64) -> SessionResult<EntityKey<T>> {
        record.check_refs(self)?;
        let index = T::table_mut(self).push(record, Some(id));
        Ok(EntityKey::new(self.session, index))
    }

    /// Key of the staged row holding primary key `id`, if any.
    pub(crate) fn find_persisted<T: Entity>(&self, id: i64) -> Option<EntityKey<T>> {
        T::table(self)
            .position_of(id)
            .map(|index| EntityKey::new(self.session, index))
    }

    pub(crate) fn resolve<T: Entity>(&self, key: EntityKey<T>) -> SessionResult<&Tracked<T>> {
        self.check_key(key)?;
        T::table(self)
            .get(key.index())
            .ok_or(SessionError::UnknownKey { entity: T::KIND })
    }

    pub(crate) fn resolve_mut<T: Entity>(
        &mut self,
        key: EntityKey<T>,
    ) -> SessionResult<&mut Tracked<T>> {
        self.check_key(key)?;
        T::table_mut(self)
            .get_mut(key.index())
            .ok_or(SessionError::UnknownKey { entity: T::KIND })
    }

    /// Keys of every staged `T`, in staging order.
    pub(crate) fn keys<T: Entity>(&self) -> impl Iterator<Item = EntityKey<T>> + '_ {
        let session = self.session;
        T::table(self)
            .iter()
            .map(move |(index, _)| EntityKey::new(session, index))
    }

    pub(crate) fn has_pending_changes(&self) -> bool {
        self.species.has_pending()
            || self.shelters.has_pending()
            || self.breed_traits.has_pending()
            || self.people.has_pending()
            || self.breeds.has_pending()
            || self.pets.has_pending()
            || !self.pet_people.is_synced()
            || !self.breed_trait_links.is_synced()
    }

    /// Adopts store-assigned ids and clears dirty state after a commit.
    pub(crate) fn mark_committed(&mut self, assigned: &PendingIds) {
        mark_table_committed::<Species>(self, assigned);
        mark_table_committed::<Shelter>(self, assigned);
        mark_table_committed::<BreedTrait>(self, assigned);
        mark_table_committed::<Person>(self, assigned);
        mark_table_committed::<Breed>(self, assigned);
        mark_table_committed::<Pet>(self, assigned);
        self.pet_people.mark_synced();
        self.breed_trait_links.mark_synced();
    }

    fn check_key<T: Entity>(&self, key: EntityKey<T>) -> SessionResult<()> {
        if key.session() != self.session {
            return Err(SessionError::ForeignKey { entity: T::KIND });
        }
        Ok(())
    }
}

fn mark_table_committed<T: Entity>(graph: &mut Graph, assigned: &PendingIds) {
    for (index, row) in T::table_mut(graph).iter_mut() {
        if row.id.is_none() {
            row.id = assigned.assigned::<T>(index);
        }
        row.dirty = false;
    }
}

impl Entity for Species {
    const KIND: &'static str = "species";

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.species
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        &mut graph.species
    }
}

impl Entity for Shelter {
    const KIND: &'static str = "shelter";

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.shelters
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        &mut graph.shelters
    }
}

impl Entity for BreedTrait {
    const KIND: &'static str = "breed_trait";

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.breed_traits
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        &mut graph.breed_traits
    }
}

impl Entity for Person {
    const KIND: &'static str = "person";

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.people
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        &mut graph.people
    }
}

impl Entity for Breed {
    const KIND: &'static str = "breed";

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.breeds
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        &mut graph.breeds
    }

    fn check_refs(&self, graph: &Graph) -> SessionResult<()> {
        graph.resolve(self.species)?;
        Ok(())
    }
}

impl Entity for Pet {
    const KIND: &'static str = "pet";

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.pets
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        &mut graph.pets
    }

    fn check_refs(&self, graph: &Graph) -> SessionResult<()> {
        graph.resolve(self.breed)?;
        if let Some(shelter) = self.shelter {
            graph.resolve(shelter)?;
        }
        Ok(())
    }
}
