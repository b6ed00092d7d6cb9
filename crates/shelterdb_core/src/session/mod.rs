//! Unit-of-work session over the shelter schema.
//!
//! # Responsibility
//! - Stage new records as an in-memory object graph addressed by keys.
//! - Maintain one-to-many and many-to-many relationship views.
//! - Flush the whole graph atomically on `commit`.
//!
//! # Invariants
//! - A key added once is written once; reusing it never duplicates a row.
//! - Records are transient until a commit that wrote them succeeds.
//! - `link_*`/`unlink_*` change the edge and both collection views in one
//!   step; the join row follows at the next commit.
//! - Uncommitted changes are discarded when the session ends.

pub(crate) mod flush;
mod graph;
mod keys;
mod links;
mod load;

pub use graph::Entity;
pub use keys::EntityKey;
pub use load::Load;

use crate::db::DbError;
use crate::model::breed::Breed;
use crate::model::breed_trait::BreedTrait;
use crate::model::person::Person;
use crate::model::pet::Pet;
use crate::model::shelter::Shelter;
use crate::model::species::Species;
use crate::repo::RepoError;
use graph::Graph;
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub type SpeciesKey = EntityKey<Species>;
pub type BreedKey = EntityKey<Breed>;
pub type BreedTraitKey = EntityKey<BreedTrait>;
pub type ShelterKey = EntityKey<Shelter>;
pub type PetKey = EntityKey<Pet>;
pub type PersonKey = EntityKey<Person>;

pub type SessionResult<T> = Result<T, SessionError>;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub enum SessionError {
    /// Key was issued by a different session.
    ForeignKey { entity: &'static str },
    /// Key does not address a staged record.
    UnknownKey { entity: &'static str },
    /// Persisted row disappeared underneath the session.
    StaleRow { entity: &'static str, id: i64 },
    /// Join row expected by the session is missing from the store.
    StaleLink {
        table: &'static str,
        left: i64,
        right: i64,
    },
    /// Stored row failed validation while loading it.
    InvalidData(String),
    Db(DbError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForeignKey { entity } => {
                write!(f, "{entity} key belongs to a different session")
            }
            Self::UnknownKey { entity } => write!(f, "{entity} key is not staged in this session"),
            Self::StaleRow { entity, id } => {
                write!(f, "{entity} row {id} no longer exists in the store")
            }
            Self::StaleLink { table, left, right } => {
                write!(f, "{table} row ({left}, {right}) no longer exists in the store")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for SessionError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            RepoError::InvalidData(message) => Self::InvalidData(message),
        }
    }
}

impl From<rusqlite::Error> for SessionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Write counts of one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub inserted: usize,
    pub updated: usize,
    pub links_added: usize,
    pub links_removed: usize,
}

/// Unit of work bound to one connection.
pub struct Session<'conn> {
    conn: &'conn mut Connection,
    graph: Graph,
    closed: bool,
}

impl<'conn> Session<'conn> {
    /// Opens a session over an initialized store connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        debug!("event=session_open module=session status=ok session={id}");
        Self {
            conn,
            graph: Graph::new(id),
            closed: false,
        }
    }

    /// Read access to the underlying connection, e.g. for `repo` queries.
    pub fn connection(&self) -> &Connection {
        &*self.conn
    }

    /// Stages a new record. Nothing is written until `commit`.
    ///
    /// # Errors
    /// - `ForeignKey`/`UnknownKey` when the record references a key this
    ///   session did not issue.
    pub fn add<T: Entity>(&mut self, record: T) -> SessionResult<EntityKey<T>> {
        let key = self.graph.stage(record)?;
        debug!(
            "event=session_add module=session status=ok session={} entity={}",
            self.graph.session(),
            T::KIND
        );
        Ok(key)
    }

    /// Brings a committed row into the session by primary key.
    ///
    /// Referenced parents are loaded with it, and join rows between loaded
    /// records become edges, so `unlink_*` can remove them. Loading an id the
    /// session already tracks returns the existing key.
    ///
    /// Returns `None` when the store has no such row.
    pub fn load<T: Load>(&mut self, id: i64) -> SessionResult<Option<EntityKey<T>>> {
        let key = load::load::<T>(&*self.conn, &mut self.graph, id)?;
        debug!(
            "event=session_load module=session status={} session={} entity={} id={}",
            if key.is_some() { "ok" } else { "missing" },
            self.graph.session(),
            T::KIND,
            id
        );
        Ok(key)
    }

    pub fn get<T: Entity>(&self, key: EntityKey<T>) -> SessionResult<&T> {
        Ok(&self.graph.resolve(key)?.record)
    }

    /// Mutable access; the row is rewritten at the next commit.
    pub fn get_mut<T: Entity>(&mut self, key: EntityKey<T>) -> SessionResult<&mut T> {
        let row = self.graph.resolve_mut(key)?;
        row.dirty = true;
        Ok(&mut row.record)
    }

    /// Store-assigned primary key, or `None` while the record is transient.
    pub fn id<T: Entity>(&self, key: EntityKey<T>) -> SessionResult<Option<i64>> {
        Ok(self.graph.resolve(key)?.id)
    }

    pub fn is_transient<T: Entity>(&self, key: EntityKey<T>) -> SessionResult<bool> {
        Ok(self.id(key)?.is_none())
    }

    pub fn has_pending_changes(&self) -> bool {
        self.graph.has_pending_changes()
    }

    /// Adds `person` to `pet`'s people (and `pet` to `person`'s pets).
    ///
    /// Returns `false` when the link already existed.
    pub fn link_pet_person(&mut self, pet: PetKey, person: PersonKey) -> SessionResult<bool> {
        self.graph.resolve(pet)?;
        self.graph.resolve(person)?;
        Ok(self.graph.pet_people.link(pet, person))
    }

    /// Removes the pet/person link from both sides.
    ///
    /// Returns `false` when there was nothing to remove.
    pub fn unlink_pet_person(&mut self, pet: PetKey, person: PersonKey) -> SessionResult<bool> {
        self.graph.resolve(pet)?;
        self.graph.resolve(person)?;
        Ok(self.graph.pet_people.unlink(pet, person))
    }

    /// Replaces the whole people collection of `pet`.
    pub fn set_pet_people(&mut self, pet: PetKey, people: &[PersonKey]) -> SessionResult<()> {
        self.graph.resolve(pet)?;
        for person in people {
            self.graph.resolve(*person)?;
        }

        for current in self.graph.pet_people.rights_of(pet) {
            if !people.contains(&current) {
                self.graph.pet_people.unlink(pet, current);
            }
        }
        for person in people {
            self.graph.pet_people.link(pet, *person);
        }
        Ok(())
    }

    pub fn pet_people(&self, pet: PetKey) -> SessionResult<Vec<PersonKey>> {
        self.graph.resolve(pet)?;
        Ok(self.graph.pet_people.rights_of(pet))
    }

    pub fn person_pets(&self, person: PersonKey) -> SessionResult<Vec<PetKey>> {
        self.graph.resolve(person)?;
        Ok(self.graph.pet_people.lefts_of(person))
    }

    pub fn link_breed_trait(
        &mut self,
        breed: BreedKey,
        breed_trait: BreedTraitKey,
    ) -> SessionResult<bool> {
        self.graph.resolve(breed)?;
        self.graph.resolve(breed_trait)?;
        Ok(self.graph.breed_trait_links.link(breed, breed_trait))
    }

    pub fn unlink_breed_trait(
        &mut self,
        breed: BreedKey,
        breed_trait: BreedTraitKey,
    ) -> SessionResult<bool> {
        self.graph.resolve(breed)?;
        self.graph.resolve(breed_trait)?;
        Ok(self.graph.breed_trait_links.unlink(breed, breed_trait))
    }

    pub fn breed_traits(&self, breed: BreedKey) -> SessionResult<Vec<BreedTraitKey>> {
        self.graph.resolve(breed)?;
        Ok(self.graph.breed_trait_links.rights_of(breed))
    }

    pub fn trait_breeds(&self, breed_trait: BreedTraitKey) -> SessionResult<Vec<BreedKey>> {
        self.graph.resolve(breed_trait)?;
        Ok(self.graph.breed_trait_links.lefts_of(breed_trait))
    }

    /// Breeds of `species`, ordered by name.
    pub fn species_breeds(&self, species: SpeciesKey) -> SessionResult<Vec<BreedKey>> {
        self.graph.resolve(species)?;
        self.children_by_name(|breed: &Breed| breed.species == species, |breed| &breed.name)
    }

    /// Pets of `breed`, ordered by name.
    pub fn breed_pets(&self, breed: BreedKey) -> SessionResult<Vec<PetKey>> {
        self.graph.resolve(breed)?;
        self.children_by_name(|pet: &Pet| pet.breed == breed, |pet| &pet.name)
    }

    /// Pets housed by `shelter`, ordered by name.
    pub fn shelter_pets(&self, shelter: ShelterKey) -> SessionResult<Vec<PetKey>> {
        self.graph.resolve(shelter)?;
        self.children_by_name(|pet: &Pet| pet.shelter == Some(shelter), |pet| &pet.name)
    }

    /// Renders a breed with its species, e.g. `Dalmatian: Dog`.
    pub fn describe_breed(&self, breed: BreedKey) -> SessionResult<String> {
        let breed = self.get(breed)?;
        let species = self.get(breed.species)?;
        Ok(format!("{}: {}", breed.name, species))
    }

    /// Flushes every pending insert, update and join-row change atomically.
    ///
    /// # Errors
    /// - Store errors (constraint violations included) abort the commit;
    ///   nothing is written and the session keeps its pending state.
    pub fn commit(&mut self) -> SessionResult<FlushStats> {
        let session = self.graph.session();
        if !self.graph.has_pending_changes() {
            debug!("event=session_commit module=session status=noop session={session}");
            return Ok(FlushStats::default());
        }

        let started_at = Instant::now();
        info!("event=session_commit module=session status=start session={session}");
        match flush::flush(self.conn, &self.graph) {
            Ok((ids, stats)) => {
                self.graph.mark_committed(&ids);
                info!(
                    "event=session_commit module=session status=ok session={} inserted={} updated={} links_added={} links_removed={} duration_ms={}",
                    session,
                    stats.inserted,
                    stats.updated,
                    stats.links_added,
                    stats.links_removed,
                    started_at.elapsed().as_millis()
                );
                Ok(stats)
            }
            Err(err) => {
                error!(
                    "event=session_commit module=session status=error session={} duration_ms={} error_code=commit_failed error={}",
                    session,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Ends the session, discarding anything not committed.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let session = self.graph.session();
        if self.graph.has_pending_changes() {
            warn!(
                "event=session_close module=session status=discarded session={session} reason=uncommitted_changes"
            );
        } else {
            info!("event=session_close module=session status=ok session={session}");
        }
    }

    fn children_by_name<T: Entity>(
        &self,
        belongs: impl Fn(&T) -> bool,
        name: impl Fn(&T) -> &String,
    ) -> SessionResult<Vec<EntityKey<T>>> {
        let mut children: Vec<(EntityKey<T>, &String)> = Vec::new();
        for key in self.graph.keys::<T>() {
            let record = self.get(key)?;
            if belongs(record) {
                children.push((key, name(record)));
            }
        }
        children.sort_by(|(left_key, left_name), (right_key, right_name)| {
            left_name.cmp(right_name).then(left_key.cmp(right_key))
        });
        Ok(children.into_iter().map(|(key, _)| key).collect())
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
