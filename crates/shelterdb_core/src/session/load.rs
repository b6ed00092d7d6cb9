//! Reading committed rows back into a session.
//!
//! # Invariants
//! - A primary key is staged at most once per session; loading it again
//!   returns the key already issued.
//! - Loaded rows are clean (`id` set, not dirty) and their parents are
//!   loaded first.
//! - A join row becomes an edge once both of its ends are staged.

use super::graph::{Entity, Graph};
use super::{EntityKey, SessionError, SessionResult};
use crate::model::breed::Breed;
use crate::model::breed_trait::BreedTrait;
use crate::model::person::Person;
use crate::model::pet::Pet;
use crate::model::shelter::Shelter;
use crate::model::species::Species;
use crate::repo::queries;
use rusqlite::Connection;

/// Record type that can be read back from the store into a session.
pub trait Load: Entity {
    #[doc(hidden)]
    fn fetch(conn: &Connection, graph: &mut Graph, id: i64) -> SessionResult<Option<Self>>;

    /// Seeds edges between a freshly loaded row and staged partners.
    #[doc(hidden)]
    fn attach_links(
        conn: &Connection,
        graph: &mut Graph,
        key: EntityKey<Self>,
        id: i64,
    ) -> SessionResult<()> {
        let _ = (conn, graph, key, id);
        Ok(())
    }
}

pub(crate) fn load<T: Load>(
    conn: &Connection,
    graph: &mut Graph,
    id: i64,
) -> SessionResult<Option<EntityKey<T>>> {
    if let Some(key) = graph.find_persisted::<T>(id) {
        return Ok(Some(key));
    }
    let Some(record) = T::fetch(conn, graph, id)? else {
        return Ok(None);
    };
    let key = graph.adopt(record, id)?;
    T::attach_links(conn, graph, key, id)?;
    Ok(Some(key))
}

/// Loads a parent row that a foreign key column points at.
fn load_parent<T: Load>(conn: &Connection, graph: &mut Graph, id: i64) -> SessionResult<EntityKey<T>> {
    load::<T>(conn, graph, id)?.ok_or(SessionError::StaleRow { entity: T::KIND, id })
}

impl Load for Species {
    fn fetch(conn: &Connection, _graph: &mut Graph, id: i64) -> SessionResult<Option<Self>> {
        Ok(queries::load_species(conn, id)?.map(|row| Species::new(row.name)))
    }
}

impl Load for Shelter {
    fn fetch(conn: &Connection, _graph: &mut Graph, id: i64) -> SessionResult<Option<Self>> {
        Ok(queries::load_shelter(conn, id)?.map(|row| Shelter {
            name: row.name,
            website: row.website,
        }))
    }
}

impl Load for BreedTrait {
    fn fetch(conn: &Connection, _graph: &mut Graph, id: i64) -> SessionResult<Option<Self>> {
        Ok(queries::load_breed_trait(conn, id)?.map(|row| BreedTrait::new(row.name)))
    }

    fn attach_links(
        conn: &Connection,
        graph: &mut Graph,
        key: EntityKey<Self>,
        id: i64,
    ) -> SessionResult<()> {
        for breed in queries::breeds_for_trait(conn, id)? {
            if let Some(breed_key) = graph.find_persisted::<Breed>(breed.id) {
                graph.breed_trait_links.seed_persisted(breed_key, key);
            }
        }
        Ok(())
    }
}

impl Load for Person {
    fn fetch(conn: &Connection, _graph: &mut Graph, id: i64) -> SessionResult<Option<Self>> {
        Ok(queries::load_person(conn, id)?.map(|row| {
            let mut person =
                Person::new(row.first_name, row.last_name).with_stored_phone(row.phone);
            person.age = row.age;
            person
        }))
    }

    fn attach_links(
        conn: &Connection,
        graph: &mut Graph,
        key: EntityKey<Self>,
        id: i64,
    ) -> SessionResult<()> {
        for pet in queries::pets_for_person(conn, id)? {
            if let Some(pet_key) = graph.find_persisted::<Pet>(pet.id) {
                graph.pet_people.seed_persisted(pet_key, key);
            }
        }
        Ok(())
    }
}

impl Load for Breed {
    fn fetch(conn: &Connection, graph: &mut Graph, id: i64) -> SessionResult<Option<Self>> {
        let Some(row) = queries::load_breed(conn, id)? else {
            return Ok(None);
        };
        let species = load_parent::<Species>(conn, graph, row.species_id)?;
        Ok(Some(Breed::new(row.name, species)))
    }

    fn attach_links(
        conn: &Connection,
        graph: &mut Graph,
        key: EntityKey<Self>,
        id: i64,
    ) -> SessionResult<()> {
        for breed_trait in queries::traits_for_breed(conn, id)? {
            if let Some(trait_key) = graph.find_persisted::<BreedTrait>(breed_trait.id) {
                graph.breed_trait_links.seed_persisted(key, trait_key);
            }
        }
        Ok(())
    }
}

impl Load for Pet {
    fn fetch(conn: &Connection, graph: &mut Graph, id: i64) -> SessionResult<Option<Self>> {
        let Some(row) = queries::load_pet(conn, id)? else {
            return Ok(None);
        };
        let breed = load_parent::<Breed>(conn, graph, row.breed_id)?;
        let shelter = row
            .shelter_id
            .map(|shelter_id| load_parent::<Shelter>(conn, graph, shelter_id))
            .transpose()?;
        Ok(Some(Pet {
            name: row.name,
            age: row.age,
            adopted: row.adopted,
            breed,
            shelter,
        }))
    }

    fn attach_links(
        conn: &Connection,
        graph: &mut Graph,
        key: EntityKey<Self>,
        id: i64,
    ) -> SessionResult<()> {
        for person in queries::people_for_pet(conn, id)? {
            if let Some(person_key) = graph.find_persisted::<Person>(person.id) {
                graph.pet_people.seed_persisted(key, person_key);
            }
        }
        Ok(())
    }
}
