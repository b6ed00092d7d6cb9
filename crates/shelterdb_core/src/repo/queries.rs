//! Read-side queries over committed rows.
//!
//! # Responsibility
//! - Expose what the store holds after a commit, independent of any
//!   session's in-memory view.
//!
//! # Invariants
//! - Collection queries are ordered by name, then id.
//! - Stored phone digits are re-validated on read.

use super::{RepoError, RepoResult};
use crate::db::SchemaTable;
use crate::model::phone::Phone;
use rusqlite::{Connection, OptionalExtension, Row};

/// Id and display name of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRow {
    pub id: i64,
    pub name: String,
}

/// Committed person row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub phone: Option<Phone>,
}

/// Committed shelter row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelterRow {
    pub id: i64,
    pub name: String,
    pub website: Option<String>,
}

/// Committed breed row with its raw species foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreedRow {
    pub id: i64,
    pub name: String,
    pub species_id: i64,
}

/// Committed pet row with its raw foreign keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetRow {
    pub id: i64,
    pub name: String,
    pub age: Option<u32>,
    pub adopted: bool,
    pub breed_id: i64,
    pub shelter_id: Option<i64>,
}

/// Counts the rows of one schema table.
pub fn count_rows(conn: &Connection, table: SchemaTable) -> RepoResult<u64> {
    let count = conn.query_row(
        &format!("SELECT COUNT(*) FROM {};", table.name()),
        [],
        |row| row.get::<_, i64>(0),
    )?;
    u64::try_from(count).map_err(|_| {
        RepoError::InvalidData(format!("negative row count {count} for {}", table.name()))
    })
}

pub fn load_species(conn: &Connection, species_id: i64) -> RepoResult<Option<NamedRow>> {
    load_named(conn, "SELECT id, name FROM species WHERE id = ?1;", species_id)
}

pub fn load_breed_trait(conn: &Connection, breed_trait_id: i64) -> RepoResult<Option<NamedRow>> {
    load_named(
        conn,
        "SELECT id, name FROM breed_trait WHERE id = ?1;",
        breed_trait_id,
    )
}

pub fn load_shelter(conn: &Connection, shelter_id: i64) -> RepoResult<Option<ShelterRow>> {
    let row = conn
        .query_row(
            "SELECT id, name, website FROM shelter WHERE id = ?1;",
            [shelter_id],
            |row| {
                Ok(ShelterRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    website: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn load_breed(conn: &Connection, breed_id: i64) -> RepoResult<Option<BreedRow>> {
    let row = conn
        .query_row(
            "SELECT id, name, species_id FROM breed WHERE id = ?1;",
            [breed_id],
            |row| {
                Ok(BreedRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    species_id: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn load_pet(conn: &Connection, pet_id: i64) -> RepoResult<Option<PetRow>> {
    let row = conn
        .query_row(
            "SELECT id, name, age, adopted, breed_id, shelter_id
             FROM pet
             WHERE id = ?1;",
            [pet_id],
            |row| {
                Ok(PetRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    age: row.get(2)?,
                    adopted: row.get(3)?,
                    breed_id: row.get(4)?,
                    shelter_id: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn load_person(conn: &Connection, person_id: i64) -> RepoResult<Option<PersonRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, age, phone_digits
         FROM person
         WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([person_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_person_row(row)?));
    }
    Ok(None)
}

/// People linked to `pet_id` through `pet_person`.
pub fn people_for_pet(conn: &Connection, pet_id: i64) -> RepoResult<Vec<PersonRow>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.first_name, p.last_name, p.age, p.phone_digits
         FROM pet_person pp
         INNER JOIN person p ON p.id = pp.person_id
         WHERE pp.pet_id = ?1
         ORDER BY p.last_name ASC, p.first_name ASC, p.id ASC;",
    )?;
    let mut rows = stmt.query([pet_id])?;
    let mut people = Vec::new();
    while let Some(row) = rows.next()? {
        people.push(parse_person_row(row)?);
    }
    Ok(people)
}

/// Pets linked to `person_id` through `pet_person`.
pub fn pets_for_person(conn: &Connection, person_id: i64) -> RepoResult<Vec<NamedRow>> {
    named_rows(
        conn,
        "SELECT pet.id, pet.name
         FROM pet_person pp
         INNER JOIN pet ON pet.id = pp.pet_id
         WHERE pp.person_id = ?1
         ORDER BY pet.name ASC, pet.id ASC;",
        person_id,
    )
}

pub fn breeds_for_species(conn: &Connection, species_id: i64) -> RepoResult<Vec<NamedRow>> {
    named_rows(
        conn,
        "SELECT id, name
         FROM breed
         WHERE species_id = ?1
         ORDER BY name ASC, id ASC;",
        species_id,
    )
}

pub fn traits_for_breed(conn: &Connection, breed_id: i64) -> RepoResult<Vec<NamedRow>> {
    named_rows(
        conn,
        "SELECT bt.id, bt.name
         FROM breed_breed_trait bbt
         INNER JOIN breed_trait bt ON bt.id = bbt.breed_trait_id
         WHERE bbt.breed_id = ?1
         ORDER BY bt.name ASC, bt.id ASC;",
        breed_id,
    )
}

/// Breeds carrying `breed_trait_id` through `breed_breed_trait`.
pub fn breeds_for_trait(conn: &Connection, breed_trait_id: i64) -> RepoResult<Vec<NamedRow>> {
    named_rows(
        conn,
        "SELECT b.id, b.name
         FROM breed_breed_trait bbt
         INNER JOIN breed b ON b.id = bbt.breed_id
         WHERE bbt.breed_trait_id = ?1
         ORDER BY b.name ASC, b.id ASC;",
        breed_trait_id,
    )
}

fn load_named(conn: &Connection, sql: &str, id: i64) -> RepoResult<Option<NamedRow>> {
    let row = conn
        .query_row(sql, [id], |row| {
            Ok(NamedRow {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn named_rows(conn: &Connection, sql: &str, owner_id: i64) -> RepoResult<Vec<NamedRow>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([owner_id])?;
    let mut named = Vec::new();
    while let Some(row) = rows.next()? {
        named.push(NamedRow {
            id: row.get(0)?,
            name: row.get(1)?,
        });
    }
    Ok(named)
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<PersonRow> {
    let id: i64 = row.get(0)?;
    let phone = match row.get::<_, Option<String>>(4)? {
        Some(digits) => Some(Phone::parse(&digits).map_err(|err| {
            RepoError::InvalidData(format!(
                "invalid phone `{digits}` in person.phone_digits for id {id}: {err}"
            ))
        })?),
        None => None,
    };

    Ok(PersonRow {
        id,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        age: row.get(3)?,
        phone,
    })
}
