//! Domain schema registry and destructive reset.
//!
//! # Responsibility
//! - Declare every table of the shelter domain in dependency order.
//! - Drop and recreate the whole schema atomically.
//!
//! # Invariants
//! - `SchemaTable::ALL` lists parents before children; drops run in reverse.
//! - Required text columns reject empty strings at the store level.
//! - Join tables hold one row per (left, right) pair.

use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

/// Tables owned by the shelter schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaTable {
    Species,
    BreedTrait,
    Shelter,
    Person,
    Breed,
    BreedBreedTrait,
    Pet,
    PetPerson,
}

impl SchemaTable {
    /// Creation order: every table appears after the tables it references.
    pub const ALL: [SchemaTable; 8] = [
        SchemaTable::Species,
        SchemaTable::BreedTrait,
        SchemaTable::Shelter,
        SchemaTable::Person,
        SchemaTable::Breed,
        SchemaTable::BreedBreedTrait,
        SchemaTable::Pet,
        SchemaTable::PetPerson,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Species => "species",
            Self::BreedTrait => "breed_trait",
            Self::Shelter => "shelter",
            Self::Person => "person",
            Self::Breed => "breed",
            Self::BreedBreedTrait => "breed_breed_trait",
            Self::Pet => "pet",
            Self::PetPerson => "pet_person",
        }
    }

    fn create_sql(self) -> &'static str {
        match self {
            Self::Species => {
                "CREATE TABLE species (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL CHECK (length(name) > 0)
                );"
            }
            Self::BreedTrait => {
                "CREATE TABLE breed_trait (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL CHECK (length(name) > 0)
                );"
            }
            Self::Shelter => {
                "CREATE TABLE shelter (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL CHECK (length(name) > 0),
                    website TEXT
                );"
            }
            Self::Person => {
                "CREATE TABLE person (
                    id INTEGER PRIMARY KEY,
                    first_name TEXT NOT NULL CHECK (length(first_name) > 0),
                    last_name TEXT NOT NULL CHECK (length(last_name) > 0),
                    age INTEGER,
                    phone_digits TEXT CHECK (phone_digits IS NULL OR length(phone_digits) = 10)
                );"
            }
            Self::Breed => {
                "CREATE TABLE breed (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL CHECK (length(name) > 0),
                    species_id INTEGER NOT NULL REFERENCES species(id)
                );
                CREATE INDEX idx_breed_species ON breed(species_id);"
            }
            Self::BreedBreedTrait => {
                "CREATE TABLE breed_breed_trait (
                    breed_id INTEGER NOT NULL REFERENCES breed(id),
                    breed_trait_id INTEGER NOT NULL REFERENCES breed_trait(id),
                    UNIQUE (breed_id, breed_trait_id)
                );"
            }
            Self::Pet => {
                "CREATE TABLE pet (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL CHECK (length(name) > 0),
                    age INTEGER,
                    adopted INTEGER NOT NULL DEFAULT 0 CHECK (adopted IN (0, 1)),
                    breed_id INTEGER NOT NULL REFERENCES breed(id),
                    shelter_id INTEGER REFERENCES shelter(id)
                );
                CREATE INDEX idx_pet_breed ON pet(breed_id);
                CREATE INDEX idx_pet_shelter ON pet(shelter_id);"
            }
            Self::PetPerson => {
                "CREATE TABLE pet_person (
                    pet_id INTEGER NOT NULL REFERENCES pet(id),
                    person_id INTEGER NOT NULL REFERENCES person(id),
                    UNIQUE (pet_id, person_id)
                );
                CREATE INDEX idx_pet_person_person ON pet_person(person_id);"
            }
        }
    }
}

/// Drops all schema tables and recreates them empty.
///
/// # Side effects
/// - Irreversibly deletes every row in the schema tables.
/// - Emits `db_init` logging events with duration and status.
pub fn init_db(conn: &mut Connection) -> DbResult<()> {
    let started_at = Instant::now();
    info!("event=db_init module=db status=start tables={}", SchemaTable::ALL.len());

    match reset_schema(conn) {
        Ok(()) => {
            info!(
                "event=db_init module=db status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=db_init module=db status=error duration_ms={} error_code=db_init_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Returns whether a table with the given name exists in the main schema.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn reset_schema(conn: &mut Connection) -> DbResult<()> {
    let tx = conn.transaction()?;
    for table in SchemaTable::ALL.iter().rev() {
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", table.name()))?;
    }
    for table in SchemaTable::ALL {
        tx.execute_batch(table.create_sql())?;
    }
    tx.commit()?;
    Ok(())
}
