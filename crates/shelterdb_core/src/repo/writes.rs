//! Row writes issued by a session flush.
//!
//! # Invariants
//! - Every insert returns the store-assigned rowid.
//! - Foreign keys are resolved through `PendingIds`; a reference to an
//!   unwritten row is an error, never a NULL.

use crate::db::SchemaTable;
use crate::model::breed::Breed;
use crate::model::breed_trait::BreedTrait;
use crate::model::person::Person;
use crate::model::pet::Pet;
use crate::model::phone::Phone;
use crate::model::shelter::Shelter;
use crate::model::species::Species;
use crate::session::flush::PendingIds;
use crate::session::{Entity, SessionError, SessionResult};
use rusqlite::{params, Transaction};

/// SQL mapping of one staged record type.
pub(crate) trait Persist: Entity {
    fn insert(&self, tx: &Transaction<'_>, ids: &PendingIds) -> SessionResult<i64>;
    fn update(&self, tx: &Transaction<'_>, id: i64, ids: &PendingIds) -> SessionResult<()>;
}

/// Join table realizing one many-to-many association.
pub(crate) struct LinkTable {
    table: SchemaTable,
    left_column: &'static str,
    right_column: &'static str,
}

pub(crate) const PET_PERSON_LINKS: LinkTable = LinkTable {
    table: SchemaTable::PetPerson,
    left_column: "pet_id",
    right_column: "person_id",
};

pub(crate) const BREED_TRAIT_LINKS: LinkTable = LinkTable {
    table: SchemaTable::BreedBreedTrait,
    left_column: "breed_id",
    right_column: "breed_trait_id",
};

impl LinkTable {
    pub(crate) fn insert(&self, tx: &Transaction<'_>, left: i64, right: i64) -> SessionResult<()> {
        tx.execute(
            &format!(
                "INSERT INTO {} ({}, {}) VALUES (?1, ?2);",
                self.table.name(),
                self.left_column,
                self.right_column
            ),
            params![left, right],
        )?;
        Ok(())
    }

    /// Deletes one join row, failing when the store no longer holds it.
    pub(crate) fn delete(&self, tx: &Transaction<'_>, left: i64, right: i64) -> SessionResult<()> {
        let removed = tx.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1 AND {} = ?2;",
                self.table.name(),
                self.left_column,
                self.right_column
            ),
            params![left, right],
        )?;
        if removed == 0 {
            return Err(SessionError::StaleLink {
                table: self.table.name(),
                left,
                right,
            });
        }
        Ok(())
    }
}

fn expect_one_row(changed: usize, entity: &'static str, id: i64) -> SessionResult<()> {
    if changed == 0 {
        return Err(SessionError::StaleRow { entity, id });
    }
    Ok(())
}

impl Persist for Species {
    fn insert(&self, tx: &Transaction<'_>, _ids: &PendingIds) -> SessionResult<i64> {
        tx.execute("INSERT INTO species (name) VALUES (?1);", [self.name.as_str()])?;
        Ok(tx.last_insert_rowid())
    }

    fn update(&self, tx: &Transaction<'_>, id: i64, _ids: &PendingIds) -> SessionResult<()> {
        let changed = tx.execute(
            "UPDATE species SET name = ?1 WHERE id = ?2;",
            params![self.name.as_str(), id],
        )?;
        expect_one_row(changed, Self::KIND, id)
    }
}

impl Persist for BreedTrait {
    fn insert(&self, tx: &Transaction<'_>, _ids: &PendingIds) -> SessionResult<i64> {
        tx.execute(
            "INSERT INTO breed_trait (name) VALUES (?1);",
            [self.name.as_str()],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn update(&self, tx: &Transaction<'_>, id: i64, _ids: &PendingIds) -> SessionResult<()> {
        let changed = tx.execute(
            "UPDATE breed_trait SET name = ?1 WHERE id = ?2;",
            params![self.name.as_str(), id],
        )?;
        expect_one_row(changed, Self::KIND, id)
    }
}

impl Persist for Shelter {
    fn insert(&self, tx: &Transaction<'_>, _ids: &PendingIds) -> SessionResult<i64> {
        tx.execute(
            "INSERT INTO shelter (name, website) VALUES (?1, ?2);",
            params![self.name.as_str(), self.website.as_deref()],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn update(&self, tx: &Transaction<'_>, id: i64, _ids: &PendingIds) -> SessionResult<()> {
        let changed = tx.execute(
            "UPDATE shelter SET name = ?1, website = ?2 WHERE id = ?3;",
            params![self.name.as_str(), self.website.as_deref(), id],
        )?;
        expect_one_row(changed, Self::KIND, id)
    }
}

impl Persist for Person {
    fn insert(&self, tx: &Transaction<'_>, _ids: &PendingIds) -> SessionResult<i64> {
        tx.execute(
            "INSERT INTO person (first_name, last_name, age, phone_digits)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                self.first_name.as_str(),
                self.last_name.as_str(),
                self.age,
                self.stored_phone().map(Phone::digits),
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn update(&self, tx: &Transaction<'_>, id: i64, _ids: &PendingIds) -> SessionResult<()> {
        let changed = tx.execute(
            "UPDATE person
             SET
                first_name = ?1,
                last_name = ?2,
                age = ?3,
                phone_digits = ?4
             WHERE id = ?5;",
            params![
                self.first_name.as_str(),
                self.last_name.as_str(),
                self.age,
                self.stored_phone().map(Phone::digits),
                id,
            ],
        )?;
        expect_one_row(changed, Self::KIND, id)
    }
}

impl Persist for Breed {
    fn insert(&self, tx: &Transaction<'_>, ids: &PendingIds) -> SessionResult<i64> {
        tx.execute(
            "INSERT INTO breed (name, species_id) VALUES (?1, ?2);",
            params![self.name.as_str(), ids.id_of(self.species)?],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn update(&self, tx: &Transaction<'_>, id: i64, ids: &PendingIds) -> SessionResult<()> {
        let changed = tx.execute(
            "UPDATE breed SET name = ?1, species_id = ?2 WHERE id = ?3;",
            params![self.name.as_str(), ids.id_of(self.species)?, id],
        )?;
        expect_one_row(changed, Self::KIND, id)
    }
}

impl Persist for Pet {
    fn insert(&self, tx: &Transaction<'_>, ids: &PendingIds) -> SessionResult<i64> {
        let shelter_id = self.shelter.map(|key| ids.id_of(key)).transpose()?;
        tx.execute(
            "INSERT INTO pet (name, age, adopted, breed_id, shelter_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                self.name.as_str(),
                self.age,
                self.adopted,
                ids.id_of(self.breed)?,
                shelter_id,
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn update(&self, tx: &Transaction<'_>, id: i64, ids: &PendingIds) -> SessionResult<()> {
        let shelter_id = self.shelter.map(|key| ids.id_of(key)).transpose()?;
        let changed = tx.execute(
            "UPDATE pet
             SET
                name = ?1,
                age = ?2,
                adopted = ?3,
                breed_id = ?4,
                shelter_id = ?5
             WHERE id = ?6;",
            params![
                self.name.as_str(),
                self.age,
                self.adopted,
                ids.id_of(self.breed)?,
                shelter_id,
                id,
            ],
        )?;
        expect_one_row(changed, Self::KIND, id)
    }
}
