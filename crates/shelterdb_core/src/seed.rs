//! Scripted demo scenario over a fresh store.
//!
//! # Responsibility
//! - Stage a small shelter graph, commit it, mutate a many-to-many edge and
//!   check that both sides observe the change.
//! - Report committed row counts.
//!
//! # Invariants
//! - The connection is closed on every exit path of `run`.
//! - Consistency checks run against the session view and the store.

use crate::db::{close_db, init_db, open_url, DbError, SchemaTable, StoreUrl};
use crate::model::breed::Breed;
use crate::model::breed_trait::BreedTrait;
use crate::model::person::Person;
use crate::model::pet::Pet;
use crate::model::phone::PhoneError;
use crate::model::shelter::Shelter;
use crate::model::species::Species;
use crate::repo::queries::{count_rows, pets_for_person};
use crate::repo::{RepoError, RepoResult};
use crate::session::{Session, SessionError};
use log::{debug, error, info};
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type SeedResult<T> = Result<T, SeedError>;

#[derive(Debug)]
pub enum SeedError {
    Phone(PhoneError),
    Session(SessionError),
    Repo(RepoError),
    Db(DbError),
    /// A relationship check failed after a commit.
    Invariant(&'static str),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phone(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Invariant(details) => write!(f, "seed invariant violated: {details}"),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Phone(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Invariant(_) => None,
        }
    }
}

impl From<PhoneError> for SeedError {
    fn from(value: PhoneError) -> Self {
        Self::Phone(value)
    }
}

impl From<SessionError> for SeedError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<RepoError> for SeedError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for SeedError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Committed row counts after the scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub species: u64,
    pub breeds: u64,
    pub breed_traits: u64,
    pub shelters: u64,
    pub pets: u64,
    pub people: u64,
    pub pet_person_links: u64,
    pub breed_trait_links: u64,
}

impl SeedReport {
    /// Reads the counts from the store.
    pub fn collect(conn: &Connection) -> RepoResult<Self> {
        Ok(Self {
            species: count_rows(conn, SchemaTable::Species)?,
            breeds: count_rows(conn, SchemaTable::Breed)?,
            breed_traits: count_rows(conn, SchemaTable::BreedTrait)?,
            shelters: count_rows(conn, SchemaTable::Shelter)?,
            pets: count_rows(conn, SchemaTable::Pet)?,
            people: count_rows(conn, SchemaTable::Person)?,
            pet_person_links: count_rows(conn, SchemaTable::PetPerson)?,
            breed_trait_links: count_rows(conn, SchemaTable::BreedBreedTrait)?,
        })
    }
}

/// Opens `url`, resets the schema, runs the scenario and closes the store.
///
/// The first error wins; the connection is closed either way.
pub fn run(url: &StoreUrl) -> SeedResult<SeedReport> {
    let started_at = Instant::now();
    info!("event=seed_run module=seed status=start store={url}");

    let mut conn = open_url(url)?;
    let outcome = init_db(&mut conn)
        .map_err(SeedError::from)
        .and_then(|()| seed_demo(&mut conn));
    let closed = close_db(conn);

    let result = match (outcome, closed) {
        (Ok(report), Ok(())) => Ok(report),
        (Err(err), _) => Err(err),
        (Ok(_), Err(err)) => Err(SeedError::from(err)),
    };

    match &result {
        Ok(_) => info!(
            "event=seed_run module=seed status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=seed_run module=seed status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

/// Runs the scenario on an initialized store.
pub fn seed_demo(conn: &mut Connection) -> SeedResult<SeedReport> {
    let mut session = Session::new(conn);

    let tom = session.add(
        Person::new("Tom", "Smith")
            .with_age(52)
            .with_phone("555-555-5555")?,
    )?;
    let sue = session.add(
        Person::new("Sue", "Johson")
            .with_age(54)
            .with_phone("555 243 9988")?,
    )?;

    let dog = session.add(Species::new("Dog"))?;
    let dalmatian = session.add(Breed::new("Dalmatian", dog))?;
    let spot = session.add(
        Pet::new("Spot", dalmatian)
            .with_age(2)
            .with_adopted(true),
    )?;
    session.set_pet_people(spot, &[tom, sue])?;

    // Golden Retriever reuses the Dog key, so no second species row.
    let happy_place = session.add(Shelter::new("Happy Animal Place"))?;
    let golden = session.add(Breed::new("Golden Retriever", dog))?;
    let goldie = session.add(
        Pet::new("Goldie", golden)
            .with_age(9)
            .with_shelter(happy_place),
    )?;
    debug!(
        "event=seed_stage module=seed status=ok pets={},{} breeds={};{}",
        session.get(spot)?,
        session.get(goldie)?,
        session.describe_breed(dalmatian)?,
        session.describe_breed(golden)?
    );

    session.commit()?;
    info!("event=seed_step module=seed status=ok step=initial_graph_committed");

    if !session.pet_people(spot)?.contains(&tom) {
        return Err(SeedError::Invariant("tom must be in spot.people after commit"));
    }
    if !session.person_pets(tom)?.contains(&spot) {
        return Err(SeedError::Invariant("spot must be in tom.pets after commit"));
    }

    session.unlink_pet_person(spot, tom)?;
    let stats = session.commit()?;
    info!(
        "event=seed_step module=seed status=ok step=tom_unlinked_from_spot links_removed={}",
        stats.links_removed
    );

    if session.person_pets(tom)?.contains(&spot) {
        return Err(SeedError::Invariant("spot must not be in tom.pets after unlink"));
    }
    let tom_id = session
        .id(tom)?
        .ok_or(SeedError::Invariant("tom must have an id after commit"))?;
    let spot_id = session
        .id(spot)?
        .ok_or(SeedError::Invariant("spot must have an id after commit"))?;
    if pets_for_person(session.connection(), tom_id)?
        .iter()
        .any(|pet| pet.id == spot_id)
    {
        return Err(SeedError::Invariant("pet_person row for tom/spot must be deleted"));
    }

    let spotted = session.add(BreedTrait::new("Spotted"))?;
    let friendly = session.add(BreedTrait::new("Friendly"))?;
    let loyal = session.add(BreedTrait::new("Loyal"))?;
    session.link_breed_trait(dalmatian, spotted)?;
    session.link_breed_trait(dalmatian, friendly)?;
    session.link_breed_trait(golden, friendly)?;
    session.link_breed_trait(golden, loyal)?;
    session.commit()?;
    info!("event=seed_step module=seed status=ok step=breed_traits_committed");

    session.close();

    let report = SeedReport::collect(conn)?;
    info!(
        "event=seed_report module=seed status=ok species={} breeds={} breed_traits={} shelters={} pets={} people={} pet_person_links={} breed_trait_links={}",
        report.species,
        report.breeds,
        report.breed_traits,
        report.shelters,
        report.pets,
        report.people,
        report.pet_person_links,
        report.breed_trait_links
    );
    Ok(report)
}
