//! Core domain logic for shelterdb.
//! This crate is the single source of truth for schema and relationship
//! invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod session;

pub use db::{close_db, init_db, open_db, open_db_in_memory, open_url, DbError, DbResult, StoreUrl};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::breed::Breed;
pub use model::breed_trait::BreedTrait;
pub use model::person::Person;
pub use model::pet::Pet;
pub use model::phone::{Phone, PhoneError};
pub use model::shelter::Shelter;
pub use model::species::Species;
pub use repo::{RepoError, RepoResult};
pub use seed::{SeedError, SeedReport, SeedResult};
pub use session::{
    BreedKey, BreedTraitKey, EntityKey, FlushStats, Load, PersonKey, PetKey, Session, SessionError,
    SessionResult, ShelterKey, SpeciesKey,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
