//! Shelter domain model.
//!
//! # Responsibility
//! - Define the six record types staged by a `Session`.
//! - Own field-level validation that must run before storage.
//!
//! # Invariants
//! - Records carry no surrogate key; identity lives in the session until
//!   the store assigns one at commit.
//! - Relationship fields hold session keys, never raw ids.

pub mod breed;
pub mod breed_trait;
pub mod person;
pub mod pet;
pub mod phone;
pub mod shelter;
pub mod species;
