//! Breed record.
//!
//! # Invariants
//! - Every breed references exactly one species through a session key; the
//!   referenced species may still be transient.

use crate::session::SpeciesKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breed {
    pub name: String,
    pub species: SpeciesKey,
}

impl Breed {
    pub fn new(name: impl Into<String>, species: SpeciesKey) -> Self {
        Self {
            name: name.into(),
            species,
        }
    }
}
