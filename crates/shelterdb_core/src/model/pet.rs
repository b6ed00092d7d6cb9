//! Pet record.
//!
//! # Invariants
//! - `breed` is required; `shelter` is optional.
//! - People linked to a pet are tracked by the session, not by this record.

use crate::session::{BreedKey, ShelterKey};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pet {
    pub name: String,
    pub age: Option<u32>,
    pub adopted: bool,
    pub breed: BreedKey,
    pub shelter: Option<ShelterKey>,
}

impl Pet {
    /// Creates an unadopted pet with unknown age and no shelter.
    pub fn new(name: impl Into<String>, breed: BreedKey) -> Self {
        Self {
            name: name.into(),
            age: None,
            adopted: false,
            breed,
            shelter: None,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_adopted(mut self, adopted: bool) -> Self {
        self.adopted = adopted;
        self
    }

    pub fn with_shelter(mut self, shelter: ShelterKey) -> Self {
        self.shelter = Some(shelter);
        self
    }
}

impl Display for Pet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pet:{}", self.name)
    }
}
