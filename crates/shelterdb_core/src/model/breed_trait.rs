//! Breed trait record.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Characteristic shared by any number of breeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreedTrait {
    pub name: String,
}

impl BreedTrait {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Display for BreedTrait {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BreedTrait: {}", self.name)
    }
}
