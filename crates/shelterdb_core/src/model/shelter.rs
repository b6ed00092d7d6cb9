//! Shelter record.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Organization housing pets awaiting adoption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelter {
    pub name: String,
    /// Free-form text; not validated as a URL.
    pub website: Option<String>,
}

impl Shelter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website: None,
        }
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }
}

impl Display for Shelter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Shelter: {}", self.name)
    }
}
