//! Store connection strings.
//!
//! Accepted forms follow the `sqlite://` URL convention:
//! - `sqlite://`, `sqlite:///:memory:` and `:memory:` address a transient
//!   in-memory database.
//! - `sqlite:///<path>` addresses a database file at `<path>`; an absolute
//!   path therefore reads `sqlite:////var/lib/shelter.db`.

use super::DbError;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

const SQLITE_SCHEME: &str = "sqlite://";
const MEMORY_TARGET: &str = ":memory:";

/// Parsed location of a backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUrl {
    Memory,
    File(PathBuf),
}

impl FromStr for StoreUrl {
    type Err = DbError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed == MEMORY_TARGET {
            return Ok(Self::Memory);
        }

        let rest = trimmed
            .strip_prefix(SQLITE_SCHEME)
            .ok_or_else(|| DbError::InvalidUrl(trimmed.to_string()))?;
        if rest.is_empty() {
            return Ok(Self::Memory);
        }

        let target = rest
            .strip_prefix('/')
            .ok_or_else(|| DbError::InvalidUrl(trimmed.to_string()))?;
        match target {
            "" | MEMORY_TARGET => Ok(Self::Memory),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }
}

impl Display for StoreUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "{SQLITE_SCHEME}/{MEMORY_TARGET}"),
            Self::File(path) => write!(f, "{SQLITE_SCHEME}/{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StoreUrl;
    use crate::db::DbError;
    use std::path::PathBuf;

    #[test]
    fn memory_forms_parse_to_memory() {
        for input in ["sqlite://", "sqlite:///:memory:", ":memory:", " sqlite:/// "] {
            let url: StoreUrl = input.parse().expect("memory url should parse");
            assert_eq!(url, StoreUrl::Memory, "input `{input}`");
        }
    }

    #[test]
    fn file_forms_keep_relative_and_absolute_paths() {
        let relative: StoreUrl = "sqlite:///pets.db".parse().unwrap();
        assert_eq!(relative, StoreUrl::File(PathBuf::from("pets.db")));

        let absolute: StoreUrl = "sqlite:////tmp/pets.db".parse().unwrap();
        assert_eq!(absolute, StoreUrl::File(PathBuf::from("/tmp/pets.db")));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let url = StoreUrl::File(PathBuf::from("/tmp/pets.db"));
        let reparsed: StoreUrl = url.to_string().parse().unwrap();
        assert_eq!(reparsed, url);
        assert_eq!(StoreUrl::Memory.to_string(), "sqlite:///:memory:");
    }

    #[test]
    fn foreign_schemes_are_rejected() {
        let err = "postgres://localhost/pets".parse::<StoreUrl>().unwrap_err();
        assert!(matches!(err, DbError::InvalidUrl(value) if value.starts_with("postgres")));
        assert!("sqlite:memory".parse::<StoreUrl>().is_err());
    }
}
