//! SQLite storage bootstrap and schema reset entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for shelterdb core.
//! - Drop and recreate the domain schema on demand.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Schema is created programmatically; there are no migration files.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;
mod url;

pub use open::{close_db, open_db, open_db_in_memory, open_url};
pub use schema::{init_db, table_exists, SchemaTable};
pub use url::StoreUrl;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidUrl(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidUrl(url) => write!(
                f,
                "unsupported store url `{url}`; expected sqlite://, sqlite:///:memory: or sqlite:///<path>"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidUrl(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
