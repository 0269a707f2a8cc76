//! UUID utilities

use uuid::Uuid;

use crate::{Error, Result};

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from string
pub fn parse(s: &str) -> std::result::Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

/// Parse a UUID read back from a TEXT column
pub fn parse_column(column: &str, s: &str) -> Result<Uuid> {
    parse(s).map_err(|e| Error::Internal(format!("Invalid UUID in column {}: {}", column, e)))
}
