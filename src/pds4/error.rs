//! Crate-wide error type.
//!
//! Mirrors the taxonomy in the readiness-check error handling design: a
//! typed `ValidationError` list is collected and reported separately (see
//! `pds4::validate`), while this enum covers everything that aborts a run
//! outright — malformed identifiers encountered outside of a collectible
//! check, I/O failures, and XML parse failures.

use std::fmt;
use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PdsError>;

#[derive(Error)]
pub enum PdsError {
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),
    #[error("unknown product type: {0}")]
    UnknownProductType(String),
    #[error("no bundle label found: {0}")]
    NoBundleLabel(String),
    #[error("duplicate product: {0}")]
    DuplicateProduct(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
    #[error("{0}")]
    General(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
}

// Error output from `?` in `main` should read like the `Display` message,
// not a derive-generated struct dump.
impl fmt::Debug for PdsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
