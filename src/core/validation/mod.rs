//! Request payload validation
//!
//! Payload types derive [`validator::Validate`]; handlers receive them through
//! the [`Validated`] extractor so rule violations never reach business code.

pub mod extractor;
pub mod validators;

pub use extractor::{IdPath, QueryOf, Validated, ValidatedQuery, field_errors};
