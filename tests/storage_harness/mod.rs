//! Shared test harness for storage backend testing
//!
//! Provides `TestRecord`, a tenant record with string, integer, float and
//! boolean fields, and helpers for building test data.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod data_service_tests;

use uuid::Uuid;

payroll::impl_company_entity!(
    /// A record with one field per JSON scalar kind
    TestRecord,
    "test record",
    "test-records",
    {
        name: String,
        email: String,
        age: i64,
        score: f64,
        active: bool,
    }
);

/// A record of `company_id`
pub fn create_test_record(
    company_id: Uuid,
    name: &str,
    email: &str,
    age: i64,
    score: f64,
    active: bool,
) -> TestRecord {
    TestRecord::new(
        company_id,
        name.to_string(),
        email.to_string(),
        age,
        score,
        active,
    )
}

/// A record of a fresh company
pub fn test_record(name: &str) -> TestRecord {
    create_test_record(
        Uuid::new_v4(),
        name,
        &format!("{}@test.com", name.to_lowercase()),
        30,
        4.5,
        true,
    )
}
