//! API exposure
//!
//! An exposure consumes a `ServerHost` and produces a router for one
//! protocol. REST is the only one.

pub mod rest;

pub use rest::RestExposure;
