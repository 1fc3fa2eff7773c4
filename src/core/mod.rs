//! Building blocks shared by every resource: records, storage, auth and errors

pub mod auth;
pub mod entity;
pub mod error;
pub mod query;
pub mod service;
pub mod validation;

pub use auth::{AuthContext, AuthPolicy, Role};
pub use entity::Entity;
pub use error::{PayrollError, PayrollResult};
pub use service::DataService;
