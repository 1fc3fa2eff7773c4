//! HTTP server: shared host state, CRUD registry, domain routes and builder
//!
//! `ServerBuilder` registers:
//! - CRUD routes for every resource in [`router::resource_registry`]
//! - The domain routes from [`crate::handlers`]
//! - Health routes

pub mod builder;
pub mod entity_registry;
pub mod exposure;
pub mod host;
pub mod resource;
pub mod router;

pub use builder::ServerBuilder;
pub use entity_registry::{EntityDescriptor, EntityRegistry};
pub use exposure::RestExposure;
pub use host::ServerHost;
pub use resource::Resource;
