//! Business logic services.
//!
//! Services orchestrate the graph store and provide the logical operations.

mod backend_factory;
mod catalog;
mod decode;
pub mod ranking;
pub mod traversal;
pub mod upsert;

pub use backend_factory::BackendFactory;
pub use catalog::MovieCatalog;
pub use upsert::MovieUpsert;
