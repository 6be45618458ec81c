//! sqlcli Gateway
//!
//! The executor side of the client:
//! - The [`Executor`] trait the statement loop talks to
//! - Query result descriptors and row fetchers
//! - [`LocalExecutor`], an in-process gateway keeping session properties,
//!   a catalog of DDL text, modules, jars and submitted jobs

mod catalog;
mod error;
mod executor;
mod local;
mod query;

pub use catalog::{Catalog, CatalogObject};
pub use error::{GatewayError, GatewayResult};
pub use executor::{Executor, ResultDescriptor, ResultFetcher, VecResultFetcher};
pub use local::{JobStatus, LocalExecutor};
