//! Oracle AI Vector Search backend.

pub mod connection;
pub mod ingest;
pub mod mmr;
pub mod retrieve;
pub mod schema;
pub mod session;
pub mod store;
pub mod vector;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::{ConnectionProfile, OracleConnector, SessionConnector};
pub use retrieve::{SearchConfig, SearchType};
pub use session::{OracleSession, SqlSession};
pub use store::{StoreDeps, StoreHandle, build_store, search};
pub use vector::DistanceStrategy;
