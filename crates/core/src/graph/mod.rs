//! Idempotent graph-upsert protocol.
//!
//! Callers describe nodes and edges with deterministic identities; the
//! [`GraphUpsertService`] turns each description into a merge or match against
//! a [`GraphStore`]. Re-running the same sequence of writes converges to the
//! same graph.

pub mod cypher;
pub mod descriptor;
pub mod memory;
pub mod neo4j;
pub mod store;
pub mod upsert;

pub use cypher::{CypherStatement, UpsertMode};
pub use descriptor::{AttrValue, EdgeDescriptor, EdgeShape, NodeDescriptor, NodeRef, NodeShape};
pub use memory::MemoryGraphStore;
pub use neo4j::Neo4jGraphStore;
pub use store::{GraphStore, UpsertOutcome};
pub use upsert::GraphUpsertService;
