//! Graph store contract.

use super::cypher::UpsertMode;
use super::descriptor::{EdgeDescriptor, EdgeShape, NodeDescriptor, NodeShape};
use crate::Error;
use async_trait::async_trait;

/// What a store did with an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The node or edge now exists with the given attributes.
    Written,
    /// Match mode found no target, or an edge endpoint does not exist.
    Missing,
}

/// Property-graph store that applies upserts by caller-supplied identity.
///
/// Implementations must make repeated identical calls converge: a second
/// merge of the same descriptor leaves exactly one node or edge behind.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn upsert_node(&self, node: &NodeDescriptor, mode: UpsertMode) -> Result<UpsertOutcome, Error>;

    async fn upsert_edge(&self, edge: &EdgeDescriptor, mode: UpsertMode) -> Result<UpsertOutcome, Error>;

    /// Make identity unique per label and per relationship type so concurrent
    /// merges cannot duplicate nodes or edges.
    async fn ensure_constraints(&self, nodes: &[&'static NodeShape], edges: &[&'static EdgeShape]) -> Result<(), Error>;
}
