//! GraphUpsertService: idempotent node and edge writes.

use super::cypher::UpsertMode;
use super::descriptor::{EdgeDescriptor, EdgeShape, NodeDescriptor, NodeShape};
use super::store::{GraphStore, UpsertOutcome};
use crate::Error;
use std::sync::Arc;

/// Translates descriptors into store upserts.
///
/// `allow_create = true` merges by identity then overwrites the given
/// attributes; `false` requires the target to exist and fails with
/// [`Error::NotFound`] otherwise. Edge endpoints are always matched, never
/// created.
#[derive(Clone)]
pub struct GraphUpsertService {
    store: Arc<dyn GraphStore>,
}

impl GraphUpsertService {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub async fn upsert_node(&self, node: &NodeDescriptor, allow_create: bool) -> Result<(), Error> {
        node.validate()?;
        match self.store.upsert_node(node, UpsertMode::from_allow_create(allow_create)).await? {
            UpsertOutcome::Written => {
                tracing::trace!(label = node.shape.label, id = %node.id, "node upserted");
                Ok(())
            }
            UpsertOutcome::Missing => Err(Error::NotFound(format!("{} {}", node.shape.label, node.id))),
        }
    }

    pub async fn upsert_edge(&self, edge: &EdgeDescriptor, allow_create: bool) -> Result<(), Error> {
        edge.validate()?;
        match self.store.upsert_edge(edge, UpsertMode::from_allow_create(allow_create)).await? {
            UpsertOutcome::Written => {
                tracing::trace!(rel_type = edge.shape.rel_type, id = %edge.id, "edge upserted");
                Ok(())
            }
            UpsertOutcome::Missing if allow_create => Err(Error::NotFound(format!(
                "{} {}: endpoint {} {} or {} {} does not exist",
                edge.shape.rel_type,
                edge.id,
                edge.left.shape.label,
                edge.left.id,
                edge.right.shape.label,
                edge.right.id
            ))),
            UpsertOutcome::Missing => Err(Error::NotFound(format!("{} {}", edge.shape.rel_type, edge.id))),
        }
    }

    /// Create identity uniqueness constraints for every shape the caller writes.
    pub async fn ensure_constraints(
        &self, nodes: &[&'static NodeShape], edges: &[&'static EdgeShape],
    ) -> Result<(), Error> {
        self.store.ensure_constraints(nodes, edges).await
    }
}
