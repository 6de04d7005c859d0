//! Neo4j-backed graph store over the bolt protocol.

use super::cypher::{CypherStatement, UpsertMode};
use super::descriptor::{AttrValue, EdgeDescriptor, EdgeShape, NodeDescriptor, NodeShape};
use super::store::{GraphStore, UpsertOutcome};
use crate::Error;
use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query, query};

/// Thin wrapper around `neo4rs::Graph` that runs upsert statements.
#[derive(Clone)]
pub struct Neo4jGraphStore {
    graph: Graph,
}

impl Neo4jGraphStore {
    /// Connect to Neo4j with the given credentials.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, Error> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .fetch_size(500)
            .max_connections(10)
            .build()
            .map_err(Error::from)?;
        let graph = Graph::connect(config).await?;
        tracing::info!(uri, "connected to graph store");
        Ok(Self { graph })
    }

    /// Run a statement; `Written` if it returned at least one row.
    async fn run(&self, stmt: CypherStatement) -> Result<UpsertOutcome, Error> {
        let mut stream = self.graph.execute(to_query(stmt)).await?;
        let mut rows = 0usize;
        while stream.next().await?.is_some() {
            rows += 1;
        }
        Ok(if rows > 0 { UpsertOutcome::Written } else { UpsertOutcome::Missing })
    }
}

fn to_query(stmt: CypherStatement) -> Query {
    stmt.params.into_iter().fold(query(&stmt.text), |q, (name, value)| match value {
        AttrValue::String(v) => q.param(&name, v),
        AttrValue::Int(v) => q.param(&name, v),
        AttrValue::Float(v) => q.param(&name, v),
        AttrValue::Bool(v) => q.param(&name, v),
    })
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn upsert_node(&self, node: &NodeDescriptor, mode: UpsertMode) -> Result<UpsertOutcome, Error> {
        self.run(CypherStatement::node_upsert(node, mode)?).await
    }

    async fn upsert_edge(&self, edge: &EdgeDescriptor, mode: UpsertMode) -> Result<UpsertOutcome, Error> {
        self.run(CypherStatement::edge_upsert(edge, mode)?).await
    }

    async fn ensure_constraints(&self, nodes: &[&'static NodeShape], edges: &[&'static EdgeShape]) -> Result<(), Error> {
        for shape in nodes {
            let stmt = CypherStatement::unique_identity_constraint(shape)?;
            self.graph.run(to_query(stmt)).await?;
            tracing::debug!(label = shape.label, "identity constraint ensured");
        }
        for shape in edges {
            let stmt = CypherStatement::unique_edge_identity_constraint(shape)?;
            self.graph.run(to_query(stmt)).await?;
            tracing::debug!(rel_type = shape.rel_type, "identity constraint ensured");
        }
        Ok(())
    }
}
