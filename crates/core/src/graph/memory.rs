//! In-memory graph store for dry runs and tests.

use super::cypher::UpsertMode;
use super::descriptor::{AttrValue, EdgeDescriptor, EdgeShape, NodeDescriptor, NodeShape};
use super::store::{GraphStore, UpsertOutcome};
use crate::Error;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

type NodeKey = (&'static str, String);
type EdgeKey = (&'static str, String, NodeKey, NodeKey);
type Properties = BTreeMap<String, AttrValue>;

#[derive(Debug, Default)]
struct State {
    nodes: HashMap<NodeKey, Properties>,
    edges: HashMap<EdgeKey, Properties>,
}

/// Graph held in process memory with the same merge/match rules as Neo4j.
///
/// An edge is identified by its type, identity and both endpoints, the same
/// tuple a `MERGE (l)-[e:TYPE {_id: $id}]->(r)` pattern matches on.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    state: Mutex<State>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.lock().edges.len()
    }

    /// Count nodes carrying `label`.
    pub fn count_label(&self, label: &str) -> usize {
        self.lock().nodes.keys().filter(|(l, _)| *l == label).count()
    }

    /// Count edges of `rel_type`.
    pub fn count_rel_type(&self, rel_type: &str) -> usize {
        self.lock().edges.keys().filter(|(t, ..)| *t == rel_type).count()
    }

    /// Properties of a node, if it exists.
    pub fn node(&self, label: &str, id: &str) -> Option<Properties> {
        self.lock()
            .nodes
            .iter()
            .find(|((l, i), _)| *l == label && i == id)
            .map(|(_, props)| props.clone())
    }

    /// Properties of the first edge with `rel_type` and identity `id`.
    pub fn edge(&self, rel_type: &str, id: &str) -> Option<Properties> {
        self.lock()
            .edges
            .iter()
            .find(|((t, i, ..), _)| *t == rel_type && i == id)
            .map(|(_, props)| props.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn apply(props: &mut Properties, attrs: &super::descriptor::Attrs) {
    for (key, value) in attrs {
        props.insert((*key).to_string(), value.clone());
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn upsert_node(&self, node: &NodeDescriptor, mode: UpsertMode) -> Result<UpsertOutcome, Error> {
        node.validate()?;
        let key = (node.shape.label, node.id.clone());
        let mut state = self.lock();

        let props = match mode {
            UpsertMode::Merge => state.nodes.entry(key).or_default(),
            UpsertMode::Match => match state.nodes.get_mut(&key) {
                Some(props) => props,
                None => return Ok(UpsertOutcome::Missing),
            },
        };
        apply(props, &node.attrs);
        Ok(UpsertOutcome::Written)
    }

    async fn upsert_edge(&self, edge: &EdgeDescriptor, mode: UpsertMode) -> Result<UpsertOutcome, Error> {
        edge.validate()?;
        let left = (edge.left.shape.label, edge.left.id.clone());
        let right = (edge.right.shape.label, edge.right.id.clone());
        let mut state = self.lock();

        if !state.nodes.contains_key(&left) || !state.nodes.contains_key(&right) {
            return Ok(UpsertOutcome::Missing);
        }

        let key = (edge.shape.rel_type, edge.id.clone(), left, right);
        let props = match mode {
            UpsertMode::Merge => state.edges.entry(key).or_default(),
            UpsertMode::Match => match state.edges.get_mut(&key) {
                Some(props) => props,
                None => return Ok(UpsertOutcome::Missing),
            },
        };
        apply(props, &edge.attrs);
        Ok(UpsertOutcome::Written)
    }

    async fn ensure_constraints(&self, _nodes: &[&'static NodeShape], _edges: &[&'static EdgeShape]) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::descriptor::{EdgeShape, NodeRef};

    static PERSON: NodeShape = NodeShape { label: "Person", attrs: &["first"] };
    static BILL: NodeShape = NodeShape { label: "Bill", attrs: &[] };
    static VOTED: EdgeShape = EdgeShape { rel_type: "VOTED", left: &PERSON, right: &BILL, attrs: &["vote"] };

    #[tokio::test]
    async fn test_same_id_different_labels_are_distinct() {
        let store = MemoryGraphStore::new();
        store.upsert_node(&NodeDescriptor::new(&PERSON, "x"), UpsertMode::Merge).await.unwrap();
        store.upsert_node(&NodeDescriptor::new(&BILL, "x"), UpsertMode::Merge).await.unwrap();

        assert_eq!(store.node_count(), 2);
        assert_eq!(store.count_label("Person"), 1);
        assert_eq!(store.count_label("Bill"), 1);
    }

    #[tokio::test]
    async fn test_edge_with_missing_endpoint_is_missing() {
        let store = MemoryGraphStore::new();
        store.upsert_node(&NodeDescriptor::new(&PERSON, "p1"), UpsertMode::Merge).await.unwrap();
        let edge = EdgeDescriptor::new(&VOTED, "v1", NodeRef::new(&PERSON, "p1"), NodeRef::new(&BILL, "b1"));

        let outcome = store.upsert_edge(&edge, UpsertMode::Merge).await.unwrap();

        assert_eq!(outcome, UpsertOutcome::Missing);
        assert_eq!(store.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_edge_merge_then_update() {
        let store = MemoryGraphStore::new();
        store.upsert_node(&NodeDescriptor::new(&PERSON, "p1"), UpsertMode::Merge).await.unwrap();
        store.upsert_node(&NodeDescriptor::new(&BILL, "b1"), UpsertMode::Merge).await.unwrap();
        let edge = EdgeDescriptor::new(&VOTED, "v1", NodeRef::new(&PERSON, "p1"), NodeRef::new(&BILL, "b1"));

        store.upsert_edge(&edge.clone().attr("vote", "Yea"), UpsertMode::Merge).await.unwrap();
        store.upsert_edge(&edge.attr("vote", "Nay"), UpsertMode::Match).await.unwrap();

        assert_eq!(store.count_rel_type("VOTED"), 1);
        assert_eq!(store.edge("VOTED", "v1").unwrap().get("vote"), Some(&AttrValue::String("Nay".into())));
    }
}
