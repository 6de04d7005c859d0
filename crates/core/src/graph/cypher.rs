//! Cypher text for node and edge upserts.
//!
//! Labels, relationship types and attribute keys come from validated
//! `'static` shapes and are the only things spliced into query text. Every
//! value, identities included, travels as a bound parameter.

use super::descriptor::{
    AttrValue, Attrs, EdgeDescriptor, EdgeShape, IDENTITY_KEY, NodeDescriptor, NodeShape, is_identifier,
};
use crate::Error;
use std::fmt::Write;

/// Create-if-absent versus require-existing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    Merge,
    Match,
}

impl UpsertMode {
    pub fn from_allow_create(allow_create: bool) -> Self {
        if allow_create { UpsertMode::Merge } else { UpsertMode::Match }
    }

    fn keyword(self) -> &'static str {
        match self {
            UpsertMode::Merge => "MERGE",
            UpsertMode::Match => "MATCH",
        }
    }
}

/// A parameterized Cypher statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherStatement {
    pub text: String,
    pub params: Vec<(String, AttrValue)>,
}

impl CypherStatement {
    /// `MERGE|MATCH (n:Label {_id: $id}) SET n.k = $p_k ... RETURN n._id AS id`
    pub fn node_upsert(node: &NodeDescriptor, mode: UpsertMode) -> Result<Self, Error> {
        node.validate()?;

        let mut text = format!("{} (n:{} {{{IDENTITY_KEY}: $id}})", mode.keyword(), node.shape.label);
        let mut params = vec![("id".to_string(), AttrValue::String(node.id.clone()))];
        push_set_clause(&mut text, &mut params, "n", &node.attrs);
        let _ = write!(text, "\nRETURN n.{IDENTITY_KEY} AS id");

        Ok(Self { text, params })
    }

    /// Endpoints are always matched; the relationship itself is merged or matched.
    pub fn edge_upsert(edge: &EdgeDescriptor, mode: UpsertMode) -> Result<Self, Error> {
        edge.validate()?;

        let mut text = format!(
            "MATCH (l:{left} {{{IDENTITY_KEY}: $left_id}})\n\
             MATCH (r:{right} {{{IDENTITY_KEY}: $right_id}})\n\
             {kw} (l)-[e:{rel} {{{IDENTITY_KEY}: $id}}]->(r)",
            left = edge.left.shape.label,
            right = edge.right.shape.label,
            kw = mode.keyword(),
            rel = edge.shape.rel_type,
        );
        let mut params = vec![
            ("left_id".to_string(), AttrValue::String(edge.left.id.clone())),
            ("right_id".to_string(), AttrValue::String(edge.right.id.clone())),
            ("id".to_string(), AttrValue::String(edge.id.clone())),
        ];
        push_set_clause(&mut text, &mut params, "e", &edge.attrs);
        let _ = write!(text, "\nRETURN e.{IDENTITY_KEY} AS id");

        Ok(Self { text, params })
    }

    /// Uniqueness constraint on the identity property of a relationship type.
    ///
    /// Without it, concurrent `MERGE`s of the same relationship are not
    /// serialized and can leave duplicates. Needs Neo4j 5.7 or later.
    pub fn unique_edge_identity_constraint(shape: &EdgeShape) -> Result<Self, Error> {
        if !is_identifier(shape.rel_type) {
            return Err(Error::InvalidInput(format!("invalid relationship type: {:?}", shape.rel_type)));
        }
        let text = format!(
            "CREATE CONSTRAINT {name}_identity IF NOT EXISTS FOR ()-[e:{rel}]-() REQUIRE e.{IDENTITY_KEY} IS UNIQUE",
            name = shape.rel_type.to_ascii_lowercase(),
            rel = shape.rel_type,
        );
        Ok(Self { text, params: Vec::new() })
    }

    /// Uniqueness constraint on the identity property of a label.
    pub fn unique_identity_constraint(shape: &NodeShape) -> Result<Self, Error> {
        if !is_identifier(shape.label) {
            return Err(Error::InvalidInput(format!("invalid label: {:?}", shape.label)));
        }
        let text = format!(
            "CREATE CONSTRAINT {name}_identity IF NOT EXISTS FOR (n:{label}) REQUIRE n.{IDENTITY_KEY} IS UNIQUE",
            name = shape.label.to_ascii_lowercase(),
            label = shape.label,
        );
        Ok(Self { text, params: Vec::new() })
    }
}

fn push_set_clause(text: &mut String, params: &mut Vec<(String, AttrValue)>, var: &str, attrs: &Attrs) {
    if attrs.is_empty() {
        return;
    }
    let assignments: Vec<String> = attrs.keys().map(|key| format!("{var}.{key} = $p_{key}")).collect();
    let _ = write!(text, "\nSET {}", assignments.join(", "));
    params.extend(attrs.iter().map(|(key, value)| (format!("p_{key}"), value.clone())));
}
