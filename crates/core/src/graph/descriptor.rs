//! Node and edge descriptors.
//!
//! A descriptor names a shape (label plus the closed set of attribute keys
//! that shape may carry), a caller-computed identity, and attribute values.
//! Shapes are `'static` and defined by the pipeline, never by remote data;
//! only the values come from remote payloads.

use crate::Error;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Property holding the caller-computed identity on every node and edge.
pub const IDENTITY_KEY: &str = "_id";

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid identifier regex"));

/// Whether `name` can be spliced into query text as a label, type or key.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// A node label and the attribute keys nodes with that label may carry.
#[derive(Debug, PartialEq, Eq)]
pub struct NodeShape {
    pub label: &'static str,
    pub attrs: &'static [&'static str],
}

/// A relationship type, its endpoint shapes and its allowed attribute keys.
#[derive(Debug, PartialEq, Eq)]
pub struct EdgeShape {
    pub rel_type: &'static str,
    pub left: &'static NodeShape,
    pub right: &'static NodeShape,
    pub attrs: &'static [&'static str],
}

/// Attribute value bound as a query parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::String(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::String(v.to_string())
    }
}

impl From<&String> for AttrValue {
    fn from(v: &String) -> Self {
        AttrValue::String(v.clone())
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

pub type Attrs = BTreeMap<&'static str, AttrValue>;

/// Reference to an existing node, used as an edge endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRef {
    pub shape: &'static NodeShape,
    pub id: String,
}

impl NodeRef {
    pub fn new(shape: &'static NodeShape, id: impl Into<String>) -> Self {
        Self { shape, id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeDescriptor {
    pub shape: &'static NodeShape,
    pub id: String,
    pub attrs: Attrs,
}

impl NodeDescriptor {
    pub fn new(shape: &'static NodeShape, id: impl Into<String>) -> Self {
        Self { shape, id: id.into(), attrs: Attrs::new() }
    }

    pub fn attr(mut self, key: &'static str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key, value.into());
        self
    }

    /// Set `key` only when a value is present.
    pub fn attr_opt<V: Into<AttrValue>>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.attr(key, v),
            None => self,
        }
    }

    pub fn to_ref(&self) -> NodeRef {
        NodeRef::new(self.shape, self.id.clone())
    }

    /// Check identity and attribute keys against the shape.
    pub fn validate(&self) -> Result<(), Error> {
        validate_name("label", self.shape.label)?;
        validate_id(self.shape.label, &self.id)?;
        validate_keys(self.shape.label, self.shape.attrs, &self.attrs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDescriptor {
    pub shape: &'static EdgeShape,
    pub id: String,
    pub left: NodeRef,
    pub right: NodeRef,
    pub attrs: Attrs,
}

impl EdgeDescriptor {
    pub fn new(shape: &'static EdgeShape, id: impl Into<String>, left: NodeRef, right: NodeRef) -> Self {
        Self { shape, id: id.into(), left, right, attrs: Attrs::new() }
    }

    pub fn attr(mut self, key: &'static str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key, value.into());
        self
    }

    pub fn attr_opt<V: Into<AttrValue>>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.attr(key, v),
            None => self,
        }
    }

    /// Check identity, endpoint shapes and attribute keys against the shape.
    pub fn validate(&self) -> Result<(), Error> {
        validate_name("relationship type", self.shape.rel_type)?;
        validate_id(self.shape.rel_type, &self.id)?;

        for (side, endpoint, expected) in
            [("left", &self.left, self.shape.left), ("right", &self.right, self.shape.right)]
        {
            if endpoint.shape.label != expected.label {
                return Err(Error::InvalidInput(format!(
                    "{} {side} endpoint must be {}, got {}",
                    self.shape.rel_type, expected.label, endpoint.shape.label
                )));
            }
            validate_name("label", endpoint.shape.label)?;
            validate_id(endpoint.shape.label, &endpoint.id)?;
        }

        validate_keys(self.shape.rel_type, self.shape.attrs, &self.attrs)
    }
}

fn validate_name(what: &str, name: &str) -> Result<(), Error> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid {what}: {name:?}")))
    }
}

fn validate_id(owner: &str, id: &str) -> Result<(), Error> {
    if id.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{owner} identity must not be empty")));
    }
    Ok(())
}

fn validate_keys(owner: &str, allowed: &[&str], attrs: &Attrs) -> Result<(), Error> {
    for key in attrs.keys() {
        if *key == IDENTITY_KEY {
            return Err(Error::InvalidInput(format!("{owner} may not set {IDENTITY_KEY} as an attribute")));
        }
        if !allowed.contains(key) {
            return Err(Error::InvalidInput(format!("{owner} does not allow attribute {key:?}")));
        }
        validate_name("attribute key", key)?;
    }
    Ok(())
}
