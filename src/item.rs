//! The dynamic value type flowing through pipelines.
//!
//! Stages treat items as opaque payloads; only user-supplied functions
//! inspect them. `Item` is self-describing so a single pipeline can carry
//! heterogeneous records (raw byte blocks, decoded feature maps, nested
//! lists) without generics leaking into the stage chain.
//!
//! Items are `Clone` and serde-serializable: the flatten stage persists
//! the upstream item whose sub-pipeline is active as part of its exported
//! state, so every item must survive a serialization round trip.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single record flowing through a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Raw memory block, e.g. an undecoded audio buffer.
    Bytes(Vec<u8>),
    List(Vec<Item>),
    Map(BTreeMap<String, Item>),
}

impl Item {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Item::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Item::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Item::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Item::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Item::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Item]> {
        match self {
            Item::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Item>> {
        match self {
            Item::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Short type name for diagnostics, e.g. in transform error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Item::Bool(_) => "bool",
            Item::Int(_) => "int",
            Item::Float(_) => "float",
            Item::Str(_) => "string",
            Item::Bytes(_) => "bytes",
            Item::List(_) => "list",
            Item::Map(_) => "map",
        }
    }
}

impl From<bool> for Item {
    fn from(v: bool) -> Self {
        Item::Bool(v)
    }
}

impl From<i64> for Item {
    fn from(v: i64) -> Self {
        Item::Int(v)
    }
}

impl From<f64> for Item {
    fn from(v: f64) -> Self {
        Item::Float(v)
    }
}

impl From<&str> for Item {
    fn from(v: &str) -> Self {
        Item::Str(v.to_string())
    }
}

impl From<String> for Item {
    fn from(v: String) -> Self {
        Item::Str(v)
    }
}

impl From<Vec<Item>> for Item {
    fn from(v: Vec<Item>) -> Self {
        Item::List(v)
    }
}

impl From<Vec<u8>> for Item {
    fn from(v: Vec<u8>) -> Self {
        Item::Bytes(v)
    }
}
