//! Resumable position state for pipelines and stages.
//!
//! A running pipeline's cursor — including the position inside an active
//! nested sub-pipeline — is exported as a [`StateNode`] tree of scalar
//! position fields, retained items, and named children. The tree is
//! wrapped in a [`PipelineState`] envelope carrying a format version and
//! the pipeline's topology fingerprint, so a blob persisted from one
//! pipeline cannot be imported into a different topology or an
//! incompatible engine version without failing fast.
//!
//! Restoring from a `StateNode` is O(1): no consumed item is replayed.

use crate::error::{PipelineError, PipelineResult};
use crate::item::Item;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format version stamped into every exported [`PipelineState`].
/// Bumped whenever the state tree layout changes incompatibly.
pub const STATE_VERSION: u32 = 1;

/// One node of the resumable cursor tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateNode {
    /// Scalar index cursor (e.g. a source's next-item index).
    Index(u64),
    /// Signed counter cursor (e.g. an unbounded count source).
    Counter(i64),
    /// Free-form tag, e.g. a nested sub-pipeline's topology fingerprint.
    Tag(String),
    /// A retained item value (the flatten stage's active upstream item).
    Item(Item),
    /// Named child nodes for stages with more than one position field.
    Tree(BTreeMap<String, StateNode>),
}

impl StateNode {
    /// Build a tree node from key/child pairs.
    pub fn tree<const N: usize>(children: [(&str, StateNode); N]) -> Self {
        StateNode::Tree(
            children
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    pub fn as_index(&self) -> Option<u64> {
        match self {
            StateNode::Index(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_counter(&self) -> Option<i64> {
        match self {
            StateNode::Counter(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&str> {
        match self {
            StateNode::Tag(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            StateNode::Item(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&BTreeMap<String, StateNode>> {
        match self {
            StateNode::Tree(v) => Some(v),
            _ => None,
        }
    }

    // Shape-checked accessors used by stage imports. A wrong node kind
    // means the blob was produced by a different stage arrangement, so
    // these report `IncompatibleState` rather than `InvalidState`.

    pub(crate) fn expect_index(&self, stage: &str) -> PipelineResult<u64> {
        self.as_index().ok_or_else(|| {
            PipelineError::incompatible(format!("stage '{stage}' expects an index cursor"))
        })
    }

    pub(crate) fn expect_counter(&self, stage: &str) -> PipelineResult<i64> {
        self.as_counter().ok_or_else(|| {
            PipelineError::incompatible(format!("stage '{stage}' expects a counter cursor"))
        })
    }

    pub(crate) fn expect_tag(&self, stage: &str) -> PipelineResult<&str> {
        self.as_tag().ok_or_else(|| {
            PipelineError::incompatible(format!("stage '{stage}' expects a topology tag"))
        })
    }

    pub(crate) fn expect_item(&self, stage: &str) -> PipelineResult<&Item> {
        self.as_item().ok_or_else(|| {
            PipelineError::incompatible(format!("stage '{stage}' expects a retained item"))
        })
    }

    pub(crate) fn expect_tree(&self, stage: &str) -> PipelineResult<&BTreeMap<String, StateNode>> {
        self.as_tree().ok_or_else(|| {
            PipelineError::incompatible(format!("stage '{stage}' expects a state tree"))
        })
    }

    pub(crate) fn expect_child<'a>(
        tree: &'a BTreeMap<String, StateNode>,
        stage: &str,
        name: &str,
    ) -> PipelineResult<&'a StateNode> {
        tree.get(name).ok_or_else(|| {
            PipelineError::incompatible(format!("stage '{stage}' state is missing '{name}'"))
        })
    }
}

/// Versioned, topology-tagged envelope around a pipeline's cursor tree.
///
/// This is the unit of persistence: serialize it with [`to_json`]
/// (or any serde format), store it, and feed it back through
/// [`from_json`] and `Pipeline::import_state` to resume.
///
/// [`to_json`]: PipelineState::to_json
/// [`from_json`]: PipelineState::from_json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    version: u32,
    topology: String,
    root: StateNode,
}

impl PipelineState {
    pub(crate) fn new(topology: String, root: StateNode) -> Self {
        Self {
            version: STATE_VERSION,
            topology,
            root,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Fingerprint of the pipeline this state was exported from.
    pub fn topology(&self) -> &str {
        &self.topology
    }

    pub(crate) fn root(&self) -> &StateNode {
        &self.root
    }

    /// Serialize to a JSON document.
    pub fn to_json(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from a JSON document, rejecting blobs written by an
    /// incompatible engine version.
    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let state: PipelineState = serde_json::from_str(json)?;
        if state.version != STATE_VERSION {
            return Err(PipelineError::incompatible(format!(
                "state format version {} does not match engine version {STATE_VERSION}",
                state.version
            )));
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_node_accessors() {
        assert_eq!(StateNode::Index(4).as_index(), Some(4));
        assert_eq!(StateNode::Counter(-2).as_counter(), Some(-2));
        assert_eq!(StateNode::Tag("a/b".into()).as_tag(), Some("a/b"));
        assert_eq!(StateNode::Index(4).as_counter(), None);

        let node = StateNode::Item(Item::Int(7));
        assert_eq!(node.as_item().unwrap().as_int(), Some(7));
    }

    #[test]
    fn test_tree_builder() {
        let node = StateNode::tree([
            ("upstream", StateNode::Index(2)),
            ("taken", StateNode::Index(1)),
        ]);
        let tree = node.as_tree().unwrap();
        assert_eq!(tree.get("upstream").unwrap().as_index(), Some(2));
        assert_eq!(tree.get("taken").unwrap().as_index(), Some(1));
    }

    #[test]
    fn test_expect_reports_incompatible() {
        let err = StateNode::Index(0).expect_tree("yield_from").unwrap_err();
        assert!(matches!(err, PipelineError::IncompatibleState(_)));

        let tree = BTreeMap::new();
        let err = StateNode::expect_child(&tree, "yield_from", "upstream").unwrap_err();
        assert!(matches!(err, PipelineError::IncompatibleState(_)));
    }

    #[test]
    fn test_envelope_round_trip() {
        let state = PipelineState::new(
            "sequence/yield_from".to_string(),
            StateNode::tree([
                ("upstream", StateNode::Index(1)),
                ("item", StateNode::Item(Item::List(vec![Item::Int(1), Item::Int(5)]))),
                ("active", StateNode::Index(2)),
            ]),
        );

        let json = state.to_json().unwrap();
        let back = PipelineState::from_json(&json).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.version(), STATE_VERSION);
        assert_eq!(back.topology(), "sequence/yield_from");
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let state = PipelineState::new("sequence".to_string(), StateNode::Index(0));
        let json = state.to_json().unwrap();

        // Rewrite the version field to simulate a blob from a future engine.
        let mut doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        doc["version"] = serde_json::json!(99);
        let tampered = serde_json::to_string(&doc).unwrap();

        let err = PipelineState::from_json(&tampered).unwrap_err();
        assert!(matches!(err, PipelineError::IncompatibleState(_)));
    }

    #[test]
    fn test_garbage_blob_is_codec_error() {
        let err = PipelineState::from_json("{not json").unwrap_err();
        assert!(matches!(err, PipelineError::Codec(_)));
    }
}
