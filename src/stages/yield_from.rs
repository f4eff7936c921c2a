//! Flatten ("yield-from") stage — the nested-cursor core of the engine.
//!
//! For each upstream item the stage invokes a user mapper that returns a
//! fresh sub-pipeline, then yields every item of that sub-pipeline before
//! pulling the next upstream item. Output order is the left-to-right
//! concatenation of the sub-pipeline outputs in upstream order.
//!
//! # Checkpointing
//!
//! The exported state does not contain the live sub-pipeline object. It
//! contains the upstream cursor (already advanced past the item whose
//! sub-pipeline is active), the retained value of that item, and the
//! sub-pipeline's own cursor tree. Restore re-invokes the mapper on the
//! retained item to reconstruct an equivalent sub-pipeline and imports the
//! nested cursor into it — O(1), no upstream replay.
//!
//! The mapper must therefore be a pure, deterministic function of its
//! input: the same item must always produce an equivalently composed
//! sub-pipeline. Behavior under an impure mapper is undefined.

use crate::error::{PipelineError, PipelineResult};
use crate::item::Item;
use crate::pipeline::Pipeline;
use crate::stage::AnyStage;
use crate::state::StateNode;
use std::collections::BTreeMap;

/// User-supplied mapper producing a sub-pipeline for an upstream item.
pub type YieldFromFn = Box<dyn Fn(&Item) -> PipelineResult<Pipeline> + Send>;

/// Expands each upstream item into a nested sub-pipeline and exhausts it
/// before advancing.
pub struct YieldFromStage {
    upstream: Box<AnyStage>,
    mapper: YieldFromFn,
    /// Upstream item whose sub-pipeline is active. Retained so restore can
    /// re-derive the sub-pipeline without replaying upstream.
    current: Option<Item>,
    /// The sub-pipeline currently being exhausted.
    active: Option<Box<Pipeline>>,
}

impl YieldFromStage {
    pub fn new(upstream: AnyStage, mapper: YieldFromFn) -> Self {
        Self {
            upstream: Box::new(upstream),
            mapper,
            current: None,
            active: None,
        }
    }

    pub fn name(&self) -> &'static str {
        "yield_from"
    }

    pub fn pull(&mut self) -> PipelineResult<Option<Item>> {
        // Loop rather than recurse so a mapper returning an empty
        // sub-pipeline just advances to the next upstream item.
        loop {
            if let Some(active) = self.active.as_mut() {
                match active.pull()? {
                    Some(item) => return Ok(Some(item)),
                    None => {
                        self.active = None;
                        self.current = None;
                    }
                }
            }

            match self.upstream.pull()? {
                Some(item) => {
                    let sub = self.derive(&item)?;
                    self.current = Some(item);
                    self.active = Some(Box::new(sub));
                }
                None => return Ok(None),
            }
        }
    }

    pub fn reset(&mut self) {
        self.active = None;
        self.current = None;
        self.upstream.reset();
    }

    pub fn export_state(&self) -> StateNode {
        let mut tree = BTreeMap::new();
        tree.insert("upstream".to_string(), self.upstream.export_state());
        // Both fields absent means "no sub-pipeline active" — distinct from
        // a sub-pipeline active at position 0.
        if let (Some(item), Some(active)) = (&self.current, &self.active) {
            tree.insert("item".to_string(), StateNode::Item(item.clone()));
            tree.insert("active".to_string(), active.export_node());
            tree.insert(
                "topology".to_string(),
                StateNode::Tag(active.topology().to_string()),
            );
        }
        StateNode::Tree(tree)
    }

    pub fn import_state(&mut self, state: &StateNode) -> PipelineResult<()> {
        let tree = state.expect_tree(self.name())?;

        self.active = None;
        self.current = None;

        let upstream = StateNode::expect_child(tree, self.name(), "upstream")?;
        self.upstream.import_state(upstream)?;

        if let Some(item_node) = tree.get("item") {
            let item = item_node.expect_item(self.name())?.clone();
            let active_node = StateNode::expect_child(tree, self.name(), "active")?;

            let mut sub = self.derive(&item)?;
            if let Some(node) = tree.get("topology") {
                let topology = node.expect_tag(self.name())?;
                if topology != sub.topology() {
                    return Err(PipelineError::incompatible(format!(
                        "mapper rebuilt sub-pipeline '{}' but state was exported from '{}'",
                        sub.topology(),
                        topology
                    )));
                }
            }
            sub.import_node(active_node)?;

            self.current = Some(item);
            self.active = Some(Box::new(sub));
        }

        Ok(())
    }

    /// Invoke the mapper. A mapper failure is not retryable — the upstream
    /// item is already consumed, so the cursor cannot be re-established.
    fn derive(&self, item: &Item) -> PipelineResult<Pipeline> {
        (self.mapper)(item).map_err(|e| {
            PipelineError::InvalidPipeline(format!("yield-from mapper failed: {e}"))
        })
    }
}
