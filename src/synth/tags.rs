//! Global tag propagation.

use std::collections::BTreeMap;

use crate::stack::Stack;

/// Merges the context's global tags into every node.
///
/// Node-local tags win: a key the node already carries is left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagPropagator;

impl TagPropagator {
    /// Merge `global` into `local` without overriding existing keys.
    pub fn merge(local: &mut BTreeMap<String, String>, global: &BTreeMap<String, String>) {
        for (key, value) in global {
            local.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    /// Apply the stack's global tags to all of its nodes.
    pub fn apply(stack: &mut Stack) {
        let global = stack.context().global_tags().clone();
        if global.is_empty() {
            return;
        }

        let mut count = 0;
        for node in stack.nodes_mut() {
            Self::merge(node.tags_mut(), &global);
            count += 1;
        }
        tracing::debug!("Applied {} global tags to {} resources", global.len(), count);
    }
}
