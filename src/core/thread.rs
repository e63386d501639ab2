//! # Reply Tree Builder
//!
//! Converts the flat, parent-referencing message list into a forest of
//! [`MessageNode`] trees for threaded rendering. Pure and O(n): the id
//! lookup is built over the whole slice before any linking, so the result
//! does not depend on whether a child precedes its parent in the sequence.
//!
//! Tolerated irregularities:
//! - a `parent_id` that resolves to no message makes the message a root;
//! - a message that names itself as parent is treated as a root;
//! - a `parent_id` cycle leaves its members unreachable from any root, so
//!   the builder promotes one member per cycle to a root (with a warning)
//!   rather than dropping them — traversal of the output always terminates.

use std::collections::HashMap;

use log::warn;

use crate::core::message::{Message, MessageNode};

/// Builds the reply forest from the flat message sequence.
///
/// Every message appears exactly once in the output: as a root, or as a
/// child of the message its `parent_id` resolves to. Sibling order and
/// root order follow the original sequence order. Deterministic, so
/// building twice from the same input yields structurally equal forests.
pub fn build_message_tree(messages: &[Message]) -> Vec<MessageNode> {
    let index_of: HashMap<&str, usize> = messages
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id.as_str(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); messages.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (i, message) in messages.iter().enumerate() {
        match message
            .parent_id
            .as_deref()
            .and_then(|p| index_of.get(p).copied())
        {
            Some(parent) if parent != i => children[parent].push(i),
            // Dangling or self-referencing parent: treat as a root.
            _ => roots.push(i),
        }
    }

    let mut placed = vec![false; messages.len()];
    let mut forest: Vec<MessageNode> = roots
        .iter()
        .map(|&i| materialize(i, messages, &children, &mut placed))
        .collect();

    // Anything still unplaced sits on a parent cycle (every acyclic chain
    // ends at a root). Promote the first unplaced member; the rest of its
    // cycle hangs off it through the normal child links.
    for i in 0..messages.len() {
        if !placed[i] {
            warn!(
                "message {} is part of a parent cycle; promoting to root",
                messages[i].id
            );
            forest.push(materialize(i, messages, &children, &mut placed));
        }
    }

    forest
}

fn materialize(
    index: usize,
    messages: &[Message],
    children: &[Vec<usize>],
    placed: &mut [bool],
) -> MessageNode {
    placed[index] = true;
    let mut node = MessageNode {
        message: messages[index].clone(),
        children: Vec::new(),
    };
    for &child in &children[index] {
        if !placed[child] {
            node.children.push(materialize(child, messages, children, placed));
        }
    }
    node
}
