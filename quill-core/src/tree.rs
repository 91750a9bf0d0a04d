//! Rose tree used to render the group structure of a recorded case.

use crate::bits::{Group, Recording};

pub mod render;

/// Words of a group shown before the rest are summarised.
const SHOWN_WORDS: usize = 6;

/// A rose tree of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree<T> {
    pub value: T,
    pub children: Vec<Tree<T>>,
}

impl<T> Tree<T> {
    /// Create a new tree with the given value and no children.
    pub fn singleton(value: T) -> Self {
        Tree {
            value,
            children: Vec::new(),
        }
    }

    /// Create a new tree with the given value and children.
    pub fn with_children(value: T, children: Vec<Tree<T>>) -> Self {
        Tree { value, children }
    }

    /// Count the total number of nodes in the tree.
    pub fn count_nodes(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| child.count_nodes())
            .sum::<usize>()
    }

    /// Get the depth of the tree.
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| child.depth())
            .max()
            .unwrap_or(0)
    }
}

impl Tree<String> {
    /// Generator and element groups of `recording`, nested as they were drawn.
    ///
    /// Internal groups (coins, retries, bit widths) are folded into their
    /// nearest generator group.
    pub fn from_recording(recording: &Recording) -> Self {
        Tree::with_children("case".to_string(), standalone_children(recording, None))
    }
}

fn standalone_children(recording: &Recording, parent: Option<usize>) -> Vec<Tree<String>> {
    let mut trees = Vec::new();
    for (index, group) in recording.children(parent) {
        let children = standalone_children(recording, Some(index));
        if group.standalone {
            trees.push(Tree::with_children(describe(group, &recording.data), children));
        } else {
            trees.extend(children);
        }
    }
    trees
}

fn describe(group: &Group, data: &[u64]) -> String {
    let (begin, end) = group.span().unwrap_or((group.begin, group.begin));
    let words = &data[begin..end];
    let mut text = if words.len() > SHOWN_WORDS {
        format!(
            "{} {:?} … +{}",
            group.label,
            &words[..SHOWN_WORDS],
            words.len() - SHOWN_WORDS
        )
    } else {
        format!("{} {:?}", group.label, words)
    };
    if group.discard {
        text.push_str(" (discarded)");
    }
    text
}
