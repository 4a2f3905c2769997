//! Branch Tree Builder.
//!
//! Pure, read-only functions over a record's flat node list:
//!
//! - [`find_current_path`] resolves the single root-to-leaf chain the player
//!   is on. Its last element (the anchor) is where the story continues.
//! - [`build_branch_tree`] nests revealed nodes under their parents for display
//!   and flags the nodes on the current path.
//!
//! Corrupt records never make these functions fail: orphans are dropped from
//! the tree, cycles stop the walk, and an empty list yields an empty path.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Choice, StoryNode};
use crate::value_objects::{ContentSource, NodeType};
use crate::NodeId;

/// Default number of characters of `original_content` kept in the tree view.
pub const DEFAULT_ORIGINAL_CONTENT_LIMIT: usize = 280;

// =============================================================================
// Current path
// =============================================================================

/// The root-to-leaf chain the player is currently on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentPath {
    chain: Vec<NodeId>,
}

impl CurrentPath {
    /// Node ids ordered from root to anchor.
    pub fn chain(&self) -> &[NodeId] {
        &self.chain
    }

    /// The leaf of the chain.
    pub fn anchor(&self) -> Option<NodeId> {
        self.chain.last().copied()
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.chain.contains(&node_id)
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }
}

/// Recency key: creation time, ties broken by insertion position.
fn recency(nodes: &[StoryNode], pos: usize) -> (DateTime<Utc>, usize) {
    (nodes[pos].created_at, pos)
}

/// Resolve the current path.
///
/// Only live nodes (revealed and not superseded) can be the leaf. The newest
/// live node carrying a selected choice is the selection anchor; from there the
/// path follows the selected choice's target, or else the newest live child,
/// until it runs out. Without any selection the newest live node is the leaf.
/// The chain is then rebuilt by walking `parent_id` up to a root.
pub fn find_current_path(nodes: &[StoryNode]) -> CurrentPath {
    let index: HashMap<NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(pos, node)| (node.id, pos))
        .collect();

    let mut live_children: HashMap<NodeId, Vec<usize>> = HashMap::new();
    for (pos, node) in nodes.iter().enumerate() {
        if let (Some(parent_id), true) = (node.parent_id, node.is_live()) {
            live_children.entry(parent_id).or_default().push(pos);
        }
    }

    let live = || (0..nodes.len()).filter(move |&pos| nodes[pos].is_live());

    let selection_anchor = live()
        .filter(|&pos| nodes[pos].has_selection())
        .max_by_key(|&pos| recency(nodes, pos));

    let leaf = match selection_anchor {
        Some(start) => descend(nodes, &index, &live_children, start),
        None => match live().max_by_key(|&pos| recency(nodes, pos)) {
            Some(pos) => pos,
            None => return CurrentPath::default(),
        },
    };

    let mut chain = vec![nodes[leaf].id];
    let mut seen: HashSet<usize> = HashSet::from([leaf]);
    let mut current = leaf;
    while let Some(parent_id) = nodes[current].parent_id {
        match index.get(&parent_id) {
            Some(&parent) if seen.insert(parent) => {
                chain.push(parent_id);
                current = parent;
            }
            // Orphan or cycle
            _ => break,
        }
    }
    chain.reverse();

    CurrentPath { chain }
}

fn descend(
    nodes: &[StoryNode],
    index: &HashMap<NodeId, usize>,
    live_children: &HashMap<NodeId, Vec<usize>>,
    start: usize,
) -> usize {
    let mut visited: HashSet<usize> = HashSet::new();
    let mut current = start;
    loop {
        visited.insert(current);
        let node = &nodes[current];

        let via_choice = node
            .selected_choice()
            .and_then(|choice| choice.next_node_id)
            .and_then(|next| index.get(&next).copied())
            .filter(|&pos| nodes[pos].is_live() && !visited.contains(&pos));

        let next = via_choice.or_else(|| {
            live_children.get(&node.id).and_then(|kids| {
                kids.iter()
                    .copied()
                    .filter(|pos| !visited.contains(pos))
                    .max_by_key(|&pos| recency(nodes, pos))
            })
        });

        match next {
            Some(pos) => current = pos,
            None => return current,
        }
    }
}

/// The node the story continues from.
pub fn current_leaf(nodes: &[StoryNode]) -> Option<&StoryNode> {
    let anchor = find_current_path(nodes).anchor()?;
    nodes.iter().find(|n| n.id == anchor)
}

/// Nodes on the current path, ordered root to leaf.
pub fn active_path_nodes(nodes: &[StoryNode]) -> Vec<&StoryNode> {
    let path = find_current_path(nodes);
    path.chain()
        .iter()
        .filter_map(|id| nodes.iter().find(|n| n.id == *id))
        .collect()
}

// =============================================================================
// Tree view
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchViewOptions {
    /// Truncate `original_content` to this many characters; `None` keeps it whole.
    pub original_content_limit: Option<usize>,
}

impl Default for BranchViewOptions {
    fn default() -> Self {
        Self {
            original_content_limit: Some(DEFAULT_ORIGINAL_CONTENT_LIMIT),
        }
    }
}

/// One node in the display tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchNode {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub title: String,
    pub content: String,
    pub original_content: String,
    pub source: ContentSource,
    pub created_at: DateTime<Utc>,
    pub choices: Vec<Choice>,
    /// On the current path
    pub is_active: bool,
    /// Last node of the current path
    pub is_anchor: bool,
    pub superseded: bool,
    pub children: Vec<BranchNode>,
}

/// Displayable tree of a record plus its current path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchView {
    pub roots: Vec<BranchNode>,
    pub current_path: Vec<NodeId>,
    pub anchor: Option<NodeId>,
}

impl BranchView {
    /// Ids flagged `is_active` anywhere in the tree.
    pub fn active_ids(&self) -> HashSet<NodeId> {
        let mut out = HashSet::new();
        let mut stack: Vec<&BranchNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            if node.is_active {
                out.insert(node.id);
            }
            stack.extend(node.children.iter());
        }
        out
    }

    /// The node flagged `is_anchor`, if any.
    pub fn anchor_in_tree(&self) -> Option<NodeId> {
        let mut stack: Vec<&BranchNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            if node.is_anchor {
                return Some(node.id);
            }
            stack.extend(node.children.iter());
        }
        None
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&BranchNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

pub fn build_branch_tree(nodes: &[StoryNode]) -> BranchView {
    build_branch_tree_with(nodes, BranchViewOptions::default())
}

pub fn build_branch_tree_with(nodes: &[StoryNode], options: BranchViewOptions) -> BranchView {
    let path = find_current_path(nodes);
    let known: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();

    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by_key(|&pos| recency(nodes, pos));

    let mut children: HashMap<NodeId, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for pos in order {
        let node = &nodes[pos];
        if !node.is_revealed {
            continue;
        }
        match node.parent_id {
            None => roots.push(pos),
            Some(parent_id) if known.contains(&parent_id) => {
                children.entry(parent_id).or_default().push(pos)
            }
            // Orphan: never attached
            Some(_) => {}
        }
    }

    let ctx = TreeContext {
        nodes,
        children: &children,
        path: &path,
        options,
    };
    let mut visited = HashSet::new();
    let roots = roots
        .into_iter()
        .filter_map(|pos| ctx.build(pos, &mut visited))
        .collect();

    BranchView {
        roots,
        anchor: path.anchor(),
        current_path: path.chain().to_vec(),
    }
}

struct TreeContext<'a> {
    nodes: &'a [StoryNode],
    children: &'a HashMap<NodeId, Vec<usize>>,
    path: &'a CurrentPath,
    options: BranchViewOptions,
}

impl TreeContext<'_> {
    fn build(&self, pos: usize, visited: &mut HashSet<usize>) -> Option<BranchNode> {
        if !visited.insert(pos) {
            return None;
        }
        let node = &self.nodes[pos];
        let children = self
            .children
            .get(&node.id)
            .map(|kids| {
                kids.iter()
                    .filter_map(|&kid| self.build(kid, visited))
                    .collect()
            })
            .unwrap_or_default();

        let is_active = !node.superseded && self.path.contains(node.id);
        Some(BranchNode {
            id: node.id,
            parent_id: node.parent_id,
            node_type: node.node_type,
            title: node.title.clone(),
            content: node.content.clone(),
            original_content: truncate_chars(
                &node.original_content,
                self.options.original_content_limit,
            ),
            source: node.source,
            created_at: node.created_at,
            choices: node.choices.clone(),
            is_active,
            is_anchor: is_active && self.path.anchor() == Some(node.id),
            superseded: node.superseded,
            children,
        })
    }
}

fn truncate_chars(text: &str, limit: Option<usize>) -> String {
    match limit {
        Some(limit) if text.chars().count() > limit => {
            let mut out: String = text.chars().take(limit).collect();
            out.push_str("...");
            out
        }
        _ => text.to_string(),
    }
}
