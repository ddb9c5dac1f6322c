//! Category tree leaf resolution
//!
//! Turns a flat snapshot of category nodes into the ordered set of leaf
//! categories that actually list products.
//!
//! # Rules
//!
//! - A node is internal when some node one level deeper names its full path
//!   as parent path; every other node is a leaf
//! - A leaf's chain is rebuilt from its ancestors, padded to the max depth
//! - The canonical link is the deepest non-null link of the chain
//! - Leaves are deduplicated by canonical link, first occurrence wins
//! - Output order follows first appearance in the input snapshot

use crate::category::{CategoryLevel, CategoryNode, LeafCategory};
use crate::ResolutionError;
use std::collections::{HashMap, HashSet};

/// Outcome of resolving one category snapshot
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Leaf categories in snapshot order, deduplicated by canonical link
    pub leaves: Vec<LeafCategory>,

    /// Distinct nodes (by full path) in the snapshot
    pub node_count: usize,

    /// Nodes that are the parent of at least one other node
    pub internal_count: usize,

    /// Nodes with no children, before link deduplication
    pub leaf_node_count: usize,

    /// Leaves dropped because an earlier leaf had the same canonical link
    pub duplicate_links: usize,

    /// Leaves dropped because no level of their chain carries a link
    pub unlinked: usize,
}

/// A category row as published by sites that only name the parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatCategory {
    pub name: String,
    pub link: Option<String>,
    pub parent: Option<String>,
}

/// Resolves a category snapshot into its leaf categories
///
/// # Arguments
///
/// * `nodes` - Category nodes of every level, in the order the site lists them
/// * `max_depth` - Maximum taxonomy depth of the site
///
/// # Returns
///
/// * `Ok(Resolution)` - Leaves and node counts
/// * `Err(ResolutionError)` - The snapshot is malformed; harvesting must not start
pub fn resolve(nodes: &[CategoryNode], max_depth: usize) -> Result<Resolution, ResolutionError> {
    let mut by_path: HashMap<Vec<String>, &CategoryNode> = HashMap::new();
    let mut ordered: Vec<&CategoryNode> = Vec::new();

    for node in nodes {
        if node.level == 0 || node.level > max_depth {
            return Err(ResolutionError::LevelOutOfRange {
                name: node.name.clone(),
                level: node.level,
                max_depth,
            });
        }

        if node.parent_path.len() != node.level - 1 {
            return Err(ResolutionError::Malformed {
                name: node.name.clone(),
                message: format!(
                    "level {} node has {} ancestors",
                    node.level,
                    node.parent_path.len()
                ),
            });
        }

        let path = node.path();
        if !by_path.contains_key(&path) {
            by_path.insert(path, node);
            ordered.push(node);
        }
    }

    for node in &ordered {
        if node.level > 1 && !by_path.contains_key(&node.parent_path) {
            return Err(ResolutionError::Orphan {
                path: node.path().join(" > "),
            });
        }
    }

    // Parent paths referenced by each level L+1, i.e. the internal nodes of level L
    let mut internal: HashSet<Vec<String>> = HashSet::new();
    for level in 1..max_depth {
        internal.extend(
            ordered
                .iter()
                .filter(|node| node.level == level + 1)
                .map(|node| node.parent_path.clone()),
        );
    }

    let mut leaves = Vec::new();
    let mut seen_links: HashSet<String> = HashSet::new();
    let mut leaf_node_count = 0;
    let mut duplicate_links = 0;
    let mut unlinked = 0;

    for node in &ordered {
        let path = node.path();
        if internal.contains(&path) {
            continue;
        }
        leaf_node_count += 1;

        let levels = (1..=path.len())
            .map(|end| {
                let ancestor = by_path.get(&path[..end]).copied().unwrap_or(*node);
                CategoryLevel {
                    name: ancestor.name.clone(),
                    link: ancestor.link.clone(),
                }
            })
            .collect();
        let leaf = LeafCategory::from_levels(levels, max_depth);

        match leaf.canonical_link().map(str::to_string) {
            Some(link) => {
                if seen_links.insert(link.clone()) {
                    leaves.push(leaf);
                } else {
                    tracing::debug!("Dropping duplicate leaf {} ({})", leaf, link);
                    duplicate_links += 1;
                }
            }
            None => {
                tracing::warn!("Leaf category {} has no link at any level, skipping", leaf);
                unlinked += 1;
            }
        }
    }

    Ok(Resolution {
        leaves,
        node_count: ordered.len(),
        internal_count: ordered.len() - leaf_node_count,
        leaf_node_count,
        duplicate_links,
        unlinked,
    })
}

/// Builds full-path nodes from rows that only name their parent
///
/// Parent names are looked up within the given rows; walking upward stops at
/// the `root` name or at a name with no known parent. Meeting a name twice on
/// one walk is a cycle; a walk that ends below `max_depth` is out of range.
///
/// # Arguments
///
/// * `root` - The top-level category the rows belong to, if the site names one
/// * `rows` - Category rows in site order
/// * `max_depth` - Maximum taxonomy depth of the site
pub fn assemble_from_parent_names(
    root: Option<&CategoryLevel>,
    rows: &[FlatCategory],
    max_depth: usize,
) -> Result<Vec<CategoryNode>, ResolutionError> {
    let parents: HashMap<&str, Option<&str>> = rows
        .iter()
        .map(|row| (row.name.as_str(), row.parent.as_deref()))
        .collect();
    let root_name = root.map(|level| level.name.as_str());
    let reserved_levels = usize::from(root.is_some());

    let mut nodes = Vec::with_capacity(rows.len() + 1);
    if let Some(root) = root {
        nodes.push(CategoryNode::root(root.name.clone(), root.link.clone()));
    }

    for row in rows {
        if Some(row.name.as_str()) == root_name {
            continue;
        }

        let mut ancestors: Vec<String> = Vec::new();
        let mut visited: HashSet<&str> = HashSet::from([row.name.as_str()]);
        let mut current = row.parent.as_deref();
        while let Some(name) = current {
            if Some(name) == root_name || !parents.contains_key(name) {
                break;
            }
            if !visited.insert(name) {
                return Err(ResolutionError::Cycle {
                    name: row.name.clone(),
                });
            }
            ancestors.push(name.to_string());
            current = parents.get(name).copied().flatten();
        }

        let level = ancestors.len() + reserved_levels + 1;
        if level > max_depth {
            return Err(ResolutionError::LevelOutOfRange {
                name: row.name.clone(),
                level,
                max_depth,
            });
        }

        let mut parent_path: Vec<String> = root_name.map(str::to_string).into_iter().collect();
        parent_path.extend(ancestors.into_iter().rev());

        nodes.push(CategoryNode {
            level: parent_path.len() + 1,
            name: row.name.clone(),
            link: row.link.clone(),
            parent_path,
        });
    }

    Ok(nodes)
}
