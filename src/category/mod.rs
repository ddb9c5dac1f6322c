//! Category taxonomy model
//!
//! This module holds the raw category nodes produced by site parsers and the
//! resolved leaf categories that the harvester consumes:
//! - `CategoryNode`: one node of a site's category tree, keyed by its full path
//! - `LeafCategory`: a terminal category chain padded to the site's max depth
//! - Tree resolution (`resolver`) and live discovery (`discovery`)

mod discovery;
mod resolver;

pub use discovery::discover_categories;
pub use resolver::{assemble_from_parent_names, resolve, FlatCategory, Resolution};

use std::fmt;

/// A node of a site's category tree
///
/// Nodes reference their parent by the full sequence of ancestor names from
/// the root, so two sibling branches that share a child name never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    /// 1-based taxonomy level
    pub level: usize,

    /// Display name of the category
    pub name: String,

    /// Absolute link to the category page, if the site publishes one
    pub link: Option<String>,

    /// Names of the ancestors, root first; empty for level 1
    pub parent_path: Vec<String>,
}

impl CategoryNode {
    /// Creates a level-1 node
    pub fn root(name: impl Into<String>, link: Option<String>) -> Self {
        Self {
            level: 1,
            name: name.into(),
            link,
            parent_path: Vec::new(),
        }
    }

    /// Creates a node one level below `parent`
    pub fn child_of(parent: &CategoryNode, name: impl Into<String>, link: Option<String>) -> Self {
        Self {
            level: parent.level + 1,
            name: name.into(),
            link,
            parent_path: parent.path(),
        }
    }

    /// Name of the direct parent, if any
    pub fn parent_name(&self) -> Option<&str> {
        self.parent_path.last().map(String::as_str)
    }

    /// Full path of names from the root down to this node
    pub fn path(&self) -> Vec<String> {
        let mut path = self.parent_path.clone();
        path.push(self.name.clone());
        path
    }
}

/// One resolved level of a leaf chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLevel {
    pub name: String,
    pub link: Option<String>,
}

/// A terminal category that lists products
///
/// The chain always has exactly `max_depth` slots; levels below the leaf's
/// own depth are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCategory {
    pub chain: Vec<Option<CategoryLevel>>,
}

impl LeafCategory {
    /// Builds a leaf from its defined levels, padding to `max_depth`
    pub fn from_levels(levels: Vec<CategoryLevel>, max_depth: usize) -> Self {
        let mut chain: Vec<Option<CategoryLevel>> = levels.into_iter().map(Some).collect();
        while chain.len() < max_depth {
            chain.push(None);
        }
        Self { chain }
    }

    /// Number of defined levels
    pub fn depth(&self) -> usize {
        self.chain.iter().filter(|level| level.is_some()).count()
    }

    /// Defined levels, root first
    pub fn levels(&self) -> impl Iterator<Item = &CategoryLevel> {
        self.chain.iter().flatten()
    }

    /// Name of the deepest defined level
    pub fn canonical_name(&self) -> Option<&str> {
        self.chain
            .iter()
            .rev()
            .flatten()
            .map(|level| level.name.as_str())
            .next()
    }

    /// Link of the deepest level that carries one
    pub fn canonical_link(&self) -> Option<&str> {
        self.chain
            .iter()
            .rev()
            .flatten()
            .find_map(|level| level.link.as_deref())
    }

    /// Names of the defined levels, root first
    pub fn names(&self) -> Vec<String> {
        self.levels().map(|level| level.name.clone()).collect()
    }
}

impl fmt::Display for LeafCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        write!(f, "{}", names.join(" > "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(name: &str, link: Option<&str>) -> CategoryLevel {
        CategoryLevel {
            name: name.to_string(),
            link: link.map(str::to_string),
        }
    }

    #[test]
    fn test_child_path() {
        let root = CategoryNode::root("Software", None);
        let crm = CategoryNode::child_of(&root, "CRM", Some("https://x/crm".to_string()));
        assert_eq!(crm.level, 2);
        assert_eq!(crm.parent_name(), Some("Software"));
        assert_eq!(crm.path(), vec!["Software".to_string(), "CRM".to_string()]);
    }

    #[test]
    fn test_leaf_padding_and_depth() {
        let leaf = LeafCategory::from_levels(vec![level("A", None), level("B", Some("b"))], 4);
        assert_eq!(leaf.chain.len(), 4);
        assert_eq!(leaf.depth(), 2);
        assert_eq!(leaf.to_string(), "A > B");
    }

    #[test]
    fn test_canonical_link_skips_unlinked_deepest_level() {
        let leaf = LeafCategory::from_levels(
            vec![level("A", Some("a")), level("B", Some("b")), level("C", None)],
            4,
        );
        assert_eq!(leaf.canonical_name(), Some("C"));
        assert_eq!(leaf.canonical_link(), Some("b"));
    }
}
