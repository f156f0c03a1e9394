use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::builders::patterns::{FileGlob, PatternMatcher};
use crate::core::policy::{NodeId, PolicyNode};

/// Owns every `PolicyNode` of a generation run and indexes them by
/// directory path.
///
/// Paths are forward-slash separated and relative to the repository root;
/// the empty string is the root itself. Nodes refer to their parent by
/// `NodeId`, so the tree never holds references into itself.
#[derive(Debug, Clone)]
pub struct PolicyTree {
    nodes: Vec<PolicyNode>,
    by_path: HashMap<String, NodeId>,
}

/// Containing directory of a path; `""` when it has none.
pub fn parent_dir(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    }
}

/// Turns a path such as `./src/`, `/src`, `.` or `src\app` into the
/// repository-relative, forward-slash separated form the tree is keyed by.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

impl PolicyTree {
    /// Creates a tree holding only the root policy, registered under `""`.
    ///
    /// The root is never removed, so `nodes` is never empty.
    pub fn new(repo_root: impl Into<String>) -> Self {
        let root = PolicyNode::root(repo_root);
        let mut by_path = HashMap::new();
        by_path.insert(String::new(), NodeId(0));
        Self {
            nodes: vec![root],
            by_path,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Derives the policy of `child_path` from `parent`.
    ///
    /// The new node is not registered under its path; call [`set`](Self::set)
    /// once its directives have been applied. Returns `None` when `parent`
    /// does not belong to this tree.
    pub fn derive_child(
        &mut self,
        parent: NodeId,
        child_path: impl Into<String>,
    ) -> Option<NodeId> {
        let child = self.node(parent)?.child(parent, child_path);
        let id = NodeId(self.nodes.len());
        self.nodes.push(child);
        Some(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&PolicyNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut PolicyNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn set(&mut self, path: impl Into<String>, id: NodeId) {
        self.by_path.insert(path.into(), id);
    }

    pub fn get(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    /// Looks up the policy of the directory containing `path`. The root's
    /// containing directory is the root itself.
    ///
    /// Returns `None` when that directory was never registered; walking the
    /// tree top-down is the caller's job.
    pub fn parent_for(&self, path: &str) -> Option<NodeId> {
        self.get(parent_dir(path))
    }

    /// Registered directory paths, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.by_path.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks from `id` up to the root, `id` first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// A file is excluded when any exclusion declared by the node or one of
    /// its ancestors matches it. A foreign `id` excludes nothing.
    pub fn is_file_excluded(&self, id: NodeId, file_path: &str) -> bool {
        self.ancestors(id)
            .any(|node| node.excludes_locally(file_path))
    }

    /// An import is ignored when the node or one of its ancestors ignores it.
    pub fn is_dependency_ignored(&self, id: NodeId, import: &str) -> bool {
        self.ancestors(id).any(|node| node.ignores_locally(import))
    }

    pub fn policy(&self, id: NodeId) -> Option<Policy<'_>> {
        let node = self.node(id)?;
        Some(Policy {
            tree: self,
            id,
            node,
        })
    }

    pub fn root_policy(&self) -> Policy<'_> {
        // Pushed by `new`, never removed.
        Policy {
            tree: self,
            id: NodeId(0),
            node: &self.nodes[0],
        }
    }
}

pub struct Ancestors<'a> {
    tree: &'a PolicyTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a PolicyNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.node(self.next?)?;
        self.next = node.parent();
        Some(node)
    }
}

/// A node seen together with its ancestors: the effective policy of one
/// directory.
#[derive(Clone, Copy)]
pub struct Policy<'a> {
    tree: &'a PolicyTree,
    id: NodeId,
    node: &'a PolicyNode,
}

impl<'a> Policy<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a PolicyNode {
        self.node
    }

    pub fn is_file_excluded(&self, file_path: &str) -> bool {
        self.tree.is_file_excluded(self.id, file_path)
    }

    pub fn is_dependency_ignored(&self, import: &str) -> bool {
        self.tree.is_dependency_ignored(self.id, import)
    }

    pub fn is_source_file(&self, file_path: &str) -> bool {
        self.node().is_source_file(file_path)
    }

    pub fn is_test_file(&self, file_path: &str) -> bool {
        self.node().is_test_file(file_path)
    }

    /// Every exclusion in force here, inherited ones included, deduplicated.
    pub fn excluded_patterns(&self) -> Vec<&'a FileGlob> {
        let mut patterns: BTreeMap<&'a str, &'a FileGlob> = BTreeMap::new();
        for node in self.tree.ancestors(self.id) {
            for glob in node.local_excluded_patterns() {
                patterns.entry(glob.as_str()).or_insert(glob);
            }
        }
        patterns.into_values().collect()
    }

    /// Every ignored import in force here, inherited ones included.
    pub fn ignored_imports(&self) -> BTreeSet<&'a str> {
        self.tree
            .ancestors(self.id)
            .flat_map(|node| node.local_ignored_imports())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Derives and registers `path` under its already registered parent.
    fn add(tree: &mut PolicyTree, path: &str) -> NodeId {
        let parent = tree.parent_for(path).unwrap();
        let id = tree.derive_child(parent, path).unwrap();
        tree.set(path, id);
        id
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("a/b/c"), "a/b");
        assert_eq!(parent_dir("a"), "");
        assert_eq!(parent_dir(""), "");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./src/app/"), "src/app");
        assert_eq!(normalize_path("/legacy/sub"), "legacy/sub");
        assert_eq!(normalize_path("."), "");
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path("src\\app//x.ts"), "src/app/x.ts");
    }

    #[test]
    fn test_parent_for() {
        let mut tree = PolicyTree::new("/repo");
        assert_eq!(tree.parent_for(""), Some(tree.root()));
        assert_eq!(tree.parent_for("a"), Some(tree.root()));
        assert_eq!(tree.parent_for("a/b"), None);

        let a = add(&mut tree, "a");
        assert_eq!(tree.parent_for("a/b"), Some(a));
        assert_eq!(tree.get("a"), Some(a));
        assert_eq!(tree.get("missing"), None);
    }

    #[test]
    fn test_derived_node_is_not_registered() {
        let mut tree = PolicyTree::new("/repo");
        let root = tree.root();
        let id = tree.derive_child(root, "x").unwrap();
        assert_eq!(tree.get("x"), None);
        assert_eq!(tree.node(id).unwrap().parent(), Some(root));
        assert_eq!(tree.node(id).unwrap().config_dir(), "x");
    }

    #[test]
    fn test_foreign_node_id_is_rejected() {
        let mut big = PolicyTree::new("/big");
        add(&mut big, "a");
        let foreign = add(&mut big, "a/b");

        let mut small = PolicyTree::new("/small");
        assert!(small.node(foreign).is_none());
        assert!(small.node_mut(foreign).is_none());
        assert!(small.policy(foreign).is_none());
        assert!(small.derive_child(foreign, "x").is_none());
        assert_eq!(small.len(), 1);
        assert_eq!(small.ancestors(foreign).count(), 0);
        assert!(!small.is_file_excluded(foreign, "x.ts"));
        assert!(!small.is_dependency_ignored(foreign, "fs"));
    }

    #[test]
    fn test_copy_down_is_a_snapshot() {
        let mut tree = PolicyTree::new("/repo");
        let root = tree.root();
        tree.node_mut(root).unwrap().set_library_naming_convention("$package_name$_lib");
        let child = add(&mut tree, "a");

        assert_eq!(tree.node(child).unwrap().render_library_name("a"), "a_lib");

        let parent = tree.node_mut(root).unwrap();
        parent.set_library_naming_convention("changed");
        parent.set_generation_enabled(false);
        parent.set_validate_import_statements(false);
        parent.set_source_glob("");
        parent.set_test_glob("");

        let child = tree.node(child).unwrap();
        assert_eq!(child.render_library_name("a"), "a_lib");
        assert!(child.generation_enabled());
        assert!(child.validate_import_statements());
        assert!(child.is_test_file("a/x.test.ts"));
        assert_eq!(child.repo_root(), "/repo");
    }

    #[test]
    fn test_late_parent_exclusion_reaches_child() {
        let mut tree = PolicyTree::new("/repo");
        let a = add(&mut tree, "a");
        let b = add(&mut tree, "a/b");
        assert!(!tree.is_file_excluded(b, "a/b/gen.ts"));

        tree.node_mut(a).unwrap().add_excluded_pattern("**/gen.ts");
        assert!(tree.is_file_excluded(b, "a/b/gen.ts"));
        assert!(tree.is_file_excluded(a, "a/gen.ts"));
    }

    #[test]
    fn test_child_exclusion_does_not_reach_parent() {
        let mut tree = PolicyTree::new("/repo");
        let a = add(&mut tree, "a");
        let sibling = add(&mut tree, "c");
        let b = add(&mut tree, "a/b");

        tree.node_mut(b).unwrap().add_excluded_pattern("**/*.ts");
        assert!(tree.is_file_excluded(b, "a/b/x.ts"));
        assert!(!tree.is_file_excluded(a, "a/b/x.ts"));
        assert!(!tree.is_file_excluded(sibling, "c/x.ts"));
        assert!(!tree.is_file_excluded(tree.root(), "x.ts"));
    }

    #[test]
    fn test_ignored_import_chain_lookup() {
        let mut tree = PolicyTree::new("/repo");
        let a = add(&mut tree, "a");
        let b = add(&mut tree, "a/b");
        let c = add(&mut tree, "c");

        tree.node_mut(a).unwrap().add_ignored_import("left-pad");

        assert!(tree.is_dependency_ignored(a, "left-pad"));
        assert!(tree.is_dependency_ignored(b, "left-pad"));
        assert!(!tree.is_dependency_ignored(c, "left-pad"));
        assert!(!tree.is_dependency_ignored(tree.root(), "left-pad"));
        assert!(!tree.is_dependency_ignored(b, "right-pad"));
    }

    #[test]
    fn test_policy_view_collects_inherited_values() {
        let mut tree = PolicyTree::new("/repo");
        let root = tree.root();
        tree.node_mut(root).unwrap().add_excluded_pattern("**/dist/**");
        tree.node_mut(root).unwrap().add_ignored_import("fs");
        let a = add(&mut tree, "a");
        tree.node_mut(a).unwrap().add_excluded_pattern("**/*.gen.ts");
        tree.node_mut(a).unwrap().add_excluded_pattern("**/dist/**");
        tree.node_mut(a).unwrap().add_ignored_import("path");

        let policy = tree.policy(a).unwrap();
        assert_eq!(policy.id(), a);
        let patterns: Vec<&str> = policy
            .excluded_patterns()
            .into_iter()
            .map(FileGlob::as_str)
            .collect();
        assert_eq!(patterns, vec!["**/*.gen.ts", "**/dist/**"]);
        assert_eq!(
            policy.ignored_imports().into_iter().collect::<Vec<_>>(),
            vec!["fs", "path"]
        );
        assert!(policy.is_file_excluded("a/dist/index.js"));
        assert!(policy.is_source_file("a/index.ts"));
    }

    #[test]
    fn test_ancestors_order() {
        let mut tree = PolicyTree::new("/repo");
        add(&mut tree, "a");
        let b = add(&mut tree, "a/b");
        let dirs: Vec<&str> = tree.ancestors(b).map(PolicyNode::config_dir).collect();
        assert_eq!(dirs, vec!["a/b", "a", ""]);
    }
}
