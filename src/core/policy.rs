use std::collections::{BTreeMap, BTreeSet};

use crate::builders::patterns::{
    FileGlob, PatternMatcher, default_srcs_glob, default_tests_glob, is_source_file_type,
};

/// Placeholder substituted with the package name when rendering target names.
pub const PACKAGE_NAME_PLACEHOLDER: &str = "$package_name$";

/// Identifies a node inside a [`PolicyTree`](crate::core::registry::PolicyTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// The code-generation policy of a single directory.
///
/// Scalar settings are copied into a child when it is derived, so later
/// changes to the parent never reach an existing child. Exclusions and
/// ignored imports only hold what this directory itself declared; the tree
/// resolves them against every ancestor at query time.
#[derive(Debug, Clone)]
pub struct PolicyNode {
    parent: Option<NodeId>,

    generation_enabled: bool,
    repo_root: String,
    config_dir: String,

    excluded_patterns: BTreeMap<String, FileGlob>,
    ignore_dependencies: BTreeSet<String>,
    validate_import_statements: bool,
    library_naming_convention: String,
    tests_naming_convention: String,
    srcs_file_glob: FileGlob,
    tests_file_glob: FileGlob,
}

impl PolicyNode {
    /// Creates the policy for the root of the tree with every default in place.
    pub fn root(repo_root: impl Into<String>) -> Self {
        Self {
            parent: None,
            generation_enabled: true,
            repo_root: repo_root.into(),
            config_dir: String::new(),
            excluded_patterns: BTreeMap::new(),
            ignore_dependencies: BTreeSet::new(),
            validate_import_statements: true,
            library_naming_convention: PACKAGE_NAME_PLACEHOLDER.to_string(),
            tests_naming_convention: format!("{PACKAGE_NAME_PLACEHOLDER}_tests"),
            srcs_file_glob: FileGlob::new(default_srcs_glob()),
            tests_file_glob: FileGlob::new(default_tests_glob()),
        }
    }

    /// Builds the policy of a child directory. Scalars are copied; the
    /// additive collections start empty.
    pub(crate) fn child(&self, parent: NodeId, child_path: impl Into<String>) -> Self {
        Self {
            parent: Some(parent),
            generation_enabled: self.generation_enabled,
            repo_root: self.repo_root.clone(),
            config_dir: child_path.into(),
            excluded_patterns: BTreeMap::new(),
            ignore_dependencies: BTreeSet::new(),
            validate_import_statements: self.validate_import_statements,
            library_naming_convention: self.library_naming_convention.clone(),
            tests_naming_convention: self.tests_naming_convention.clone(),
            srcs_file_glob: self.srcs_file_glob.clone(),
            tests_file_glob: self.tests_file_glob.clone(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn repo_root(&self) -> &str {
        &self.repo_root
    }

    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Adds a glob from the standard `exclude` directive. Adding the same
    /// glob twice keeps a single entry.
    pub fn add_excluded_pattern(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if !self.excluded_patterns.contains_key(&pattern) {
            let glob = FileGlob::new(pattern.clone());
            self.excluded_patterns.insert(pattern, glob);
        }
    }

    /// Exclusions declared by this directory only.
    pub fn local_excluded_patterns(&self) -> impl Iterator<Item = &FileGlob> {
        self.excluded_patterns.values()
    }

    /// Checks the exclusions declared by this directory only. Use
    /// `PolicyTree::is_file_excluded` for the inherited answer.
    pub fn excludes_locally(&self, file_path: &str) -> bool {
        self.excluded_patterns
            .values()
            .any(|glob| glob.matches_path(file_path))
    }

    pub fn set_generation_enabled(&mut self, enabled: bool) {
        self.generation_enabled = enabled;
    }

    pub fn generation_enabled(&self) -> bool {
        self.generation_enabled
    }

    /// Ignores an import in this directory and, through the tree, in every
    /// directory below it. Ancestors are not affected.
    pub fn add_ignored_import(&mut self, import: impl Into<String>) {
        self.ignore_dependencies.insert(import.into());
    }

    /// Imports ignored by this directory only.
    pub fn local_ignored_imports(&self) -> impl Iterator<Item = &str> {
        self.ignore_dependencies.iter().map(String::as_str)
    }

    pub fn ignores_locally(&self, import: &str) -> bool {
        self.ignore_dependencies.contains(import)
    }

    pub fn set_validate_import_statements(&mut self, validate: bool) {
        self.validate_import_statements = validate;
    }

    /// Defaults to `true` when never set anywhere up the tree.
    pub fn validate_import_statements(&self) -> bool {
        self.validate_import_statements
    }

    pub fn set_library_naming_convention(&mut self, template: impl Into<String>) {
        self.library_naming_convention = template.into();
    }

    pub fn library_naming_convention(&self) -> &str {
        &self.library_naming_convention
    }

    /// Renders the library target name, e.g. `$package_name$_lib` with
    /// package `foo` gives `foo_lib`.
    pub fn render_library_name(&self, package_name: &str) -> String {
        self.library_naming_convention
            .replace(PACKAGE_NAME_PLACEHOLDER, package_name)
    }

    pub fn set_tests_naming_convention(&mut self, template: impl Into<String>) {
        self.tests_naming_convention = template.into();
    }

    pub fn tests_naming_convention(&self) -> &str {
        &self.tests_naming_convention
    }

    pub fn render_tests_library_name(&self, package_name: &str) -> String {
        self.tests_naming_convention
            .replace(PACKAGE_NAME_PLACEHOLDER, package_name)
    }

    pub fn set_source_glob(&mut self, glob: impl Into<String>) {
        self.srcs_file_glob = FileGlob::new(glob);
    }

    pub fn source_glob(&self) -> &FileGlob {
        &self.srcs_file_glob
    }

    /// A file is a source file when its extension is supported and it
    /// matches the source glob. An empty glob accepts every supported file.
    pub fn is_source_file(&self, file_path: &str) -> bool {
        if !is_source_file_type(file_path) {
            return false;
        }
        if self.srcs_file_glob.is_empty() {
            return true;
        }
        self.srcs_file_glob.matches_path(file_path)
    }

    pub fn set_test_glob(&mut self, glob: impl Into<String>) {
        self.tests_file_glob = FileGlob::new(glob);
    }

    pub fn test_glob(&self) -> &FileGlob {
        &self.tests_file_glob
    }

    /// Unlike the source glob, an empty test glob disables tests: no file
    /// is a test file.
    pub fn is_test_file(&self, file_path: &str) -> bool {
        if !is_source_file_type(file_path) {
            return false;
        }
        if self.tests_file_glob.is_empty() {
            return false;
        }
        self.tests_file_glob.matches_path(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_defaults() {
        let node = PolicyNode::root("/repo");
        assert!(node.generation_enabled());
        assert!(node.validate_import_statements());
        assert_eq!(node.repo_root(), "/repo");
        assert_eq!(node.config_dir(), "");
        assert!(node.parent().is_none());
        assert_eq!(node.library_naming_convention(), "$package_name$");
        assert_eq!(node.tests_naming_convention(), "$package_name$_tests");
        assert_eq!(node.local_excluded_patterns().count(), 0);
        assert_eq!(node.local_ignored_imports().count(), 0);
    }

    #[test]
    fn test_render_names() {
        let mut node = PolicyNode::root("/repo");
        assert_eq!(node.render_library_name("foo"), "foo");
        assert_eq!(node.render_tests_library_name("foo"), "foo_tests");

        node.set_library_naming_convention("$package_name$_my_lib");
        assert_eq!(node.render_library_name("foo"), "foo_my_lib");
        assert_eq!(node.render_library_name("foo"), "foo_my_lib");

        node.set_tests_naming_convention("$package_name$-$package_name$");
        assert_eq!(node.render_tests_library_name("x"), "x-x");

        node.set_library_naming_convention("lib");
        assert_eq!(node.render_library_name("foo"), "lib");
    }

    #[test]
    fn test_default_classification() {
        let node = PolicyNode::root("/repo");
        assert!(node.is_source_file("widgets/button.tsx"));
        assert!(!node.is_test_file("widgets/button.tsx"));

        // A spec file satisfies both default globs.
        assert!(node.is_source_file("widgets/button.spec.ts"));
        assert!(node.is_test_file("widgets/button.spec.ts"));

        assert!(!node.is_source_file("widgets/data.json"));
        assert!(!node.is_test_file("widgets/README.md"));
    }

    #[test]
    fn test_empty_globs_are_asymmetric() {
        let mut node = PolicyNode::root("/repo");
        node.set_source_glob("");
        node.set_test_glob("");
        assert!(node.is_source_file("any/where/file.mjs"));
        assert!(!node.is_test_file("any/where/file.test.ts"));
        assert!(!node.is_source_file("any/where/file.css"));
    }

    #[test]
    fn test_custom_globs() {
        let mut node = PolicyNode::root("/repo");
        node.set_source_glob("src/**/*.ts");
        node.set_test_glob("**/__tests__/*.ts");
        assert!(node.is_source_file("src/a/b.ts"));
        assert!(!node.is_source_file("lib/a.ts"));
        assert!(node.is_test_file("pkg/__tests__/a.ts"));
        assert!(!node.is_test_file("pkg/a.spec.ts"));
    }

    #[test]
    fn test_malformed_glob_classifies_nothing() {
        let mut node = PolicyNode::root("/repo");
        node.set_source_glob("**/*.{ts");
        node.set_test_glob("[");
        assert!(!node.is_source_file("a.ts"));
        assert!(!node.is_test_file("a.spec.ts"));
    }

    #[test]
    fn test_setters_are_idempotent() {
        let mut node = PolicyNode::root("/repo");
        node.set_generation_enabled(false);
        node.set_generation_enabled(false);
        assert!(!node.generation_enabled());

        node.add_excluded_pattern("**/gen/**");
        node.add_excluded_pattern("**/gen/**");
        assert_eq!(node.local_excluded_patterns().count(), 1);

        node.add_ignored_import("left-pad");
        node.add_ignored_import("left-pad");
        assert_eq!(node.local_ignored_imports().count(), 1);
    }

    #[test]
    fn test_local_exclusions() {
        let mut node = PolicyNode::root("/repo");
        node.add_excluded_pattern("{bad");
        node.add_excluded_pattern("**/*.gen.ts");
        assert!(node.excludes_locally("a/b/c.gen.ts"));
        assert!(!node.excludes_locally("a/b/c.ts"));
    }
}
