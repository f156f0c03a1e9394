use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::builders::directives::Directive;
use crate::builders::patterns::is_data_file_type;
use crate::core::config::{DirectiveEntry, PolicyConfig};
use crate::core::policy::NodeId;
use crate::core::registry::{Policy, PolicyTree, normalize_path, parent_dir};

/// How the generator treats a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileClass {
    /// Generation is turned off for the file's directory.
    Disabled,
    /// An exclusion pattern in force for the directory matches the file.
    Excluded,
    Test,
    Source,
    /// A data file sources may reference; never a target of its own.
    Data,
    Other,
}

impl fmt::Display for FileClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileClass::Disabled => write!(f, "disabled"),
            FileClass::Excluded => write!(f, "excluded"),
            FileClass::Test => write!(f, "test"),
            FileClass::Source => write!(f, "source"),
            FileClass::Data => write!(f, "data"),
            FileClass::Other => write!(f, "other"),
        }
    }
}

/// A snapshot of the settings in force for one directory, inherited values
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectivePolicy {
    pub directory: String,
    /// The directory whose node answered, `directory` itself or its nearest
    /// configured ancestor.
    pub resolved_from: String,
    pub generation_enabled: bool,
    pub validate_import_statements: bool,
    pub library_name: String,
    pub tests_library_name: String,
    pub srcs_file_glob: String,
    pub tests_file_glob: String,
    pub excluded_patterns: Vec<String>,
    pub ignored_imports: Vec<String>,
}

/// Walks a configured source tree top-down and answers "what applies here".
///
/// The engine plays the part of the generator's tree walker: every
/// directory is derived from its parent before its own directives are
/// applied, so parents always exist when a child is visited.
pub struct PolicyEngine {
    tree: PolicyTree,
}

impl PolicyEngine {
    pub fn new(repo_root: impl Into<String>) -> Self {
        Self {
            tree: PolicyTree::new(repo_root),
        }
    }

    /// Builds the policy tree for every configured directory.
    ///
    /// Directory keys are normalized first, and keys that normalize alike
    /// are merged in key order. Directories are then visited by depth, so a
    /// parent's directives are applied before any child copies them.
    ///
    /// A directive that does not parse is logged and skipped; the rest of
    /// the tree is still built.
    pub fn from_config(config: &PolicyConfig) -> Self {
        let mut engine = Self::new(config.repo_root.clone());

        let mut directories: BTreeMap<String, Vec<&DirectiveEntry>> = BTreeMap::new();
        for (key, entries) in &config.directories {
            let directory = normalize_path(key);
            if directory != *key {
                tracing::debug!(key = %key, directory = %directory, "normalized directory key");
            }
            directories.entry(directory).or_default().extend(entries);
        }

        let mut ordered: Vec<_> = directories.into_iter().collect();
        ordered.sort_by_key(|(directory, _)| depth(directory));

        for (directory, entries) in &ordered {
            let directory = directory.as_str();
            let directives: Vec<Directive> = entries
                .iter()
                .filter_map(|entry| match entry.parse() {
                    Ok(directive) => Some(directive),
                    Err(e) => {
                        tracing::warn!(
                            directory,
                            directive = %entry.directive,
                            error = %e,
                            "skipping invalid directive"
                        );
                        None
                    }
                })
                .collect();
            if engine.visit(directory, &directives).is_none() {
                tracing::warn!(directory, "could not register directory");
            }
        }

        engine
    }

    pub fn tree(&self) -> &PolicyTree {
        &self.tree
    }

    /// Visits a directory: derives its policy from the parent, applies the
    /// directives in declaration order and registers the result.
    ///
    /// Revisiting a registered directory applies the directives to its
    /// existing node; children derived before that keep their snapshot.
    pub fn visit(&mut self, directory: &str, directives: &[Directive]) -> Option<NodeId> {
        let directory = normalize_path(directory);
        let id = self.ensure_directory(&directory)?;
        let node = self.tree.node_mut(id)?;
        for directive in directives {
            tracing::debug!(directory = %directory, %directive, "applying directive");
            directive.apply(node);
        }
        Some(id)
    }

    fn ensure_directory(&mut self, directory: &str) -> Option<NodeId> {
        if let Some(id) = self.tree.get(directory) {
            return Some(id);
        }

        let parent = match self.tree.parent_for(directory) {
            Some(parent) => parent,
            None => self.ensure_directory(parent_dir(directory))?,
        };
        let id = self.tree.derive_child(parent, directory)?;
        self.tree.set(directory, id);
        Some(id)
    }

    /// The policy of the nearest registered directory at or above
    /// `directory`, which must already be normalized.
    fn nearest_policy(&self, directory: &str) -> Policy<'_> {
        let mut current = directory;
        loop {
            if let Some(policy) = self.tree.get(current).and_then(|id| self.tree.policy(id)) {
                return policy;
            }
            if current.is_empty() {
                return self.tree.root_policy();
            }
            current = parent_dir(current);
        }
    }

    /// The nearest registered directory at or above `directory`.
    pub fn nearest_directory(&self, directory: &str) -> NodeId {
        self.nearest_policy(&normalize_path(directory)).id()
    }

    /// The policy node governing a file.
    pub fn directory_for(&self, file_path: &str) -> NodeId {
        let file_path = normalize_path(file_path);
        self.nearest_policy(parent_dir(&file_path)).id()
    }

    /// Classifies a repository-relative file.
    ///
    /// Test files are taken out of the source set here: a file matching both
    /// globs, such as `button.spec.ts` under the defaults, is a test.
    pub fn classify(&self, file_path: &str) -> FileClass {
        let file_path = normalize_path(file_path);
        let file_path = file_path.as_str();
        let policy = self.nearest_policy(parent_dir(file_path));

        if !policy.node().generation_enabled() {
            FileClass::Disabled
        } else if policy.is_file_excluded(file_path) {
            FileClass::Excluded
        } else if policy.is_test_file(file_path) {
            FileClass::Test
        } else if policy.is_source_file(file_path) {
            FileClass::Source
        } else if is_data_file_type(file_path) {
            FileClass::Data
        } else {
            FileClass::Other
        }
    }

    pub fn is_dependency_ignored(&self, directory: &str, import: &str) -> bool {
        self.nearest_policy(&normalize_path(directory))
            .is_dependency_ignored(import)
    }

    /// Resolves the effective settings of a directory, rendering target
    /// names with the directory's base name as package name.
    pub fn describe(&self, directory: &str) -> EffectivePolicy {
        let directory = normalize_path(directory);
        let policy = self.nearest_policy(&directory);
        let node = policy.node();
        let package_name = self.package_name(&directory);

        EffectivePolicy {
            directory: directory.clone(),
            resolved_from: node.config_dir().to_string(),
            generation_enabled: node.generation_enabled(),
            validate_import_statements: node.validate_import_statements(),
            library_name: node.render_library_name(&package_name),
            tests_library_name: node.render_tests_library_name(&package_name),
            srcs_file_glob: node.source_glob().to_string(),
            tests_file_glob: node.test_glob().to_string(),
            excluded_patterns: policy
                .excluded_patterns()
                .into_iter()
                .map(ToString::to_string)
                .collect(),
            ignored_imports: policy
                .ignored_imports()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    fn package_name(&self, directory: &str) -> String {
        if let Some((_, base)) = directory.rsplit_once('/') {
            return base.to_string();
        }
        if !directory.is_empty() {
            return directory.to_string();
        }
        let repo_root = self.tree.root_policy().node().repo_root();
        Path::new(repo_root)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string())
    }
}

fn depth(directory: &str) -> usize {
    directory.split('/').filter(|segment| !segment.is_empty()).count()
}
