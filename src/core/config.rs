use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::directives::Directive;
use crate::builders::validator::{ConfigValidator, StandardValidator};

/// Name of the configuration file kept at the root of the source tree.
pub const CONFIG_FILE_NAME: &str = "tsgen-config.toml";

/// The configuration format version this crate reads and writes.
pub const CONFIG_VERSION: &str = "1.0";

/// One directive occurrence, in the order it was declared.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DirectiveEntry {
    pub directive: String,
    pub value: String,
}

impl DirectiveEntry {
    pub fn new(directive: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            directive: directive.into(),
            value: value.into(),
        }
    }

    pub fn parse(&self) -> Result<Directive> {
        Directive::parse(&self.directive, &self.value)
    }
}

/// Directives declared across a source tree, keyed by directory.
///
/// Directory keys are repository-relative and forward-slash separated; the
/// empty key is the root. Hand-edited keys such as `./a/` or `.` are
/// normalized when the policy tree is built.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PolicyConfig {
    pub version: String,
    #[serde(default = "default_repo_root")]
    pub repo_root: String,
    #[serde(default)]
    pub directories: BTreeMap<String, Vec<DirectiveEntry>>,
}

fn default_repo_root() -> String {
    ".".to_string()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            repo_root: default_repo_root(),
            directories: BTreeMap::new(),
        }
    }
}

impl PolicyConfig {
    /// Records a directive for a directory, after any already declared there.
    pub fn push(&mut self, directory: impl Into<String>, entry: DirectiveEntry) {
        self.directories
            .entry(directory.into())
            .or_default()
            .push(entry);
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
    repo_root: PathBuf,
}

impl ConfigManager {
    /// Uses the configuration file of the tree rooted at `repo_root`.
    pub fn new_at(repo_root: impl Into<PathBuf>) -> Result<Self> {
        let repo_root = repo_root.into();
        if !repo_root.is_dir() {
            anyhow::bail!("Not a directory: {}", repo_root.display());
        }
        let config_path = repo_root.join(CONFIG_FILE_NAME);

        Ok(Self {
            config_path,
            repo_root,
        })
    }

    /// Finds the tree root by walking up from the current directory to the
    /// nearest configuration file, falling back to the current directory.
    pub fn discover() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to read current directory")?;
        let root = find_config_root(&current_dir).unwrap_or(current_dir);
        Self::new_at(root)
    }

    pub fn initialize(&self) -> Result<()> {
        if self.config_path.exists() {
            return Ok(());
        }

        let default_config = PolicyConfig {
            repo_root: self.repo_root.display().to_string(),
            ..PolicyConfig::default()
        };
        self.save_config(&default_config)?;
        Ok(())
    }

    /// Validates the stored configuration, returning the issues found.
    pub fn validate_config(&self) -> Result<Vec<String>> {
        let config = self.load_config()?;
        StandardValidator::new().validate_config(&config)
    }

    /// Appends a directive to a directory. The pair must parse.
    pub fn add_directive(
        &mut self,
        directory: String,
        directive: String,
        value: String,
    ) -> Result<()> {
        let entry = DirectiveEntry::new(directive, value);
        entry
            .parse()
            .with_context(|| format!("Refusing to add directive to '{directory}'"))?;

        let mut config = self.load_config()?;
        config.push(directory, entry);
        self.save_config(&config)?;
        Ok(())
    }

    /// Removes the directives of a directory: only those with the given name,
    /// or all of them.
    ///
    /// # Returns
    /// The number of entries removed.
    pub fn remove_directives(
        &mut self,
        directory: &str,
        directive: Option<&str>,
    ) -> Result<usize> {
        let mut config = self.load_config()?;
        let mut removed = 0;

        if let Some(entries) = config.directories.get_mut(directory) {
            let before = entries.len();
            entries.retain(|entry| directive.is_some_and(|name| entry.directive != name));
            removed = before - entries.len();
            if entries.is_empty() {
                config.directories.remove(directory);
            }
        }

        self.save_config(&config)?;
        Ok(removed)
    }

    pub fn export_config(&self, file_path: &Path, format: &str) -> Result<()> {
        let config = self.load_config()?;

        let content = match format {
            "json" => {
                serde_json::to_string_pretty(&config).context("Failed to serialize to JSON")?
            }
            "yaml" => serde_yaml::to_string(&config).context("Failed to serialize to YAML")?,
            _ => toml::to_string_pretty(&config).context("Failed to serialize to TOML")?,
        };

        fs::write(file_path, content).context("Failed to write export file")?;

        Ok(())
    }

    pub fn get_repo_root(&self) -> &Path {
        &self.repo_root
    }
}

pub trait ConfigProvider {
    fn load_config(&self) -> Result<PolicyConfig>;
    fn save_config(&self, config: &PolicyConfig) -> Result<()>;
    fn get_config_path(&self) -> Result<PathBuf>;
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<PolicyConfig> {
        if !self.config_path.exists() {
            return Ok(PolicyConfig {
                repo_root: self.repo_root.display().to_string(),
                ..PolicyConfig::default()
            });
        }

        let content =
            fs::read_to_string(&self.config_path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    fn save_config(&self, config: &PolicyConfig) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn get_config_path(&self) -> Result<PathBuf> {
        Ok(self.config_path.clone())
    }
}

fn find_config_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).exists())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_initialize_and_load() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new_at(dir.path()).unwrap();
        manager.initialize().unwrap();

        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
        let config = manager.load_config().unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.directories.is_empty());
    }

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new_at(dir.path()).unwrap();
        let config = manager.load_config().unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_add_and_remove_directives() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new_at(dir.path()).unwrap();
        manager.initialize().unwrap();

        manager
            .add_directive("a".into(), "ts_ignore_imports".into(), "left-pad".into())
            .unwrap();
        manager
            .add_directive("a".into(), "exclude".into(), "**/gen/**".into())
            .unwrap();
        assert!(
            manager
                .add_directive("a".into(), "typescript_extension".into(), "maybe".into())
                .is_err()
        );

        let config = manager.load_config().unwrap();
        assert_eq!(config.directories["a"].len(), 2);
        assert_eq!(
            config.directories["a"][0],
            DirectiveEntry::new("ts_ignore_imports", "left-pad")
        );

        assert_eq!(manager.remove_directives("a", Some("exclude")).unwrap(), 1);
        assert_eq!(manager.remove_directives("a", None).unwrap(), 1);
        assert!(manager.load_config().unwrap().directories.is_empty());
    }

    #[test]
    fn test_export_formats() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new_at(dir.path()).unwrap();
        manager
            .add_directive("src".into(), "exclude".into(), "**/dist/**".into())
            .unwrap();

        for format in ["json", "yaml", "toml"] {
            let out = dir.path().join(format!("export.{format}"));
            manager.export_config(&out, format).unwrap();
            let content = fs::read_to_string(&out).unwrap();
            assert!(content.contains("**/dist/**"));
        }
    }

    #[test]
    fn test_find_config_root() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "version = \"1.0\"\n").unwrap();

        assert_eq!(find_config_root(&nested), Some(dir.path().to_path_buf()));
    }
}
