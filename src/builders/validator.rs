use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;

use crate::builders::directives::Directive;
use crate::builders::patterns;
use crate::core::config::{self, DirectiveEntry};
use crate::core::policy::PACKAGE_NAME_PLACEHOLDER;

/// The `ConfigValidator` trait defines the public interface for validating a
/// policy configuration before it drives generation.
pub trait ConfigValidator {
    /// Performs a full validation of the `PolicyConfig` and returns a list
    /// of issues found. An empty list means the configuration is clean.
    fn validate_config(&self, config: &config::PolicyConfig) -> Result<Vec<String>>;

    /// Validates a single directive declared in `directory`.
    fn validate_directive(&self, directory: &str, entry: &DirectiveEntry) -> Result<Vec<String>>;
}

/// The `StandardValidator` checks that directives parse, that their globs
/// compile and that naming templates interpolate the package name.
pub struct StandardValidator {
    directory_key: Regex,
}

impl StandardValidator {
    pub fn new() -> Self {
        // Repository-relative, no leading or trailing slash, no `.`/`..`
        // segments, no empty segments.
        let directory_key = Regex::new(r"^(?:[^/]+(?:/[^/]+)*)?$").expect("static regex");
        Self { directory_key }
    }

    fn check_directory_key(&self, directory: &str) -> Option<String> {
        let dotted = directory
            .split('/')
            .any(|segment| segment == "." || segment == "..");
        if dotted || !self.directory_key.is_match(directory) {
            Some(format!("Directory key is not normalized: '{directory}'"))
        } else {
            None
        }
    }

    /// Flags imports ignored more than once in the same directory.
    fn check_duplicate_imports(&self, directory: &str, entries: &[DirectiveEntry]) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for entry in entries {
            if let Ok(Directive::IgnoreImports(imports)) = entry.parse() {
                for import in imports {
                    if !seen.insert(import.clone()) {
                        warnings.push(format!(
                            "Import '{import}' is ignored more than once in '{directory}'"
                        ));
                    }
                }
            }
        }
        warnings
    }
}

impl Default for StandardValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator for StandardValidator {
    fn validate_config(&self, config: &config::PolicyConfig) -> Result<Vec<String>> {
        let mut issues = Vec::new();

        if config.version != config::CONFIG_VERSION {
            issues.push(format!("Unsupported config version: {}", config.version));
        }

        for (directory, entries) in &config.directories {
            issues.extend(self.check_directory_key(directory));
            issues.extend(self.check_duplicate_imports(directory, entries));

            for entry in entries {
                issues.extend(self.validate_directive(directory, entry)?);
            }
        }

        Ok(issues)
    }

    fn validate_directive(
        &self,
        directory: &str,
        entry: &DirectiveEntry,
    ) -> Result<Vec<String>> {
        let mut issues = Vec::new();

        let directive = match entry.parse() {
            Ok(directive) => directive,
            Err(e) => {
                issues.push(format!("Invalid directive in '{directory}': {e:#}"));
                return Ok(issues);
            }
        };

        match &directive {
            Directive::SourcesFileGlob(glob)
            | Directive::TestsFileGlob(glob)
            | Directive::Exclude(glob) => {
                if glob.is_empty() && matches!(directive, Directive::Exclude(_)) {
                    issues.push(format!("Empty exclude pattern in '{directory}'"));
                } else if !glob.is_empty()
                    && let Err(e) = patterns::matches(glob, "")
                {
                    issues.push(format!(
                        "Invalid glob for {} in '{directory}': {e:#}",
                        directive.name()
                    ));
                }
            }
            Directive::LibraryNamingConvention(template)
            | Directive::TestsNamingConvention(template) => {
                if !template.contains(PACKAGE_NAME_PLACEHOLDER) {
                    issues.push(format!(
                        "{} in '{directory}' does not use {PACKAGE_NAME_PLACEHOLDER}",
                        directive.name()
                    ));
                }
            }
            Directive::IgnoreImports(imports) => {
                if imports.is_empty() {
                    issues.push(format!(
                        "{} in '{directory}' lists no imports",
                        directive.name()
                    ));
                }
            }
            Directive::GenerationEnabled(_) | Directive::ValidateImportStatements(_) => {}
        }

        Ok(issues)
    }
}
