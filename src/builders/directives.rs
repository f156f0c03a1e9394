use anyhow::{Context, Result};
use std::fmt;

use crate::core::policy::PolicyNode;

/// Toggles generation: `enabled` or `disabled`. Inherited by subdirectories.
pub const TYPESCRIPT_EXTENSION: &str = "typescript_extension";
/// Comma-separated imports that never become dependencies of generated rules.
pub const IGNORE_IMPORTS: &str = "ts_ignore_imports";
/// Whether unresolved import statements are reported.
pub const VALIDATE_IMPORT_STATEMENTS: &str = "ts_validate_import_statements";
/// Library target naming template, interpolating `$package_name$`.
pub const LIBRARY_NAMING_CONVENTION: &str = "ts_project_naming_convention";
/// Test target naming template, interpolating `$package_name$`.
pub const TESTS_NAMING_CONVENTION: &str = "ts_tests_naming_convention";
/// Glob selecting source files.
pub const SOURCES_FILE_GLOB: &str = "ts_srcs_file_glob";
/// Glob selecting test files.
pub const TESTS_FILE_GLOB: &str = "ts_tests_file_glob";
/// The standard, language independent exclusion directive.
pub const EXCLUDE: &str = "exclude";

/// Every directive name this engine understands.
pub const KNOWN_DIRECTIVES: [&str; 8] = [
    TYPESCRIPT_EXTENSION,
    IGNORE_IMPORTS,
    VALIDATE_IMPORT_STATEMENTS,
    LIBRARY_NAMING_CONVENTION,
    TESTS_NAMING_CONVENTION,
    SOURCES_FILE_GLOB,
    TESTS_FILE_GLOB,
    EXCLUDE,
];

/// A single directive, already split into name and value by the directive
/// parser and checked for a well-formed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    GenerationEnabled(bool),
    IgnoreImports(Vec<String>),
    ValidateImportStatements(bool),
    LibraryNamingConvention(String),
    TestsNamingConvention(String),
    SourcesFileGlob(String),
    TestsFileGlob(String),
    Exclude(String),
}

impl Directive {
    /// Interprets a raw name/value pair.
    ///
    /// # Returns
    /// An error for unknown names and for values that a flag directive
    /// cannot interpret. Glob and template values are passed through as-is.
    pub fn parse(name: &str, value: &str) -> Result<Self> {
        let directive = match name {
            TYPESCRIPT_EXTENSION => Self::GenerationEnabled(parse_extension_toggle(value)?),
            IGNORE_IMPORTS => Self::IgnoreImports(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|import| !import.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            VALIDATE_IMPORT_STATEMENTS => Self::ValidateImportStatements(
                parse_bool(value)
                    .with_context(|| format!("invalid value for {VALIDATE_IMPORT_STATEMENTS}"))?,
            ),
            LIBRARY_NAMING_CONVENTION => Self::LibraryNamingConvention(value.to_string()),
            TESTS_NAMING_CONVENTION => Self::TestsNamingConvention(value.to_string()),
            SOURCES_FILE_GLOB => Self::SourcesFileGlob(value.to_string()),
            TESTS_FILE_GLOB => Self::TestsFileGlob(value.to_string()),
            EXCLUDE => Self::Exclude(value.to_string()),
            _ => anyhow::bail!("Unknown directive: {name}"),
        };
        Ok(directive)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GenerationEnabled(_) => TYPESCRIPT_EXTENSION,
            Self::IgnoreImports(_) => IGNORE_IMPORTS,
            Self::ValidateImportStatements(_) => VALIDATE_IMPORT_STATEMENTS,
            Self::LibraryNamingConvention(_) => LIBRARY_NAMING_CONVENTION,
            Self::TestsNamingConvention(_) => TESTS_NAMING_CONVENTION,
            Self::SourcesFileGlob(_) => SOURCES_FILE_GLOB,
            Self::TestsFileGlob(_) => TESTS_FILE_GLOB,
            Self::Exclude(_) => EXCLUDE,
        }
    }

    /// Applies the directive to the policy of the directory declaring it.
    pub fn apply(&self, node: &mut PolicyNode) {
        match self {
            Self::GenerationEnabled(enabled) => node.set_generation_enabled(*enabled),
            Self::IgnoreImports(imports) => {
                for import in imports {
                    node.add_ignored_import(import.clone());
                }
            }
            Self::ValidateImportStatements(validate) => {
                node.set_validate_import_statements(*validate)
            }
            Self::LibraryNamingConvention(template) => {
                node.set_library_naming_convention(template.clone())
            }
            Self::TestsNamingConvention(template) => {
                node.set_tests_naming_convention(template.clone())
            }
            Self::SourcesFileGlob(glob) => node.set_source_glob(glob.clone()),
            Self::TestsFileGlob(glob) => node.set_test_glob(glob.clone()),
            Self::Exclude(glob) => node.add_excluded_pattern(glob.clone()),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GenerationEnabled(enabled) => {
                let value = if *enabled { "enabled" } else { "disabled" };
                write!(f, "{} {value}", self.name())
            }
            Self::IgnoreImports(imports) => write!(f, "{} {}", self.name(), imports.join(",")),
            Self::ValidateImportStatements(validate) => write!(f, "{} {validate}", self.name()),
            Self::LibraryNamingConvention(value)
            | Self::TestsNamingConvention(value)
            | Self::SourcesFileGlob(value)
            | Self::TestsFileGlob(value)
            | Self::Exclude(value) => write!(f, "{} {value}", self.name()),
        }
    }
}

fn parse_extension_toggle(value: &str) -> Result<bool> {
    match value.trim() {
        "enabled" => Ok(true),
        "disabled" => Ok(false),
        other => anyhow::bail!(
            "{TYPESCRIPT_EXTENSION} must be 'enabled' or 'disabled', got '{other}'"
        ),
    }
}

/// Accepts the usual spellings of a boolean flag.
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{other}'"),
    }
}
