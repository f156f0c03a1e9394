use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::fmt;

/// File extensions (without the leading dot) that rule generation treats as
/// script sources.
pub const SOURCE_FILE_EXTENSIONS: [&str; 5] = ["js", "mjs", "ts", "tsx", "jsx"];

/// Data file extensions that sources may reference. These are never a
/// generation target on their own.
pub const DATA_FILE_EXTENSIONS: [&str; 1] = ["json"];

/// The glob every source file matches unless a directory overrides it:
/// `**/*.{js,mjs,ts,tsx,jsx}`.
pub fn default_srcs_glob() -> String {
    format!("**/*.{{{}}}", SOURCE_FILE_EXTENSIONS.join(","))
}

/// The glob test files match unless a directory overrides it:
/// `**/*.{spec,test}.{js,mjs,ts,tsx,jsx}`.
pub fn default_tests_glob() -> String {
    format!("**/*.{{spec,test}}.{{{}}}", SOURCE_FILE_EXTENSIONS.join(","))
}

/// Text after the last `.` of the final path segment. A dot-file such as
/// `src/.ts` has the extension `ts`; `Makefile` and `a.d/Makefile` have none.
fn extension_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Returns `true` when the path carries one of the supported source extensions.
pub fn is_source_file_type(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| SOURCE_FILE_EXTENSIONS.contains(&ext))
}

/// Returns `true` when the path carries one of the referenced data extensions.
pub fn is_data_file_type(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| DATA_FILE_EXTENSIONS.contains(&ext))
}

/// Compiles a glob with doublestar semantics.
///
/// `*` matches within a single path segment, `**` spans any number of
/// segments (including none) and `{a,b}` alternates between literals.
fn compile(glob: &str) -> Result<GlobMatcher> {
    let matcher = GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob: {glob:?}"))?
        .compile_matcher();
    Ok(matcher)
}

/// Matches a single path against a glob.
///
/// This is the pure form of the matcher: a malformed glob is reported as an
/// error. Callers that must stay non-fatal should hold a [`FileGlob`], which
/// degrades a malformed pattern to "no match".
///
/// # Arguments
/// * `glob`: The pattern, e.g. `**/*.{ts,tsx}`.
/// * `path`: A forward-slash separated path, relative to the repository root.
pub fn matches(glob: &str, path: &str) -> Result<bool> {
    Ok(compile(glob)?.is_match(path))
}

/// The `PatternMatcher` trait lets the policy treat exclusion, source and
/// test globs uniformly when classifying a file.
pub trait PatternMatcher {
    /// Checks whether the given path matches. Never fails: a pattern that
    /// could not be compiled simply matches nothing.
    fn matches_path(&self, path: &str) -> bool;
}

/// A glob compiled once, when it is configured.
///
/// The pattern text is kept for display. If the text does not compile, a
/// warning is emitted exactly once (here, at construction) and the glob
/// never matches afterwards.
#[derive(Debug, Clone)]
pub struct FileGlob {
    source: String,
    matcher: Option<GlobMatcher>,
}

impl FileGlob {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        if source.is_empty() {
            return Self {
                source,
                matcher: None,
            };
        }

        let matcher = match compile(&source) {
            Ok(matcher) => Some(matcher),
            Err(e) => {
                tracing::warn!(glob = %source, error = %e, "glob will never match");
                None
            }
        };

        Self { source, matcher }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// An empty glob carries policy meaning of its own (see `PolicyNode`),
    /// so it is kept apart from a malformed one.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// `false` only for a non-empty glob that failed to compile.
    pub fn is_valid(&self) -> bool {
        self.is_empty() || self.matcher.is_some()
    }
}

impl PatternMatcher for FileGlob {
    fn matches_path(&self, path: &str) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|matcher| matcher.is_match(path))
    }
}

impl PartialEq for FileGlob {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for FileGlob {}

impl fmt::Display for FileGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_globs() {
        assert_eq!(default_srcs_glob(), "**/*.{js,mjs,ts,tsx,jsx}");
        assert_eq!(default_tests_glob(), "**/*.{spec,test}.{js,mjs,ts,tsx,jsx}");
    }

    #[test]
    fn test_recursive_wildcard_spans_segments() {
        assert!(matches("**/*.ts", "a/b/c/file.ts").unwrap());
        assert!(matches("**/*.ts", "file.ts").unwrap());
        assert!(matches("src/**", "src/a/b.ts").unwrap());
        assert!(!matches("**/*.ts", "a/b/file.tsx").unwrap());
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        assert!(matches("*.ts", "file.ts").unwrap());
        assert!(!matches("*.ts", "dir/file.ts").unwrap());
        assert!(matches("dir/*.ts", "dir/file.ts").unwrap());
        assert!(!matches("dir/*.ts", "dir/nested/file.ts").unwrap());
    }

    #[test]
    fn test_brace_alternation() {
        let glob = default_tests_glob();
        assert!(matches(&glob, "widgets/button.spec.ts").unwrap());
        assert!(matches(&glob, "widgets/button.test.jsx").unwrap());
        assert!(!matches(&glob, "widgets/button.ts").unwrap());
        assert!(!matches(&glob, "widgets/button.spec.json").unwrap());
    }

    #[test]
    fn test_malformed_glob_is_an_error() {
        assert!(matches("{unclosed", "unclosed").is_err());
        assert!(matches("[abc", "a").is_err());
    }

    #[test]
    fn test_file_glob_degrades_to_no_match() {
        let glob = FileGlob::new("src/{a,b");
        assert!(!glob.is_valid());
        assert!(!glob.is_empty());
        assert!(!glob.matches_path("src/a"));
        assert_eq!(glob.as_str(), "src/{a,b");
    }

    #[test]
    fn test_empty_file_glob() {
        let glob = FileGlob::new("");
        assert!(glob.is_empty());
        assert!(glob.is_valid());
        assert!(!glob.matches_path(""));
    }

    #[test]
    fn test_extension_checks() {
        for ext in SOURCE_FILE_EXTENSIONS {
            assert!(is_source_file_type(&format!("a/b.{ext}")));
        }
        assert!(!is_source_file_type("a/b.json"));
        assert!(!is_source_file_type("Makefile"));
        assert!(is_data_file_type("package.json"));
        assert!(!is_data_file_type("index.ts"));
    }

    #[test]
    fn test_extension_of_last_segment_only() {
        assert_eq!(extension_of("src/.ts"), Some("ts"));
        assert!(is_source_file_type("src/.ts"));
        assert!(is_data_file_type(".json"));

        assert_eq!(extension_of("a.ts/Makefile"), None);
        assert!(!is_source_file_type("a.ts/Makefile"));
        assert_eq!(extension_of("a/b.d.ts"), Some("ts"));
        assert_eq!(extension_of("a/trailing."), Some(""));
        assert!(!is_source_file_type("a/trailing."));
    }
}
