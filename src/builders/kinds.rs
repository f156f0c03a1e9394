use serde::Serialize;

/// The single rule kind produced by the generator.
pub const TS_PROJECT_KIND: &str = "ts_project";

/// Describes how existing declarations of a kind are matched and merged
/// when the generator runs again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KindInfo {
    /// Whether any declaration of this kind matches regardless of name.
    pub match_any: bool,
    /// Attributes that must be non-empty for a declaration to count as one
    /// of this kind.
    pub non_empty_attrs: &'static [&'static str],
    /// Attributes replaced wholesale on regeneration.
    pub substitute_attrs: &'static [&'static str],
    /// Attributes merged with existing values on regeneration.
    pub mergeable_attrs: &'static [&'static str],
    /// Attributes filled by dependency resolution.
    pub resolve_attrs: &'static [&'static str],
}

/// A file every generated rule is loaded from, and the symbols it defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadInfo {
    pub name: &'static str,
    pub symbols: &'static [&'static str],
}

static KINDS: [(&str, KindInfo); 1] = [(
    TS_PROJECT_KIND,
    KindInfo {
        match_any: false,
        non_empty_attrs: &["srcs"],
        substitute_attrs: &[],
        mergeable_attrs: &["srcs"],
        resolve_attrs: &["deps"],
    },
)];

// TODO: read the `@aspect_rules_ts` repository name from configuration
// instead of hard-coding it.
static LOADS: [LoadInfo; 1] = [LoadInfo {
    name: "@aspect_rules_ts//ts:defs.bzl",
    symbols: &[TS_PROJECT_KIND],
}];

/// All rule kinds keyed by name.
pub fn kinds() -> &'static [(&'static str, KindInfo)] {
    &KINDS
}

pub fn kind_info(kind: &str) -> Option<&'static KindInfo> {
    KINDS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, info)| info)
}

/// Load statements every generated rule requires.
pub fn loads() -> &'static [LoadInfo] {
    &LOADS
}
