// This file is the module declaration file for the `builders` module.
// It declares the pieces the engine is built from and the ones built on
// top of it.

// `patterns` module:
// Glob matching with `**`, `*` and `{a,b}` support, the `PatternMatcher`
// trait and the compiled `FileGlob`, plus the supported file extensions.
pub mod patterns;

// `directives` module:
// The directive names the engine understands and the `Directive` enum that
// applies a name/value pair to a `PolicyNode`.
pub mod directives;

// `kinds` module:
// The static rule-shape catalog: which attributes of a generated rule are
// matched, merged or resolved, and where its symbols are loaded from.
pub mod kinds;

// `reporter` module:
// Text and JSON reports for classification results, effective policies
// and the rule-shape catalog.
pub mod reporter;

// `validator` module:
// The `ConfigValidator` trait and `StandardValidator`, which flag unknown
// directives, malformed globs and suspicious naming templates.
pub mod validator;
