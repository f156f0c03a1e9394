// This file is the module declaration file for the `core` module.
// It groups the hierarchical policy engine itself: the per-directory
// record, the tree that owns those records, the configuration layer that
// feeds directives in, and the engine that walks the tree.

// `policy` module:
// Defines `PolicyNode`, the effective code-generation settings of one
// directory, with its accessors, mutators and classification queries.
pub mod policy;

// `registry` module:
// Holds `PolicyTree`, the arena of nodes indexed by directory path. Parent
// lookups and every query that walks the ancestor chain (exclusions,
// ignored imports) live here.
pub mod registry;

// `config` module:
// Loads and saves the directive configuration (`tsgen-config.toml`) through
// the `ConfigProvider` trait and `ConfigManager`.
pub mod config;

// `engine` module:
// `PolicyEngine` builds the tree from a configuration, top-down, and
// classifies files against it.
pub mod engine;
