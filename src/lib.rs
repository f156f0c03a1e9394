//! Resolves, per directory of a source tree, the code-generation policy that
//! governs how build rules are produced for its files.
//!
//! Policies are declared with directives at any directory and inherited
//! downward. Scalar settings are copied into a child when it is derived;
//! exclusions and ignored imports accumulate along the ancestor chain.
pub mod builders;
pub mod core;
pub mod utils;


pub use crate::builders::directives::Directive;
pub use crate::builders::patterns::{FileGlob, PatternMatcher};
pub use crate::core::engine::{EffectivePolicy, FileClass, PolicyEngine};
pub use crate::core::policy::{NodeId, PolicyNode};
pub use crate::core::registry::{Policy, PolicyTree};
