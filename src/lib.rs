//! Affilink - rewrite outbound links in markup to carry affiliate parameters.
//!
//! This library provides:
//! - Rule parsing from `domain=param_key=param_value` lines
//! - Anchor discovery and per-link rewrite decisions
//! - An overwrite/nofollow policy for conflicting parameters
//! - A shared engine handle whose rules can be swapped at runtime
//! - Configuration file parsing and cascade discovery for the CLI
//!
//! Rewriting never fails: links that cannot be rewritten are left as written.
//!
//! # Example
//!
//! ```
//! use affilink::{Policy, build_rule_set, rewrite};
//!
//! let rules = build_rule_set("amazon.com=tag=mytag-20");
//! let html = r#"<a href="https://www.amazon.com/dp/B000">a book</a>"#;
//!
//! assert_eq!(
//!     rewrite(html, &rules, &Policy::default()),
//!     r#"<a href="https://www.amazon.com/dp/B000?tag=mytag-20">a book</a>"#
//! );
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod policy;
pub mod rules;

pub use engine::{AffilinkEngine, Snapshot};
pub use error::{AffilinkError, Result};
pub use policy::Policy;
pub use rules::{
	LinkDecision, RewriteOutput, RewriteReport, Rule, RuleSet, SkipReason, build_rule_set,
	decide_link, rewrite, rewrite_with_report,
};
