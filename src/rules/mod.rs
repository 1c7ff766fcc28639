//! Affiliate rules and link rewriting.
//!
//! This module handles:
//! - Parsing rule text into an ordered rule set
//! - Matching link hosts against domain rules (first match wins)
//! - Rewriting anchor tags in markup under an overwrite/nofollow policy

pub mod markup;
pub mod matcher;
pub mod query;
pub mod rewriter;
pub mod store;

pub use matcher::{ParsedLink, find_matching_rule};
pub use query::QueryMap;
pub use rewriter::{
	LinkDecision, RewriteOutput, RewriteReport, SkipReason, decide_link, rewrite,
	rewrite_with_report,
};
pub use store::{Rule, RuleSet, build_rule_set};
