//! Shared handle over the current rule set and policy.
//!
//! Hosts keep one [`AffilinkEngine`] and call it from any thread. Reloading
//! swaps in a new immutable [`Snapshot`]; callers that already hold the old
//! one keep using it until they fetch again.

use crate::policy::Policy;
use crate::rules::{RewriteOutput, RuleSet, rewrite_with_report};
use parking_lot::RwLock;
use std::sync::Arc;

/// An immutable pairing of rules and policy.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
	pub rules: RuleSet,
	pub policy: Policy,
}

impl Snapshot {
	pub fn rewrite(&self, text: &str) -> RewriteOutput {
		rewrite_with_report(text, &self.rules, &self.policy)
	}
}

#[derive(Debug, Default)]
pub struct AffilinkEngine {
	current: RwLock<Arc<Snapshot>>,
}

impl AffilinkEngine {
	pub fn new(rules: RuleSet, policy: Policy) -> Self {
		AffilinkEngine {
			current: RwLock::new(Arc::new(Snapshot { rules, policy })),
		}
	}

	/// Build the engine straight from rule text.
	pub fn from_config(raw: &str, policy: Policy) -> Self {
		Self::new(RuleSet::from_config(raw), policy)
	}

	/// The snapshot in effect right now.
	pub fn snapshot(&self) -> Arc<Snapshot> {
		Arc::clone(&self.current.read())
	}

	/// Rebuild the rule set from new rule text, keeping the policy.
	pub fn reload_rules(&self, raw: &str) {
		let rules = RuleSet::from_config(raw);
		self.update(|current| Snapshot {
			rules,
			policy: current.policy,
		});
	}

	pub fn set_policy(&self, policy: Policy) {
		self.update(|current| Snapshot {
			rules: current.rules.clone(),
			policy,
		});
	}

	pub fn replace(&self, rules: RuleSet, policy: Policy) {
		self.update(|_| Snapshot { rules, policy });
	}

	/// Swap in a snapshot derived from the current one. Concurrent updates
	/// are serialized by the write lock.
	fn update(&self, next: impl FnOnce(&Snapshot) -> Snapshot) {
		let mut current = self.current.write();
		let next = next(&current);
		tracing::info!(
			rules = next.rules.len(),
			policy = ?next.policy,
			"swapping rule snapshot"
		);
		*current = Arc::new(next);
	}

	pub fn rewrite(&self, text: &str) -> String {
		self.snapshot().rewrite(text).text
	}

	pub fn rewrite_with_report(&self, text: &str) -> RewriteOutput {
		self.snapshot().rewrite(text)
	}

	/// Rewrite a content field in place, e.g. a post body or signature.
	pub fn rewrite_in_place(&self, field: &mut String) {
		let output = self.snapshot().rewrite(field);
		if output.report.rewritten > 0 {
			*field = output.text;
		}
	}
}
