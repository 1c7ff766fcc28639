use crate::policy::Policy;
use crate::rules::markup::{decode_entities, ensure_nofollow, escape_attr, escape_text};
use crate::rules::matcher::{ParsedLink, find_matching_rule};
use crate::rules::query::QueryMap;
use crate::rules::store::RuleSet;
use regex::{Captures, Regex};
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

/// Anchor with an href, captured as (attrs before href, url, attrs after, content).
///
/// `.` does not cross newlines, so anchors whose content spans lines are not
/// matched and stay as written.
static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?i)<a(\s[^>]*)href=["']([^'"]+)["']([^>]*)>(.*?)</a>"#)
		.expect("anchor pattern is valid")
});

/// Why a discovered link was left as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
	/// The href has no host component.
	NoHost,
	/// No rule's domain matcher occurs in the host.
	NoMatchingRule,
	/// A rule key is already in the query and overwriting is off.
	KeyConflict,
	/// The anchor came after the policy's link cap.
	OverLimit,
}

impl fmt::Display for SkipReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let reason = match self {
			SkipReason::NoHost => "no host",
			SkipReason::NoMatchingRule => "no matching rule",
			SkipReason::KeyConflict => "parameter already present",
			SkipReason::OverLimit => "over link limit",
		};
		f.write_str(reason)
	}
}

/// Outcome of the rewrite decision for one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkDecision {
	/// Replace the href with this URL.
	Rewrite(String),
	/// Leave the anchor byte-for-byte as written.
	Unmodified(SkipReason),
}

/// Advisory counts for one rewrite call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteReport {
	pub links_seen: usize,
	pub rewritten: usize,
	pub no_host: usize,
	pub no_matching_rule: usize,
	pub key_conflict: usize,
	pub over_limit: usize,
}

impl RewriteReport {
	fn record(&mut self, decision: &LinkDecision) {
		self.links_seen += 1;
		match decision {
			LinkDecision::Rewrite(_) => self.rewritten += 1,
			LinkDecision::Unmodified(SkipReason::NoHost) => self.no_host += 1,
			LinkDecision::Unmodified(SkipReason::NoMatchingRule) => self.no_matching_rule += 1,
			LinkDecision::Unmodified(SkipReason::KeyConflict) => self.key_conflict += 1,
			LinkDecision::Unmodified(SkipReason::OverLimit) => self.over_limit += 1,
		}
	}

	/// Links left as written, for any reason.
	pub fn unmodified(&self) -> usize {
		self.links_seen - self.rewritten
	}
}

impl fmt::Display for RewriteReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"links: {} seen, {} rewritten, {} unmodified (no host: {}, no rule: {}, conflict: {}, over limit: {})",
			self.links_seen,
			self.rewritten,
			self.unmodified(),
			self.no_host,
			self.no_matching_rule,
			self.key_conflict,
			self.over_limit
		)
	}
}

/// Rewritten text together with its report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutput {
	pub text: String,
	pub report: RewriteReport,
}

/// Decide what to do with a single href value as it appears in markup.
///
/// Character references in `href` are decoded first. The returned URL is
/// decoded too; escaping it for markup is up to the caller.
pub fn decide_link(href: &str, rules: &RuleSet, policy: &Policy) -> LinkDecision {
	let href = decode_entities(href);

	let Some(link) = ParsedLink::parse(&href) else {
		return LinkDecision::Unmodified(SkipReason::NoHost);
	};

	let Some(rule) = find_matching_rule(rules, &link) else {
		return LinkDecision::Unmodified(SkipReason::NoMatchingRule);
	};

	let injected = QueryMap::parse(&rule.params);
	let mut query = QueryMap::parse(link.url.query().unwrap_or_default());

	if policy.overwrite {
		for key in injected.keys() {
			query.remove(key);
		}
	} else if query.collides_with(&injected) {
		return LinkDecision::Unmodified(SkipReason::KeyConflict);
	}
	query.merge(&injected);

	let mut url = link.url;
	if query.is_empty() {
		url.set_query(None);
	} else {
		url.set_query(Some(&query.encode()));
	}

	LinkDecision::Rewrite(url.into())
}

/// Rewrite every matching anchor in `text`. See [`rewrite_with_report`].
pub fn rewrite(text: &str, rules: &RuleSet, policy: &Policy) -> String {
	rewrite_with_report(text, rules, policy).text
}

/// Rewrite every matching anchor in `text` and report what happened.
///
/// Anchors are found in document order and decided independently. A link
/// that cannot be rewritten is kept byte-for-byte, and everything between
/// anchors is copied verbatim. Never fails.
pub fn rewrite_with_report(text: &str, rules: &RuleSet, policy: &Policy) -> RewriteOutput {
	let mut report = RewriteReport::default();
	let mut edits: Vec<(Range<usize>, String)> = Vec::new();

	for (index, caps) in ANCHOR.captures_iter(text).enumerate() {
		let href = &caps[2];
		let decision = match policy.max_links {
			Some(limit) if index >= limit => LinkDecision::Unmodified(SkipReason::OverLimit),
			_ => decide_link(href, rules, policy),
		};

		tracing::debug!(href, decision = ?decision, "processed link");
		report.record(&decision);

		if let LinkDecision::Rewrite(url) = decision {
			edits.push(rebuild_anchor(text, &caps, &url, policy));
		}
	}

	if report.links_seen > 0 {
		tracing::debug!(
			seen = report.links_seen,
			rewritten = report.rewritten,
			"rewrite finished"
		);
	}

	RewriteOutput {
		text: splice(text, &edits),
		report,
	}
}

/// Build the replacement for one matched anchor.
fn rebuild_anchor(
	text: &str,
	caps: &Captures<'_>,
	url: &str,
	policy: &Policy,
) -> (Range<usize>, String) {
	let (Some(whole), Some(before), Some(after), Some(content)) =
		(caps.get(0), caps.get(1), caps.get(3), caps.get(4))
	else {
		unreachable!("anchor pattern has four capture groups");
	};

	// "<a" with its original case, and "</a>" likewise.
	let open = &text[whole.start()..before.start()];
	let close = &text[content.end()..whole.end()];

	let (before, after) = if policy.add_nofollow {
		ensure_nofollow(before.as_str(), after.as_str())
	} else {
		(before.as_str().into(), after.as_str().into())
	};

	let replacement = format!(
		"{open}{before}href=\"{}\"{after}>{}{close}",
		escape_attr(url),
		escape_text(content.as_str()),
	);
	(whole.range(), replacement)
}

/// Apply non-overlapping, ordered edits to `text` in one pass.
fn splice(text: &str, edits: &[(Range<usize>, String)]) -> String {
	if edits.is_empty() {
		return text.to_string();
	}

	let extra: usize = edits.iter().map(|(_, s)| s.len()).sum();
	let mut out = String::with_capacity(text.len() + extra);
	let mut cursor = 0;
	for (range, replacement) in edits {
		out.push_str(&text[cursor..range.start]);
		out.push_str(replacement);
		cursor = range.end;
	}
	out.push_str(&text[cursor..]);
	out
}
