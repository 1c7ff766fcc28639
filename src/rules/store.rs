use std::fmt;

/// A single affiliate rule: a domain matcher and the query fragment to inject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
	/// Substring tested (case-insensitively) against a link's host.
	pub domain: String,

	/// Encoded query fragment, e.g. `tag=mytag-20` or `a=1&b=2`.
	pub params: String,

	/// Lowercased copy of `domain`, punycoded when it holds non-ASCII
	/// labels, used for matching.
	matcher: String,
}

impl Rule {
	/// Create a rule from a domain matcher and a parameter string.
	pub fn new(domain: impl Into<String>, params: impl Into<String>) -> Self {
		let domain = domain.into();
		let matcher = normalize_matcher(&domain);
		Rule {
			domain,
			params: params.into(),
			matcher,
		}
	}
}

/// Parsed hosts come back from `url` in ASCII form, so internationalized
/// matchers are converted the same way. Conversion failures keep the
/// lowercased text.
fn normalize_matcher(domain: &str) -> String {
	let lower = domain.to_lowercase();
	if lower.is_ascii() {
		return lower;
	}
	match idna::domain_to_ascii(&lower) {
		Ok(puny) => puny,
		Err(_) => {
			tracing::trace!(domain, "keeping non-ASCII rule domain unconverted");
			lower
		}
	}
}

impl fmt::Display for Rule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}={}", self.domain, self.params)
	}
}

/// Ordered, immutable collection of rules. First match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
	rules: Vec<Rule>,
}

impl RuleSet {
	/// Build a rule set from raw configuration text.
	///
	/// One rule per line in the form `domain=param_key=param_value`. The first
	/// `=` separates the domain from the parameter string, which is kept
	/// verbatim (it may hold further `=` and `&`). Blank lines, lines without
	/// `=`, and lines with an empty domain are skipped. Never fails.
	pub fn from_config(raw: &str) -> Self {
		let mut rules = Vec::new();

		for (lineno, line) in raw.lines().enumerate() {
			let line = line.trim();
			if line.is_empty() {
				continue;
			}

			let Some((domain, params)) = line.split_once('=') else {
				tracing::trace!(line = lineno + 1, "skipping rule line without '='");
				continue;
			};

			let domain = domain.trim();
			if domain.is_empty() {
				tracing::trace!(line = lineno + 1, "skipping rule line with empty domain");
				continue;
			}

			rules.push(Rule::new(domain, params.trim()));
		}

		RuleSet { rules }
	}

	/// Create a rule set from already-built rules, keeping their order.
	pub fn from_rules(rules: Vec<Rule>) -> Self {
		RuleSet { rules }
	}

	/// Find the first rule whose domain matcher is contained in `host`.
	pub fn find(&self, host: &str) -> Option<&Rule> {
		let host = host.to_lowercase();
		self.rules.iter().find(|rule| host.contains(&rule.matcher))
	}

	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
		self.rules.iter()
	}
}

impl<'a> IntoIterator for &'a RuleSet {
	type Item = &'a Rule;
	type IntoIter = std::slice::Iter<'a, Rule>;

	fn into_iter(self) -> Self::IntoIter {
		self.rules.iter()
	}
}

/// Build a rule set from raw configuration text. See [`RuleSet::from_config`].
pub fn build_rule_set(raw: &str) -> RuleSet {
	RuleSet::from_config(raw)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_build_single_rule() {
		let rules = build_rule_set("amazon.com=tag=mytag-20");
		assert_eq!(rules.len(), 1);
		assert_eq!(rules.rules()[0].domain, "amazon.com");
		assert_eq!(rules.rules()[0].params, "tag=mytag-20");
	}

	#[test]
	fn test_build_skips_malformed_lines() {
		let rules = build_rule_set("justtext\n\namazon.com=tag=x");
		assert_eq!(rules.len(), 1);
		assert_eq!(rules.rules()[0], Rule::new("amazon.com", "tag=x"));
	}

	#[test]
	fn test_build_trims_segments() {
		let rules = build_rule_set("  amazon.com  =  tag=x  \r\n\t example.com=ref=me\t");
		assert_eq!(rules.len(), 2);
		assert_eq!(rules.rules()[0].domain, "amazon.com");
		assert_eq!(rules.rules()[0].params, "tag=x");
		assert_eq!(rules.rules()[1].domain, "example.com");
		assert_eq!(rules.rules()[1].params, "ref=me");
	}

	#[test]
	fn test_build_keeps_multi_pair_params_verbatim() {
		let rules = build_rule_set("shop.example=aff=1&campaign=spring=sale");
		assert_eq!(rules.rules()[0].params, "aff=1&campaign=spring=sale");
	}

	#[test]
	fn test_build_keeps_duplicate_domains_in_order() {
		let rules = build_rule_set("a.com=k=1\na.com=k=2");
		assert_eq!(rules.len(), 2);
		assert_eq!(rules.find("www.a.com").unwrap().params, "k=1");
	}

	#[test]
	fn test_build_skips_empty_domain() {
		let rules = build_rule_set("=tag=x\namazon.com=");
		assert_eq!(rules.len(), 1);
		assert_eq!(rules.rules()[0].domain, "amazon.com");
		assert_eq!(rules.rules()[0].params, "");
	}

	#[test]
	fn test_build_empty_input() {
		assert!(build_rule_set("").is_empty());
		assert!(build_rule_set("\n\n   \n").is_empty());
	}

	#[test]
	fn test_find_is_case_insensitive_substring() {
		let rules = build_rule_set("Amazon.COM=tag=x");
		assert!(rules.find("www.amazon.com").is_some());
		assert!(rules.find("SMILE.AMAZON.COM").is_some());
		assert!(rules.find("amazon.co.uk").is_none());
	}

	#[test]
	fn test_find_first_match_wins() {
		let rules = build_rule_set("amazon=tag=generic\namazon.com=tag=specific");
		assert_eq!(rules.find("amazon.com").unwrap().params, "tag=generic");
	}

	#[test]
	fn test_from_rules_keeps_order() {
		let rules = RuleSet::from_rules(vec![Rule::new("b.com", "k=1"), Rule::new("B.COM", "k=2")]);
		let params: Vec<_> = rules.iter().map(|r| r.params.as_str()).collect();
		assert_eq!(params, vec!["k=1", "k=2"]);
		assert_eq!(rules.find("www.b.com").unwrap().params, "k=1");
	}

	#[test]
	fn test_rule_display_round_trips_config_line() {
		let rule = Rule::new("amazon.com", "tag=mytag-20");
		assert_eq!(rule.to_string(), "amazon.com=tag=mytag-20");
	}

	#[test]
	fn test_find_internationalized_domain_matches_punycoded_host() {
		let rules = build_rule_set("Bücher.de=ref=x");
		assert_eq!(rules.rules()[0].domain, "Bücher.de");
		assert_eq!(rules.rules()[0].to_string(), "Bücher.de=ref=x");
		assert!(rules.find("www.xn--bcher-kva.de").is_some());
		assert!(rules.find("www.buecher.de").is_none());
	}
}
