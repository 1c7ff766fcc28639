use crate::rules::store::{Rule, RuleSet};
use url::Url;

/// A link whose URL parsed with a host component.
#[derive(Debug, Clone)]
pub struct ParsedLink {
	/// The parsed URL. Protocol-relative input is resolved against `https:`.
	pub url: Url,
}

impl ParsedLink {
	/// Parse a link target, returning `None` when it has no host.
	///
	/// Absolute URLs (`https://host/...`) parse as-is. Protocol-relative URLs
	/// (`//host/...`) get the `https` scheme. Anything else, including bare
	/// `host/path` text, `mailto:` and relative paths, has no host.
	pub fn parse(raw: &str) -> Option<Self> {
		let raw = raw.trim();

		let url = if raw.starts_with("//") {
			Url::parse(&format!("https:{raw}")).ok()?
		} else {
			Url::parse(raw).ok()?
		};

		match url.host_str() {
			Some(host) if !host.is_empty() => Some(ParsedLink { url }),
			_ => None,
		}
	}

	pub fn host(&self) -> &str {
		self.url.host_str().unwrap_or_default()
	}
}

/// Find the first rule whose domain matcher is contained in the link's host.
pub fn find_matching_rule<'a>(rules: &'a RuleSet, link: &ParsedLink) -> Option<&'a Rule> {
	rules.find(link.host())
}
