use crate::engine::AffilinkEngine;
use crate::policy::Policy;
use crate::rules::RuleSet;
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration from a `.affilink.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
	/// If true, stop the directory cascade here and only add ~/.affilink.toml.
	#[serde(default)]
	pub root: bool,

	/// Affiliate rules, one `domain=param_key=param_value` per line.
	#[serde(default)]
	pub domains: String,

	/// Replace existing query keys that collide with a rule's keys.
	pub overwrite: Option<bool>,

	/// Add `nofollow` to the `rel` attribute of rewritten anchors.
	pub add_nofollow: Option<bool>,

	/// Only rewrite the first N anchors of each text.
	pub max_links: Option<usize>,
}

impl Config {
	/// The rules defined by this file alone.
	pub fn rule_set(&self) -> RuleSet {
		RuleSet::from_config(&self.domains)
	}
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

/// Merged configuration from every config file in the cascade.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
	/// Rule text from all configs, most specific first (first match wins).
	pub domains: String,

	/// Effective policy; each field comes from the nearest config that sets it.
	pub policy: Policy,

	/// Files that contributed, in cascade order.
	pub sources: Vec<PathBuf>,
}

impl MergedConfig {
	pub fn rule_set(&self) -> RuleSet {
		RuleSet::from_config(&self.domains)
	}

	pub fn engine(&self) -> AffilinkEngine {
		AffilinkEngine::new(self.rule_set(), self.policy)
	}
}
