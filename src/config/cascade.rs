use crate::config::parser::parse_config_file;
use crate::config::types::{LoadedConfig, MergedConfig};
use crate::error::{AffilinkError, Result};
use crate::policy::Policy;
use std::path::{Path, PathBuf};

/// Name of the config file looked up in each directory.
pub const CONFIG_FILE_NAME: &str = ".affilink.toml";

/// Environment variable that, if truthy, skips ~/.affilink.toml.
pub const NO_USER_CONFIG_ENV: &str = "AFFILINK_NO_USER_CONFIG";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.affilink.toml`
/// 2. If found and `root = true`, skip to user config only
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check ~/.affilink.toml (unless disabled)
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();
	let mut current_dir = start_dir.to_path_buf();

	loop {
		let config_path = current_dir.join(CONFIG_FILE_NAME);

		if config_path.exists() {
			let config = parse_config_file(&config_path)?;
			let is_root = config.root;
			tracing::debug!(path = %config_path.display(), root = is_root, "loaded config");

			configs.push(LoadedConfig {
				config,
				path: config_path,
			});

			if is_root {
				break;
			}
		}

		match current_dir.parent() {
			Some(parent) => current_dir = parent.to_path_buf(),
			None => break,
		}
	}

	if let Some(user_config) = load_user_config(&configs)? {
		configs.push(user_config);
	}

	Ok(configs)
}

/// Load the user's ~/.affilink.toml if it exists, isn't disabled, and wasn't
/// already picked up by the directory walk.
fn load_user_config(existing_configs: &[LoadedConfig]) -> Result<Option<LoadedConfig>> {
	if is_env_truthy(NO_USER_CONFIG_ENV) {
		return Ok(None);
	}

	let user_config_path = user_config_path()?;
	if existing_configs.iter().any(|c| c.path == user_config_path) {
		return Ok(None);
	}

	if user_config_path.exists() {
		let config = parse_config_file(&user_config_path)?;
		Ok(Some(LoadedConfig {
			config,
			path: user_config_path,
		}))
	} else {
		Ok(None)
	}
}

/// Load a single config file named explicitly, e.g. with `--config`.
pub fn load_config_file(path: &Path) -> Result<LoadedConfig> {
	if !path.exists() {
		return Err(AffilinkError::ConfigNotFound {
			path: path.to_path_buf(),
		});
	}

	Ok(LoadedConfig {
		config: parse_config_file(path)?,
		path: path.to_path_buf(),
	})
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var_name: &str) -> bool {
	match std::env::var(var_name) {
		Ok(value) => {
			let lower = value.to_lowercase();
			!value.is_empty() && lower != "0" && lower != "false" && lower != "no"
		}
		Err(_) => false,
	}
}

/// Merge multiple configs into a single effective config.
///
/// Rule text is concatenated in cascade order, so the nearest config's rules
/// shadow farther ones under first-match-wins. Each policy field takes the
/// value from the nearest config that sets it.
pub fn merge_configs(configs: &[LoadedConfig]) -> MergedConfig {
	let mut merged = MergedConfig::default();
	let mut overwrite = None;
	let mut add_nofollow = None;
	let mut max_links = None;

	for loaded in configs {
		let config = &loaded.config;

		if !config.domains.trim().is_empty() {
			if !merged.domains.is_empty() {
				merged.domains.push('\n');
			}
			merged.domains.push_str(config.domains.trim_end());
		}

		overwrite = overwrite.or(config.overwrite);
		add_nofollow = add_nofollow.or(config.add_nofollow);
		max_links = max_links.or(config.max_links);

		merged.sources.push(loaded.path.clone());
	}

	merged.policy = Policy {
		overwrite: overwrite.unwrap_or(false),
		add_nofollow: add_nofollow.unwrap_or(false),
		max_links,
	};

	merged
}

/// Convenience function to discover, load, and merge configs from a directory.
pub fn load_merged_config(start_dir: &Path) -> Result<MergedConfig> {
	let configs = discover_configs(start_dir)?;
	Ok(merge_configs(&configs))
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(AffilinkError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}
