//! Configuration loading and parsing for affilink.
//!
//! This module handles:
//! - TOML config file parsing
//! - Directory cascade discovery
//! - Config merging into one rule text and policy

pub mod cascade;
pub mod parser;
pub mod template;
pub mod types;

pub use cascade::{
	CONFIG_FILE_NAME, discover_configs, load_config_file, load_merged_config, merge_configs,
	user_config_path,
};
pub use parser::{parse_config_file, parse_config_str};
pub use template::generate_init_template;
pub use types::{Config, LoadedConfig, MergedConfig};
