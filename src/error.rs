use std::path::PathBuf;

/// Library-level structured errors for affilink.
///
/// Only the configuration and I/O surface can fail. Link rewriting itself
/// never returns an error: a link that cannot be rewritten is left unchanged.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum AffilinkError {
	#[error("Config file not found: {path}")]
	ConfigNotFound { path: PathBuf },

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Config file already exists: {path}")]
	ConfigExists { path: PathBuf },

	#[error("Failed to read rules file: {path}")]
	RulesReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to read input: {name}")]
	InputReadError {
		name: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write output")]
	OutputWriteError {
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using AffilinkError.
pub type Result<T> = std::result::Result<T, AffilinkError>;
