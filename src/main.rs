use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use affilink::config::{
	CONFIG_FILE_NAME, MergedConfig, discover_configs, generate_init_template, load_config_file,
	load_merged_config, merge_configs, user_config_path,
};
use affilink::rules::{ParsedLink, find_matching_rule};
use affilink::{AffilinkError, LinkDecision, decide_link};

#[derive(Parser)]
#[command(name = "affilink")]
#[command(
	author,
	version,
	about = "Rewrite outbound links in HTML to carry affiliate parameters"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Create a template .affilink.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .affilink.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,

	/// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
	#[arg(short, long, action = ArgAction::Count, global = true)]
	verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Rewrite links in a file (or stdin) and print the result
	Rewrite {
		/// Input file; reads stdin when omitted or "-"
		input: Option<PathBuf>,

		/// Print link counts to stderr
		#[arg(long)]
		report: bool,

		#[command(flatten)]
		rules: RuleArgs,
	},
	/// Show what would happen to a single URL
	Check {
		/// The href value to check
		url: String,

		#[command(flatten)]
		rules: RuleArgs,
	},
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display merged effective configuration with source annotations
	Show,
	/// Check all config files for errors without rewriting anything
	Validate,
}

/// Where rules and policy come from, plus command-line overrides.
#[derive(Args)]
struct RuleArgs {
	/// Use this config file instead of discovering .affilink.toml files
	#[arg(long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Read rule lines from this file instead of the config's `domains`
	#[arg(long, value_name = "FILE")]
	rules: Option<PathBuf>,

	/// Replace existing affiliate parameters
	#[arg(long)]
	overwrite: bool,

	/// Add rel="nofollow" to rewritten links
	#[arg(long)]
	nofollow: bool,

	/// Only consider the first N links
	#[arg(long, value_name = "N")]
	max_links: Option<usize>,
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	match run(cli) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_logging(verbose: u8) {
	let default_level = match verbose {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn run(cli: Cli) -> Result<ExitCode> {
	// Handle --init
	if cli.init {
		return handle_init(cli.force);
	}

	match cli.command {
		Some(Commands::Rewrite {
			input,
			report,
			rules,
		}) => handle_rewrite(input.as_deref(), report, &rules),
		Some(Commands::Check { url, rules }) => handle_check(&url, &rules),
		Some(Commands::Config { action }) => match action {
			ConfigAction::Show => handle_config_show(),
			ConfigAction::Validate => handle_config_validate(),
		},
		// No command specified - this shouldn't happen due to arg_required_else_help
		None => Ok(ExitCode::SUCCESS),
	}
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		return Err(AffilinkError::ConfigExists { path: config_path })
			.context("Use --force to overwrite");
	}

	std::fs::write(&config_path, generate_init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {CONFIG_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}

/// Resolve the effective rules and policy for a rewrite or check.
fn load_effective_config(args: &RuleArgs) -> Result<MergedConfig> {
	let mut merged = match args.config {
		Some(ref path) => {
			let loaded = load_config_file(path).context("Failed to load configuration")?;
			merge_configs(&[loaded])
		}
		None => {
			let cwd = std::env::current_dir().context("Failed to get current directory")?;
			load_merged_config(&cwd).context("Failed to load configuration")?
		}
	};

	if let Some(ref rules_path) = args.rules {
		merged.domains =
			std::fs::read_to_string(rules_path).map_err(|source| AffilinkError::RulesReadError {
				path: rules_path.clone(),
				source,
			})?;
	}

	if args.overwrite {
		merged.policy.overwrite = true;
	}
	if args.nofollow {
		merged.policy.add_nofollow = true;
	}
	if args.max_links.is_some() {
		merged.policy.max_links = args.max_links;
	}

	Ok(merged)
}

fn read_input(input: Option<&Path>) -> Result<String> {
	let text = match input {
		Some(path) if path != Path::new("-") => {
			std::fs::read_to_string(path).map_err(|source| AffilinkError::InputReadError {
				name: path.display().to_string(),
				source,
			})?
		}
		_ => {
			let mut buf = String::new();
			std::io::stdin()
				.read_to_string(&mut buf)
				.map_err(|source| AffilinkError::InputReadError {
					name: "<stdin>".to_string(),
					source,
				})?;
			buf
		}
	};
	Ok(text)
}

fn handle_rewrite(input: Option<&Path>, report: bool, args: &RuleArgs) -> Result<ExitCode> {
	let merged = load_effective_config(args)?;
	let engine = merged.engine();

	let text = read_input(input)?;
	let output = engine.rewrite_with_report(&text);

	let mut stdout = std::io::stdout().lock();
	stdout
		.write_all(output.text.as_bytes())
		.and_then(|()| stdout.flush())
		.map_err(|source| AffilinkError::OutputWriteError { source })?;

	if report {
		eprintln!("{}", output.report);
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_check(url: &str, args: &RuleArgs) -> Result<ExitCode> {
	let merged = load_effective_config(args)?;
	let rules = merged.rule_set();

	if let Some(link) = ParsedLink::parse(url)
		&& let Some(rule) = find_matching_rule(&rules, &link)
	{
		println!("rule: {rule}");
	}

	match decide_link(url, &rules, &merged.policy) {
		LinkDecision::Rewrite(rewritten) => println!("rewrite: {rewritten}"),
		LinkDecision::Unmodified(reason) => println!("unmodified: {reason}"),
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_show() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let configs = discover_configs(&cwd).context("Failed to discover config files")?;

	if configs.is_empty() {
		println!("No configuration files found.");
		return Ok(ExitCode::SUCCESS);
	}

	println!("Configuration files (in cascade order):\n");

	for loaded in &configs {
		let config = &loaded.config;
		println!("# Source: {}", loaded.path.display());
		println!("# root: {}", config.root);
		if let Some(overwrite) = config.overwrite {
			println!("# overwrite: {overwrite}");
		}
		if let Some(add_nofollow) = config.add_nofollow {
			println!("# add-nofollow: {add_nofollow}");
		}
		if let Some(max_links) = config.max_links {
			println!("# max-links: {max_links}");
		}

		let rules = config.rule_set();
		println!("# rules: {}", rules.len());
		for (i, rule) in rules.iter().enumerate() {
			println!("  Rule {}: {}", i + 1, rule);
		}
		println!();
	}

	let merged = merge_configs(&configs);
	println!("Effective policy:");
	println!("  overwrite: {}", merged.policy.overwrite);
	println!("  add-nofollow: {}", merged.policy.add_nofollow);
	match merged.policy.max_links {
		Some(max_links) => println!("  max-links: {max_links}"),
		None => println!("  max-links: unlimited"),
	}
	println!();

	// Show user config path
	if let Ok(user_path) = user_config_path() {
		println!("User config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;

	match discover_configs(&cwd) {
		Ok(configs) => {
			if configs.is_empty() {
				println!("No configuration files found.");
			} else {
				println!("All configuration files are valid:");
				for loaded in &configs {
					let rules = loaded.config.rule_set();
					let lines = loaded
						.config
						.domains
						.lines()
						.filter(|l| !l.trim().is_empty())
						.count();
					println!(
						"  {} ({} rules, {} lines ignored)",
						loaded.path.display(),
						rules.len(),
						lines - rules.len()
					);
				}
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {e}");
			Ok(ExitCode::FAILURE)
		}
	}
}
