use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::profile::{BrowserKind, ColorScheme, ProfileField, Viewport};

#[derive(Parser, Debug)]
#[command(name = "bwsr")]
#[command(about = "Shared browser sessions behind a lazily started daemon")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Start a session, or print the one already running
	Start {
		/// Profile to launch from
		#[arg(long, default_value = "default")]
		profile: String,
		/// Named session (always starts a new one)
		#[arg(long)]
		session: Option<String>,
		/// Start a new session even if one exists
		#[arg(long)]
		force: bool,
	},
	/// Stop a session (auto-selects when only one is running)
	Stop {
		session: Option<String>,
		/// Stop every session
		#[arg(long)]
		all: bool,
	},
	/// List running sessions, one per line, tab-separated
	List,
	/// Print the debug port of a session
	Cdp { session: Option<String> },
	/// Manage launch profiles
	Profile {
		#[command(subcommand)]
		command: ProfileCommand,
	},
	/// Check browsers, profiles and daemon status
	Doctor,
	/// Run the watchdog in the foreground (spawned by the bootstrap)
	#[command(hide = true)]
	Watchdog,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
	/// Create a profile with stock settings (chromium, headless)
	Create { name: String },
	/// Update fields of an existing profile
	Set {
		name: String,
		#[arg(long, value_enum)]
		browser: Option<BrowserKind>,
		/// Executable path overriding discovery
		#[arg(long)]
		executable: Option<PathBuf>,
		#[arg(long, conflicts_with = "headed")]
		headless: bool,
		#[arg(long)]
		headed: bool,
		/// Viewport as WIDTHxHEIGHT, e.g. 1280x720
		#[arg(long, value_parser = parse_viewport)]
		viewport: Option<Viewport>,
		#[arg(long)]
		locale: Option<String>,
		#[arg(long)]
		timezone: Option<String>,
		#[arg(long, value_enum)]
		color_scheme: Option<ColorScheme>,
		#[arg(long)]
		user_agent: Option<String>,
		#[arg(long)]
		proxy: Option<String>,
		#[arg(long)]
		ignore_https_errors: bool,
		#[arg(long)]
		offline: bool,
		/// Extra launch arguments to append (repeatable)
		#[arg(long = "arg")]
		args: Vec<String>,
	},
	/// Reset fields back to unset
	Unset {
		name: String,
		#[arg(value_enum, required = true)]
		fields: Vec<ProfileField>,
	},
	/// Delete a profile (running sessions keep their snapshot)
	Remove { name: String },
	/// List profile names
	List,
	/// Print a profile as YAML
	Show { name: String },
}

fn parse_viewport(value: &str) -> Result<Viewport, String> {
	let (width, height) =
		value.split_once('x').ok_or_else(|| "expected WIDTHxHEIGHT, e.g. 1280x720".to_string())?;
	let width = width.parse().map_err(|_| format!("invalid width: {width}"))?;
	let height = height.parse().map_err(|_| format!("invalid height: {height}"))?;
	Ok(Viewport { width, height })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cli_parses_start_with_flags() {
		let cli =
			Cli::try_parse_from(["bwsr", "start", "--profile", "work", "--session", "happy-fox"])
				.unwrap();
		let Command::Start { profile, session, force } = cli.command else {
			panic!("expected start");
		};
		assert_eq!(profile, "work");
		assert_eq!(session.as_deref(), Some("happy-fox"));
		assert!(!force);
	}

	#[test]
	fn viewport_parses_wxh() {
		let viewport = parse_viewport("1280x720").unwrap();
		assert_eq!((viewport.width, viewport.height), (1280, 720));
		assert!(parse_viewport("1280").is_err());
		assert!(parse_viewport("axb").is_err());
	}

	#[test]
	fn headed_conflicts_with_headless() {
		let err = Cli::try_parse_from(["bwsr", "profile", "set", "p", "--headless", "--headed"]);
		assert!(err.is_err());
	}
}
