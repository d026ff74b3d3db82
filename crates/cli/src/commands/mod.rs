mod cdp;
mod doctor;
mod list;
mod profile;
mod start;
mod stop;
mod watchdog;

use crate::cli::{Cli, Command};
use crate::error::Result;
use crate::paths::BwsrPaths;

pub async fn dispatch(cli: Cli) -> Result<()> {
	let paths = BwsrPaths::resolve();

	match cli.command {
		Command::Start { profile, session, force } => {
			start::run(&paths, &profile, session.as_deref(), force, cli.verbose > 0).await
		}
		Command::Stop { session, all } => stop::run(&paths, session.as_deref(), all).await,
		Command::List => list::run(&paths).await,
		Command::Cdp { session } => cdp::run(&paths, session.as_deref()).await,
		Command::Profile { command } => profile::run(&paths, command),
		Command::Doctor => doctor::run(&paths).await,
		Command::Watchdog => watchdog::run(paths).await,
	}
}
