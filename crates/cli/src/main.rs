use bwsr_cli::{cli::Cli, commands, logging};
use clap::Parser;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		eprintln!("{err}");
		std::process::exit(1);
	}
}
