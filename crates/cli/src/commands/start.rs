use crate::daemon::Client;
use crate::error::{BwsrError, Result};
use crate::paths::BwsrPaths;
use crate::profile::{Profile, ProfileStore};

pub async fn run(
	paths: &BwsrPaths,
	profile: &str,
	session: Option<&str>,
	force: bool,
	verbose: bool,
) -> Result<()> {
	paths.ensure_directories()?;
	let client = Client::new(paths.clone());

	// With no explicit session requested, reuse one that is already running.
	if session.is_none() && !force {
		let instances = client.list().await?;
		if let Some(instance) = instances.first() {
			if verbose {
				println!("Session: {}", instance.session);
				println!("CDP: {}", instance.cdp_port);
				println!("Profile: {}", instance.profile);
				println!("(already running, use --force to start another)");
			} else {
				println!("{}", instance.session);
			}
			return Ok(());
		}
	}

	// The default profile is created on demand; any other missing profile
	// is the user's to create.
	let store = ProfileStore::new(paths.profiles());
	if store.get(profile)?.is_none() {
		if profile == "default" {
			store.create("default", &Profile::stock())?;
			println!("Created default profile (chromium, headless)");
		} else {
			eprintln!("Create it with: bwsr profile create {profile}");
			return Err(BwsrError::ProfileNotFound(profile.to_string()));
		}
	}

	let (session, cdp_port) = client.start(profile, session.unwrap_or("")).await?;

	if verbose {
		println!("Session: {session}");
		println!("CDP: {cdp_port}");
		println!("Profile: {profile}");
	} else {
		println!("{session}");
	}
	Ok(())
}
