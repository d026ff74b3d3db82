use crate::cli::ProfileCommand;
use crate::error::{BwsrError, Result};
use crate::paths::BwsrPaths;
use crate::profile::{Profile, ProfileStore};

pub fn run(paths: &BwsrPaths, command: ProfileCommand) -> Result<()> {
	paths.ensure_directories()?;
	let store = ProfileStore::new(paths.profiles());

	match command {
		ProfileCommand::Create { name } => {
			if store.get(&name)?.is_some() {
				return Err(BwsrError::ProfileExists(name));
			}
			store.create(&name, &Profile::stock())?;
			println!("Created profile '{name}'");
			Ok(())
		}
		ProfileCommand::Set {
			name,
			browser,
			executable,
			headless,
			headed,
			viewport,
			locale,
			timezone,
			color_scheme,
			user_agent,
			proxy,
			ignore_https_errors,
			offline,
			args,
		} => {
			let update = Profile {
				browser,
				executable,
				headless: match (headless, headed) {
					(true, _) => Some(true),
					(_, true) => Some(false),
					_ => None,
				},
				viewport,
				locale,
				timezone,
				color_scheme,
				user_agent,
				proxy,
				ignore_https_errors: ignore_https_errors.then_some(true),
				offline: offline.then_some(true),
				args: None,
			};
			store.set(&name, update)?;
			if !args.is_empty() {
				store.append_args(&name, &args)?;
			}
			println!("Updated profile '{name}'");
			Ok(())
		}
		ProfileCommand::Unset { name, fields } => {
			store.unset(&name, &fields)?;
			println!("Updated profile '{name}'");
			Ok(())
		}
		ProfileCommand::Remove { name } => {
			store.remove(&name)?;
			println!("Removed profile '{name}'");
			Ok(())
		}
		ProfileCommand::List => {
			for name in store.list() {
				println!("{name}");
			}
			Ok(())
		}
		ProfileCommand::Show { name } => {
			let profile =
				store.get(&name)?.ok_or_else(|| BwsrError::ProfileNotFound(name.clone()))?;
			print!("{}", serde_yaml::to_string(&profile)?);
			Ok(())
		}
	}
}
