use crate::daemon::Client;
use crate::error::{BwsrError, Result};
use crate::paths::BwsrPaths;

pub async fn run(paths: &BwsrPaths, session: Option<&str>, all: bool) -> Result<()> {
	let client = Client::new(paths.clone());

	if all {
		return client.stop_all().await;
	}

	let session = match session {
		Some(session) => session.to_string(),
		// No name given: stop the single running session, or make the user
		// pick when there are several.
		None => {
			let instances = client.list().await?;
			match instances.as_slice() {
				[] => return Err(BwsrError::Other(anyhow::anyhow!("no sessions running"))),
				[only] => only.session.clone(),
				many => {
					eprintln!("Multiple sessions running. Specify which to stop:");
					for instance in many {
						eprintln!("  bwsr stop {}", instance.session);
					}
					eprintln!("  bwsr stop --all");
					return Err(BwsrError::Other(anyhow::anyhow!("multiple sessions running")));
				}
			}
		}
	};

	client.stop(&session).await
}
