use crate::daemon::Client;
use crate::error::Result;
use crate::paths::BwsrPaths;

pub async fn run(paths: &BwsrPaths, session: Option<&str>) -> Result<()> {
	let client = Client::new(paths.clone());
	let port = client.cdp(session).await?;
	println!("{port}");
	Ok(())
}
