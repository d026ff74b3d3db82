use crate::daemon::Client;
use crate::error::Result;
use crate::paths::BwsrPaths;

/// Tab-separated, one session per line, silent when nothing is running.
pub async fn run(paths: &BwsrPaths) -> Result<()> {
	let client = Client::new(paths.clone());
	for instance in client.list().await? {
		println!(
			"{}\t{}\t{}\t{}",
			instance.session,
			instance.profile,
			instance.cdp_port,
			match instance.status {
				bwsr_protocol::HealthStatus::Healthy => "healthy",
				bwsr_protocol::HealthStatus::Unhealthy => "unhealthy",
			}
		);
	}
	Ok(())
}
