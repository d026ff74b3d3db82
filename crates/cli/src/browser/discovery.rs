//! Locates a browser executable for a given engine.
//!
//! Preference order: the Playwright browser cache (a known-good build),
//! then well-known system install paths, then `$PATH`.

use std::path::{Path, PathBuf};

use crate::profile::BrowserKind;

fn playwright_cache() -> Option<PathBuf> {
	dirs::home_dir().map(|home| home.join(".cache").join("ms-playwright"))
}

fn system_candidates(kind: BrowserKind) -> &'static [&'static str] {
	match kind {
		BrowserKind::Chromium => &[
			"/usr/bin/chromium",
			"/usr/bin/chromium-browser",
			"/usr/bin/google-chrome",
			"/usr/bin/google-chrome-stable",
			"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
			"/Applications/Chromium.app/Contents/MacOS/Chromium",
		],
		BrowserKind::Firefox => {
			&["/usr/bin/firefox", "/Applications/Firefox.app/Contents/MacOS/firefox"]
		}
		// WebKit ships only via the Playwright cache.
		BrowserKind::Webkit => &[],
	}
}

fn path_candidates(kind: BrowserKind) -> &'static [&'static str] {
	match kind {
		BrowserKind::Chromium => &["chromium", "chromium-browser", "google-chrome"],
		BrowserKind::Firefox => &["firefox"],
		BrowserKind::Webkit => &[],
	}
}

/// Relative executable path inside a Playwright cache entry.
pub fn playwright_executable(kind: BrowserKind) -> &'static str {
	if cfg!(target_os = "macos") {
		match kind {
			BrowserKind::Chromium => "chrome-mac/Chromium.app/Contents/MacOS/Chromium",
			BrowserKind::Firefox => "firefox/Nightly.app/Contents/MacOS/firefox",
			BrowserKind::Webkit => "pw_run.app/Contents/MacOS/pw_run",
		}
	} else {
		match kind {
			BrowserKind::Chromium => "chrome-linux/chrome",
			BrowserKind::Firefox => "firefox/firefox",
			BrowserKind::Webkit => "playwright-webkit/pw_run.sh",
		}
	}
}

/// Newest `<browser>-<revision>` entry in the cache that actually contains
/// the executable.
pub fn find_playwright_browser(cache: &Path, kind: BrowserKind) -> Option<PathBuf> {
	let prefix = format!("{kind}-");
	let mut entries: Vec<String> = std::fs::read_dir(cache)
		.ok()?
		.filter_map(|e| e.ok())
		.filter_map(|e| e.file_name().into_string().ok())
		.filter(|name| name.starts_with(&prefix))
		.collect();
	entries.sort();

	for entry in entries.into_iter().rev() {
		let candidate = cache.join(entry).join(playwright_executable(kind));
		if candidate.exists() {
			return Some(candidate);
		}
	}
	None
}

fn find_system_browser(kind: BrowserKind) -> Option<PathBuf> {
	for candidate in system_candidates(kind) {
		let path = Path::new(candidate);
		if path.exists() {
			return Some(path.to_path_buf());
		}
	}
	for name in path_candidates(kind) {
		if let Ok(path) = which::which(name) {
			return Some(path);
		}
	}
	None
}

pub async fn discover_browser(kind: BrowserKind) -> Option<PathBuf> {
	if let Some(cache) = playwright_cache() {
		if let Some(path) = find_playwright_browser(&cache, kind) {
			return Some(path);
		}
	}
	find_system_browser(kind)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fake_install(cache: &Path, entry: &str, kind: BrowserKind) {
		let exec = cache.join(entry).join(playwright_executable(kind));
		std::fs::create_dir_all(exec.parent().unwrap()).unwrap();
		std::fs::write(&exec, "").unwrap();
	}

	#[test]
	fn prefers_newest_cache_entry() {
		let dir = tempfile::tempdir().unwrap();
		fake_install(dir.path(), "chromium-1100", BrowserKind::Chromium);
		fake_install(dir.path(), "chromium-1099", BrowserKind::Chromium);

		let found = find_playwright_browser(dir.path(), BrowserKind::Chromium).unwrap();
		assert!(found.to_string_lossy().contains("chromium-1100"));
	}

	#[test]
	fn skips_entries_missing_the_executable() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir_all(dir.path().join("chromium-1200")).unwrap();
		fake_install(dir.path(), "chromium-1100", BrowserKind::Chromium);

		let found = find_playwright_browser(dir.path(), BrowserKind::Chromium).unwrap();
		assert!(found.to_string_lossy().contains("chromium-1100"));
	}

	#[test]
	fn empty_cache_finds_nothing() {
		let dir = tempfile::tempdir().unwrap();
		assert!(find_playwright_browser(dir.path(), BrowserKind::Firefox).is_none());
	}

	#[test]
	fn other_engines_do_not_match() {
		let dir = tempfile::tempdir().unwrap();
		fake_install(dir.path(), "firefox-1474", BrowserKind::Firefox);
		assert!(find_playwright_browser(dir.path(), BrowserKind::Chromium).is_none());
		assert!(find_playwright_browser(dir.path(), BrowserKind::Firefox).is_some());
	}
}
