//! Persisted launch profiles.
//!
//! A profile is a YAML document under the profiles directory. It is an
//! immutable input to session creation: the watchdog snapshots it when a
//! session starts, and later edits never affect running sessions.

mod store;

pub use store::ProfileStore;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Browser engine for a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
	/// Chromium-based browser (Chrome, Edge)
	#[default]
	Chromium,
	/// Mozilla Firefox
	Firefox,
	/// WebKit (Safari)
	Webkit,
}

impl std::fmt::Display for BrowserKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			BrowserKind::Chromium => write!(f, "chromium"),
			BrowserKind::Firefox => write!(f, "firefox"),
			BrowserKind::Webkit => write!(f, "webkit"),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
	pub width: u32,
	pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorScheme {
	Light,
	Dark,
	NoPreference,
}

/// A session launch configuration. Every field is optional; the launcher
/// applies defaults (chromium, headless) for anything unset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub browser: Option<BrowserKind>,
	/// Explicit executable path, overriding discovery.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub executable: Option<PathBuf>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub headless: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub viewport: Option<Viewport>,
	/// Extra launch arguments, appended before the debugging flag.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub args: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub locale: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timezone: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub color_scheme: Option<ColorScheme>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_agent: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub proxy: Option<String>,
	#[serde(rename = "ignoreHTTPSErrors", skip_serializing_if = "Option::is_none")]
	pub ignore_https_errors: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub offline: Option<bool>,
}

impl Profile {
	/// The stock profile created on first use: chromium, headless.
	pub fn stock() -> Self {
		Self { browser: Some(BrowserKind::Chromium), headless: Some(true), ..Default::default() }
	}

	pub fn browser_kind(&self) -> BrowserKind {
		self.browser.unwrap_or_default()
	}

	/// Overlay the `Some` fields of `update` onto this profile.
	pub fn merge(&mut self, update: Profile) {
		macro_rules! take {
			($field:ident) => {
				if update.$field.is_some() {
					self.$field = update.$field;
				}
			};
		}
		take!(browser);
		take!(executable);
		take!(headless);
		take!(viewport);
		take!(args);
		take!(locale);
		take!(timezone);
		take!(color_scheme);
		take!(user_agent);
		take!(proxy);
		take!(ignore_https_errors);
		take!(offline);
	}

	pub fn clear(&mut self, field: ProfileField) {
		match field {
			ProfileField::Browser => self.browser = None,
			ProfileField::Executable => self.executable = None,
			ProfileField::Headless => self.headless = None,
			ProfileField::Viewport => self.viewport = None,
			ProfileField::Args => self.args = None,
			ProfileField::Locale => self.locale = None,
			ProfileField::Timezone => self.timezone = None,
			ProfileField::ColorScheme => self.color_scheme = None,
			ProfileField::UserAgent => self.user_agent = None,
			ProfileField::Proxy => self.proxy = None,
			ProfileField::IgnoreHttpsErrors => self.ignore_https_errors = None,
			ProfileField::Offline => self.offline = None,
		}
	}
}

/// Profile field names, for `profile unset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProfileField {
	Browser,
	Executable,
	Headless,
	Viewport,
	Args,
	Locale,
	Timezone,
	ColorScheme,
	UserAgent,
	Proxy,
	IgnoreHttpsErrors,
	Offline,
}
