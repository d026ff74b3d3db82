use std::path::PathBuf;

use crate::error::{BwsrError, Result};
use crate::profile::{Profile, ProfileField};

/// Flat YAML document store, one file per profile.
#[derive(Debug, Clone)]
pub struct ProfileStore {
	dir: PathBuf,
}

impl ProfileStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn create(&self, name: &str, profile: &Profile) -> Result<()> {
		std::fs::create_dir_all(&self.dir)?;
		self.write(name, profile)
	}

	pub fn get(&self, name: &str) -> Result<Option<Profile>> {
		let path = self.path(name);
		if !path.exists() {
			return Ok(None);
		}
		let content = std::fs::read_to_string(&path)?;
		Ok(Some(serde_yaml::from_str(&content)?))
	}

	/// Merge the `Some` fields of `update` into an existing profile.
	pub fn set(&self, name: &str, update: Profile) -> Result<()> {
		let mut profile = self.get(name)?.ok_or_else(|| BwsrError::ProfileNotFound(name.into()))?;
		profile.merge(update);
		self.write(name, &profile)
	}

	pub fn append_args(&self, name: &str, values: &[String]) -> Result<()> {
		let mut profile = self.get(name)?.ok_or_else(|| BwsrError::ProfileNotFound(name.into()))?;
		profile.args.get_or_insert_with(Vec::new).extend(values.iter().cloned());
		self.write(name, &profile)
	}

	pub fn unset(&self, name: &str, fields: &[ProfileField]) -> Result<()> {
		let mut profile = self.get(name)?.ok_or_else(|| BwsrError::ProfileNotFound(name.into()))?;
		for field in fields {
			profile.clear(*field);
		}
		self.write(name, &profile)
	}

	/// Tolerates a missing profile.
	pub fn remove(&self, name: &str) -> Result<()> {
		match std::fs::remove_file(self.path(name)) {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(err) => Err(err.into()),
		}
	}

	pub fn list(&self) -> Vec<String> {
		let Ok(entries) = std::fs::read_dir(&self.dir) else {
			return Vec::new();
		};
		let mut names: Vec<String> = entries
			.filter_map(|e| e.ok())
			.filter_map(|e| {
				let name = e.file_name().into_string().ok()?;
				name.strip_suffix(".yaml").map(str::to_string)
			})
			.collect();
		names.sort();
		names
	}

	fn write(&self, name: &str, profile: &Profile) -> Result<()> {
		std::fs::write(self.path(name), serde_yaml::to_string(profile)?)?;
		Ok(())
	}

	fn path(&self, name: &str) -> PathBuf {
		self.dir.join(format!("{name}.yaml"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::profile::BrowserKind;

	fn store() -> (tempfile::TempDir, ProfileStore) {
		let dir = tempfile::tempdir().unwrap();
		let store = ProfileStore::new(dir.path().join("profiles"));
		(dir, store)
	}

	#[test]
	fn create_then_get() {
		let (_dir, store) = store();
		store.create("work", &Profile::stock()).unwrap();
		let profile = store.get("work").unwrap().unwrap();
		assert_eq!(profile.browser, Some(BrowserKind::Chromium));
		assert_eq!(profile.headless, Some(true));
	}

	#[test]
	fn get_missing_is_none() {
		let (_dir, store) = store();
		assert!(store.get("nope").unwrap().is_none());
	}

	#[test]
	fn set_merges_into_existing() {
		let (_dir, store) = store();
		store.create("work", &Profile::stock()).unwrap();
		store
			.set("work", Profile { locale: Some("de-DE".into()), ..Default::default() })
			.unwrap();
		let profile = store.get("work").unwrap().unwrap();
		assert_eq!(profile.locale.as_deref(), Some("de-DE"));
		assert_eq!(profile.headless, Some(true));
	}

	#[test]
	fn set_missing_is_not_found() {
		let (_dir, store) = store();
		let err = store.set("nope", Profile::default()).unwrap_err();
		assert!(matches!(err, BwsrError::ProfileNotFound(_)));
	}

	#[test]
	fn append_args_accumulates() {
		let (_dir, store) = store();
		store.create("work", &Profile::stock()).unwrap();
		store.append_args("work", &["--foo".into()]).unwrap();
		store.append_args("work", &["--bar".into()]).unwrap();
		let profile = store.get("work").unwrap().unwrap();
		assert_eq!(profile.args.unwrap(), vec!["--foo", "--bar"]);
	}

	#[test]
	fn remove_tolerates_absence() {
		let (_dir, store) = store();
		store.remove("nope").unwrap();
		store.create("work", &Profile::stock()).unwrap();
		store.remove("work").unwrap();
		assert!(store.get("work").unwrap().is_none());
	}

	#[test]
	fn list_is_sorted_and_empty_on_missing_dir() {
		let (_dir, store) = store();
		assert!(store.list().is_empty());
		store.create("b", &Profile::stock()).unwrap();
		store.create("a", &Profile::stock()).unwrap();
		assert_eq!(store.list(), vec!["a", "b"]);
	}
}
