//! Node image decoration: initials fallbacks and single-flight photo jobs.
//!
//! A photo is decorated (loaded, masked to a circle and ringed in the sex
//! colour) asynchronously. The cache below records which photo URL each node
//! was last dispatched for *before* the job resolves, so repeated
//! reconciliation passes over an unchanged URL never dispatch twice. Each
//! dispatch carries a generation token; a result is only applied while its
//! token is still current.

use std::collections::HashMap;

use thiserror::Error;

use super::config::{Color, sex_color};
use super::types::{PersonId, Sex};

/// What a node currently draws inside its disc.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageHandle {
	/// Initials on a disc in the sex colour. Computed synchronously.
	Initials { text: String, background: Color },
	/// A decorated photo, encoded as a data URL.
	Composited(String),
	/// The undecorated photo URL, used when decoration failed.
	Raw(String),
}

impl ImageHandle {
	pub fn initials_for(display_name: &str, sex: Sex) -> Self {
		Self::Initials {
			text: initials(display_name),
			background: sex_color(sex),
		}
	}

	/// Text drawn while no photo is showing. A photo that is still loading or
	/// failed to load falls back to initials derived from `display_name`.
	pub fn fallback_text(&self, display_name: &str) -> String {
		match self {
			Self::Initials { text, .. } => text.clone(),
			Self::Composited(_) | Self::Raw(_) => initials(display_name),
		}
	}

	/// The URL the renderer must fetch, if any.
	pub fn url(&self) -> Option<&str> {
		match self {
			Self::Initials { .. } => None,
			Self::Composited(url) | Self::Raw(url) => Some(url),
		}
	}
}

/// Two-letter initials: first letters of the first and last word, or the
/// first two letters of a single word. `?` for a blank name.
pub fn initials(name: &str) -> String {
	let words: Vec<&str> = name.split_whitespace().collect();
	let picked: String = match words.as_slice() {
		[] => return "?".to_owned(),
		[single] => single.chars().take(2).collect(),
		[first, .., last] => first.chars().take(1).chain(last.chars().take(1)).collect(),
	};
	picked.to_uppercase()
}

#[derive(Debug, Error)]
pub enum DecorationError {
	#[error("photo {url} failed to load")]
	Load { url: String },
	#[error("could not composite photo {url}: {reason}")]
	Composite { url: String, reason: String },
}

/// A decoration job the host must run for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct DecorationRequest {
	pub id: PersonId,
	pub photo_url: String,
	pub sex: Sex,
	pub generation: u64,
}

#[derive(Clone, Debug, PartialEq)]
struct DecorationEntry {
	photo_url: Option<String>,
	generation: u64,
}

/// Photo URL each node was last decorated for.
#[derive(Debug, Default)]
pub struct DecorationCache {
	entries: HashMap<PersonId, DecorationEntry>,
	next_generation: u64,
}

impl DecorationCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `photo_url` for `id` if it differs from the last recorded value
	/// (including to or from absent, and the first sighting of a node).
	///
	/// Returns the new generation token when the value changed, `None` when
	/// nothing needs to be dispatched.
	pub fn record(&mut self, id: &PersonId, photo_url: Option<&str>) -> Option<u64> {
		if let Some(entry) = self.entries.get(id) {
			if entry.photo_url.as_deref() == photo_url {
				return None;
			}
		}
		self.next_generation += 1;
		let generation = self.next_generation;
		self.entries.insert(
			id.clone(),
			DecorationEntry {
				photo_url: photo_url.map(str::to_owned),
				generation,
			},
		);
		Some(generation)
	}

	/// Whether a job dispatched with `generation` is still the latest for `id`.
	pub fn is_current(&self, id: &PersonId, generation: u64) -> bool {
		self.entries
			.get(id)
			.is_some_and(|entry| entry.generation == generation)
	}

	pub fn forget(&mut self, id: &PersonId) {
		self.entries.remove(id);
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case("Joe Bloggs", "JB")]
	#[case("  mary   anne  smith ", "MS")]
	#[case("Prince", "PR")]
	#[case("q", "Q")]
	#[case("   ", "?")]
	#[case("élodie durand", "ÉD")]
	fn extracts_initials(#[case] name: &str, #[case] expected: &str) {
		assert_eq!(initials(name), expected);
	}

	#[test]
	fn initials_disc_uses_sex_color() {
		let handle = ImageHandle::initials_for("Ann Lee", Sex::Female);
		assert_eq!(
			handle,
			ImageHandle::Initials {
				text: "AL".into(),
				background: sex_color(Sex::Female),
			}
		);
		assert_eq!(handle.url(), None);
	}

	#[test]
	fn broken_photo_still_shows_initials() {
		let raw = ImageHandle::Raw("https://img.test/missing.png".into());
		assert_eq!(raw.fallback_text("Raj Patel"), "RP");

		let initials = ImageHandle::initials_for("Kit", Sex::Other);
		assert_eq!(initials.fallback_text("ignored"), "KI");
	}

	#[test]
	fn unchanged_url_is_recorded_once() {
		let mut cache = DecorationCache::new();
		let id = PersonId::from("a");

		let first = cache.record(&id, Some("https://img.test/a.png"));
		assert!(first.is_some());
		assert_eq!(cache.record(&id, Some("https://img.test/a.png")), None);
	}

	#[test]
	fn transitions_to_and_from_absent_count_as_changes() {
		let mut cache = DecorationCache::new();
		let id = PersonId::from("a");

		assert!(cache.record(&id, None).is_some());
		assert_eq!(cache.record(&id, None), None);
		assert!(cache.record(&id, Some("https://img.test/a.png")).is_some());
		assert!(cache.record(&id, None).is_some());
	}

	#[test]
	fn superseded_generation_is_stale() {
		let mut cache = DecorationCache::new();
		let id = PersonId::from("a");

		let old = cache.record(&id, Some("https://img.test/old.png")).unwrap();
		let new = cache.record(&id, Some("https://img.test/new.png")).unwrap();

		assert!(!cache.is_current(&id, old));
		assert!(cache.is_current(&id, new));

		cache.forget(&id);
		assert!(!cache.is_current(&id, new));
	}
}
