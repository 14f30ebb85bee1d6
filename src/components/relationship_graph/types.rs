use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a person row in the backing store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for PersonId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for PersonId {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

/// Identifier of one relationship tree (one graph owned by a user).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(String);

impl TreeId {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}
}

impl fmt::Display for TreeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for TreeId {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
	Male,
	Female,
	#[default]
	Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipCategory {
	Family,
	Social,
	Professional,
	#[default]
	Other,
}

/// A world-space canvas position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance_to(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

/// A person row as fetched from the backing store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
	pub id: PersonId,
	#[serde(rename = "full_name")]
	pub display_name: String,
	#[serde(default)]
	pub sex: Option<Sex>,
	#[serde(default)]
	pub photo_url: Option<String>,
	#[serde(default, rename = "layout_x")]
	pub position_x: Option<f64>,
	#[serde(default, rename = "layout_y")]
	pub position_y: Option<f64>,
}

impl PersonRecord {
	pub fn new(id: impl Into<String>, display_name: impl Into<String>, sex: Sex) -> Self {
		Self {
			id: PersonId::new(id),
			display_name: display_name.into(),
			sex: Some(sex),
			photo_url: None,
			position_x: None,
			position_y: None,
		}
	}

	pub fn with_position(mut self, x: f64, y: f64) -> Self {
		self.position_x = Some(x);
		self.position_y = Some(y);
		self
	}

	pub fn sex(&self) -> Sex {
		self.sex.unwrap_or_default()
	}

	/// The stored position, if it is authoritative.
	///
	/// Both coordinates must be present and the pair must not be the (0,0)
	/// sentinel that means "not placed yet".
	pub fn stored_position(&self) -> Option<Point> {
		match (self.position_x, self.position_y) {
			(Some(x), Some(y)) if !(x == 0.0 && y == 0.0) => Some(Point::new(x, y)),
			_ => None,
		}
	}
}

/// A relationship row. Stored with a fixed direction, but logically an
/// unordered pair carrying a label for each viewing direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
	#[serde(rename = "source")]
	pub source_id: PersonId,
	#[serde(rename = "target")]
	pub target_id: PersonId,
	#[serde(default)]
	pub category: RelationshipCategory,
	#[serde(rename = "label")]
	pub forward_label: String,
	#[serde(rename = "reverse_label")]
	pub reverse_label: String,
}

impl RelationshipRecord {
	pub fn new(
		source: impl Into<String>,
		target: impl Into<String>,
		category: RelationshipCategory,
		forward_label: impl Into<String>,
		reverse_label: impl Into<String>,
	) -> Self {
		Self {
			source_id: PersonId::new(source),
			target_id: PersonId::new(target),
			category,
			forward_label: forward_label.into(),
			reverse_label: reverse_label.into(),
		}
	}

	pub fn touches(&self, id: &PersonId) -> bool {
		&self.source_id == id || &self.target_id == id
	}

	/// The endpoint on the other side of `id`, if the edge touches it.
	pub fn other_end(&self, id: &PersonId) -> Option<&PersonId> {
		if &self.source_id == id {
			Some(&self.target_id)
		} else if &self.target_id == id {
			Some(&self.source_id)
		} else {
			None
		}
	}
}

/// The full node/edge result set for one tree at one point in time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
	#[serde(default)]
	pub nodes: Vec<PersonRecord>,
	#[serde(default)]
	pub edges: Vec<RelationshipRecord>,
}

impl Snapshot {
	pub fn new(nodes: Vec<PersonRecord>, edges: Vec<RelationshipRecord>) -> Self {
		Self { nodes, edges }
	}

	/// Overwrite the stored position of one person. Returns false when the
	/// person is not part of this snapshot.
	pub fn set_position(&mut self, id: &PersonId, position: Point) -> bool {
		match self.nodes.iter_mut().find(|node| &node.id == id) {
			Some(node) => {
				node.position_x = Some(position.x);
				node.position_y = Some(position.y);
				true
			}
			None => false,
		}
	}
}
