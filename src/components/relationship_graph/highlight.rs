use std::collections::HashSet;

use super::types::{PersonId, RelationshipRecord};

/// Visibility class of a node relative to the current selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeClass {
	/// No selection is active.
	Neutral,
	Selected,
	Neighbor,
	Dimmed,
}

/// Visibility class of an edge relative to the current selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeClass {
	Neutral,
	Selected,
	Dimmed,
}

/// One-hop neighbourhood of the selected node.
#[derive(Clone, Debug, Default)]
pub struct Highlight {
	selected: Option<PersonId>,
	neighbors: HashSet<PersonId>,
}

impl Highlight {
	/// Scans `edges` once, collecting everything one hop from `selected` in
	/// either direction.
	pub fn compute(edges: &[RelationshipRecord], selected: Option<&PersonId>) -> Self {
		let Some(selected) = selected else {
			return Self::default();
		};
		let neighbors = edges
			.iter()
			.filter_map(|edge| edge.other_end(selected))
			.filter(|id| *id != selected)
			.cloned()
			.collect();
		Self {
			selected: Some(selected.clone()),
			neighbors,
		}
	}

	pub fn selected(&self) -> Option<&PersonId> {
		self.selected.as_ref()
	}

	pub fn neighbors(&self) -> &HashSet<PersonId> {
		&self.neighbors
	}

	pub fn node_class(&self, id: &PersonId) -> NodeClass {
		match &self.selected {
			None => NodeClass::Neutral,
			Some(selected) if selected == id => NodeClass::Selected,
			Some(_) if self.neighbors.contains(id) => NodeClass::Neighbor,
			Some(_) => NodeClass::Dimmed,
		}
	}

	pub fn edge_class(&self, edge: &RelationshipRecord) -> EdgeClass {
		match &self.selected {
			None => EdgeClass::Neutral,
			Some(selected) if edge.touches(selected) => EdgeClass::Selected,
			Some(_) => EdgeClass::Dimmed,
		}
	}
}
