use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::types::{PersonId, Point};

/// Last-known canvas position of every node placed this session.
///
/// Mirrors the authoritative store and stands in for it while a node's stored
/// position is still the (0,0) sentinel, so refreshes never re-seed a node.
pub struct LayoutCache {
	positions: HashMap<PersonId, Point>,
	rng: SmallRng,
	seed_extent: f64,
}

impl LayoutCache {
	pub fn new(seed: u64, seed_extent: f64) -> Self {
		Self {
			positions: HashMap::new(),
			rng: SmallRng::seed_from_u64(seed),
			seed_extent: seed_extent.abs().max(1.0),
		}
	}

	/// Three-tier lookup: an authoritative stored position wins and is cached,
	/// then the cached position, then a freshly seeded one.
	pub fn resolve_position(&mut self, id: &PersonId, stored: Option<Point>) -> Point {
		if let Some(stored) = stored {
			self.positions.insert(id.clone(), stored);
			return stored;
		}
		if let Some(cached) = self.positions.get(id) {
			return *cached;
		}
		let seeded = self.seed();
		self.positions.insert(id.clone(), seeded);
		seeded
	}

	pub fn get(&self, id: &PersonId) -> Option<Point> {
		self.positions.get(id).copied()
	}

	/// Records a live position, e.g. while a node is being dragged.
	pub fn set(&mut self, id: &PersonId, position: Point) {
		self.positions.insert(id.clone(), position);
	}

	fn seed(&mut self) -> Point {
		let extent = self.seed_extent;
		loop {
			let candidate = Point::new(
				self.rng.gen_range(-extent..extent),
				self.rng.gen_range(-extent..extent),
			);
			// A seeded (0,0) would read back as "unplaced" once persisted.
			if candidate != Point::default() {
				return candidate;
			}
		}
	}
}
