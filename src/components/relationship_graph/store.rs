//! Boundary to the persistent backing store.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use thiserror::Error;

use super::types::{PersonId, Point, Snapshot, TreeId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
	/// Network or store failure; the caller decides whether to retry.
	#[error("backing store unavailable: {reason}")]
	Unavailable { reason: String },
	#[error("unknown tree {0}")]
	UnknownTree(TreeId),
	#[error("unknown person {0}")]
	UnknownPerson(PersonId),
}

/// Request/response access to people and relationship rows. No caching.
#[allow(async_fn_in_trait)]
pub trait GraphStore {
	async fn fetch_nodes_and_edges(&self, tree: &TreeId) -> Result<Snapshot, StoreError>;

	async fn persist_position(&self, id: &PersonId, position: Point) -> Result<(), StoreError>;
}

/// Client-side bookkeeping that keeps at most one position write per person
/// in flight. Drops made meanwhile collapse into the latest one, which is
/// written once the in-flight write settles, so the store ends on the last drop.
#[derive(Debug, Default)]
pub struct PositionWrites {
	in_flight: HashSet<PersonId>,
	pending: HashMap<PersonId, Point>,
}

impl PositionWrites {
	pub fn new() -> Self {
		Self::default()
	}

	/// True when the caller should write `position` now.
	pub fn submit(&mut self, id: &PersonId, position: Point) -> bool {
		if self.in_flight.contains(id) {
			self.pending.insert(id.clone(), position);
			return false;
		}
		self.in_flight.insert(id.clone());
		true
	}

	pub fn settle(&mut self, id: &PersonId) -> Option<Point> {
		let next = self.pending.remove(id);
		if next.is_none() {
			self.in_flight.remove(id);
		}
		next
	}
}

#[derive(Debug, Default)]
struct MemoryInner {
	trees: RefCell<HashMap<TreeId, Snapshot>>,
	writes: Cell<usize>,
	failures: Cell<usize>,
}

/// In-process store backing the demo page and tests. Cloning shares state.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	inner: Rc<MemoryInner>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert_tree(&self, tree: TreeId, snapshot: Snapshot) {
		self.inner.trees.borrow_mut().insert(tree, snapshot);
	}

	/// Makes the next `count` operations fail with [`StoreError::Unavailable`].
	pub fn fail_next(&self, count: usize) {
		self.inner.failures.set(count);
	}

	/// Number of successful position writes so far.
	pub fn position_writes(&self) -> usize {
		self.inner.writes.get()
	}

	fn check_available(&self) -> Result<(), StoreError> {
		let remaining = self.inner.failures.get();
		if remaining == 0 {
			return Ok(());
		}
		self.inner.failures.set(remaining - 1);
		Err(StoreError::Unavailable {
			reason: "injected failure".into(),
		})
	}
}

impl GraphStore for MemoryStore {
	async fn fetch_nodes_and_edges(&self, tree: &TreeId) -> Result<Snapshot, StoreError> {
		self.check_available()?;
		self.inner
			.trees
			.borrow()
			.get(tree)
			.cloned()
			.ok_or_else(|| StoreError::UnknownTree(tree.clone()))
	}

	async fn persist_position(&self, id: &PersonId, position: Point) -> Result<(), StoreError> {
		self.check_available()?;
		let mut trees = self.inner.trees.borrow_mut();
		let updated = trees
			.values_mut()
			.any(|snapshot| snapshot.set_position(id, position));
		if !updated {
			return Err(StoreError::UnknownPerson(id.clone()));
		}
		self.inner.writes.set(self.inner.writes.get() + 1);
		Ok(())
	}
}
