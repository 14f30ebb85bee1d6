use log::{debug, info, warn};

use super::config::GraphViewConfig;
use super::decoration::{DecorationRequest, ImageHandle};
use super::drag::{CLICK_TOLERANCE, DragController, DragOutcome};
use super::scene::{ReconcileReport, SceneGraph, SceneReconciler};
use super::store::{PositionWrites, StoreError};
use super::types::{PersonId, Point, Snapshot};

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// What the host must do after a pointer release.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerOutcome {
	Nothing,
	/// Change the selection to this value.
	Select(Option<PersonId>),
	/// Write this final drag position to the store.
	Persist { id: PersonId, position: Point },
}

/// Everything the relationship canvas needs between events: the scene and its
/// caches, the last good snapshot, selection, camera and drag gesture.
pub struct GraphViewState {
	reconciler: SceneReconciler,
	snapshot: Option<Snapshot>,
	selected: Option<PersonId>,
	/// Token of the most recently started fetch. Only its result is applied.
	fetch_generation: u64,
	writes: PositionWrites,
	pub transform: ViewTransform,
	pub pan: PanState,
	pub drag: DragController,
	pub width: f64,
	pub height: f64,
}

impl GraphViewState {
	pub fn new(config: GraphViewConfig, width: f64, height: f64) -> Self {
		Self {
			reconciler: SceneReconciler::new(config),
			snapshot: None,
			selected: None,
			fetch_generation: 0,
			writes: PositionWrites::new(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			pan: PanState::default(),
			drag: DragController::new(),
			width,
			height,
		}
	}

	pub fn scene(&self) -> &SceneGraph {
		self.reconciler.scene()
	}

	/// Starts a fetch, superseding any still in flight.
	pub fn begin_fetch(&mut self) -> u64 {
		self.fetch_generation += 1;
		self.fetch_generation
	}

	/// Adopts a freshly fetched snapshot and reconciles against it, unless a
	/// newer fetch has been started since `token` was issued.
	pub fn apply_snapshot(&mut self, token: u64, snapshot: Snapshot) -> ReconcileReport {
		if token != self.fetch_generation {
			debug!(
				"dropping snapshot from fetch {token}, fetch {} is newer",
				self.fetch_generation
			);
			return ReconcileReport::default();
		}
		info!(
			"snapshot loaded: {} people, {} relationships",
			snapshot.nodes.len(),
			snapshot.edges.len()
		);
		self.snapshot = Some(snapshot);
		self.reconcile()
	}

	/// A failed fetch leaves the last good snapshot on screen. Returns whether
	/// the failure belongs to the latest fetch and should be reported.
	pub fn fetch_failed(&self, token: u64, error: &StoreError) -> bool {
		if token != self.fetch_generation {
			debug!("ignoring failure of superseded fetch {token}: {error}");
			return false;
		}
		warn!("snapshot fetch failed, keeping previous scene: {error}");
		true
	}

	/// Whether a write of `position` should start now. When one is already in
	/// flight for `id`, the position is held and handed out by [`Self::write_settled`].
	pub fn submit_write(&mut self, id: &PersonId, position: Point) -> bool {
		self.writes.submit(id, position)
	}

	/// The in-flight write for `id` finished; returns the next position to write.
	pub fn write_settled(&mut self, id: &PersonId) -> Option<Point> {
		self.writes.settle(id)
	}

	pub fn select(&mut self, selected: Option<PersonId>) -> ReconcileReport {
		if self.selected == selected {
			return ReconcileReport::default();
		}
		debug!("selection changed to {selected:?}");
		self.selected = selected;
		self.reconcile()
	}

	/// Runs one reconciliation pass over the held snapshot.
	pub fn reconcile(&mut self) -> ReconcileReport {
		let Some(snapshot) = &self.snapshot else {
			return ReconcileReport::default();
		};
		self.reconciler
			.reconcile(snapshot, self.selected.as_ref(), self.drag.dragged())
	}

	pub fn apply_decoration(&mut self, request: &DecorationRequest, image: ImageHandle) -> bool {
		let applied = self.reconciler.apply_decoration(request, image);
		if !applied {
			debug!("discarded stale decoration for {}", request.id);
		}
		applied
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		Point::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<&PersonId> {
		self.reconciler
			.node_at(self.screen_to_graph(sx, sy))
			.map(|node| &node.id)
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		let hit = self
			.node_at_position(sx, sy)
			.cloned()
			.and_then(|id| Some((self.scene().node(&id)?.position, id)));
		match hit {
			Some((position, id)) => self.drag.pointer_down(id, Point::new(sx, sy), position),
			None => {
				self.pan = PanState {
					active: true,
					moved: false,
					start_x: sx,
					start_y: sy,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
				};
			}
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if let Some((id, position)) = self.drag.pointer_move(Point::new(sx, sy), self.transform.k) {
			self.reconciler.move_node(id, position);
		} else if self.pan.active {
			let (dx, dy) = (sx - self.pan.start_x, sy - self.pan.start_y);
			if (dx * dx + dy * dy).sqrt() >= CLICK_TOLERANCE {
				self.pan.moved = true;
			}
			self.transform.x = self.pan.transform_start_x + dx;
			self.transform.y = self.pan.transform_start_y + dy;
		}
	}

	pub fn pointer_up(&mut self) -> PointerOutcome {
		let background_click = self.pan.active && !self.pan.moved;
		self.pan.active = false;

		match self.drag.pointer_up() {
			DragOutcome::Persist { id, position } => {
				// Keep the drop in place until the store write shows up in a refetch.
				if let Some(snapshot) = &mut self.snapshot {
					snapshot.set_position(&id, position);
				}
				PointerOutcome::Persist { id, position }
			}
			DragOutcome::Click(id) if self.selected.as_ref() == Some(&id) => {
				PointerOutcome::Select(None)
			}
			DragOutcome::Click(id) => PointerOutcome::Select(Some(id)),
			DragOutcome::None if background_click && self.selected.is_some() => {
				PointerOutcome::Select(None)
			}
			DragOutcome::None => PointerOutcome::Nothing,
		}
	}

	/// Aborts an active drag, putting the node back without a store write.
	pub fn cancel_drag(&mut self) -> bool {
		match self.drag.cancel() {
			Some((id, origin)) => {
				self.reconciler.move_node(&id, origin);
				true
			}
			None => false,
		}
	}

	/// Zooms around the cursor. Ignored while a node is being dragged.
	pub fn zoom(&mut self, sx: f64, sy: f64, delta_y: f64) {
		if self.drag.is_dragging() {
			return;
		}
		let config = self.reconciler.config();
		let factor = if delta_y > 0.0 {
			1.0 / config.zoom_step
		} else {
			config.zoom_step
		};
		let new_k = (self.transform.k * factor).clamp(config.min_zoom, config.max_zoom);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::relationship_graph::types::{
		PersonRecord, RelationshipCategory, RelationshipRecord, Sex,
	};

	fn state() -> GraphViewState {
		let mut state = GraphViewState::new(GraphViewConfig::default(), 800.0, 600.0);
		let token = state.begin_fetch();
		state.apply_snapshot(token, couple());
		state
	}

	fn couple() -> Snapshot {
		Snapshot::new(
			vec![
				PersonRecord::new("a", "Ann", Sex::Female).with_position(0.0, 50.0),
				PersonRecord::new("b", "Bob", Sex::Male).with_position(200.0, 50.0),
			],
			vec![RelationshipRecord::new(
				"a",
				"b",
				RelationshipCategory::Family,
				"Husband",
				"Wife",
			)],
		)
	}

	fn screen_of(state: &GraphViewState, id: &str) -> (f64, f64) {
		let p = state.scene().node(&id.into()).unwrap().position;
		let t = &state.transform;
		(p.x * t.k + t.x, p.y * t.k + t.y)
	}

	#[test]
	fn drag_gesture_writes_once_and_survives_refresh() {
		let mut state = state();
		let (sx, sy) = screen_of(&state, "a");

		state.pointer_down(sx, sy);
		for step in 1..=10 {
			state.pointer_move(sx + step as f64 * 5.0, sy);
		}
		let outcome = state.pointer_up();

		let expected = Point::new(50.0, 50.0);
		assert_eq!(
			outcome,
			PointerOutcome::Persist {
				id: "a".into(),
				position: expected,
			}
		);
		state.reconcile();
		assert_eq!(state.scene().node(&"a".into()).unwrap().position, expected);
	}

	#[test]
	fn refresh_mid_drag_keeps_the_node_under_the_pointer() {
		let mut state = state();
		let (sx, sy) = screen_of(&state, "a");

		state.pointer_down(sx, sy);
		state.pointer_move(sx + 30.0, sy + 10.0);
		state.reconcile();

		assert_eq!(
			state.scene().node(&"a".into()).unwrap().position,
			Point::new(30.0, 60.0)
		);
	}

	#[test]
	fn escape_restores_position_without_write() {
		let mut state = state();
		let (sx, sy) = screen_of(&state, "b");

		state.pointer_down(sx, sy);
		state.pointer_move(sx - 80.0, sy);
		assert!(state.cancel_drag());

		assert_eq!(
			state.scene().node(&"b".into()).unwrap().position,
			Point::new(200.0, 50.0)
		);
		assert_eq!(state.pointer_up(), PointerOutcome::Nothing);
	}

	#[test]
	fn clicks_toggle_selection() {
		let mut state = state();
		let (sx, sy) = screen_of(&state, "b");

		state.pointer_down(sx, sy);
		assert_eq!(state.pointer_up(), PointerOutcome::Select(Some("b".into())));
		state.select(Some("b".into()));

		state.pointer_down(sx, sy);
		assert_eq!(state.pointer_up(), PointerOutcome::Select(None));

		state.pointer_down(5.0, 5.0);
		assert_eq!(state.pointer_up(), PointerOutcome::Select(None));
	}

	#[test]
	fn background_drag_pans_without_clearing_selection() {
		let mut state = state();
		state.select(Some("a".into()));

		state.pointer_down(5.0, 5.0);
		state.pointer_move(45.0, 25.0);
		assert_eq!(state.pointer_up(), PointerOutcome::Nothing);
		assert_eq!((state.transform.x, state.transform.y), (440.0, 320.0));
	}

	#[test]
	fn zoom_is_clamped_and_suspended_during_drag() {
		let mut state = state();
		for _ in 0..200 {
			state.zoom(400.0, 300.0, -1.0);
		}
		assert_eq!(state.transform.k, 10.0);

		// The cursor's world point stays fixed while zooming.
		assert!(state.screen_to_graph(400.0, 300.0).distance_to(Point::new(0.0, 0.0)) < 1e-9);

		let (sx, sy) = screen_of(&state, "a");
		state.pointer_down(sx, sy);
		assert!(state.drag.is_dragging());
		state.zoom(sx, sy, 1.0);
		assert_eq!(state.transform.k, 10.0);
	}

	#[test]
	fn failed_fetch_keeps_previous_scene() {
		let mut state = state();
		let token = state.begin_fetch();
		let offline = StoreError::Unavailable {
			reason: "offline".into(),
		};

		assert!(state.fetch_failed(token, &offline));
		assert_eq!(state.scene().len(), 2);
		assert!(state.snapshot.is_some());

		state.begin_fetch();
		assert!(!state.fetch_failed(token, &offline));
	}

	#[test]
	fn late_result_of_superseded_fetch_is_dropped() {
		let mut state = GraphViewState::new(GraphViewConfig::default(), 800.0, 600.0);
		let first = state.begin_fetch();
		let second = state.begin_fetch();

		let other_tree = Snapshot::new(vec![PersonRecord::new("z", "Zed", Sex::Male)], vec![]);
		state.apply_snapshot(second, couple());
		let report = state.apply_snapshot(first, other_tree);

		assert_eq!(report, ReconcileReport::default());
		assert!(state.scene().contains(&"a".into()));
		assert!(!state.scene().contains(&"z".into()));
	}

	#[test]
	fn writes_for_one_person_are_serialized_and_coalesced() {
		let mut state = state();
		let id = PersonId::from("a");

		assert!(state.submit_write(&id, Point::new(1.0, 1.0)));
		assert!(!state.submit_write(&id, Point::new(2.0, 2.0)));
		assert!(!state.submit_write(&id, Point::new(3.0, 3.0)));
		assert!(state.submit_write(&"b".into(), Point::new(9.0, 9.0)));

		assert_eq!(state.write_settled(&id), Some(Point::new(3.0, 3.0)));
		assert_eq!(state.write_settled(&id), None);
		assert!(state.submit_write(&id, Point::new(4.0, 4.0)));
	}
}
