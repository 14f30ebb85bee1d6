use super::types::{PersonId, Point};

/// Pointer distance, in screen pixels, below which a press-release is a click.
pub const CLICK_TOLERANCE: f64 = 3.0;

/// An in-progress node drag.
#[derive(Clone, Debug, PartialEq)]
pub struct DragGesture {
	pub id: PersonId,
	start_screen: Point,
	node_start: Point,
	current: Point,
	moved: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragState {
	#[default]
	Idle,
	Dragging(DragGesture),
}

/// What a pointer release means for the rest of the view.
#[derive(Clone, Debug, PartialEq)]
pub enum DragOutcome {
	/// No drag was in progress.
	None,
	/// The node was pressed and released without moving.
	Click(PersonId),
	/// The node was moved; its final position must be written to the store once.
	Persist { id: PersonId, position: Point },
}

/// Idle -> Dragging -> Idle state machine translating pointer events on a
/// node into live world positions.
#[derive(Debug, Default)]
pub struct DragController {
	state: DragState,
}

impl DragController {
	pub fn new() -> Self {
		Self::default()
	}

	/// Camera pan/zoom input is suspended while this is true.
	pub fn is_dragging(&self) -> bool {
		matches!(self.state, DragState::Dragging(_))
	}

	pub fn dragged(&self) -> Option<&PersonId> {
		match &self.state {
			DragState::Dragging(gesture) => Some(&gesture.id),
			DragState::Idle => None,
		}
	}

	pub fn pointer_down(&mut self, id: PersonId, screen: Point, node_position: Point) {
		self.state = DragState::Dragging(DragGesture {
			id,
			start_screen: screen,
			node_start: node_position,
			current: node_position,
			moved: false,
		});
	}

	/// Returns the dragged node's new world position, scaled by the camera zoom.
	pub fn pointer_move(&mut self, screen: Point, zoom: f64) -> Option<(&PersonId, Point)> {
		let DragState::Dragging(gesture) = &mut self.state else {
			return None;
		};
		if !gesture.moved && screen.distance_to(gesture.start_screen) < CLICK_TOLERANCE {
			return None;
		}
		gesture.moved = true;
		let zoom = if zoom > 0.0 { zoom } else { 1.0 };
		gesture.current = Point::new(
			gesture.node_start.x + (screen.x - gesture.start_screen.x) / zoom,
			gesture.node_start.y + (screen.y - gesture.start_screen.y) / zoom,
		);
		Some((&gesture.id, gesture.current))
	}

	pub fn pointer_up(&mut self) -> DragOutcome {
		match std::mem::take(&mut self.state) {
			DragState::Idle => DragOutcome::None,
			DragState::Dragging(gesture) if gesture.moved => DragOutcome::Persist {
				id: gesture.id,
				position: gesture.current,
			},
			DragState::Dragging(gesture) => DragOutcome::Click(gesture.id),
		}
	}

	/// Aborts the drag, returning the node and the position it had before it.
	pub fn cancel(&mut self) -> Option<(PersonId, Point)> {
		match std::mem::take(&mut self.state) {
			DragState::Idle => None,
			DragState::Dragging(gesture) => Some((gesture.id, gesture.node_start)),
		}
	}
}
