//! Retained scene graph and the reconciler that keeps it in step with the
//! latest store snapshot.
//!
//! Visual nodes live in an arena indexed by [`PersonId`]. A reconciliation
//! pass mutates surviving nodes in place, creates nodes that are new to the
//! snapshot and drops those that vanished from it. Edges carry no state of
//! their own and are rebuilt on every pass, after all node mutations.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::config::{Color, EdgeStyle, GraphViewConfig, sex_color};
use super::decoration::{DecorationCache, DecorationRequest, ImageHandle};
use super::highlight::{EdgeClass, Highlight, NodeClass};
use super::labels::resolve_edge;
use super::layout::LayoutCache;
use super::types::{PersonId, PersonRecord, Point, RelationshipCategory, Snapshot};

#[derive(Clone, Debug, PartialEq)]
pub struct VisualNode {
	pub id: PersonId,
	pub label: String,
	pub position: Point,
	/// Rendered radius in world units.
	pub size: f64,
	pub color: Color,
	pub class: NodeClass,
	pub image: ImageHandle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualEdge {
	pub from: PersonId,
	pub to: PersonId,
	pub label: Option<String>,
	pub category: RelationshipCategory,
	pub class: EdgeClass,
	pub size: f64,
	pub color: Color,
}

/// Arena slot of a visual node. Stable for as long as the node exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeSlot(usize);

#[derive(Debug, Default)]
pub struct SceneGraph {
	slots: Vec<Option<VisualNode>>,
	free: Vec<usize>,
	index: HashMap<PersonId, NodeSlot>,
	edges: Vec<VisualEdge>,
}

impl SceneGraph {
	pub fn len(&self) -> usize {
		self.index.len()
	}

	pub fn contains(&self, id: &PersonId) -> bool {
		self.index.contains_key(id)
	}

	pub fn slot_of(&self, id: &PersonId) -> Option<NodeSlot> {
		self.index.get(id).copied()
	}

	pub fn node(&self, id: &PersonId) -> Option<&VisualNode> {
		let NodeSlot(slot) = self.slot_of(id)?;
		self.slots.get(slot)?.as_ref()
	}

	pub fn node_mut(&mut self, id: &PersonId) -> Option<&mut VisualNode> {
		let NodeSlot(slot) = self.slot_of(id)?;
		self.slots.get_mut(slot)?.as_mut()
	}

	/// Nodes in draw order.
	pub fn nodes(&self) -> impl Iterator<Item = &VisualNode> {
		self.slots.iter().flatten()
	}

	/// Every photo URL some node currently draws.
	pub fn image_urls(&self) -> HashSet<&str> {
		self.nodes().filter_map(|node| node.image.url()).collect()
	}

	pub fn edges(&self) -> &[VisualEdge] {
		&self.edges
	}

	/// Topmost node whose disc, grown by `slack`, contains `point`.
	pub fn node_at(&self, point: Point, slack: f64) -> Option<&VisualNode> {
		self.slots
			.iter()
			.rev()
			.flatten()
			.find(|node| node.position.distance_to(point) <= node.size + slack)
	}

	fn insert(&mut self, node: VisualNode) -> NodeSlot {
		let id = node.id.clone();
		let slot = match self.free.pop() {
			Some(slot) => {
				self.slots[slot] = Some(node);
				slot
			}
			None => {
				self.slots.push(Some(node));
				self.slots.len() - 1
			}
		};
		self.index.insert(id, NodeSlot(slot));
		NodeSlot(slot)
	}

	fn remove(&mut self, id: &PersonId) -> Option<VisualNode> {
		let NodeSlot(slot) = self.index.remove(id)?;
		self.free.push(slot);
		self.slots.get_mut(slot)?.take()
	}

	fn ids(&self) -> impl Iterator<Item = &PersonId> {
		self.index.keys()
	}
}

/// Counts and follow-up work produced by one reconciliation pass.
#[derive(Debug, Default, PartialEq)]
pub struct ReconcileReport {
	pub created: usize,
	pub updated: usize,
	pub removed: usize,
	/// Relationships dropped because an endpoint is missing from the snapshot.
	pub skipped_edges: usize,
	/// Photo decoration jobs the host must run, at most one per changed node.
	pub decorations: Vec<DecorationRequest>,
}

/// Owns the scene graph and the caches that keep it stable across passes.
pub struct SceneReconciler {
	scene: SceneGraph,
	layout: LayoutCache,
	decorations: DecorationCache,
	config: GraphViewConfig,
}

impl SceneReconciler {
	pub fn new(config: GraphViewConfig) -> Self {
		Self {
			scene: SceneGraph::default(),
			layout: LayoutCache::new(config.layout_seed, config.seed_extent),
			decorations: DecorationCache::new(),
			config,
		}
	}

	pub fn scene(&self) -> &SceneGraph {
		&self.scene
	}

	pub fn layout(&self) -> &LayoutCache {
		&self.layout
	}

	pub fn config(&self) -> &GraphViewConfig {
		&self.config
	}

	/// Brings the scene in line with `snapshot` as seen with `selected`.
	///
	/// The node named by `dragging` keeps its live cached position even if the
	/// snapshot still carries an older stored one.
	pub fn reconcile(
		&mut self,
		snapshot: &Snapshot,
		selected: Option<&PersonId>,
		dragging: Option<&PersonId>,
	) -> ReconcileReport {
		let highlight = Highlight::compute(&snapshot.edges, selected);
		let mut stale: HashSet<PersonId> = self.scene.ids().cloned().collect();
		let mut report = ReconcileReport::default();

		for record in &snapshot.nodes {
			let class = highlight.node_class(&record.id);
			let position = match (dragging, self.layout.get(&record.id)) {
				(Some(dragged), Some(live)) if dragged == &record.id => live,
				_ => self.layout.resolve_position(&record.id, record.stored_position()),
			};
			let size = match class {
				NodeClass::Selected => self.config.selected_node_size,
				_ => self.config.node_size,
			};
			let color = self.node_color(record, class);

			let revisited = stale.remove(&record.id);
			match self.scene.node_mut(&record.id) {
				Some(node) => {
					node.label.clone_from(&record.display_name);
					node.position = position;
					node.size = size;
					node.color = color;
					node.class = class;
					if revisited {
						report.updated += 1;
					}
				}
				None => {
					self.scene.insert(VisualNode {
						id: record.id.clone(),
						label: record.display_name.clone(),
						position,
						size,
						color,
						class,
						image: ImageHandle::initials_for(&record.display_name, record.sex()),
					});
					report.created += 1;
				}
			}

			self.decorate(record, &mut report);
		}

		for id in stale {
			self.scene.remove(&id);
			self.decorations.forget(&id);
			report.removed += 1;
		}

		self.rebuild_edges(snapshot, &highlight, &mut report);

		debug!(
			"reconciled {} nodes: {} created, {} updated, {} removed, {} edges ({} skipped), {} decorations",
			self.scene.len(),
			report.created,
			report.updated,
			report.removed,
			self.scene.edges.len(),
			report.skipped_edges,
			report.decorations.len()
		);
		report
	}

	fn node_color(&self, record: &PersonRecord, class: NodeClass) -> Color {
		let base = sex_color(record.sex());
		match class {
			NodeClass::Dimmed => base.with_alpha(self.config.dimmed_opacity),
			_ => base,
		}
	}

	fn decorate(&mut self, record: &PersonRecord, report: &mut ReconcileReport) {
		let photo = record.photo_url.as_deref().filter(|url| !url.trim().is_empty());
		let changed = self.decorations.record(&record.id, photo);

		match (photo, changed) {
			(Some(url), Some(generation)) => report.decorations.push(DecorationRequest {
				id: record.id.clone(),
				photo_url: url.to_owned(),
				sex: record.sex(),
				generation,
			}),
			// No photo: the initials follow name and sex edits synchronously.
			(None, _) => {
				if let Some(node) = self.scene.node_mut(&record.id) {
					node.image = ImageHandle::initials_for(&record.display_name, record.sex());
				}
			}
			(Some(_), None) => {}
		}
	}

	fn rebuild_edges(
		&mut self,
		snapshot: &Snapshot,
		highlight: &Highlight,
		report: &mut ReconcileReport,
	) {
		self.scene.edges.clear();
		for edge in &snapshot.edges {
			if !self.scene.contains(&edge.source_id) || !self.scene.contains(&edge.target_id) {
				report.skipped_edges += 1;
				continue;
			}
			let class = highlight.edge_class(edge);
			let EdgeStyle { size, color } = match class {
				EdgeClass::Selected => self.config.selected_edge,
				EdgeClass::Neutral => self.config.neutral_edge,
				EdgeClass::Dimmed => self.config.dimmed_edge,
			};
			let view = resolve_edge(edge, highlight.selected());
			self.scene.edges.push(VisualEdge {
				from: view.from.clone(),
				to: view.to.clone(),
				label: view.label,
				category: edge.category,
				class,
				size,
				color,
			});
		}
	}

	/// Applies the result of a decoration job, unless the node has since been
	/// removed or a newer job was dispatched for it.
	pub fn apply_decoration(&mut self, request: &DecorationRequest, image: ImageHandle) -> bool {
		if !self.decorations.is_current(&request.id, request.generation) {
			return false;
		}
		match self.scene.node_mut(&request.id) {
			Some(node) => {
				node.image = image;
				true
			}
			None => false,
		}
	}

	/// Moves a node live: scene and layout cache, never the store.
	pub fn move_node(&mut self, id: &PersonId, position: Point) -> bool {
		match self.scene.node_mut(id) {
			Some(node) => {
				node.position = position;
				self.layout.set(id, position);
				true
			}
			None => false,
		}
	}

	pub fn node_at(&self, point: Point) -> Option<&VisualNode> {
		self.scene.node_at(point, self.config.hit_slack)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::relationship_graph::types::{RelationshipRecord, Sex};

	fn reconciler() -> SceneReconciler {
		SceneReconciler::new(GraphViewConfig::default())
	}

	fn mentor_snapshot() -> Snapshot {
		Snapshot::new(
			vec![
				PersonRecord::new("a", "Ada Lovelace", Sex::Female),
				PersonRecord::new("b", "Charles Babbage", Sex::Male),
			],
			vec![RelationshipRecord::new(
				"a",
				"b",
				RelationshipCategory::Professional,
				"Mentor",
				"Mentee",
			)],
		)
	}

	#[test]
	fn unplaced_nodes_do_not_jitter_between_passes() {
		let mut reconciler = reconciler();
		let snapshot = mentor_snapshot();

		reconciler.reconcile(&snapshot, None, None);
		let before: Vec<Point> = reconciler.scene().nodes().map(|n| n.position).collect();
		reconciler.reconcile(&snapshot, None, None);
		let after: Vec<Point> = reconciler.scene().nodes().map(|n| n.position).collect();

		assert_eq!(before, after);
	}

	#[test]
	fn stored_position_overrides_cache() {
		let mut reconciler = reconciler();
		let mut snapshot = mentor_snapshot();
		reconciler.reconcile(&snapshot, None, None);

		let a = PersonId::from("a");
		snapshot.set_position(&a, Point::new(120.0, -30.0));
		reconciler.reconcile(&snapshot, None, None);

		assert_eq!(reconciler.scene().node(&a).unwrap().position, Point::new(120.0, -30.0));
		assert_eq!(reconciler.layout().get(&a), Some(Point::new(120.0, -30.0)));
	}

	#[test]
	fn unchanged_snapshot_mutates_in_place() {
		let mut reconciler = reconciler();
		let snapshot = mentor_snapshot();
		let a = PersonId::from("a");

		let first = reconciler.reconcile(&snapshot, None, None);
		let slot = reconciler.scene().slot_of(&a);
		let second = reconciler.reconcile(&snapshot, Some(&a), None);

		assert_eq!((first.created, first.updated), (2, 0));
		assert_eq!((second.created, second.updated, second.removed), (0, 2, 0));
		assert_eq!(reconciler.scene().slot_of(&a), slot);
		assert_eq!(reconciler.scene().node(&a).unwrap().class, NodeClass::Selected);
	}

	#[test]
	fn vanished_node_is_removed_with_its_edges() {
		let mut reconciler = reconciler();
		let mut snapshot = mentor_snapshot();
		reconciler.reconcile(&snapshot, None, None);

		snapshot.nodes.retain(|n| n.id.as_str() != "b");
		let report = reconciler.reconcile(&snapshot, None, None);

		assert_eq!(report.removed, 1);
		assert_eq!(report.skipped_edges, 1);
		assert!(!reconciler.scene().contains(&"b".into()));
		assert!(reconciler.scene().edges().is_empty());

		let again = reconciler.reconcile(&snapshot, None, None);
		assert_eq!(again.removed, 0);
	}

	#[test]
	fn labels_follow_the_selection_perspective() {
		let mut reconciler = reconciler();
		let snapshot = mentor_snapshot();
		let edge_of = |r: &SceneReconciler| r.scene().edges()[0].clone();

		reconciler.reconcile(&snapshot, None, None);
		let neutral = edge_of(&reconciler);
		assert_eq!(neutral.label.as_deref(), Some("Mentor / Mentee"));
		assert_eq!(neutral.class, EdgeClass::Neutral);

		reconciler.reconcile(&snapshot, Some(&"a".into()), None);
		let from_a = edge_of(&reconciler);
		assert_eq!(from_a.label.as_deref(), Some("Mentor"));
		assert_eq!((from_a.from.as_str(), from_a.to.as_str()), ("a", "b"));

		reconciler.reconcile(&snapshot, Some(&"b".into()), None);
		let from_b = edge_of(&reconciler);
		assert_eq!(from_b.label.as_deref(), Some("Mentee"));
		assert_eq!((from_b.from.as_str(), from_b.to.as_str()), ("b", "a"));
		assert_eq!(from_b.class, EdgeClass::Selected);
	}

	#[test]
	fn selection_dims_unrelated_nodes_and_edges() {
		let mut reconciler = reconciler();
		let mut snapshot = mentor_snapshot();
		snapshot.nodes.push(PersonRecord::new("c", "Cy", Sex::Other));
		snapshot.nodes.push(PersonRecord::new("d", "Di", Sex::Female));
		snapshot.edges.push(RelationshipRecord::new(
			"c",
			"d",
			RelationshipCategory::Social,
			"Friend",
			"Friend",
		));
		let config = GraphViewConfig::default();

		reconciler.reconcile(&snapshot, Some(&"a".into()), None);
		let scene = reconciler.scene();

		let selected = scene.node(&"a".into()).unwrap();
		assert_eq!(selected.size, config.selected_node_size);
		assert_eq!(scene.node(&"b".into()).unwrap().class, NodeClass::Neighbor);
		let dimmed = scene.node(&"c".into()).unwrap();
		assert_eq!(dimmed.class, NodeClass::Dimmed);
		assert_eq!(dimmed.color.a, config.dimmed_opacity);

		let unrelated = &scene.edges()[1];
		assert_eq!(unrelated.class, EdgeClass::Dimmed);
		assert_eq!(unrelated.label, None);
		assert_eq!(unrelated.size, config.dimmed_edge.size);
	}

	#[test]
	fn dangling_relationship_is_skipped_quietly() {
		let mut reconciler = reconciler();
		let mut snapshot = mentor_snapshot();
		snapshot.edges.push(RelationshipRecord::new(
			"a",
			"ghost",
			RelationshipCategory::Other,
			"Pen Pal",
			"Pen Pal",
		));

		let report = reconciler.reconcile(&snapshot, None, None);

		assert_eq!(report.skipped_edges, 1);
		assert_eq!(reconciler.scene().edges().len(), 1);
	}

	#[test]
	fn unchanged_photo_is_decorated_once() {
		let mut reconciler = reconciler();
		let mut snapshot = mentor_snapshot();
		snapshot.nodes[0].photo_url = Some("https://img.test/ada.png".into());

		let first = reconciler.reconcile(&snapshot, None, None);
		let second = reconciler.reconcile(&snapshot, Some(&"b".into()), None);

		assert_eq!(first.decorations.len(), 1);
		assert_eq!(first.decorations[0].photo_url, "https://img.test/ada.png");
		assert!(second.decorations.is_empty());
	}

	#[test]
	fn decoration_result_respects_generation_and_existence() {
		let mut reconciler = reconciler();
		let mut snapshot = mentor_snapshot();
		let a = PersonId::from("a");
		snapshot.nodes[0].photo_url = Some("https://img.test/old.png".into());
		let old = reconciler.reconcile(&snapshot, None, None).decorations.remove(0);

		snapshot.nodes[0].photo_url = Some("https://img.test/new.png".into());
		let new = reconciler.reconcile(&snapshot, None, None).decorations.remove(0);

		assert!(!reconciler.apply_decoration(&old, ImageHandle::Raw(old.photo_url.clone())));
		assert!(reconciler.apply_decoration(&new, ImageHandle::Composited("data:new".into())));
		assert_eq!(
			reconciler.scene().node(&a).unwrap().image,
			ImageHandle::Composited("data:new".into())
		);

		snapshot.nodes.retain(|n| n.id != a);
		reconciler.reconcile(&snapshot, None, None);
		assert!(!reconciler.apply_decoration(&new, ImageHandle::Raw(new.photo_url.clone())));
	}

	#[test]
	fn image_urls_track_only_what_nodes_draw() {
		let mut reconciler = reconciler();
		let mut snapshot = mentor_snapshot();
		snapshot.nodes[0].photo_url = Some("https://img.test/old.png".into());
		let old = reconciler.reconcile(&snapshot, None, None).decorations.remove(0);
		reconciler.apply_decoration(&old, ImageHandle::Composited("data:old".into()));
		assert_eq!(reconciler.scene().image_urls(), HashSet::from(["data:old"]));

		snapshot.nodes[0].photo_url = Some("https://img.test/new.png".into());
		let new = reconciler.reconcile(&snapshot, None, None).decorations.remove(0);
		reconciler.apply_decoration(&new, ImageHandle::Composited("data:new".into()));
		assert_eq!(reconciler.scene().image_urls(), HashSet::from(["data:new"]));

		snapshot.nodes.remove(0);
		reconciler.reconcile(&snapshot, None, None);
		assert!(reconciler.scene().image_urls().is_empty());
	}

	#[test]
	fn removing_photo_restores_initials() {
		let mut reconciler = reconciler();
		let mut snapshot = mentor_snapshot();
		let a = PersonId::from("a");
		snapshot.nodes[0].photo_url = Some("https://img.test/ada.png".into());
		let job = reconciler.reconcile(&snapshot, None, None).decorations.remove(0);
		reconciler.apply_decoration(&job, ImageHandle::Composited("data:ada".into()));

		snapshot.nodes[0].photo_url = None;
		let report = reconciler.reconcile(&snapshot, None, None);

		assert!(report.decorations.is_empty());
		assert_eq!(
			reconciler.scene().node(&a).unwrap().image,
			ImageHandle::initials_for("Ada Lovelace", Sex::Female)
		);
	}

	#[test]
	fn dragged_node_keeps_live_position_over_stale_store() {
		let mut reconciler = reconciler();
		let a = PersonId::from("a");
		let mut snapshot = mentor_snapshot();
		snapshot.set_position(&a, Point::new(10.0, 10.0));
		reconciler.reconcile(&snapshot, None, None);

		assert!(reconciler.move_node(&a, Point::new(55.0, 66.0)));
		reconciler.reconcile(&snapshot, None, Some(&a));

		assert_eq!(reconciler.scene().node(&a).unwrap().position, Point::new(55.0, 66.0));
	}

	#[test]
	fn hit_test_prefers_topmost_node() {
		let mut reconciler = reconciler();
		let snapshot = Snapshot::new(
			vec![
				PersonRecord::new("a", "Ann", Sex::Female).with_position(10.0, 10.0),
				PersonRecord::new("b", "Bob", Sex::Male).with_position(12.0, 10.0),
			],
			vec![],
		);
		reconciler.reconcile(&snapshot, None, None);

		assert_eq!(reconciler.node_at(Point::new(11.0, 10.0)).unwrap().id.as_str(), "b");
		assert!(reconciler.node_at(Point::new(500.0, 500.0)).is_none());
	}
}
