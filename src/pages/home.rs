use std::collections::HashMap;

use leptos::prelude::*;
use log::warn;

use crate::components::relationship_graph::{
	MemoryStore, PersonId, RelationshipCategory, RelationshipRecord, RelationshipGraphCanvas, Sex,
	Snapshot, TreeId,
};

const DEMO_TREE_ID: &str = "demo";

/// Sample people rows in the store's wire shape. Unplaced rows use the (0,0) sentinel.
const DEMO_PEOPLE: &str = r#"{
	"nodes": [
		{ "id": "joe", "full_name": "Joe Bloggs", "sex": "Male", "layout_x": -120.0, "layout_y": -40.0 },
		{ "id": "ann", "full_name": "Ann Bloggs", "sex": "Female", "layout_x": 110.0, "layout_y": -60.0 },
		{ "id": "sam", "full_name": "Sam Bloggs", "sex": "Male", "layout_x": 0.0, "layout_y": 0.0 },
		{ "id": "kit", "full_name": "Kit", "sex": "Other" },
		{ "id": "mia", "full_name": "Mia Torres", "sex": "Female" },
		{ "id": "raj", "full_name": "Raj Patel", "sex": "Male", "photo_url": "https://i.pravatar.cc/256?u=raj" }
	],
	"edges": []
}"#;

fn demo_snapshot() -> Snapshot {
	let mut snapshot: Snapshot = serde_json::from_str(DEMO_PEOPLE).unwrap_or_else(|err| {
		warn!("demo data is malformed: {err}");
		Snapshot::default()
	});
	let sexes: HashMap<PersonId, Sex> = snapshot
		.nodes
		.iter()
		.map(|person| (person.id.clone(), person.sex()))
		.collect();
	let sex_of = |id: &str| sexes.get(&PersonId::from(id)).copied().unwrap_or_default();

	// Forward labels read "target is source's <label>".
	let links = [
		("joe", "ann", RelationshipCategory::Family, "Wife"),
		("joe", "sam", RelationshipCategory::Family, "Son"),
		("ann", "sam", RelationshipCategory::Family, "Son"),
		("sam", "kit", RelationshipCategory::Social, "Best Friend"),
		("ann", "mia", RelationshipCategory::Professional, "Mentee"),
		("mia", "raj", RelationshipCategory::Professional, "Colleague"),
		("raj", "kit", RelationshipCategory::Other, "Climbing Partner"),
	];
	snapshot.edges = links
		.into_iter()
		.map(|(source, target, category, label)| {
			RelationshipRecord::reciprocal(source, target, category, label, sex_of(source))
		})
		.collect();
	snapshot
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let store = MemoryStore::new();
	let snapshot = demo_snapshot();
	let names: HashMap<PersonId, String> = snapshot
		.nodes
		.iter()
		.map(|person| (person.id.clone(), person.display_name.clone()))
		.collect();
	store.insert_tree(TreeId::from(DEMO_TREE_ID), snapshot);
	// ErrorBoundary children must be Send.
	let store = StoredValue::new_local(store);

	let tree_id = Signal::derive(|| Some(TreeId::from(DEMO_TREE_ID)));
	let selected = RwSignal::new(None::<PersonId>);
	let status = RwSignal::new(None::<String>);
	let refresh = RwSignal::new(0u64);

	let selection_text = move || match selected.get() {
		Some(id) => format!(
			"Showing {}'s relationships.",
			names.get(&id).map(String::as_str).unwrap_or("Unknown")
		),
		None => "Click a person to see their relationships.".to_owned(),
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<RelationshipGraphCanvas
					store=store.get_value()
					tree_id=tree_id
					selected=selected
					refresh=Signal::derive(move || Some(refresh.get()))
					status=status
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Relationship Graph"</h1>
					<p class="subtitle">
						"Drag people to reposition. Scroll to zoom. Drag background to pan. Esc cancels a drag."
					</p>
					<p class="selection">{selection_text}</p>
					{move || status.get().map(|message| view! { <p class="status">{message}</p> })}
					<button on:click=move |_| {
						status.set(None);
						refresh.update(|n| *n += 1);
					}>"Reload"</button>
				</div>
			</div>
		</ErrorBoundary>
	}
}
