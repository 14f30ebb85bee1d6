use leptos::prelude::*;
use relationship_graph::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App)
}
