use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::config::GraphViewConfig;
use super::image::spawn_decoration;
use super::render::{self, ImageAtlas};
use super::scene::ReconcileReport;
use super::state::{GraphViewState, PointerOutcome};
use super::store::GraphStore;
use super::types::{PersonId, TreeId};

type SharedState = Rc<RefCell<GraphViewState>>;

/// Hands every decoration job from a pass to the photo pipeline.
fn dispatch(report: ReconcileReport, state: &SharedState) {
	for request in report.decorations {
		spawn_decoration(request, state.clone());
	}
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

#[component]
pub fn RelationshipGraphCanvas<S>(
	store: S,
	#[prop(into)] tree_id: Signal<Option<TreeId>>,
	selected: RwSignal<Option<PersonId>>,
	/// Bump to refetch the current tree.
	#[prop(optional, into)]
	refresh: MaybeProp<u64>,
	/// Receives user-facing messages for failed store operations.
	#[prop(optional)]
	status: Option<RwSignal<Option<String>>>,
	#[prop(default = GraphViewConfig::default())] config: GraphViewConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView
where
	S: GraphStore + Clone + 'static,
{
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let config = GraphViewConfig {
		layout_seed: js_sys::Date::now() as u64,
		..config
	};
	let state: SharedState = Rc::new(RefCell::new(GraphViewState::new(config, 800.0, 600.0)));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let viewport = |window: &Window| {
			(
				window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(800.0),
				window.inner_height().ok().and_then(|h| h.as_f64()).unwrap_or(600.0),
			)
		};

		let (w, h) = if fullscreen {
			viewport(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("canvas has no 2d context");
			return;
		};
		{
			let mut s = state_init.borrow_mut();
			s.resize(w, h);
			s.transform.x = w / 2.0;
			s.transform.y = h / 2.0;
		}

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = viewport(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				state_resize.borrow_mut().resize(nw, nh);
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		let mut atlas = ImageAtlas::default();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			render::render(&state_anim.borrow(), &ctx, &mut atlas);
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let (state_fetch, store_fetch) = (state.clone(), store.clone());
	Effect::new(move |_| {
		let _ = refresh.get();
		let Some(tree) = tree_id.get() else {
			return;
		};
		let (state, store) = (state_fetch.clone(), store_fetch.clone());
		let token = state.borrow_mut().begin_fetch();
		spawn_local(async move {
			match store.fetch_nodes_and_edges(&tree).await {
				Ok(snapshot) => {
					let report = state.borrow_mut().apply_snapshot(token, snapshot);
					dispatch(report, &state);
				}
				Err(err) => {
					let current = state.borrow().fetch_failed(token, &err);
					if let (true, Some(status)) = (current, status) {
						status.set(Some(format!("Could not load tree: {err}")));
					}
				}
			}
		});
	});

	let state_sel = state.clone();
	Effect::new(move |_| {
		let report = state_sel.borrow_mut().select(selected.get());
		dispatch(report, &state_sel);
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = canvas_point(canvas_ref, &ev) {
			state_md.borrow_mut().pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = canvas_point(canvas_ref, &ev) {
			state_mm.borrow_mut().pointer_move(x, y);
		}
	};

	// Releasing, or leaving the canvas mid-gesture, ends it the same way.
	let release = {
		let state = state.clone();
		move || {
			let outcome = state.borrow_mut().pointer_up();
			match outcome {
				PointerOutcome::Nothing => {}
				PointerOutcome::Select(next) => selected.set(next),
				PointerOutcome::Persist { id, position } => {
					if !state.borrow_mut().submit_write(&id, position) {
						debug!("position of {id} queued behind an in-flight write");
						return;
					}
					let (store, state) = (store.clone(), state.clone());
					spawn_local(async move {
						let mut next = Some(position);
						while let Some(position) = next {
							match store.persist_position(&id, position).await {
								Ok(()) => debug!("persisted position of {id}"),
								Err(err) => {
									error!("could not save position of {id}: {err}");
									if let Some(status) = status {
										status.set(Some(format!("Could not save position: {err}")));
									}
								}
							}
							next = state.borrow_mut().write_settled(&id);
						}
					});
				}
			}
		}
	};
	let release_leave = release.clone();
	let on_mouseup = move |_: MouseEvent| release();
	let on_mouseleave = move |_: MouseEvent| release_leave();

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = canvas_point(canvas_ref, &ev) {
			state_wh.borrow_mut().zoom(x, y, ev.delta_y());
		}
	};

	let state_kd = state.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		if ev.key() == "Escape" && state_kd.borrow_mut().cancel_drag() {
			debug!("drag cancelled");
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="relationship-graph-canvas"
			tabindex="0"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:keydown=on_keydown
			style="display: block; cursor: grab; outline: none;"
		/>
	}
}
