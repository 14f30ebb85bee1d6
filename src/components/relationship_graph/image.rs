use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use leptos::task::spawn_local;
use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use super::config::sex_color;
use super::decoration::{DecorationError, DecorationRequest, ImageHandle};
use super::state::GraphViewState;

const DECORATED_SIZE: u32 = 256;
const RING_WIDTH: f64 = 16.0;

/// Load and error callbacks of one photo. Whichever fires first takes both out,
/// so the one that never runs is released with it.
struct HandlerPair<T> {
	slot: RefCell<Option<[T; 2]>>,
}

impl<T> HandlerPair<T> {
	fn new() -> Self {
		Self {
			slot: RefCell::new(None),
		}
	}

	fn arm(&self, handlers: [T; 2]) {
		*self.slot.borrow_mut() = Some(handlers);
	}

	fn settle(&self) -> Option<[T; 2]> {
		self.slot.borrow_mut().take()
	}
}

type PhotoHandlers = Rc<HandlerPair<Closure<dyn FnMut()>>>;

fn release(image: &HtmlImageElement, handlers: &PhotoHandlers) {
	image.set_onload(None);
	image.set_onerror(None);
	if let Some(closures) = handlers.settle() {
		// The running callback is one of these; drop them after it returns.
		spawn_local(async move { drop(closures) });
	}
}

/// Loads the requested photo and applies the decorated result once it
/// resolves. Fire-and-forget: failures fall back to the raw photo URL.
pub fn spawn_decoration(request: DecorationRequest, state: Rc<RefCell<GraphViewState>>) {
	let image = match HtmlImageElement::new() {
		Ok(image) => image,
		Err(_) => {
			let raw = ImageHandle::Raw(request.photo_url.clone());
			state.borrow_mut().apply_decoration(&request, raw);
			return;
		}
	};
	image.set_cross_origin(Some("anonymous"));
	debug!("decorating {} from {}", request.id, request.photo_url);

	let handlers: PhotoHandlers = Rc::new(HandlerPair::new());
	let onload: Closure<dyn FnMut()> = {
		let (image, request, state, handlers) =
			(image.clone(), request.clone(), state.clone(), handlers.clone());
		Closure::once(move || {
			release(&image, &handlers);
			let decorated = match composite(&image, &request) {
				Ok(data_url) => ImageHandle::Composited(data_url),
				Err(err) => {
					warn!("{err}; showing undecorated photo");
					ImageHandle::Raw(request.photo_url.clone())
				}
			};
			state.borrow_mut().apply_decoration(&request, decorated);
		})
	};
	let onerror: Closure<dyn FnMut()> = {
		let (image, request, handlers) = (image.clone(), request.clone(), handlers.clone());
		Closure::once(move || {
			release(&image, &handlers);
			let err = DecorationError::Load {
				url: request.photo_url.clone(),
			};
			warn!("{err}; falling back to raw url");
			let raw = ImageHandle::Raw(request.photo_url.clone());
			state.borrow_mut().apply_decoration(&request, raw);
		})
	};

	image.set_onload(Some(onload.as_ref().unchecked_ref()));
	image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
	handlers.arm([onload, onerror]);
	image.set_src(&request.photo_url);
}

/// Draws `image` covering a circle inside a ring of the sex colour and
/// returns the result as a PNG data URL.
fn composite(image: &HtmlImageElement, request: &DecorationRequest) -> Result<String, DecorationError> {
	let fail = |reason: &str| DecorationError::Composite {
		url: request.photo_url.clone(),
		reason: reason.to_owned(),
	};

	let (width, height) = (image.natural_width() as f64, image.natural_height() as f64);
	if width == 0.0 || height == 0.0 {
		return Err(fail("image has no pixels"));
	}

	let canvas: HtmlCanvasElement = web_sys::window()
		.and_then(|window| window.document())
		.and_then(|document| document.create_element("canvas").ok())
		.and_then(|element| element.dyn_into().ok())
		.ok_or_else(|| fail("no canvas available"))?;
	canvas.set_width(DECORATED_SIZE);
	canvas.set_height(DECORATED_SIZE);
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|ctx| ctx.dyn_into().ok())
		.ok_or_else(|| fail("no 2d context"))?;

	let radius = DECORATED_SIZE as f64 / 2.0;
	let inner = radius - RING_WIDTH;

	ctx.begin_path();
	ctx.arc(radius, radius, radius, 0.0, TAU)
		.map_err(|_| fail("ring path"))?;
	ctx.set_fill_style_str(&sex_color(request.sex).to_css());
	ctx.fill();

	ctx.begin_path();
	ctx.arc(radius, radius, inner, 0.0, TAU)
		.map_err(|_| fail("mask path"))?;
	ctx.clip();

	let scale = (inner * 2.0 / width).max(inner * 2.0 / height);
	let (draw_width, draw_height) = (width * scale, height * scale);
	ctx.draw_image_with_html_image_element_and_dw_and_dh(
		image,
		radius - draw_width / 2.0,
		radius - draw_height / 2.0,
		draw_width,
		draw_height,
	)
	.map_err(|_| fail("draw failed"))?;

	// A photo served without CORS headers taints the canvas and cannot be exported.
	canvas.to_data_url().map_err(|_| fail("canvas is tainted"))
}
