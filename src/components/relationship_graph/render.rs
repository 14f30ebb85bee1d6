use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;

use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::highlight::NodeClass;
use super::scene::{VisualEdge, VisualNode};
use super::state::GraphViewState;

const BACKGROUND: &str = "#f9fafb";
const LABEL_COLOR: &str = "#1f2937";

/// Browser image elements for decorated and raw photo URLs, loaded lazily.
#[derive(Default)]
pub struct ImageAtlas {
	images: HashMap<String, HtmlImageElement>,
}

impl ImageAtlas {
	/// The image for `url` if it has finished loading; starts the load otherwise.
	fn ready(&mut self, url: &str) -> Option<&HtmlImageElement> {
		if !self.images.contains_key(url) {
			let image = HtmlImageElement::new().ok()?;
			image.set_src(url);
			self.images.insert(url.to_owned(), image);
		}
		self.images
			.get(url)
			.filter(|image| image.complete() && image.natural_width() > 0)
	}

	/// Drops images no node draws any more.
	fn prune(&mut self, live: &HashSet<&str>) {
		self.images.retain(|url, _| live.contains(url.as_str()));
	}
}

pub fn render(state: &GraphViewState, ctx: &CanvasRenderingContext2d, atlas: &mut ImageAtlas) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx, atlas);
	ctx.restore();
	atlas.prune(&state.scene().image_urls());
}

fn draw_edges(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let scene = state.scene();

	for edge in scene.edges() {
		let (Some(from), Some(to)) = (scene.node(&edge.from), scene.node(&edge.to)) else {
			continue;
		};
		let (x1, y1, x2, y2) = (from.position.x, from.position.y, to.position.x, to.position.y);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let (ux, uy) = (dx / dist, dy / dist);
		let arrow_size = (edge.size * 3.0 + 4.0) / k;
		let color = edge.color.to_css();

		ctx.set_stroke_style_str(&color);
		ctx.set_line_width(edge.size / k);
		ctx.begin_path();
		ctx.move_to(x1 + ux * from.size, y1 + uy * from.size);
		ctx.line_to(
			x2 - ux * (to.size + arrow_size),
			y2 - uy * (to.size + arrow_size),
		);
		ctx.stroke();

		ctx.set_fill_style_str(&color);
		let (tip_x, tip_y) = (x2 - ux * to.size, y2 - uy * to.size);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		draw_edge_label(edge, (x1 + x2) / 2.0, (y1 + y2) / 2.0, k, ctx);
	}
}

fn draw_edge_label(edge: &VisualEdge, x: f64, y: f64, k: f64, ctx: &CanvasRenderingContext2d) {
	let Some(label) = &edge.label else {
		return;
	};
	ctx.set_font(&format!("{}px sans-serif", 11.0 / k.max(0.5)));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(LABEL_COLOR);
	let _ = ctx.fill_text(label, x, y);
}

fn draw_nodes(state: &GraphViewState, ctx: &CanvasRenderingContext2d, atlas: &mut ImageAtlas) {
	let k = state.transform.k;
	for node in state.scene().nodes() {
		ctx.set_global_alpha(node.color.a);
		let photo = node.image.url().and_then(|url| atlas.ready(url));
		match photo {
			Some(image) => draw_photo(node, image, ctx),
			None => draw_initials(node, &node.image.fallback_text(&node.label), k, ctx),
		}

		if node.class == NodeClass::Selected {
			ctx.begin_path();
			let _ = ctx.arc(node.position.x, node.position.y, node.size + 3.0 / k, 0.0, TAU);
			ctx.set_stroke_style_str(LABEL_COLOR);
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		}

		ctx.set_fill_style_str(LABEL_COLOR);
		ctx.set_font(&format!("{}px sans-serif", 12.0 / k.max(0.5)));
		ctx.set_text_align("center");
		ctx.set_text_baseline("top");
		let _ = ctx.fill_text(
			&node.label,
			node.position.x,
			node.position.y + node.size + 4.0 / k,
		);
		ctx.set_global_alpha(1.0);
	}
}

fn draw_photo(node: &VisualNode, image: &HtmlImageElement, ctx: &CanvasRenderingContext2d) {
	let (x, y, r) = (node.position.x, node.position.y, node.size);
	ctx.save();
	ctx.begin_path();
	let _ = ctx.arc(x, y, r, 0.0, TAU);
	ctx.clip();
	let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(image, x - r, y - r, r * 2.0, r * 2.0);
	ctx.restore();
}

fn draw_initials(node: &VisualNode, text: &str, k: f64, ctx: &CanvasRenderingContext2d) {
	let (x, y, r) = (node.position.x, node.position.y, node.size);
	ctx.begin_path();
	let _ = ctx.arc(x, y, r, 0.0, TAU);
	ctx.set_fill_style_str(&node.color.with_alpha(1.0).to_css());
	ctx.fill();

	if text.is_empty() || r * k < 6.0 {
		return;
	}
	ctx.set_fill_style_str("white");
	ctx.set_font(&format!("bold {}px sans-serif", r * 0.9));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(text, x, y);
}
