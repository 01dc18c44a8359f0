use std::collections::HashMap;
use std::f64::consts::PI;

use log::debug;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::config::{BackdropConfig, Theme};
use super::scene::{Backdrop, RoundedRect, Scene};
use super::state::ForceGraphState;

/// URL of a node's backdrop. Node ids are free text, so every character
/// that is not safe in a path segment (`#`, `?`, `/`, spaces) is escaped.
pub fn backdrop_url(config: &BackdropConfig, node: &str) -> String {
	config.path_for(&String::from(js_sys::encode_uri_component(node)))
}

/// Backdrop images by URL. Loads are started on first use; an image that
/// has not finished loading, or failed to, is simply not drawn.
#[derive(Default)]
pub struct BackdropCache {
	images: HashMap<String, HtmlImageElement>,
}

impl BackdropCache {
	pub fn ready(&mut self, config: &BackdropConfig, backdrop: &Backdrop) -> Option<&HtmlImageElement> {
		let url = backdrop_url(config, &backdrop.node);
		if !self.images.contains_key(&url) {
			let image = HtmlImageElement::new().ok()?;
			image.set_src(&url);
			debug!("loading backdrop {url}");
			self.images.insert(url.clone(), image);
		}
		self.images
			.get(&url)
			.filter(|img| img.complete() && img.natural_width() > 0)
	}
}

/// Draws one frame. Returns false while the hovered node's backdrop is still
/// loading, so the caller knows to draw again.
///
/// The backdrop shows only through edges and node outlines. Edges are erased
/// inside node boxes first, and node fills, greeting and background are
/// slid underneath at the end with `destination-over`.
pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, cache: &mut BackdropCache) -> bool {
	let (w, h) = (state.viewport.outer_width(), state.viewport.outer_height());
	let (theme, scene, t) = (&state.config.theme, &state.scene, state.transform);
	ctx.clear_rect(0.0, 0.0, w, h);

	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_edges(scene, theme, ctx);
	let _ = ctx.set_global_composite_operation("destination-out");
	fill_nodes(scene, "#000", ctx);
	let _ = ctx.set_global_composite_operation("source-over");
	stroke_nodes(scene, theme, ctx);
	ctx.restore();

	let mut complete = true;
	if let Some(backdrop) = &scene.backdrop {
		match cache.ready(&state.config.backdrops, backdrop) {
			Some(image) => {
				let _ = ctx.set_global_composite_operation("source-atop");
				draw_cover(image, w, h, ctx);
				let _ = ctx.set_global_composite_operation("source-over");
			}
			None => complete = false,
		}
	}

	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_labels(scene, theme, ctx);
	let _ = ctx.set_global_composite_operation("destination-over");
	fill_nodes(scene, &theme.node_fill, ctx);
	ctx.restore();

	let _ = ctx.set_global_composite_operation("destination-over");
	if let Some(greeting) = &theme.greeting {
		let (cx, cy) = state.viewport.center();
		ctx.set_fill_style_str(&theme.text_fill);
		ctx.set_font(&format!("{}px sans-serif", theme.greeting_size));
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let _ = ctx.fill_text(greeting, cx, cy);
	}
	ctx.set_fill_style_str(&theme.background);
	ctx.fill_rect(0.0, 0.0, w, h);
	let _ = ctx.set_global_composite_operation("source-over");
	complete
}

fn draw_edges(scene: &Scene, theme: &Theme, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str(&theme.link_stroke);
	ctx.set_global_alpha(theme.link_opacity);
	ctx.set_line_cap("round");
	for line in &scene.lines {
		ctx.set_line_width(line.width);
		ctx.begin_path();
		ctx.move_to(line.from.0, line.from.1);
		ctx.line_to(line.to.0, line.to.1);
		ctx.stroke();
	}
	ctx.set_global_alpha(1.0);
}

fn node_path(rect: &RoundedRect, ctx: &CanvasRenderingContext2d) {
	let (w, h) = (rect.size.width, rect.size.height);
	let r = rect.size.corner_radius.min(w / 2.0).min(h / 2.0);
	ctx.begin_path();
	if r <= 0.0 {
		ctx.rect(rect.x, rect.y, w, h);
	} else {
		rounded_rect_path(ctx, rect.x, rect.y, w, h, r);
	}
}

fn fill_nodes(scene: &Scene, fill: &str, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(fill);
	for rect in &scene.rects {
		node_path(rect, ctx);
		ctx.fill();
	}
}

fn stroke_nodes(scene: &Scene, theme: &Theme, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str(&theme.node_stroke);
	ctx.set_line_width(theme.node_stroke_width);
	for rect in &scene.rects {
		node_path(rect, ctx);
		ctx.stroke();
	}
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	ctx.move_to(x + r, y);
	ctx.line_to(x + w - r, y);
	let _ = ctx.arc(x + w - r, y + r, r, -PI / 2.0, 0.0);
	ctx.line_to(x + w, y + h - r);
	let _ = ctx.arc(x + w - r, y + h - r, r, 0.0, PI / 2.0);
	ctx.line_to(x + r, y + h);
	let _ = ctx.arc(x + r, y + h - r, r, PI / 2.0, PI);
	ctx.line_to(x, y + r);
	let _ = ctx.arc(x + r, y + r, r, PI, 3.0 * PI / 2.0);
	ctx.close_path();
}

fn draw_labels(scene: &Scene, theme: &Theme, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(&theme.text_fill);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for label in &scene.labels {
		let family = label.style.font.as_deref().unwrap_or("sans-serif");
		ctx.set_font(&format!("{}px {}", label.style.font_size, family));
		let _ = ctx.fill_text(&label.text, label.x, label.y);
	}
}

/// Draws the image scaled to cover the whole viewport, cropping overflow.
fn draw_cover(image: &HtmlImageElement, w: f64, h: f64, ctx: &CanvasRenderingContext2d) {
	let (iw, ih) = (image.natural_width() as f64, image.natural_height() as f64);
	if iw <= 0.0 || ih <= 0.0 {
		return;
	}
	let scale = (w / iw).max(h / ih);
	let (dw, dh) = (iw * scale, ih * scale);
	let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
		image,
		(w - dw) / 2.0,
		(h - dh) / 2.0,
		dw,
		dh,
	);
}
