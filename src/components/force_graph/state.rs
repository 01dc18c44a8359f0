use log::debug;

use super::config::GraphConfig;
use super::scene::{Backdrop, Scene};
use super::simulation::{ForceSimulation, LayoutCommand};
use super::types::{GraphData, NodeId, NodeKind, Viewport};

/// Screen position = `(x, y) + k * graph position`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<NodeId>,
	/// Pointer minus node position at grab time, in graph space.
	pub offset_x: f64,
	pub offset_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

pub struct ForceGraphState {
	pub simulation: ForceSimulation,
	pub scene: Scene,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: Option<NodeId>,
	pub viewport: Viewport,
	pub config: GraphConfig,
	settled: bool,
	/// Set by anything that changes the picture outside of a layout tick.
	redraw: bool,
}

impl ForceGraphState {
	pub fn new(data: &GraphData, viewport: Viewport, config: GraphConfig) -> Self {
		let config = config.validated();
		let simulation = ForceSimulation::new(data, config.forces.clone());
		let scene = Scene::new(&simulation, &config.theme);
		let (cx, cy) = viewport.center();
		Self {
			simulation,
			scene,
			transform: ViewTransform {
				x: cx,
				y: cy,
				k: config.zoom.initial,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: None,
			viewport,
			config,
			settled: false,
			redraw: true,
		}
	}

	/// Asks for one more frame even if the layout is at rest.
	pub fn request_redraw(&mut self) {
		self.redraw = true;
	}

	/// Returns whether a redraw was requested since the last call.
	pub fn take_redraw(&mut self) -> bool {
		std::mem::take(&mut self.redraw)
	}

	/// Runs one simulation step if the layout is still moving and brings the
	/// scene up to date. Returns whether anything needs redrawing.
	pub fn tick(&mut self) -> bool {
		if !self.simulation.is_running() {
			if !self.settled {
				self.settled = true;
				debug!("layout settled at alpha {:.4}", self.simulation.alpha());
			}
			return false;
		}
		self.settled = false;
		self.simulation.tick();
		self.scene.sync(&self.simulation) > 0
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeId> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.scene.node_at(gx, gy).map(|r| r.key.clone())
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		let Some(id) = self.node_at_position(sx, sy) else {
			self.pan = PanState {
				active: true,
				start_x: sx,
				start_y: sy,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
			return;
		};
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let Some(node) = self.simulation.node(&id) else {
			return;
		};
		let (nx, ny) = (node.x, node.y);
		debug!("drag start: {id}");
		self.drag = DragState {
			node: Some(id.clone()),
			offset_x: gx - nx,
			offset_y: gy - ny,
		};
		self.simulation.send(LayoutCommand::Reheat);
		self.simulation
			.send(LayoutCommand::PinSet { id, x: nx, y: ny });
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if let Some(id) = self.drag.node.clone() {
			let (gx, gy) = self.screen_to_graph(sx, sy);
			self.simulation.send(LayoutCommand::PinSet {
				id,
				x: gx - self.drag.offset_x,
				y: gy - self.drag.offset_y,
			});
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
			self.redraw = true;
		} else {
			let hovered = self.node_at_position(sx, sy);
			self.set_hover(hovered);
		}
	}

	pub fn pointer_up(&mut self) {
		if let Some(id) = self.drag.node.take() {
			debug!("drag end: {id}");
			self.simulation.send(LayoutCommand::PinClear { id });
			self.simulation.send(LayoutCommand::Cool);
		}
		self.pan.active = false;
	}

	pub fn pointer_leave(&mut self) {
		self.pointer_up();
		self.set_hover(None);
	}

	/// Zooms by one wheel notch around the pointer: out for a positive
	/// delta, in for a negative one. A purely horizontal scroll has a zero
	/// vertical delta and leaves the zoom alone.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		if delta_y == 0.0 || delta_y.is_nan() {
			return;
		}
		let step = self.config.zoom.step;
		let factor = if delta_y > 0.0 { 1.0 / step } else { step };
		self.zoom_at(sx, sy, factor);
	}

	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = self.config.zoom.clamp(self.transform.k * factor);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.redraw = true;
	}

	pub fn set_hover(&mut self, node: Option<NodeId>) {
		if self.hover == node {
			return;
		}
		self.scene.backdrop = node.as_deref().and_then(|id| {
			let rect = self.scene.rect(id)?;
			(rect.kind != NodeKind::Tag).then(|| Backdrop {
				node: id.to_string(),
			})
		});
		debug!("hover: {node:?}");
		self.hover = node;
		self.redraw = true;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::builder::{BuildOptions, build_graph, build_graph_with};
	use crate::components::force_graph::types::Record;

	fn records() -> Vec<Record> {
		vec![
			Record::new("A", &["x"]),
			Record::new("B", &["x"]),
			Record::new("C", &["y"]),
		]
	}

	fn state() -> ForceGraphState {
		ForceGraphState::new(
			&build_graph("root", &records()),
			Viewport::new(800.0, 600.0),
			GraphConfig::default(),
		)
	}

	fn screen_of(s: &ForceGraphState, id: &str) -> (f64, f64) {
		let n = s.simulation.node(id).unwrap();
		(
			s.transform.x + n.x * s.transform.k,
			s.transform.y + n.y * s.transform.k,
		)
	}

	#[test]
	fn starts_zoomed_in_on_the_origin() {
		let s = state();
		assert_eq!(
			s.transform,
			ViewTransform {
				x: 400.0,
				y: 300.0,
				k: 4.0
			}
		);
		assert_eq!(s.screen_to_graph(400.0, 300.0), (0.0, 0.0));
	}

	#[test]
	fn zoom_never_leaves_configured_range() {
		let mut s = state();
		for _ in 0..100 {
			s.wheel(123.0, 45.0, -1.0);
			assert!(s.transform.k <= 8.0);
		}
		assert_eq!(s.transform.k, 8.0);
		for _ in 0..200 {
			s.wheel(700.0, 10.0, 1.0);
			assert!(s.transform.k >= 0.75);
		}
		assert_eq!(s.transform.k, 0.75);
		s.zoom_at(0.0, 0.0, 1e9);
		assert_eq!(s.transform.k, 8.0);
	}

	#[test]
	fn horizontal_scroll_does_not_zoom() {
		let mut s = state();
		let before = s.transform;
		s.wheel(400.0, 300.0, 0.0);
		s.wheel(400.0, 300.0, -0.0);
		s.wheel(400.0, 300.0, f64::NAN);
		assert_eq!(s.transform, before);
	}

	#[test]
	fn invalid_zoom_config_falls_back_to_defaults() {
		let mut config = GraphConfig::default();
		config.zoom.min = 8.0;
		config.zoom.max = 0.5;
		config.zoom.initial = f64::NAN;
		let mut s = ForceGraphState::new(
			&build_graph("root", &records()),
			Viewport::new(800.0, 600.0),
			config,
		);
		assert_eq!(s.transform.k, 4.0);
		for _ in 0..100 {
			s.wheel(10.0, 10.0, 1.0);
		}
		assert_eq!(s.transform.k, 0.75);
	}

	#[test]
	fn redraw_is_only_requested_when_the_view_changes() {
		let mut s = state();
		assert!(s.take_redraw());
		assert!(!s.take_redraw());
		for _ in 0..1000 {
			s.tick();
		}
		assert!(!s.tick());
		assert!(!s.take_redraw());

		s.wheel(400.0, 300.0, 1.0);
		assert!(s.take_redraw());
		assert!(!s.take_redraw());

		s.wheel(400.0, 300.0, 0.0);
		assert!(!s.take_redraw());

		s.pointer_down(-4000.0, -4000.0);
		assert!(s.pan.active);
		s.pointer_move(-3990.0, -4000.0);
		assert!(s.take_redraw());
		s.pointer_up();

		s.set_hover(Some("A".into()));
		assert!(s.take_redraw());
		s.set_hover(Some("A".into()));
		assert!(!s.take_redraw());
	}

	#[test]
	fn zoom_keeps_point_under_pointer_fixed() {
		let mut s = state();
		let before = s.screen_to_graph(250.0, 100.0);
		s.wheel(250.0, 100.0, 1.0);
		let after = s.screen_to_graph(250.0, 100.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
	}

	#[test]
	fn background_drag_pans() {
		let mut s = state();
		s.pointer_down(5.0, 5.0);
		assert!(s.pan.active);
		s.pointer_move(25.0, -5.0);
		assert_eq!((s.transform.x, s.transform.y), (420.0, 290.0));
		s.pointer_up();
		assert!(!s.pan.active);
	}

	#[test]
	fn dragging_pins_the_node_and_release_clears_it() {
		let mut s = state();
		s.tick();
		let (sx, sy) = screen_of(&s, "C");
		s.pointer_down(sx + 4.0, sy);
		assert_eq!(s.drag.node.as_deref(), Some("C"));

		s.pointer_move(sx + 44.0, sy + 20.0);
		assert!(s.tick());
		let c = s.simulation.node("C").unwrap();
		let expected = c.pin.unwrap();
		assert_eq!((c.x, c.y), expected);
		assert!(s.simulation.alpha() >= 0.29);

		for _ in 0..10 {
			s.tick();
			let c = s.simulation.node("C").unwrap();
			assert_eq!((c.x, c.y), expected);
		}

		s.pointer_up();
		s.simulation.drain_commands();
		let c = s.simulation.node("C").unwrap();
		assert_eq!(c.pin, None);
		assert_eq!((c.vx, c.vy), (0.0, 0.0));
	}

	#[test]
	fn hover_selects_one_backdrop_and_clears_on_leave() {
		let mut s = state();
		s.simulation.send(LayoutCommand::PinSet {
			id: "A".into(),
			x: 120.0,
			y: -100.0,
		});
		s.tick();
		let (sx, sy) = screen_of(&s, "A");
		s.pointer_move(sx, sy);
		assert_eq!(s.hover.as_deref(), Some("A"));
		assert_eq!(
			s.scene.backdrop.as_ref().map(|b| b.node.as_str()),
			Some("A")
		);

		s.pointer_leave();
		assert_eq!(s.hover, None);
		assert_eq!(s.scene.backdrop, None);
	}

	#[test]
	fn hovering_a_tag_shows_no_backdrop() {
		let options = BuildOptions {
			tag_nodes: true,
			..BuildOptions::new("root")
		};
		let mut s = ForceGraphState::new(
			&build_graph_with(&records(), &options),
			Viewport::new(800.0, 600.0),
			GraphConfig::default(),
		);
		s.set_hover(Some("x".into()));
		assert_eq!(s.hover.as_deref(), Some("x"));
		assert_eq!(s.scene.backdrop, None);
	}

	#[test]
	fn stops_ticking_once_settled() {
		let mut s = state();
		for _ in 0..1000 {
			s.tick();
		}
		assert!(!s.tick());
	}
}
