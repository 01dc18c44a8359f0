use log::warn;

use super::scale::Accessor;
use super::simulation::ForceParams;
use super::types::GraphEdge;

/// Everything tunable about the graph view.
#[derive(Clone, Debug, Default)]
pub struct GraphConfig {
	pub forces: ForceParams,
	pub zoom: ZoomConfig,
	pub theme: Theme,
	pub backdrops: BackdropConfig,
}

impl GraphConfig {
	pub fn validated(mut self) -> Self {
		self.zoom = self.zoom.validated();
		self
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomConfig {
	pub min: f64,
	pub max: f64,
	pub initial: f64,
	/// Scale factor applied per wheel notch.
	pub step: f64,
}

impl Default for ZoomConfig {
	fn default() -> Self {
		Self {
			min: 0.75,
			max: 8.0,
			initial: 4.0,
			step: 1.1,
		}
	}
}

impl ZoomConfig {
	/// Never panics, even on a range that has not been through [`Self::validated`].
	pub fn clamp(&self, k: f64) -> f64 {
		k.max(self.min).min(self.max)
	}

	/// Falls back to the defaults for a range that is empty, inverted or not
	/// finite, and for a step that would not zoom.
	pub fn validated(self) -> Self {
		let defaults = Self::default();
		let range_ok = self.min.is_finite()
			&& self.max.is_finite()
			&& self.min > 0.0
			&& self.min <= self.max;
		let (min, max) = if range_ok {
			(self.min, self.max)
		} else {
			warn!("invalid zoom range {}..{}, using defaults", self.min, self.max);
			(defaults.min, defaults.max)
		};
		let step = if self.step.is_finite() && self.step > 1.0 {
			self.step
		} else {
			warn!("invalid zoom step {}, using {}", self.step, defaults.step);
			defaults.step
		};
		let initial = if self.initial.is_finite() {
			self.initial.max(min).min(max)
		} else {
			defaults.initial.max(min).min(max)
		};
		Self {
			min,
			max,
			initial,
			step,
		}
	}
}

#[derive(Clone, Debug)]
pub struct Theme {
	pub background: String,
	pub node_fill: String,
	pub node_stroke: String,
	pub node_stroke_width: f64,
	pub link_stroke: String,
	pub link_width: Accessor<GraphEdge, f64>,
	pub link_opacity: f64,
	pub text_fill: String,
	/// Text drawn behind the graph at the centre of the viewport.
	pub greeting: Option<String>,
	pub greeting_size: f64,
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: "#fff".into(),
			node_fill: "#fff".into(),
			node_stroke: "#000".into(),
			node_stroke_width: 0.4,
			link_stroke: "#000".into(),
			link_width: Accessor::Constant(0.4),
			link_opacity: 1.0,
			text_fill: "#000".into(),
			greeting: Some("Hello, stranger.".into()),
			greeting_size: 30.0,
		}
	}
}

/// Where hover backdrops are looked up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackdropConfig {
	pub root: String,
	pub extension: String,
}

impl Default for BackdropConfig {
	fn default() -> Self {
		Self {
			root: "/backgrounds".into(),
			extension: "jpg".into(),
		}
	}
}

impl BackdropConfig {
	/// Joins an already URL-escaped file stem onto the backdrop directory.
	pub fn path_for(&self, stem: &str) -> String {
		format!(
			"{}/{}.{}",
			self.root.trim_end_matches('/'),
			stem,
			self.extension
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn backdrop_path_is_built_from_the_node_id() {
		let cfg = BackdropConfig::default();
		assert_eq!(cfg.path_for("Tide%20Pool"), "/backgrounds/Tide%20Pool.jpg");

		let cfg = BackdropConfig {
			root: "assets/bg/".into(),
			extension: "webp".into(),
		};
		assert_eq!(cfg.path_for("a"), "assets/bg/a.webp");
	}

	#[test]
	fn zoom_clamp_respects_bounds() {
		let zoom = ZoomConfig::default();
		assert_eq!(zoom.clamp(0.1), 0.75);
		assert_eq!(zoom.clamp(100.0), 8.0);
		assert_eq!(zoom.clamp(2.0), 2.0);
	}

	#[test]
	fn inverted_or_nan_zoom_range_falls_back_to_defaults() {
		let inverted = ZoomConfig {
			min: 8.0,
			max: 0.5,
			initial: 4.0,
			step: 1.1,
		}
		.validated();
		assert_eq!((inverted.min, inverted.max), (0.75, 8.0));
		assert_eq!(inverted.clamp(100.0), 8.0);

		let nan = ZoomConfig {
			min: f64::NAN,
			max: 3.0,
			initial: f64::NAN,
			step: 0.5,
		}
		.validated();
		assert_eq!(nan, ZoomConfig::default());
	}

	#[test]
	fn initial_zoom_is_pulled_into_range() {
		let zoom = ZoomConfig {
			min: 1.0,
			max: 2.0,
			initial: 4.0,
			step: 1.2,
		}
		.validated();
		assert_eq!(zoom.initial, 2.0);
		assert_eq!(zoom.step, 1.2);
	}

	#[test]
	fn clamp_on_an_unchecked_range_does_not_panic() {
		let zoom = ZoomConfig {
			min: 8.0,
			max: 0.5,
			initial: 1.0,
			step: 1.1,
		};
		assert_eq!(zoom.clamp(3.0), 0.5);
	}
}
