//! Retained scene of typed shapes, independent of the drawing backend.
//!
//! Shapes are created once from the simulation, lines in edge order and
//! rects and labels in node order; [`Scene::sync`] moves them to the latest
//! positions each tick.

use std::collections::HashMap;

use super::config::Theme;
use super::simulation::ForceSimulation;
use super::types::{LabelStyle, NodeId, NodeKind, NodeSize};

#[derive(Clone, Debug, PartialEq)]
pub struct Line {
	pub from: (f64, f64),
	pub to: (f64, f64),
	pub width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoundedRect {
	pub key: NodeId,
	pub kind: NodeKind,
	/// Top-left corner.
	pub x: f64,
	pub y: f64,
	pub size: NodeSize,
}

impl RoundedRect {
	pub fn contains(&self, x: f64, y: f64) -> bool {
		x >= self.x && x <= self.x + self.size.width && y >= self.y && y <= self.y + self.size.height
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
	/// Centre of the text.
	pub x: f64,
	pub y: f64,
	pub text: String,
	pub style: LabelStyle,
}

/// Background image revealed through the graph while a node is hovered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backdrop {
	pub node: NodeId,
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
	pub lines: Vec<Line>,
	pub rects: Vec<RoundedRect>,
	pub labels: Vec<Label>,
	pub backdrop: Option<Backdrop>,
	index: HashMap<NodeId, usize>,
}

impl Scene {
	pub fn new(sim: &ForceSimulation, theme: &Theme) -> Self {
		let nodes = sim.nodes();
		let lines = sim
			.edges()
			.iter()
			.map(|e| Line {
				from: (nodes[e.source].x, nodes[e.source].y),
				to: (nodes[e.target].x, nodes[e.target].y),
				width: theme.link_width.resolve(&e.edge),
			})
			.collect();
		let rects = nodes
			.iter()
			.map(|n| RoundedRect {
				key: n.node.id.clone(),
				kind: n.node.kind,
				x: n.x - n.node.size.width / 2.0,
				y: n.y - n.node.size.height / 2.0,
				size: n.node.size,
			})
			.collect();
		let labels = nodes
			.iter()
			.map(|n| Label {
				x: n.x,
				y: n.y,
				text: n.node.id.clone(),
				style: n.node.label.clone(),
			})
			.collect();
		let index = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.node.id.clone(), i))
			.collect();

		Self {
			lines,
			rects,
			labels,
			backdrop: None,
			index,
		}
	}

	/// Moves every shape to the simulation's current positions and returns
	/// how many shapes changed.
	pub fn sync(&mut self, sim: &ForceSimulation) -> usize {
		let nodes = sim.nodes();
		let mut changed = 0;

		for (line, edge) in self.lines.iter_mut().zip(sim.edges()) {
			let from = (nodes[edge.source].x, nodes[edge.source].y);
			let to = (nodes[edge.target].x, nodes[edge.target].y);
			if line.from != from || line.to != to {
				line.from = from;
				line.to = to;
				changed += 1;
			}
		}

		for (i, node) in nodes.iter().enumerate() {
			let rect = &mut self.rects[i];
			let (x, y) = (
				node.x - rect.size.width / 2.0,
				node.y - rect.size.height / 2.0,
			);
			if rect.x != x || rect.y != y {
				rect.x = x;
				rect.y = y;
				changed += 1;
			}
			let label = &mut self.labels[i];
			if label.x != node.x || label.y != node.y {
				label.x = node.x;
				label.y = node.y;
				changed += 1;
			}
		}
		changed
	}

	pub fn rect(&self, id: &str) -> Option<&RoundedRect> {
		self.index.get(id).map(|&i| &self.rects[i])
	}

	/// Topmost node whose box contains the graph-space point.
	pub fn node_at(&self, x: f64, y: f64) -> Option<&RoundedRect> {
		self.rects.iter().rev().find(|r| r.contains(x, y))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::builder::build_graph;
	use crate::components::force_graph::simulation::{ForceParams, LayoutCommand};
	use crate::components::force_graph::types::Record;

	fn sim() -> ForceSimulation {
		let records = vec![Record::new("A", &["x"]), Record::new("B", &["x"])];
		ForceSimulation::new(&build_graph("root", &records), ForceParams::default())
	}

	#[test]
	fn one_shape_per_edge_node_and_label() {
		let sim = sim();
		let scene = Scene::new(&sim, &Theme::default());
		assert_eq!(scene.lines.len(), 3);
		assert_eq!(scene.rects.len(), 3);
		assert_eq!(scene.labels.len(), 3);
		assert!(scene.lines.iter().all(|l| l.width == 0.4));
		assert_eq!(scene.labels[1].text, "A");
	}

	#[test]
	fn rects_are_centred_on_their_nodes() {
		let mut sim = sim();
		let mut scene = Scene::new(&sim, &Theme::default());
		sim.tick();
		assert!(scene.sync(&sim) > 0);

		for node in sim.nodes() {
			let rect = scene.rect(&node.node.id).unwrap();
			assert!((rect.x + rect.size.width / 2.0 - node.x).abs() < 1e-9);
			assert!((rect.y + rect.size.height / 2.0 - node.y).abs() < 1e-9);
		}
		let line = &scene.lines[0];
		let source = &sim.nodes()[sim.edges()[0].source];
		assert_eq!(line.from, (source.x, source.y));
	}

	#[test]
	fn sync_reports_nothing_when_nodes_are_still() {
		let sim = sim();
		let mut scene = Scene::new(&sim, &Theme::default());
		assert_eq!(scene.sync(&sim), 0);
	}

	#[test]
	fn hit_test_finds_node_under_point() {
		let mut sim = sim();
		sim.send(LayoutCommand::PinSet {
			id: "B".into(),
			x: 500.0,
			y: 500.0,
		});
		sim.tick();
		let mut scene = Scene::new(&sim, &Theme::default());
		scene.sync(&sim);

		assert_eq!(scene.node_at(510.0, 490.0).map(|r| r.key.as_str()), Some("B"));
		assert_eq!(scene.node_at(700.0, 700.0), None);
	}
}
