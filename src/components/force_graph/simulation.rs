//! Force-directed layout.
//!
//! Every tick applies link attraction, n-body repulsion and centering to
//! the node velocities, scaled by `alpha`, which decays toward a target so
//! the layout comes to rest. Pins are applied through [`LayoutCommand`]s
//! queued by the interaction layer and consumed at the start of a tick.

use std::collections::{HashMap, VecDeque};
use std::f64::consts::PI;

use log::{debug, warn};

use super::scale::Accessor;
use super::types::{GraphData, GraphEdge, GraphNode, NodeId};

const INITIAL_RADIUS: f64 = 10.0;

#[derive(Clone, Debug)]
pub struct ForceParams {
	/// Charge per node; negative values repel.
	pub charge: Accessor<GraphNode, f64>,
	/// Squared distances below this floor are clamped when computing charge.
	pub distance_min: f64,
	pub link_distance: Accessor<GraphEdge, f64>,
	pub link_strength: Accessor<GraphEdge, f64>,
	pub center_strength: f64,
	pub alpha_min: f64,
	pub alpha_decay: f64,
	/// Fraction of velocity lost every tick.
	pub velocity_decay: f64,
	/// Alpha the simulation is held at while a node is dragged.
	pub drag_alpha: f64,
}

impl Default for ForceParams {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			charge: Accessor::Constant(-450.0),
			distance_min: 1.0,
			link_distance: Accessor::Constant(80.0),
			link_strength: Accessor::Constant(0.05),
			center_strength: 1.0,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			velocity_decay: 0.4,
			drag_alpha: 0.3,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayoutCommand {
	PinSet { id: NodeId, x: f64, y: f64 },
	PinClear { id: NodeId },
	/// Wake the simulation up for a drag.
	Reheat,
	/// Let the simulation settle again after a drag.
	Cool,
}

#[derive(Clone, Debug)]
pub struct SimNode {
	pub node: GraphNode,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub pin: Option<(f64, f64)>,
	charge: f64,
}

#[derive(Clone, Debug)]
pub struct SimEdge {
	pub edge: GraphEdge,
	pub source: usize,
	pub target: usize,
	distance: f64,
	strength: f64,
	/// Share of the correction applied to the target.
	bias: f64,
}

pub struct ForceSimulation {
	nodes: Vec<SimNode>,
	edges: Vec<SimEdge>,
	index: HashMap<NodeId, usize>,
	params: ForceParams,
	alpha: f64,
	alpha_target: f64,
	pending: VecDeque<LayoutCommand>,
	seed: u64,
}

impl ForceSimulation {
	pub fn new(data: &GraphData, params: ForceParams) -> Self {
		let charges = params.charge.resolve_all(&data.nodes);
		let nodes: Vec<SimNode> = data
			.nodes
			.iter()
			.zip(charges)
			.enumerate()
			.map(|(i, (node, charge))| {
				// Phyllotaxis spiral so nodes never start stacked.
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * PI * (3.0 - 5.0_f64.sqrt());
				SimNode {
					node: node.clone(),
					x: radius * angle.cos(),
					y: radius * angle.sin(),
					vx: 0.0,
					vy: 0.0,
					pin: None,
					charge,
				}
			})
			.collect();
		let index: HashMap<NodeId, usize> = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.node.id.clone(), i))
			.collect();

		let mut edges = Vec::with_capacity(data.edges.len());
		for edge in &data.edges {
			let (Some(&source), Some(&target)) = (index.get(&edge.source), index.get(&edge.target))
			else {
				warn!("skipping edge {} -> {}: unknown node", edge.source, edge.target);
				continue;
			};
			edges.push(SimEdge {
				edge: edge.clone(),
				source,
				target,
				distance: params.link_distance.resolve(edge),
				strength: params.link_strength.resolve(edge),
				bias: 0.0,
			});
		}

		let mut degree = vec![0usize; nodes.len()];
		for e in &edges {
			degree[e.source] += 1;
			degree[e.target] += 1;
		}
		for e in &mut edges {
			e.bias = degree[e.source] as f64 / (degree[e.source] + degree[e.target]) as f64;
		}

		Self {
			nodes,
			edges,
			index,
			params,
			alpha: 1.0,
			alpha_target: 0.0,
			pending: VecDeque::new(),
			seed: 1,
		}
	}

	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn edges(&self) -> &[SimEdge] {
		&self.edges
	}

	pub fn node(&self, id: &str) -> Option<&SimNode> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn is_running(&self) -> bool {
		self.alpha >= self.params.alpha_min || !self.pending.is_empty()
	}

	/// Queues a command for the next tick.
	pub fn send(&mut self, command: LayoutCommand) {
		self.pending.push_back(command);
	}

	pub fn drain_commands(&mut self) {
		while let Some(command) = self.pending.pop_front() {
			self.apply(command);
		}
	}

	fn apply(&mut self, command: LayoutCommand) {
		match command {
			LayoutCommand::PinSet { id, x, y } => {
				if let Some(&i) = self.index.get(&id) {
					self.nodes[i].pin = Some((x, y));
				}
			}
			LayoutCommand::PinClear { id } => {
				if let Some(&i) = self.index.get(&id) {
					let node = &mut self.nodes[i];
					if let Some((x, y)) = node.pin.take() {
						node.x = x;
						node.y = y;
					}
					node.vx = 0.0;
					node.vy = 0.0;
				}
			}
			LayoutCommand::Reheat => {
				self.alpha_target = self.params.drag_alpha;
				self.alpha = self.alpha.max(self.params.drag_alpha);
				debug!("simulation reheated to {}", self.alpha);
			}
			LayoutCommand::Cool => self.alpha_target = 0.0,
		}
	}

	/// Advances the layout one step and returns how far the nodes moved in
	/// total.
	pub fn tick(&mut self) -> f64 {
		self.drain_commands();
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;

		self.apply_links();
		self.apply_charge();
		self.apply_center();

		let keep = 1.0 - self.params.velocity_decay;
		let mut moved = 0.0;
		for node in &mut self.nodes {
			let (px, py) = (node.x, node.y);
			if let Some((x, y)) = node.pin {
				node.x = x;
				node.y = y;
				node.vx = 0.0;
				node.vy = 0.0;
			} else {
				node.vx *= keep;
				node.vy *= keep;
				node.x += node.vx;
				node.y += node.vy;
			}
			moved += (node.x - px).hypot(node.y - py);
		}
		moved
	}

	fn apply_links(&mut self) {
		for i in 0..self.edges.len() {
			let SimEdge {
				source,
				target,
				distance,
				strength,
				bias,
				..
			} = self.edges[i];
			let (s, t) = (&self.nodes[source], &self.nodes[target]);
			let (mut x, mut y) = (t.x + t.vx - s.x - s.vx, t.y + t.vy - s.y - s.vy);
			if x == 0.0 {
				x = self.jiggle();
			}
			if y == 0.0 {
				y = self.jiggle();
			}
			let len = x.hypot(y);
			let l = (len - distance) / len * self.alpha * strength;
			let (x, y) = (x * l, y * l);

			let t = &mut self.nodes[target];
			t.vx -= x * bias;
			t.vy -= y * bias;
			let s = &mut self.nodes[source];
			s.vx += x * (1.0 - bias);
			s.vy += y * (1.0 - bias);
		}
	}

	fn apply_charge(&mut self) {
		let min2 = self.params.distance_min * self.params.distance_min;
		let n = self.nodes.len();
		for i in 0..n {
			let (mut fx, mut fy) = (0.0, 0.0);
			for j in 0..n {
				if i == j {
					continue;
				}
				let mut x = self.nodes[j].x - self.nodes[i].x;
				let mut y = self.nodes[j].y - self.nodes[i].y;
				if x == 0.0 {
					x = self.jiggle();
				}
				if y == 0.0 {
					y = self.jiggle();
				}
				let mut l = x * x + y * y;
				if l < min2 {
					l = (min2 * l).sqrt();
				}
				let w = self.nodes[j].charge * self.alpha / l;
				fx += x * w;
				fy += y * w;
			}
			self.nodes[i].vx += fx;
			self.nodes[i].vy += fy;
		}
	}

	fn apply_center(&mut self) {
		if self.nodes.is_empty() {
			return;
		}
		let n = self.nodes.len() as f64;
		let (sx, sy) = self
			.nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let (dx, dy) = (
			sx / n * self.params.center_strength,
			sy / n * self.params.center_strength,
		);
		for node in &mut self.nodes {
			node.x -= dx;
			node.y -= dy;
		}
	}

	/// Tiny random offset used to separate coincident nodes.
	fn jiggle(&mut self) -> f64 {
		self.seed = self
			.seed
			.wrapping_mul(6364136223846793005)
			.wrapping_add(1442695040888963407);
		((self.seed >> 11) as f64 / (1u64 << 53) as f64 - 0.5) * 1e-6
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::builder::build_graph;
	use crate::components::force_graph::types::{EdgeKind, Record};

	fn sample() -> ForceSimulation {
		let records = vec![
			Record::new("A", &["x"]),
			Record::new("B", &["x", "z"]),
			Record::new("C", &["y"]),
			Record::new("D", &["z"]),
			Record::new("E", &[]),
		];
		ForceSimulation::new(&build_graph("root", &records), ForceParams::default())
	}

	fn mean(sim: &ForceSimulation) -> (f64, f64) {
		let n = sim.nodes().len() as f64;
		let (x, y) = sim
			.nodes()
			.iter()
			.fold((0.0, 0.0), |(x, y), node| (x + node.x, y + node.y));
		(x / n, y / n)
	}

	#[test]
	fn resolves_edges_to_node_indices() {
		let sim = sample();
		assert_eq!(sim.nodes().len(), 6);
		for e in sim.edges() {
			assert_eq!(sim.nodes()[e.source].node.id, e.edge.source);
			assert_eq!(sim.nodes()[e.target].node.id, e.edge.target);
		}
	}

	#[test]
	fn skips_edges_with_unknown_endpoints() {
		let mut data = build_graph("root", &[Record::new("A", &[])]);
		data.edges.push(GraphEdge {
			source: "A".into(),
			target: "missing".into(),
			kind: EdgeKind::ProjectToProject,
		});
		let sim = ForceSimulation::new(&data, ForceParams::default());
		assert_eq!(sim.edges().len(), 1);
	}

	#[test]
	fn settles_without_pins() {
		let mut sim = sample();
		let early = sim.tick();
		for _ in 0..1000 {
			sim.tick();
		}
		let late = sim.tick();
		assert!(late < early, "late {late} early {early}");
		assert!(late < 1e-3, "still moving: {late}");
		assert!(!sim.is_running());
	}

	#[test]
	fn disconnected_nodes_also_settle() {
		let data = GraphData {
			nodes: build_graph("root", &[Record::new("A", &[]), Record::new("B", &[])]).nodes,
			edges: Vec::new(),
		};
		let mut sim = ForceSimulation::new(&data, ForceParams::default());
		for _ in 0..1000 {
			sim.tick();
		}
		assert!(sim.tick() < 1e-3);
	}

	#[test]
	fn layout_is_centered_on_origin() {
		let mut sim = sample();
		for _ in 0..500 {
			sim.tick();
		}
		let (x, y) = mean(&sim);
		assert!(x.abs() < 0.01 && y.abs() < 0.01, "mean ({x}, {y})");
	}

	#[test]
	fn pinned_node_sits_on_its_pin_every_tick() {
		let mut sim = sample();
		sim.send(LayoutCommand::Reheat);
		for step in 0..50 {
			let target = (20.0 + step as f64, -35.0);
			sim.send(LayoutCommand::PinSet {
				id: "A".into(),
				x: target.0,
				y: target.1,
			});
			sim.tick();
			let a = sim.node("A").unwrap();
			assert_eq!((a.x, a.y), target);
		}
	}

	#[test]
	fn release_leaves_node_at_rest_where_it_was_dropped() {
		let mut sim = sample();
		sim.send(LayoutCommand::PinSet {
			id: "B".into(),
			x: 12.0,
			y: 7.0,
		});
		sim.tick();
		sim.send(LayoutCommand::PinClear { id: "B".into() });
		sim.drain_commands();

		let b = sim.node("B").unwrap();
		assert_eq!(b.pin, None);
		assert_eq!((b.x, b.y), (12.0, 7.0));
		assert_eq!((b.vx, b.vy), (0.0, 0.0));
	}

	#[test]
	fn reheat_restarts_a_settled_layout() {
		let mut sim = sample();
		for _ in 0..1000 {
			sim.tick();
		}
		assert!(!sim.is_running());

		sim.send(LayoutCommand::Reheat);
		assert!(sim.is_running());
		sim.tick();
		assert!(sim.alpha() >= 0.29);

		sim.send(LayoutCommand::Cool);
		for _ in 0..1000 {
			sim.tick();
		}
		assert!(!sim.is_running());
	}

	#[test]
	fn per_edge_parameters_are_resolved_once() {
		let params = ForceParams {
			link_distance: Accessor::per_item(|e: &GraphEdge| {
				if e.target == "root" { 120.0 } else { 40.0 }
			}),
			..ForceParams::default()
		};
		let records = [Record::new("A", &["t"]), Record::new("B", &["t"])];
		let sim = ForceSimulation::new(&build_graph("root", &records), params);
		let distances: Vec<f64> = sim.edges().iter().map(|e| e.distance).collect();
		assert_eq!(distances, [120.0, 120.0, 40.0]);
	}
}
