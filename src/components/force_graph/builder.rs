//! Graph construction from tagged project records.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use super::scale::NodeStyle;
use super::types::{
	EdgeKind, GraphData, GraphEdge, GraphNode, LabelStyle, NodeId, NodeKind, NodeSize, Record,
};

#[derive(Clone, Debug)]
pub struct BuildOptions {
	/// Id of the single root node.
	pub root: NodeId,
	/// Also emit one node per tag, linked to the root and to its projects.
	pub tag_nodes: bool,
	pub style: NodeStyle,
}

impl BuildOptions {
	pub fn new(root: impl Into<NodeId>) -> Self {
		Self {
			root: root.into(),
			tag_nodes: false,
			style: NodeStyle::default(),
		}
	}
}

/// Builds the portfolio graph with the default options.
pub fn build_graph(root: &str, records: &[Record]) -> GraphData {
	build_graph_with(records, &BuildOptions::new(root))
}

/// Builds the portfolio graph.
///
/// The root node comes first, then one project node per record in input
/// order. Each project links to the root. Projects sharing a tag are linked
/// pairwise once per shared tag, so two projects with two common tags get
/// two edges.
///
/// With [`BuildOptions::tag_nodes`], a tag spelled like the root or a project
/// title gets no node of its own, since node ids must stay unique; its
/// projects are still linked to each other.
pub fn build_graph_with(records: &[Record], options: &BuildOptions) -> GraphData {
	let mut data = GraphData::default();
	data.nodes.push(node(&options.root, NodeKind::Root, &options.style));

	for record in records {
		data.nodes
			.push(node(&record.title, NodeKind::Project, &options.style));
		data.edges.push(GraphEdge {
			source: record.title.clone(),
			target: options.root.clone(),
			kind: EdgeKind::ProjectToRoot,
		});
	}

	let buckets = tag_buckets(records);

	if options.tag_nodes {
		let taken: HashSet<&str> = std::iter::once(options.root.as_str())
			.chain(records.iter().map(|r| r.title.as_str()))
			.collect();
		let (tags, clashing): (Vec<_>, Vec<_>) = buckets
			.iter()
			.partition(|(tag, _)| !taken.contains(tag.as_str()));
		for (tag, _) in clashing {
			warn!("tag {tag:?} clashes with a node id, no tag node added");
		}
		for (tag, members) in tags {
			data.nodes.push(node(tag, NodeKind::Tag, &options.style));
			data.edges.push(GraphEdge {
				source: tag.clone(),
				target: options.root.clone(),
				kind: EdgeKind::TagToRoot,
			});
			for title in members {
				data.edges.push(GraphEdge {
					source: title.clone(),
					target: tag.clone(),
					kind: EdgeKind::ProjectToTag,
				});
			}
		}
	}

	for (_, members) in &buckets {
		for (i, a) in members.iter().enumerate() {
			for b in &members[i + 1..] {
				data.edges.push(GraphEdge {
					source: a.clone(),
					target: b.clone(),
					kind: EdgeKind::ProjectToProject,
				});
			}
		}
	}

	debug!(
		"built graph: {} nodes, {} edges, {} tags",
		data.nodes.len(),
		data.edges.len(),
		buckets.len()
	);
	data
}

/// Groups project titles by tag, keeping first-seen order for both.
fn tag_buckets(records: &[Record]) -> Vec<(String, Vec<NodeId>)> {
	let mut buckets: Vec<(String, Vec<NodeId>)> = Vec::new();
	let mut index: HashMap<&str, usize> = HashMap::new();

	for record in records {
		for tag in &record.tags {
			let slot = *index.entry(tag.as_str()).or_insert_with(|| {
				buckets.push((tag.clone(), Vec::new()));
				buckets.len() - 1
			});
			let members = &mut buckets[slot].1;
			// A record listing the same tag twice still joins the bucket once.
			if members.last() != Some(&record.title) {
				members.push(record.title.clone());
			}
		}
	}
	buckets
}

fn node(id: &str, kind: NodeKind, style: &NodeStyle) -> GraphNode {
	let mut node = GraphNode {
		id: id.to_string(),
		kind,
		size: NodeSize {
			width: 0.0,
			height: 0.0,
			corner_radius: 0.0,
		},
		label: LabelStyle {
			font_size: 0.0,
			font: None,
		},
	};
	style.apply(&mut node);
	node
}
