//! Per-item style parameters.
//!
//! A parameter is either one value for every item or a function of the
//! item. Either way it is resolved once, when the graph or simulation is
//! built, into a plain table indexed like the items.

use std::fmt;
use std::sync::Arc;

use super::types::{GraphNode, LabelStyle, NodeKind, NodeSize};

pub enum Accessor<I, T> {
	Constant(T),
	PerItem(Arc<dyn Fn(&I) -> T + Send + Sync>),
}

impl<I, T: Clone> Accessor<I, T> {
	pub fn per_item(f: impl Fn(&I) -> T + Send + Sync + 'static) -> Self {
		Self::PerItem(Arc::new(f))
	}

	pub fn resolve(&self, item: &I) -> T {
		match self {
			Self::Constant(value) => value.clone(),
			Self::PerItem(f) => f(item),
		}
	}

	pub fn resolve_all<'a>(&self, items: impl IntoIterator<Item = &'a I>) -> Vec<T>
	where
		I: 'a,
	{
		items.into_iter().map(|item| self.resolve(item)).collect()
	}
}

impl<I, T: Clone> Clone for Accessor<I, T> {
	fn clone(&self) -> Self {
		match self {
			Self::Constant(value) => Self::Constant(value.clone()),
			Self::PerItem(f) => Self::PerItem(Arc::clone(f)),
		}
	}
}

impl<I, T: fmt::Debug> fmt::Debug for Accessor<I, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
			Self::PerItem(_) => f.write_str("PerItem(..)"),
		}
	}
}

impl<I, T> From<T> for Accessor<I, T> {
	fn from(value: T) -> Self {
		Self::Constant(value)
	}
}

/// Ordinal scale over the node kinds.
#[derive(Clone, Debug, PartialEq)]
pub struct KindScale<T> {
	pub root: T,
	pub tag: T,
	pub project: T,
}

impl<T> KindScale<T> {
	pub fn get(&self, kind: NodeKind) -> &T {
		match kind {
			NodeKind::Root => &self.root,
			NodeKind::Tag => &self.tag,
			NodeKind::Project => &self.project,
		}
	}
}

/// Box and label appearance assigned to nodes by the graph builder.
#[derive(Clone, Debug)]
pub struct NodeStyle {
	pub size: Accessor<GraphNode, NodeSize>,
	pub label: Accessor<GraphNode, LabelStyle>,
}

impl NodeStyle {
	pub fn from_scales(sizes: KindScale<NodeSize>, labels: KindScale<LabelStyle>) -> Self {
		Self {
			size: Accessor::per_item(move |n: &GraphNode| *sizes.get(n.kind)),
			label: Accessor::per_item(move |n: &GraphNode| labels.get(n.kind).clone()),
		}
	}

	pub fn apply(&self, node: &mut GraphNode) {
		node.size = self.size.resolve(node);
		node.label = self.label.resolve(node);
	}
}

impl Default for NodeStyle {
	fn default() -> Self {
		let size = |width, height, corner_radius| NodeSize {
			width,
			height,
			corner_radius,
		};
		let label = |font_size| LabelStyle {
			font_size,
			font: None,
		};
		Self::from_scales(
			KindScale {
				root: size(120.0, 90.0, 0.0),
				tag: size(70.0, 70.0, 35.0),
				project: size(80.0, 60.0, 0.0),
			},
			KindScale {
				root: label(24.0),
				tag: label(16.0),
				project: label(16.0),
			},
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(kind: NodeKind) -> GraphNode {
		GraphNode {
			id: "n".into(),
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
		}
	}

	#[test]
	fn constant_resolves_to_same_value_for_every_item() {
		let acc: Accessor<u32, f64> = 0.05.into();
		assert_eq!(acc.resolve_all(&[1, 2, 3]), vec![0.05, 0.05, 0.05]);
	}

	#[test]
	fn per_item_is_evaluated_per_item() {
		let acc = Accessor::per_item(|n: &u32| *n as f64 * 2.0);
		assert_eq!(acc.resolve_all(&[1, 2, 3]), vec![2.0, 4.0, 6.0]);
	}

	#[test]
	fn default_style_sizes_by_kind() {
		let style = NodeStyle::default();
		let mut root = node(NodeKind::Root);
		let mut tag = node(NodeKind::Tag);
		let mut project = node(NodeKind::Project);
		style.apply(&mut root);
		style.apply(&mut tag);
		style.apply(&mut project);

		assert_eq!((root.size.width, root.size.height), (120.0, 90.0));
		assert_eq!(root.label.font_size, 24.0);
		assert_eq!(tag.size.corner_radius, 35.0);
		assert_eq!((project.size.width, project.size.height), (80.0, 60.0));
		assert_eq!(project.label.font_size, 16.0);
	}
}
