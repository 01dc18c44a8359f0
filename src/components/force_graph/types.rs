use serde::Deserialize;

/// Identity of a node: the project title, the tag text or the root name.
pub type NodeId = String;

/// One tagged project as loaded from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Record {
	pub title: String,
	#[serde(default)]
	pub tags: Vec<String>,
}

#[cfg(test)]
impl Record {
	pub fn new(title: impl Into<String>, tags: &[&str]) -> Self {
		Self {
			title: title.into(),
			tags: tags.iter().map(|t| t.to_string()).collect(),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	Root,
	Tag,
	Project,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
	ProjectToRoot,
	ProjectToProject,
	TagToRoot,
	ProjectToTag,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeSize {
	pub width: f64,
	pub height: f64,
	pub corner_radius: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelStyle {
	pub font_size: f64,
	/// Font family; `None` inherits the surface default.
	pub font: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: NodeId,
	pub kind: NodeKind,
	pub size: NodeSize,
	pub label: LabelStyle,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GraphEdge {
	pub source: NodeId,
	pub target: NodeId,
	pub kind: EdgeKind,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}

/// Outer size of the drawing surface, with the margins inside it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
	pub margin: Margin,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Margin {
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
	pub left: f64,
}

impl Viewport {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			margin: Margin::default(),
		}
	}

	pub fn outer_width(&self) -> f64 {
		self.width + self.margin.left + self.margin.right
	}

	pub fn outer_height(&self) -> f64 {
		self.height + self.margin.top + self.margin.bottom
	}

	/// Screen position of the graph origin before any pan.
	pub fn center(&self) -> (f64, f64) {
		(
			self.margin.left + self.width / 2.0,
			self.margin.top + self.height / 2.0,
		)
	}
}
