//! The project catalog shown on the home page.

use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::components::force_graph::Record;

const BUNDLED: &str = include_str!("../assets/projects.json");

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Catalog {
	/// Id of the central node every project hangs off.
	pub root: String,
	#[serde(rename = "info")]
	pub projects: Vec<Record>,
}

impl Catalog {
	pub fn bundled() -> Result<Self> {
		Self::parse(BUNDLED).context("bundled assets/projects.json")
	}

	pub fn parse(json: &str) -> Result<Self> {
		let catalog: Self = serde_json::from_str(json).context("invalid project catalog")?;
		catalog.validate()?;
		Ok(catalog)
	}

	/// Node ids must be unique and non-empty, root included.
	fn validate(&self) -> Result<()> {
		if self.root.trim().is_empty() {
			bail!("root name is empty");
		}
		let mut seen = HashSet::from([self.root.as_str()]);
		for project in &self.projects {
			if project.title.trim().is_empty() {
				bail!("project with empty title");
			}
			if !seen.insert(project.title.as_str()) {
				bail!("duplicate node id {:?}", project.title);
			}
		}
		Ok(())
	}
}
