use leptos::prelude::*;
use log::{error, info};

use crate::components::force_graph::{ForceGraphCanvas, GraphConfig, build_graph};
use crate::projects::Catalog;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let catalog = match Catalog::bundled() {
		Ok(catalog) => catalog,
		Err(err) => {
			error!("{err:#}");
			return view! {
				<h1>"Uh oh! Something went wrong!"</h1>
				<p>{format!("{err:#}")}</p>
			}
			.into_any();
		}
	};
	info!(
		"loaded {} projects for {}",
		catalog.projects.len(),
		catalog.root
	);

	let graph = build_graph(&catalog.root, &catalog.projects);
	let graph_data = Signal::derive(move || graph.clone());

	view! {
		<main role="main" class="fullscreen-graph">
			<ForceGraphCanvas data=graph_data config=GraphConfig::default() fullscreen=true />
		</main>
	}
	.into_any()
}
