mod builder;
mod component;
mod config;
mod render;
pub mod scale;
mod scene;
mod simulation;
mod state;
mod types;

pub use builder::build_graph;
pub use component::ForceGraphCanvas;
pub use config::GraphConfig;
pub use types::Record;
