//! Canvas rendering of a laid-out knowledge graph.

mod component;
mod render;
pub mod state;

pub use component::KnowledgeGraphCanvas;
pub use state::{ForceGraphState, GraphLayout};
