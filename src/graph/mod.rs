//! Knowledge-graph data model and force-directed layout.

pub mod layout;
pub mod types;

pub use layout::{ForceLayout, MAX_VIEWPORT, Viewport, compute_layout, compute_layout_seeded, fresh_seed};
pub use types::{GraphEdge, GraphNode, KnowledgeGraph, NodeType, PositionedNode};
