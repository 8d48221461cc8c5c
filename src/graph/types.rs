//! Graph data as the extraction service returns it, and nodes with positions.

use serde::{Deserialize, Serialize};

/// Entity category assigned by the extraction service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
	/// A substance or compound.
	Material,
	/// A measurable characteristic.
	Property,
	/// A synthesis or processing technique.
	Method,
	/// An end use.
	Application,
}

impl NodeType {
	/// Every variant, in legend order.
	pub const ALL: [NodeType; 4] = [
		NodeType::Material,
		NodeType::Property,
		NodeType::Method,
		NodeType::Application,
	];

	/// Fill color used when drawing nodes of this type.
	pub fn color(self) -> &'static str {
		match self {
			NodeType::Material => "#3b82f6",
			NodeType::Property => "#10b981",
			NodeType::Method => "#8b5cf6",
			NodeType::Application => "#f59e0b",
		}
	}

	/// Legend label.
	pub fn label(self) -> &'static str {
		match self {
			NodeType::Material => "Material",
			NodeType::Property => "Property",
			NodeType::Method => "Method",
			NodeType::Application => "Application",
		}
	}
}

/// An extracted entity. Identity is `id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	/// Unique identifier within one graph.
	pub id: String,
	/// Short display label.
	pub label: String,
	/// Entity category.
	#[serde(rename = "type")]
	pub node_type: NodeType,
}

/// A directed, labeled relation between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
	/// Id of the source node.
	pub source: String,
	/// Id of the target node.
	pub target: String,
	/// Short verb phrase, e.g. "improves".
	pub relationship: String,
}

/// Nodes and edges as delivered by the extraction service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
	/// Entities, ids unique.
	pub nodes: Vec<GraphNode>,
	/// Relations. May reference ids missing from `nodes`.
	pub edges: Vec<GraphEdge>,
}

impl KnowledgeGraph {
	/// Parse the JSON shape produced by the extraction service.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Number of entities.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of relations, dangling ones included.
	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}
}

/// A node with a layout position and the velocity left over from the last
/// simulation step.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedNode {
	/// The input node, unchanged.
	pub node: GraphNode,
	/// Horizontal position.
	pub x: f64,
	/// Vertical position.
	pub y: f64,
	/// Horizontal velocity.
	pub vx: f64,
	/// Vertical velocity.
	pub vy: f64,
}

impl PositionedNode {
	/// Place `node` at `(x, y)` at rest.
	pub fn at_rest(node: GraphNode, x: f64, y: f64) -> Self {
		Self {
			node,
			x,
			y,
			vx: 0.0,
			vy: 0.0,
		}
	}

	/// Shorthand for `self.node.id`.
	pub fn id(&self) -> &str {
		&self.node.id
	}

	/// Euclidean distance to another positioned node.
	pub fn distance_to(&self, other: &PositionedNode) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}
