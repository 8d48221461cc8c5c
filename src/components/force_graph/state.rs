//! Layout cache and view state behind the graph canvas.

use std::collections::HashMap;

use crate::graph::{ForceLayout, GraphEdge, KnowledgeGraph, PositionedNode, Viewport, fresh_seed};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Drawn node radius in graph units.
pub const NODE_RADIUS: f64 = 12.0;
/// Pointer distance that still counts as over a node.
pub const HIT_RADIUS: f64 = 14.0;
/// Furthest zoom out.
pub const MIN_ZOOM: f64 = 0.1;
/// Furthest zoom in.
pub const MAX_ZOOM: f64 = 10.0;

/// One drawable edge: both endpoints resolved to positions.
#[derive(Clone, Copy, Debug)]
pub struct EdgeSegment<'a> {
	/// Index of the source node.
	pub source: usize,
	/// Index of the target node.
	pub target: usize,
	/// Source position.
	pub from: &'a PositionedNode,
	/// Target position.
	pub to: &'a PositionedNode,
	/// Edge label.
	pub relationship: &'a str,
}

/// Axis-aligned box around every node centre.
#[derive(Clone, Copy, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct Bounds {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

/// Positions for one "generate" action, kept until regenerated.
#[derive(Clone, Debug)]
pub struct GraphLayout {
	graph: KnowledgeGraph,
	viewport: Viewport,
	nodes: Vec<PositionedNode>,
	index: HashMap<String, usize>,
	seed: u64,
}

impl GraphLayout {
	/// Lay out `graph` in the requested area, capped to the maximum layout
	/// viewport.
	pub fn generate(graph: &KnowledgeGraph, requested_width: f64, requested_height: f64, seed: Option<u64>) -> Self {
		let mut layout = Self {
			graph: graph.clone(),
			viewport: Viewport::effective(requested_width, requested_height),
			nodes: Vec::new(),
			index: HashMap::new(),
			seed: 0,
		};
		layout.regenerate(seed);
		layout
	}

	/// Throw away the current positions and simulate again.
	pub fn regenerate(&mut self, seed: Option<u64>) {
		self.seed = seed.unwrap_or_else(fresh_seed);
		let mut rng = StdRng::seed_from_u64(self.seed);
		self.nodes = ForceLayout::default().run(&self.graph.nodes, &self.graph.edges, self.viewport, &mut rng);
		self.index.clear();
		for (i, n) in self.nodes.iter().enumerate() {
			self.index.entry(n.node.id.clone()).or_insert(i);
		}
	}

	/// The graph as given.
	pub fn graph(&self) -> &KnowledgeGraph {
		&self.graph
	}

	/// Area the simulation ran in.
	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	/// Seed of the current arrangement.
	pub fn seed(&self) -> u64 {
		self.seed
	}

	/// Positions, in input order.
	pub fn nodes(&self) -> &[PositionedNode] {
		&self.nodes
	}

	/// Edges joined to positions by node id. Dangling edges are skipped.
	pub fn edge_segments(&self) -> impl Iterator<Item = EdgeSegment<'_>> {
		self.graph.edges.iter().filter_map(|edge: &GraphEdge| {
			let source = *self.index.get(edge.source.as_str())?;
			let target = *self.index.get(edge.target.as_str())?;
			Some(EdgeSegment {
				source,
				target,
				from: &self.nodes[source],
				to: &self.nodes[target],
				relationship: &edge.relationship,
			})
		})
	}

	/// Index of the topmost node within [`HIT_RADIUS`] of a graph-space
	/// point. Later nodes are drawn on top, so they win.
	pub fn node_at_position(&self, x: f64, y: f64) -> Option<usize> {
		self.nodes
			.iter()
			.rposition(|n| ((n.x - x).powi(2) + (n.y - y).powi(2)).sqrt() < HIT_RADIUS)
	}

	/// `None` for an empty graph.
	pub fn bounds(&self) -> Option<Bounds> {
		let first = self.nodes.first()?;
		let init = Bounds {
			min_x: first.x,
			min_y: first.y,
			max_x: first.x,
			max_y: first.y,
		};
		Some(self.nodes.iter().fold(init, |b, n| Bounds {
			min_x: b.min_x.min(n.x),
			min_y: b.min_y.min(n.y),
			max_x: b.max_x.max(n.x),
			max_y: b.max_y.max(n.y),
		}))
	}

	/// Indices of nodes sharing an edge with node `idx`.
	pub fn neighbors(&self, idx: usize) -> Vec<usize> {
		let Some(id) = self.nodes.get(idx).map(|n| n.id()) else {
			return Vec::new();
		};
		let mut out: Vec<usize> = self
			.graph
			.edges
			.iter()
			.filter_map(|e| {
				if e.source == id {
					self.index.get(e.target.as_str()).copied()
				} else if e.target == id {
					self.index.get(e.source.as_str()).copied()
				} else {
					None
				}
			})
			.filter(|&n| n != idx)
			.collect();
		out.sort_unstable();
		out.dedup();
		out
	}
}

/// Screen = graph * k + (x, y).
#[derive(Clone, Debug, Default)]
#[allow(missing_docs)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

/// Background drag in progress.
#[derive(Clone, Debug, Default)]
#[allow(missing_docs)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// A laid-out graph plus how it is being viewed.
#[allow(missing_docs)]
pub struct ForceGraphState {
	pub layout: GraphLayout,
	pub transform: ViewTransform,
	pub pan: PanState,
	pub hovered: Option<usize>,
	pub neighbors: Vec<usize>,
	pub width: f64,
	pub height: f64,
}

impl ForceGraphState {
	/// Lay out `graph` for a `width` x `height` canvas and fit it to view.
	pub fn new(graph: &KnowledgeGraph, width: f64, height: f64, seed: Option<u64>) -> Self {
		let layout = GraphLayout::generate(graph, width, height, seed);
		let mut state = Self {
			layout,
			transform: ViewTransform::default(),
			pan: PanState::default(),
			hovered: None,
			neighbors: Vec::new(),
			width,
			height,
		};
		state.fit_to_content();
		state
	}

	/// Center the layout viewport in the canvas at unit zoom.
	pub fn reset_view(&mut self) {
		let viewport = self.layout.viewport();
		self.transform = ViewTransform {
			x: (self.width - viewport.width) / 2.0,
			y: (self.height - viewport.height) / 2.0,
			k: 1.0,
		};
	}

	/// Scale and center so every node is on screen, never zooming past 1.
	pub fn fit_to_content(&mut self) {
		let Some(b) = self.layout.bounds() else {
			return self.reset_view();
		};
		let margin = NODE_RADIUS * 3.0;
		let (w, h) = (b.max_x - b.min_x + 2.0 * margin, b.max_y - b.min_y + 2.0 * margin);
		let k = (self.width / w).min(self.height / h).min(1.0).max(MIN_ZOOM);
		let (cx, cy) = ((b.min_x + b.max_x) / 2.0, (b.min_y + b.max_y) / 2.0);
		self.transform = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
	}

	/// Graph coordinates to canvas pixels.
	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(
			gx * self.transform.k + self.transform.x,
			gy * self.transform.k + self.transform.y,
		)
	}

	/// New arrangement from a fresh seed.
	pub fn regenerate(&mut self) {
		self.layout.regenerate(None);
		self.set_hover(None);
		self.fit_to_content();
	}

	/// Canvas pixels to graph coordinates.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Hit test in screen coordinates.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.layout.node_at_position(gx, gy)
	}

	/// Returns whether the hovered node changed.
	pub fn set_hover(&mut self, node: Option<usize>) -> bool {
		if self.hovered == node {
			return false;
		}
		self.hovered = node;
		self.neighbors = node.map(|idx| self.layout.neighbors(idx)).unwrap_or_default();
		true
	}

	/// Hovered node or one of its neighbours.
	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hovered == Some(idx) || self.neighbors.contains(&idx)
	}

	/// Start dragging the background at a screen point.
	pub fn begin_pan(&mut self, x: f64, y: f64) {
		self.pan = PanState {
			active: true,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	/// Returns whether the view moved.
	pub fn pan_to(&mut self, x: f64, y: f64) -> bool {
		if !self.pan.active {
			return false;
		}
		self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
		self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		true
	}

	/// Stop dragging.
	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Zoom by one wheel notch around a screen point, keeping that point
	/// fixed.
	pub fn zoom_at(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Canvas size changed; refit.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.fit_to_content();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{GraphNode, NodeType};

	fn graph() -> KnowledgeGraph {
		let node = |id: &str, t| GraphNode {
			id: id.into(),
			label: id.into(),
			node_type: t,
		};
		let edge = |s: &str, t: &str| GraphEdge {
			source: s.into(),
			target: t.into(),
			relationship: "r".into(),
		};
		KnowledgeGraph {
			nodes: vec![
				node("a", NodeType::Material),
				node("b", NodeType::Property),
				node("c", NodeType::Method),
			],
			edges: vec![edge("a", "b"), edge("b", "ghost"), edge("c", "a")],
		}
	}

	#[test]
	fn generate_caps_viewport() {
		let layout = GraphLayout::generate(&graph(), 1920.0, 1080.0, Some(1));
		assert_eq!(layout.viewport(), Viewport::new(1000.0, 700.0));
		assert_eq!(layout.nodes().len(), 3);
		assert_eq!(layout.seed(), 1);
	}

	#[test]
	fn regenerate_with_same_seed_reproduces() {
		let mut layout = GraphLayout::generate(&graph(), 800.0, 600.0, Some(5));
		let before = layout.nodes().to_vec();
		layout.regenerate(Some(6));
		assert_ne!(layout.nodes(), &before[..]);
		layout.regenerate(Some(5));
		assert_eq!(layout.nodes(), &before[..]);
	}

	#[test]
	fn edge_segments_skip_dangling() {
		let layout = GraphLayout::generate(&graph(), 800.0, 600.0, Some(2));
		let pairs: Vec<_> = layout.edge_segments().map(|s| (s.from.id(), s.to.id())).collect();
		assert_eq!(pairs, vec![("a", "b"), ("c", "a")]);
		let indices: Vec<_> = layout.edge_segments().map(|s| (s.source, s.target)).collect();
		assert_eq!(indices, vec![(0, 1), (2, 0)]);
	}

	#[test]
	fn lookup_and_hit_test() {
		let layout = GraphLayout::generate(&graph(), 800.0, 600.0, Some(3));
		let b = &layout.nodes()[1];
		assert_eq!(b.id(), "b");
		assert_eq!(layout.node_at_position(b.x + 3.0, b.y - 3.0), Some(1));
		let far = layout.bounds().unwrap();
		assert_eq!(layout.node_at_position(far.max_x + 100.0, far.max_y + 100.0), None);
	}

	#[test]
	fn bounds_cover_every_node() {
		let layout = GraphLayout::generate(&graph(), 800.0, 600.0, Some(4));
		let b = layout.bounds().unwrap();
		for n in layout.nodes() {
			assert!(n.x >= b.min_x && n.x <= b.max_x && n.y >= b.min_y && n.y <= b.max_y);
		}
		assert!(GraphLayout::generate(&KnowledgeGraph::default(), 800.0, 600.0, None).bounds().is_none());
	}

	#[test]
	fn neighbors_follow_both_directions() {
		let layout = GraphLayout::generate(&graph(), 800.0, 600.0, Some(4));
		assert_eq!(layout.neighbors(0), vec![1, 2]);
		assert_eq!(layout.neighbors(1), vec![0]);
		assert!(layout.neighbors(9).is_empty());
	}

	#[test]
	fn hover_tracks_neighbors() {
		let mut state = ForceGraphState::new(&graph(), 800.0, 600.0, Some(1));
		assert!(state.set_hover(Some(2)));
		assert!(!state.set_hover(Some(2)));
		assert!(state.is_highlighted(0));
		assert!(!state.is_highlighted(1));
		state.set_hover(None);
		assert!(state.neighbors.is_empty());
	}

	#[test]
	fn view_is_centered_in_a_larger_canvas() {
		let mut state = ForceGraphState::new(&graph(), 1400.0, 900.0, Some(1));
		state.reset_view();
		assert_eq!((state.transform.x, state.transform.y, state.transform.k), (200.0, 100.0, 1.0));
		assert_eq!(state.screen_to_graph(200.0, 100.0), (0.0, 0.0));
	}

	#[test]
	fn zoom_keeps_cursor_point_fixed() {
		let mut state = ForceGraphState::new(&graph(), 800.0, 600.0, Some(1));
		let k0 = state.transform.k;
		let before = state.screen_to_graph(300.0, 200.0);
		state.zoom_at(300.0, 200.0, -1.0);
		let after = state.screen_to_graph(300.0, 200.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
		assert!((state.transform.k - k0 * 1.1).abs() < 1e-12);
		for _ in 0..100 {
			state.zoom_at(0.0, 0.0, 1.0);
		}
		assert_eq!(state.transform.k, MIN_ZOOM);
	}

	#[test]
	fn fit_puts_every_node_on_screen() {
		let state = ForceGraphState::new(&graph(), 640.0, 480.0, Some(8));
		assert!(state.transform.k <= 1.0);
		for n in state.layout.nodes() {
			let (sx, sy) = state.graph_to_screen(n.x, n.y);
			assert!((0.0..=640.0).contains(&sx) && (0.0..=480.0).contains(&sy), "({sx}, {sy})");
		}
	}

	#[test]
	fn resize_refits_to_the_new_canvas() {
		let mut state = ForceGraphState::new(&graph(), 1400.0, 900.0, Some(8));
		for (w, h) in [(320.0, 240.0), (1920.0, 1080.0), (320.0, 240.0)] {
			state.resize(w, h);
			assert_eq!((state.width, state.height), (w, h));
			for n in state.layout.nodes() {
				let (sx, sy) = state.graph_to_screen(n.x, n.y);
				assert!((0.0..=w).contains(&sx) && (0.0..=h).contains(&sy), "({sx}, {sy}) in {w}x{h}");
			}
		}
		assert_eq!(state.layout.viewport(), Viewport::new(1000.0, 700.0));
	}

	#[test]
	fn pan_only_while_active() {
		let mut state = ForceGraphState::new(&graph(), 800.0, 600.0, Some(1));
		state.reset_view();
		assert!(!state.pan_to(50.0, 50.0));
		state.begin_pan(10.0, 10.0);
		assert!(state.pan_to(30.0, 5.0));
		assert_eq!((state.transform.x, state.transform.y), (20.0, -5.0));
		state.end_pan();
		assert!(!state.pan_to(0.0, 0.0));
	}
}
