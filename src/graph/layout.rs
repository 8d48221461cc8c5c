//! Force-directed placement for knowledge graphs.
//!
//! Nodes repel each other, edges pull their endpoints together and a weak
//! gravity well keeps everything near the viewport center. The simulation
//! runs a fixed number of steps synchronously and returns the final
//! positions; there is no convergence test.

use std::collections::HashMap;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::{GraphEdge, GraphNode, PositionedNode};

/// Largest area a layout is ever computed for.
pub const MAX_VIEWPORT: Viewport = Viewport {
	width: 1000.0,
	height: 700.0,
};

/// Canvas area the simulation lays nodes out in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Horizontal extent.
	pub width: f64,
	/// Vertical extent.
	pub height: f64,
}

impl Viewport {
	/// A viewport of exactly the given size.
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// The requested size capped per axis at [`MAX_VIEWPORT`].
	pub fn effective(requested_width: f64, requested_height: f64) -> Self {
		Self {
			width: requested_width.min(MAX_VIEWPORT.width),
			height: requested_height.min(MAX_VIEWPORT.height),
		}
	}

	/// Midpoint, where centering gravity pulls toward.
	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}

	/// Length of the diagonal.
	pub fn diagonal(&self) -> f64 {
		(self.width * self.width + self.height * self.height).sqrt()
	}
}

/// Simulation constants.
///
/// Repulsion is applied once per *ordered* pair of nodes, so every unordered
/// pair pushes apart twice per step. That is twice the textbook
/// Fruchterman-Reingold strength and the resulting spacing depends on it.
#[derive(Clone, Debug, PartialEq)]
pub struct ForceLayout {
	/// Number of simulation steps.
	pub iterations: usize,
	/// Multiplier on the ideal edge length `sqrt(area / n)`.
	pub spacing: f64,
	/// Scale applied to repulsive and attractive forces before they are
	/// added to velocity.
	pub force_scale: f64,
	/// Pull toward the viewport center, per unit of offset.
	pub gravity: f64,
	/// Velocity retained after each step.
	pub friction: f64,
	/// Distance substituted when two nodes coincide.
	pub min_distance: f64,
}

impl Default for ForceLayout {
	fn default() -> Self {
		Self {
			iterations: 150,
			spacing: 0.8,
			force_scale: 0.05,
			gravity: 0.01,
			friction: 0.5,
			min_distance: 0.1,
		}
	}
}

impl ForceLayout {
	/// Ideal distance `k` for `node_count` nodes sharing `viewport`.
	pub fn ideal_distance(&self, viewport: Viewport, node_count: usize) -> f64 {
		((viewport.width * viewport.height) / node_count as f64).sqrt() * self.spacing
	}

	/// Lay out `nodes` inside `viewport`, drawing initial positions from
	/// `rng`. Output order matches `nodes`.
	///
	/// Edges naming an unknown node are skipped.
	pub fn run<R: Rng + ?Sized>(
		&self,
		nodes: &[GraphNode],
		edges: &[GraphEdge],
		viewport: Viewport,
		rng: &mut R,
	) -> Vec<PositionedNode> {
		if nodes.is_empty() {
			return Vec::new();
		}

		let mut positioned: Vec<PositionedNode> = nodes
			.iter()
			.map(|node| {
				let x = rng.random::<f64>() * viewport.width;
				let y = rng.random::<f64>() * viewport.height;
				PositionedNode::at_rest(node.clone(), x, y)
			})
			.collect();

		let springs = resolve_springs(nodes, edges);
		let k = self.ideal_distance(viewport, nodes.len());
		debug!(
			"force layout: {} nodes, {} springs ({} edges), k = {:.2}",
			nodes.len(),
			springs.len(),
			edges.len(),
			k
		);

		for _ in 0..self.iterations {
			self.step(&mut positioned, &springs, k, viewport);
		}
		positioned
	}

	fn step(&self, nodes: &mut [PositionedNode], springs: &[(usize, usize)], k: f64, viewport: Viewport) {
		let n = nodes.len();

		for a in 0..n {
			for b in 0..n {
				if a == b {
					continue;
				}
				let (dx, dy, dist) = self.separation(&nodes[a], &nodes[b]);
				let force = k * k / dist;
				nodes[a].vx += dx / dist * force * self.force_scale;
				nodes[a].vy += dy / dist * force * self.force_scale;
			}
		}

		for &(s, t) in springs {
			let (dx, dy, dist) = self.separation(&nodes[s], &nodes[t]);
			let force = dist * dist / k;
			let (fx, fy) = (
				dx / dist * force * self.force_scale,
				dy / dist * force * self.force_scale,
			);
			nodes[s].vx -= fx;
			nodes[s].vy -= fy;
			nodes[t].vx += fx;
			nodes[t].vy += fy;
		}

		let (cx, cy) = viewport.center();
		for node in nodes.iter_mut() {
			node.vx += (cx - node.x) * self.gravity;
			node.vy += (cy - node.y) * self.gravity;
			node.x += node.vx;
			node.y += node.vy;
			node.vx *= self.friction;
			node.vy *= self.friction;
		}
	}

	/// Offset from `b` to `a` and its length, with zero (or NaN) length
	/// replaced by `min_distance`.
	fn separation(&self, a: &PositionedNode, b: &PositionedNode) -> (f64, f64, f64) {
		let (dx, dy) = (a.x - b.x, a.y - b.y);
		let dist = (dx * dx + dy * dy).sqrt();
		let dist = if dist > 0.0 { dist } else { self.min_distance };
		(dx, dy, dist)
	}
}

/// Index pairs for every edge whose endpoints both resolve. Duplicate ids
/// resolve to their first occurrence.
fn resolve_springs(nodes: &[GraphNode], edges: &[GraphEdge]) -> Vec<(usize, usize)> {
	let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
	for (i, node) in nodes.iter().enumerate() {
		index.entry(node.id.as_str()).or_insert(i);
	}
	edges
		.iter()
		.filter_map(|edge| {
			match (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
				(Some(&s), Some(&t)) => Some((s, t)),
				_ => None,
			}
		})
		.collect()
}

/// Lay out a graph in a `width` × `height` area using a fresh random seed.
pub fn compute_layout(
	nodes: &[GraphNode],
	edges: &[GraphEdge],
	width: f64,
	height: f64,
) -> Vec<PositionedNode> {
	compute_layout_seeded(nodes, edges, width, height, fresh_seed())
}

/// Like [`compute_layout`] but reproducible: equal inputs and seed give
/// bit-identical positions.
pub fn compute_layout_seeded(
	nodes: &[GraphNode],
	edges: &[GraphEdge],
	width: f64,
	height: f64,
	seed: u64,
) -> Vec<PositionedNode> {
	let mut rng = StdRng::seed_from_u64(seed);
	ForceLayout::default().run(nodes, edges, Viewport::new(width, height), &mut rng)
}

/// A seed from the platform's ambient randomness.
#[cfg(target_arch = "wasm32")]
pub fn fresh_seed() -> u64 {
	// Math.random carries ~52 bits; two draws fill the word.
	let hi = (js_sys::Math::random() * 4_294_967_296.0) as u64;
	let lo = (js_sys::Math::random() * 4_294_967_296.0) as u64;
	(hi << 32) | lo
}

/// A seed from the platform's ambient randomness.
#[cfg(not(target_arch = "wasm32"))]
pub fn fresh_seed() -> u64 {
	rand::random()
}
