//! Property and statistical tests for the force layout.
//!
//! Verifies:
//! 1. Output has the same ids, in the same order, as the input
//! 2. Edges naming unknown ids never fail the run
//! 3. Every position stays finite and within a loose band around the viewport
//! 4. Connected pairs settle closer than unconnected ones
//! 5. Unconnected nodes do not collapse onto each other

use proptest::prelude::*;
use research_graph_canvas::graph::{
	GraphEdge, GraphNode, NodeType, PositionedNode, Viewport, compute_layout, compute_layout_seeded,
};

fn node(id: &str) -> GraphNode {
	GraphNode {
		id: id.into(),
		label: id.into(),
		node_type: NodeType::Method,
	}
}

fn edge(source: &str, target: &str) -> GraphEdge {
	GraphEdge {
		source: source.into(),
		target: target.into(),
		relationship: "uses".into(),
	}
}

fn ids(nodes: &[GraphNode]) -> Vec<&str> {
	nodes.iter().map(|n| n.id.as_str()).collect()
}

fn positioned_ids(nodes: &[PositionedNode]) -> Vec<&str> {
	nodes.iter().map(|n| n.id()).collect()
}

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_graph() -> impl Strategy<Value = (Vec<GraphNode>, Vec<GraphEdge>)> {
	(1usize..=12).prop_flat_map(|n| {
		let nodes: Vec<GraphNode> = (0..n).map(|i| node(&format!("n{i}"))).collect();
		// ids up to n + 3 so some edges dangle
		let edges = prop::collection::vec((0..n + 3, 0..n + 3), 0..20).prop_map(|pairs| {
			pairs
				.into_iter()
				.map(|(s, t)| edge(&format!("n{s}"), &format!("n{t}")))
				.collect::<Vec<_>>()
		});
		(Just(nodes), edges)
	})
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	#[test]
	fn identity_and_order_are_preserved((nodes, edges) in arb_graph(), seed in any::<u64>()) {
		let out = compute_layout_seeded(&nodes, &edges, 800.0, 600.0, seed);
		prop_assert_eq!(positioned_ids(&out), ids(&nodes));
		for (p, n) in out.iter().zip(&nodes) {
			prop_assert_eq!(&p.node, n);
		}
	}

	#[test]
	fn positions_stay_near_viewport(
		(nodes, edges) in arb_graph(),
		width in 200.0f64..1000.0,
		height in 200.0f64..700.0,
		seed in any::<u64>(),
	) {
		let viewport = Viewport::new(width, height);
		let (cx, cy) = viewport.center();
		let out = compute_layout_seeded(&nodes, &edges, width, height, seed);
		for p in &out {
			prop_assert!(p.x.is_finite() && p.y.is_finite());
			let offset = ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt();
			prop_assert!(offset < 1.5 * viewport.diagonal(), "offset {} from center", offset);
		}
	}

	#[test]
	fn seeded_runs_repeat(seed in any::<u64>()) {
		let nodes = [node("a"), node("b"), node("c"), node("d")];
		let edges = [edge("a", "b"), edge("c", "d"), edge("d", "zzz")];
		let first = compute_layout_seeded(&nodes, &edges, 1000.0, 700.0, seed);
		let second = compute_layout_seeded(&nodes, &edges, 1000.0, 700.0, seed);
		prop_assert_eq!(first, second);
	}
}

#[test]
fn empty_input_gives_empty_output_even_with_edges() {
	assert!(compute_layout(&[], &[edge("a", "b")], 800.0, 600.0).is_empty());
}

#[test]
fn unseeded_layout_covers_all_declared_nodes() {
	let nodes = [node("a"), node("b"), node("c")];
	let out = compute_layout(&nodes, &[edge("a", "missing"), edge("missing", "c")], 800.0, 600.0);
	assert_eq!(positioned_ids(&out), vec!["a", "b", "c"]);
}

#[test]
fn connected_pair_settles_closer_than_unconnected_pair() {
	let nodes = [node("a"), node("b"), node("c"), node("d")];
	let edges = [edge("a", "b")];
	let trials = 40;
	let (mut connected, mut unconnected) = (0.0, 0.0);
	for seed in 0..trials {
		let out = compute_layout_seeded(&nodes, &edges, 800.0, 600.0, seed);
		connected += out[0].distance_to(&out[1]);
		unconnected += out[2].distance_to(&out[3]);
	}
	let (connected, unconnected) = (connected / trials as f64, unconnected / trials as f64);
	assert!(
		connected * 2.0 < unconnected,
		"connected {connected:.1} vs unconnected {unconnected:.1}"
	);
}

#[test]
fn two_connected_nodes_reach_the_same_spacing_from_any_start() {
	let nodes = [node("a"), node("b")];
	let edges = [edge("a", "b")];
	let spacings: Vec<f64> = (0..20)
		.map(|seed| {
			let out = compute_layout_seeded(&nodes, &edges, 800.0, 600.0, seed);
			out[0].distance_to(&out[1])
		})
		.collect();
	let first = spacings[0];
	assert!(spacings.iter().all(|d| (d - first).abs() < 1.0), "{spacings:?}");

	let apart = compute_layout_seeded(&nodes, &[], 800.0, 600.0, 0);
	assert!(first < apart[0].distance_to(&apart[1]));
}

#[test]
fn unconnected_nodes_spread_out() {
	let nodes: Vec<GraphNode> = ["a", "b", "c", "d", "e"].iter().map(|id| node(id)).collect();
	let k = (800.0f64 * 600.0 / 5.0).sqrt() * 0.8;
	for seed in 0..20 {
		let out = compute_layout_seeded(&nodes, &[], 800.0, 600.0, seed);
		for i in 0..out.len() {
			for j in 0..i {
				let d = out[i].distance_to(&out[j]);
				assert!(d > k, "seed {seed}: nodes {i} and {j} only {d:.1} apart");
			}
		}
	}
}
