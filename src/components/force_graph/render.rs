use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::{EdgeSegment, ForceGraphState, NODE_RADIUS};

const BACKGROUND: &str = "#111827";
const EDGE_COLOR: &str = "#4b5563";
const EDGE_ALPHA: f64 = 0.6;

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, arrow_size) = (0.7 / k, 6.0 / k);
	let has_hover = state.hovered.is_some();

	for segment in state.layout.edge_segments() {
		let EdgeSegment {
			source,
			target,
			from,
			to,
			relationship,
		} = segment;
		let (dx, dy) = (to.x - from.x, to.y - from.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 2.0 * NODE_RADIUS {
			continue;
		}

		let is_highlighted = state.hovered.is_some_and(|h| h == source || h == target);

		let alpha = match (has_hover, is_highlighted) {
			(false, _) => EDGE_ALPHA,
			(true, true) => 0.95,
			(true, false) => 0.15,
		};
		let color = if is_highlighted { "#e5e7eb" } else { EDGE_COLOR };

		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(if is_highlighted { line_width * 2.0 } else { line_width });

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(from.x + ux * NODE_RADIUS, from.y + uy * NODE_RADIUS);
		ctx.line_to(to.x - ux * (NODE_RADIUS + arrow_size), to.y - uy * (NODE_RADIUS + arrow_size));
		ctx.stroke();

		ctx.set_fill_style_str(color);
		let (tip_x, tip_y) = (to.x - ux * NODE_RADIUS, to.y - uy * NODE_RADIUS);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		if is_highlighted {
			ctx.set_global_alpha(1.0);
			ctx.set_fill_style_str("#d1d5db");
			ctx.set_font(&format!("italic {}px sans-serif", 9.0 / k.max(0.5)));
			ctx.set_text_align("center");
			let _ = ctx.fill_text(relationship, from.x + dx / 2.0, from.y + dy / 2.0 - 4.0 / k);
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let has_hover = state.hovered.is_some();

	for (idx, node) in state.layout.nodes().iter().enumerate() {
		let highlighted = state.is_highlighted(idx);
		ctx.set_global_alpha(if has_hover && !highlighted { 0.3 } else { 1.0 });

		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, NODE_RADIUS, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.node.node_type.color());
		ctx.fill();
		ctx.set_stroke_style_str("white");
		ctx.set_line_width(2.0 / k);
		ctx.stroke();

		if highlighted {
			ctx.set_fill_style_str("white");
			ctx.set_font(&format!("600 {}px sans-serif", 10.0 / k.max(0.5)));
			ctx.set_text_align("center");
			let _ = ctx.fill_text(&node.node.label, node.x, node.y + NODE_RADIUS * 2.0);
		}
	}
	ctx.set_global_alpha(1.0);
}
