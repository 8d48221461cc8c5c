use std::cell::RefCell;
use std::rc::Rc;

use leptos::ev;
use leptos::prelude::*;
use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::ForceGraphState;
use crate::graph::{KnowledgeGraph, NodeType};

struct Scene {
	state: ForceGraphState,
	ctx: CanvasRenderingContext2d,
}

impl Scene {
	fn draw(&self) {
		render::render(&self.state, &self.ctx);
	}
}

type SharedScene = Rc<RefCell<Option<Scene>>>;

fn local_position(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn window_size(window: &Window) -> (f64, f64) {
	let dim = |v: Result<JsValue, JsValue>, fallback: f64| v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback);
	(
		dim(window.inner_width(), 1000.0),
		dim(window.inner_height(), 700.0),
	)
}

/// Static force-directed drawing of a knowledge graph.
///
/// The layout is computed once whenever `graph` changes and kept until the
/// graph changes again or the user asks for a new arrangement.
#[component]
pub fn KnowledgeGraphCanvas(
	#[prop(into)] graph: Signal<KnowledgeGraph>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let scene: SharedScene = Rc::new(RefCell::new(None));
	let scene_init = scene.clone();

	Effect::new(move |_| {
		let data = graph.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.filter(|w| *w > 0.0)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.filter(|h| *h > 0.0)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			return;
		};
		let state = ForceGraphState::new(&data, w, h, None);
		debug!(
			"laid out {} nodes / {} edges in {:?} (seed {})",
			state.layout.graph().node_count(),
			state.layout.graph().edge_count(),
			state.layout.viewport(),
			state.layout.seed()
		);
		let next = Scene { state, ctx };
		next.draw();
		*scene_init.borrow_mut() = Some(next);
	});

	// Lives exactly as long as this component; the graph modal remounts it.
	if fullscreen {
		let scene_resize = scene.clone();
		let handle = window_event_listener(ev::resize, move |_| {
			let (Some(win), Some(canvas)) = (web_sys::window(), canvas_ref.get_untracked()) else {
				return;
			};
			let (nw, nh) = window_size(&win);
			canvas.set_width(nw as u32);
			canvas.set_height(nh as u32);
			if let Some(ref mut s) = *scene_resize.borrow_mut() {
				s.state.resize(nw, nh);
				s.draw();
			}
		});
		on_cleanup(move || handle.remove());
	}

	let scene_md = scene.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_position(&canvas, &ev);
		if let Some(ref mut s) = *scene_md.borrow_mut() {
			s.state.begin_pan(x, y);
		}
	};

	let scene_mm = scene.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_position(&canvas, &ev);
		if let Some(ref mut s) = *scene_mm.borrow_mut() {
			let moved = s.state.pan_to(x, y);
			let hover_changed = if s.state.pan.active {
				false
			} else {
				let hovered = s.state.node_at_position(x, y);
				s.state.set_hover(hovered)
			};
			if moved || hover_changed {
				s.draw();
			}
		}
	};

	let scene_mu = scene.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *scene_mu.borrow_mut() {
			s.state.end_pan();
		}
	};

	let scene_ml = scene.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *scene_ml.borrow_mut() {
			s.state.end_pan();
			if s.state.set_hover(None) {
				s.draw();
			}
		}
	};

	let scene_wh = scene.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_position(&canvas, &ev);
		if let Some(ref mut s) = *scene_wh.borrow_mut() {
			s.state.zoom_at(x, y, ev.delta_y());
			s.draw();
		}
	};

	let scene_rl = scene.clone();
	let on_relayout = move |_: MouseEvent| {
		if let Some(ref mut s) = *scene_rl.borrow_mut() {
			s.state.regenerate();
			debug!("re-laid out graph (seed {})", s.state.layout.seed());
			s.draw();
		}
	};

	let scene_fit = scene.clone();
	let on_fit = move |_: MouseEvent| {
		if let Some(ref mut s) = *scene_fit.borrow_mut() {
			s.state.fit_to_content();
			s.draw();
		}
	};

	view! {
		<div class="graph-canvas-wrapper">
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<div class="graph-toolbar">
				<ul class="graph-legend">
					{NodeType::ALL
						.into_iter()
						.map(|t| {
							view! {
								<li>
									<span class="legend-swatch" style=format!("background: {}", t.color())></span>
									{t.label()}
								</li>
							}
						})
						.collect_view()}
				</ul>
				<button on:click=on_fit>"Fit"</button>
				<button on:click=on_relayout>"Re-layout"</button>
			</div>
		</div>
	}
}
