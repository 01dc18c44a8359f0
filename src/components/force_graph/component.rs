use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent, Window,
};

use super::config::GraphConfig;
use super::render::{self, BackdropCache};
use super::state::ForceGraphState;
use super::types::{GraphData, Margin, Viewport};

type SharedState = Rc<RefCell<Option<ForceGraphState>>>;
type Callback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Animation frame loop and window listener of one mounted canvas.
#[derive(Default)]
struct GraphLoop {
	animate: Callback,
	resize: Callback,
	frame: Rc<RefCell<Option<i32>>>,
}

impl GraphLoop {
	fn dispose(&self) {
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some(id) = self.frame.borrow_mut().take() {
			let _ = window.cancel_animation_frame(id);
		}
		if let Some(cb) = self.resize.borrow_mut().take() {
			let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		// Dropping the closure also breaks its reference to itself.
		self.animate.borrow_mut().take();
		debug!("force graph loop disposed");
	}
}

fn window_viewport(window: &Window, margin: Margin) -> Option<Viewport> {
	let width = window.inner_width().ok()?.as_f64()?;
	let height = window.inner_height().ok()?.as_f64()?;
	Some(Viewport {
		width: width - margin.left - margin.right,
		height: height - margin.top - margin.bottom,
		margin,
	})
}

fn element_viewport(canvas: &HtmlCanvasElement, width: Option<f64>, height: Option<f64>) -> Viewport {
	let parent = canvas.parent_element();
	Viewport::new(
		width.unwrap_or_else(|| parent.as_ref().map(|p| p.client_width() as f64).unwrap_or(800.0)),
		height.unwrap_or_else(|| parent.as_ref().map(|p| p.client_height() as f64).unwrap_or(600.0)),
	)
}

fn size_canvas(canvas: &HtmlCanvasElement, viewport: &Viewport) {
	canvas.set_width(viewport.outer_width() as u32);
	canvas.set_height(viewport.outer_height() as u32);
}

fn pointer_position(canvas: &HtmlCanvasElement, client_x: f64, client_y: f64) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(client_x - rect.left(), client_y - rect.top())
}

#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(optional)] config: GraphConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(optional)] margin: Margin,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let current: Rc<RefCell<Option<GraphLoop>>> = Rc::new(RefCell::new(None));
	let (state_init, current_init) = (state.clone(), current.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let data = data.get();
		if let Some(previous) = current_init.borrow_mut().take() {
			previous.dispose();
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			warn!("no window; force graph not started");
			return;
		};
		let ctx: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into().ok())
		{
			Some(ctx) => ctx,
			None => {
				warn!("2d context unavailable; force graph not started");
				return;
			}
		};

		let viewport = if fullscreen {
			window_viewport(&window, margin).unwrap_or_else(|| element_viewport(&canvas, width, height))
		} else {
			element_viewport(&canvas, width, height)
		};
		size_canvas(&canvas, &viewport);
		*state_init.borrow_mut() = Some(ForceGraphState::new(&data, viewport, config.clone()));
		let graph_loop = GraphLoop::default();

		if fullscreen {
			let (state_resize, canvas_resize, config_resize) =
				(state_init.clone(), canvas.clone(), config.clone());
			*graph_loop.resize.borrow_mut() = Some(Closure::new(move || {
				let Some(viewport) = web_sys::window().and_then(|w| window_viewport(&w, margin)) else {
					return;
				};
				debug!("resized to {}x{}", viewport.width, viewport.height);
				size_canvas(&canvas_resize, &viewport);
				// A new viewport rebuilds the layout from scratch.
				*state_resize.borrow_mut() =
					Some(ForceGraphState::new(&data, viewport, config_resize.clone()));
			}));
			if let Some(ref cb) = *graph_loop.resize.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner, frame) = (
			state_init.clone(),
			graph_loop.animate.clone(),
			graph_loop.frame.clone(),
		);
		let mut cache = BackdropCache::default();
		*graph_loop.animate.borrow_mut() = Some(Closure::new(move || {
			// A settled, untouched graph is not redrawn.
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				let moved = s.tick();
				if (moved | s.take_redraw()) && !render::render(s, &ctx, &mut cache) {
					s.request_redraw();
				}
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				*frame.borrow_mut() = web_sys::window()
					.and_then(|w| w.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *graph_loop.animate.borrow() {
			*graph_loop.frame.borrow_mut() =
				window.request_animation_frame(cb.as_ref().unchecked_ref()).ok();
		}
		*current_init.borrow_mut() = Some(graph_loop);
	});

	let current_cleanup = SendWrapper::new(current.clone());
	on_cleanup(move || {
		if let Some(graph_loop) = current_cleanup.borrow_mut().take() {
			graph_loop.dispose();
		}
	});

	let canvas_position = move |x: f64, y: f64| {
		canvas_ref
			.get()
			.map(|c| pointer_position(&c.into(), x, y))
	};

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_position(ev.client_x() as f64, ev.client_y() as f64) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_position(ev.client_x() as f64, ev.client_y() as f64) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.pointer_up();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_position(ev.client_x() as f64, ev.client_y() as f64) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(x, y, ev.delta_y());
		}
	};

	let first_touch = move |ev: &TouchEvent| {
		let touch = ev.touches().get(0)?;
		canvas_position(touch.client_x() as f64, touch.client_y() as f64)
	};

	let state_ts = state.clone();
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		if let (Some((x, y)), Some(s)) = (first_touch(&ev), state_ts.borrow_mut().as_mut()) {
			s.pointer_down(x, y);
		}
	};

	let state_tm = state.clone();
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		if let (Some((x, y)), Some(s)) = (first_touch(&ev), state_tm.borrow_mut().as_mut()) {
			s.pointer_move(x, y);
		}
	};

	let state_te = state.clone();
	let on_touchend = move |_: TouchEvent| {
		if let Some(ref mut s) = *state_te.borrow_mut() {
			s.pointer_up();
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			style="display: block; cursor: grab; touch-action: none;"
		/>
	}
}
