use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	Blob, BlobPropertyBag, CanvasRenderingContext2d, HtmlAnchorElement, HtmlCanvasElement,
	MouseEvent, ResizeObserver, Url, WheelEvent,
};

use super::config::EngineConfig;
use super::export::{ExportFormat, export_file_name};
use super::render;
use super::state::{GraphCommands, ProcessGraphState};
use super::types::{Graph, Node};

const FRAME_DT: f64 = 1.0 / 60.0;

type ClickHandler = Box<dyn FnMut(&Node)>;

/// Host-side handle to a mounted diagram. Commands issued before the canvas
/// mounts are ignored.
#[derive(Clone, Default)]
pub struct ProcessGraphHandle {
	state: Rc<RefCell<Option<ProcessGraphState>>>,
	on_node_click: Rc<RefCell<Option<ClickHandler>>>,
}

impl ProcessGraphHandle {
	/// Run `f` against the live diagram, if there is one.
	pub fn with_state<R>(&self, f: impl FnOnce(&mut ProcessGraphState) -> R) -> Option<R> {
		self.state.borrow_mut().as_mut().map(f)
	}

	/// Whether the canvas has mounted.
	pub fn is_mounted(&self) -> bool {
		self.state.borrow().is_some()
	}

	/// Bind a diagram instance to this handle.
	pub fn attach(&self, state: ProcessGraphState) {
		*self.state.borrow_mut() = Some(state);
	}

	/// Drop the diagram instance; later commands are ignored.
	pub fn detach(&self) {
		self.state.borrow_mut().take();
	}

	/// Register a node activation callback for hosts outside the Leptos
	/// component tree. It runs with the diagram unborrowed, so it may issue
	/// commands through this handle.
	pub fn set_on_node_click(&self, callback: impl FnMut(&Node) + 'static) {
		*self.on_node_click.borrow_mut() = Some(Box::new(callback));
	}

	/// Finish a press on the diagram and report the activated node, if any.
	pub fn pointer_up(&self, x: f64, y: f64) -> Option<Node> {
		let clicked = self.with_state(|s| s.pointer_up(x, y)).flatten()?;
		let handler = self.on_node_click.borrow_mut().take();
		if let Some(mut handler) = handler {
			handler(&clicked);
			let mut slot = self.on_node_click.borrow_mut();
			if slot.is_none() {
				*slot = Some(handler);
			}
		}
		Some(clicked)
	}

	/// Clear the diagram and its camera.
	pub fn reset(&self) {
		self.with_state(ProcessGraphState::reset);
	}

	/// Export in `format` and hand the file to the browser as a download.
	/// Returns whether a file was produced.
	pub fn download(&self, format: ExportFormat) -> bool {
		let content = match format {
			ExportFormat::Json => self
				.with_state(|s| if s.is_placeholder() { None } else { s.export_json().ok() })
				.flatten(),
			ExportFormat::Svg => self.export_to_svg(),
		};
		let Some(content) = content else {
			warn!("nothing to export as {}", format.extension());
			return false;
		};
		let stamp: String = js_sys::Date::new_0().to_iso_string().into();
		let file_name = export_file_name(&stamp, format);
		match save_file(&file_name, &content, format.mime_type()) {
			Ok(()) => true,
			Err(err) => {
				error!("download of {file_name} failed: {err:?}");
				false
			}
		}
	}
}

impl GraphCommands for ProcessGraphHandle {
	fn zoom_in(&mut self) {
		self.with_state(|s| s.zoom_in());
	}

	fn zoom_out(&mut self) {
		self.with_state(|s| s.zoom_out());
	}

	fn center_graph(&mut self) {
		self.with_state(|s| s.center_graph());
	}

	fn export_to_svg(&self) -> Option<String> {
		self.state.borrow().as_ref().and_then(|s| s.export_to_svg())
	}
}

/// Browser resources held by a mounted canvas.
#[derive(Default)]
struct Mounted {
	frame: Cell<Option<i32>>,
	animate: RefCell<Option<Closure<dyn FnMut()>>>,
	on_resize: RefCell<Option<Closure<dyn FnMut()>>>,
	observer: RefCell<Option<ResizeObserver>>,
}

impl Mounted {
	fn release(&self, handle: &ProcessGraphHandle) {
		if let (Some(id), Some(window)) = (self.frame.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		if let Some(observer) = self.observer.borrow_mut().take() {
			observer.disconnect();
		}
		self.animate.borrow_mut().take();
		self.on_resize.borrow_mut().take();
		handle.detach();
	}
}

fn save_file(file_name: &str, content: &str, mime: &str) -> Result<(), JsValue> {
	let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
	let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
	let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;

	let options = BlobPropertyBag::new();
	options.set_type(mime);
	let parts = js_sys::Array::of1(&JsValue::from_str(content));
	let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
	let url = Url::create_object_url_with_blob(&blob)?;

	let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
	anchor.set_href(&url);
	anchor.set_download(file_name);
	body.append_child(&anchor)?;
	anchor.click();
	body.remove_child(&anchor)?;
	Url::revoke_object_url(&url)
}

fn container_size(canvas: &HtmlCanvasElement, config: &EngineConfig) -> (f64, f64) {
	let parent = canvas.parent_element();
	let measured = |v: i32, fallback: f64| if v > 0 { v as f64 } else { fallback };
	match parent {
		Some(p) => (
			measured(p.client_width(), config.canvas.fallback_width),
			measured(p.client_height(), config.canvas.fallback_height),
		),
		None => (config.canvas.fallback_width, config.canvas.fallback_height),
	}
}

fn local_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Canvas that draws `data` as a top-down process tree and handles pan, zoom,
/// hover and node clicks.
#[component]
pub fn ProcessGraphCanvas(
	#[prop(into)] data: Signal<Graph>,
	#[prop(optional)] handle: ProcessGraphHandle,
	#[prop(optional, into)] on_node_click: Option<Callback<Node>>,
	#[prop(optional)] config: EngineConfig,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let mounted = Rc::new(Mounted::default());
	let (handle_init, mounted_init) = (handle.clone(), mounted.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if handle_init.is_mounted() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
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
				error!("canvas 2d context unavailable");
				return;
			}
		};

		let (w, h) = container_size(&canvas, &config);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		handle_init.attach(ProcessGraphState::new(&data.get_untracked(), w, h, config.clone()));

		let (handle_resize, canvas_resize, config_resize) =
			(handle_init.clone(), canvas.clone(), config.clone());
		*mounted_init.on_resize.borrow_mut() = Some(Closure::new(move || {
			let (nw, nh) = container_size(&canvas_resize, &config_resize);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			handle_resize.with_state(|s| {
				let (ow, oh) = s.viewport.size();
				if ow != nw || oh != nh {
					s.resize(nw, nh);
				}
			});
		}));
		match (canvas.parent_element(), &*mounted_init.on_resize.borrow()) {
			(Some(container), Some(cb)) => match ResizeObserver::new(cb.as_ref().unchecked_ref()) {
				Ok(observer) => {
					observer.observe(&container);
					*mounted_init.observer.borrow_mut() = Some(observer);
				}
				Err(err) => warn!("container size changes will be missed: {err:?}"),
			},
			_ => warn!("canvas has no container to observe"),
		}

		let (handle_anim, mounted_anim) = (handle_init.clone(), mounted_init.clone());
		*mounted_init.animate.borrow_mut() = Some(Closure::new(move || {
			handle_anim.with_state(|s| {
				s.tick(FRAME_DT);
				render::render(s, &ctx);
			});
			if let (Some(cb), Some(win)) = (&*mounted_anim.animate.borrow(), web_sys::window()) {
				mounted_anim
					.frame
					.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *mounted_init.animate.borrow() {
			mounted_init
				.frame
				.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	});

	let teardown = StoredValue::new_local((mounted, handle.clone()));
	on_cleanup(move || {
		let _ = teardown.try_with_value(|(mounted, handle)| mounted.release(handle));
	});

	let handle_data = handle.clone();
	Effect::new(move |_| {
		let graph = data.get();
		handle_data.with_state(|s| s.set_graph(graph));
	});

	let state_md = handle.state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = handle.state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
			let cursor = if s.pan.moved {
				"grabbing"
			} else if s.hover.node.is_some() {
				"pointer"
			} else {
				"grab"
			};
			let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
		}
	};

	let handle_mu = handle.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		let clicked = handle_mu.pointer_up(x, y);
		if let (Some(node), Some(cb)) = (clicked, on_node_click) {
			cb.run(node);
		}
	};

	let state_ml = handle.state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = handle.state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(x, y, ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="process-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::process_graph::types::{Edge, NodeKind};

	fn mounted_handle() -> ProcessGraphHandle {
		let graph = Graph {
			nodes: vec![
				Node::new("1", "Start", NodeKind::BeginEnd, "begin"),
				Node::new("2", "Work", NodeKind::MainProcess, "do it"),
			],
			edges: vec![Edge::new("1", "2")],
		};
		let handle = ProcessGraphHandle::default();
		handle.attach(ProcessGraphState::new(&graph, 800.0, 600.0, EngineConfig::default()));
		handle.with_state(|s| while s.tick(0.016) {});
		handle
	}

	fn screen_of(handle: &ProcessGraphHandle, id: &str) -> (f64, f64) {
		handle
			.with_state(|s| {
				let node = s.positioned_nodes().iter().find(|n| n.node.id == id).unwrap();
				let p = s.viewport.transform().apply(node.position);
				(p.x, p.y)
			})
			.unwrap()
	}

	#[test]
	fn click_callback_may_command_the_diagram() {
		let handle = mounted_handle();
		let seen = Rc::new(RefCell::new(Vec::new()));
		let (sink, inner) = (seen.clone(), handle.clone());
		handle.set_on_node_click(move |node| {
			let mut commands = inner.clone();
			commands.zoom_in();
			let svg = commands.export_to_svg();
			sink.borrow_mut().push((node.id.clone(), svg.is_some()));
		});

		let (x, y) = screen_of(&handle, "2");
		handle.with_state(|s| s.pointer_down(x, y));
		let clicked = handle.pointer_up(x, y);

		assert_eq!(clicked.map(|n| n.id), Some("2".to_owned()));
		assert_eq!(*seen.borrow(), [("2".to_owned(), true)]);
		assert_eq!(handle.with_state(|s| s.viewport.is_animating()), Some(true));
	}

	#[test]
	fn callback_can_replace_itself() {
		let handle = mounted_handle();
		let inner = handle.clone();
		let hits = Rc::new(RefCell::new(0));
		let counter = hits.clone();
		handle.set_on_node_click(move |_| {
			let counter = counter.clone();
			inner.set_on_node_click(move |_| *counter.borrow_mut() += 10);
		});

		let (x, y) = screen_of(&handle, "1");
		for _ in 0..2 {
			handle.with_state(|s| s.pointer_down(x, y));
			handle.pointer_up(x, y);
		}
		assert_eq!(*hits.borrow(), 10);
	}

	#[test]
	fn detached_handle_ignores_commands() {
		let mut handle = mounted_handle();
		handle.detach();
		assert!(!handle.is_mounted());
		handle.zoom_in();
		assert!(handle.export_to_svg().is_none());
		assert!(handle.pointer_up(10.0, 10.0).is_none());
	}
}
