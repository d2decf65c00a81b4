use log::{debug, info};

use super::config::EngineConfig;
use super::export;
use super::hierarchy::Tree;
use super::layout::{Layout, PositionedNode};
use super::scene::{Scene, SceneNode};
use super::types::{Graph, Node};
use super::viewport::{ViewTransform, Viewport};

/// Commands a host can issue to a diagram.
pub trait GraphCommands {
	/// Animated zoom in around the viewport centre.
	fn zoom_in(&mut self);
	/// Animated zoom out around the viewport centre.
	fn zoom_out(&mut self);
	/// Animated fit of the whole diagram; no-op when there is nothing to fit.
	fn center_graph(&mut self);
	/// Self-contained SVG of the current view, `None` when nothing is drawn.
	fn export_to_svg(&self) -> Option<String>;
}

/// An in-progress pointer press.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	/// A button is down.
	pub active: bool,
	/// The press moved past the click tolerance and became a pan.
	pub moved: bool,
	/// Screen x at press time.
	pub start_x: f64,
	/// Screen y at press time.
	pub start_y: f64,
	/// Camera x at press time.
	pub transform_start_x: f64,
	/// Camera y at press time.
	pub transform_start_y: f64,
	/// Card under the pointer at press time.
	pub pressed_node: Option<usize>,
}

/// Hovered card and its highlight progress.
#[derive(Clone, Debug, Default)]
pub struct HoverState {
	/// Index into the scene nodes.
	pub node: Option<usize>,
	/// 0 to 1 fade-in of the highlight.
	pub highlight_t: f64,
}

/// One diagram instance: the laid-out graph, its camera and pointer state.
#[derive(Clone, Debug)]
pub struct ProcessGraphState {
	graph: Graph,
	layout: Layout,
	scene: Option<Scene>,
	config: EngineConfig,
	/// Camera.
	pub viewport: Viewport,
	/// Current press, if any.
	pub pan: PanState,
	/// Current hover, if any.
	pub hover: HoverState,
}

impl ProcessGraphState {
	/// Lay `graph` out for a `width` x `height` screen and centre it.
	pub fn new(graph: &Graph, width: f64, height: f64, config: EngineConfig) -> Self {
		let mut state = Self {
			graph: Graph::default(),
			layout: Layout::default(),
			scene: None,
			viewport: Viewport::new(width, height, config.viewport.clone()),
			config,
			pan: PanState::default(),
			hover: HoverState::default(),
		};
		state.relayout(graph.clone());
		state
	}

	/// Replace the graph wholesale: re-derive the tree, lay it out again and
	/// re-centre the camera. A graph equal to the current one is ignored so
	/// the camera and hover survive. Returns whether a new layout was made.
	pub fn set_graph(&mut self, graph: Graph) -> bool {
		if graph == self.graph {
			debug!("graph unchanged, keeping layout and camera");
			return false;
		}
		self.relayout(graph);
		true
	}

	fn relayout(&mut self, graph: Graph) {
		let tree = Tree::build(&graph);
		self.layout = Layout::compute(&tree, &self.config.layout);
		self.scene = Scene::from_layout(&self.layout, &self.config.layout);
		self.graph = graph;
		self.hover = HoverState::default();
		self.pan = PanState::default();
		info!(
			"graph loaded: {} of {} nodes laid out",
			self.layout.nodes.len(),
			self.graph.nodes.len()
		);
		self.center_graph();
	}

	/// Drop the graph and return the camera to identity.
	pub fn reset(&mut self) {
		self.graph = Graph::default();
		self.layout = Layout::default();
		self.scene = None;
		self.hover = HoverState::default();
		self.pan = PanState::default();
		self.viewport.reset();
	}

	/// Graph currently laid out.
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	/// Result of the last layout pass.
	pub fn layout(&self) -> &Layout {
		&self.layout
	}

	/// Nodes with their layout positions, root first.
	pub fn positioned_nodes(&self) -> &[PositionedNode] {
		&self.layout.nodes
	}

	/// What is drawn; `None` for the placeholder.
	pub fn scene(&self) -> Option<&Scene> {
		self.scene.as_ref()
	}

	/// Settings in use.
	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// True when there is nothing to draw; the host shows a placeholder.
	pub fn is_placeholder(&self) -> bool {
		self.scene.is_none()
	}

	/// Pretty exchange JSON of the current graph.
	pub fn export_json(&self) -> Result<String, serde_json::Error> {
		export::export_json(&self.graph)
	}

	/// New container size. Positions stay; the camera re-centres.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport.resize(width, height);
		self.center_graph();
	}

	/// Screen point in layout coordinates.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		let p = self.viewport.transform().invert(sx, sy);
		(p.x, p.y)
	}

	/// Scene index of the card under a screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let p = self.viewport.transform().invert(sx, sy);
		self.scene.as_ref()?.node_at(p)
	}

	/// Scene card by index.
	pub fn scene_node(&self, idx: usize) -> Option<&SceneNode> {
		self.scene.as_ref()?.nodes.get(idx)
	}

	/// Hover a card, restarting the highlight fade when it changes.
	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		self.hover.node = node;
		self.hover.highlight_t = 0.0;
	}

	/// Whether card `idx` is hovered.
	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.node == Some(idx)
	}

	/// Start a press at a screen point.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		let t = self.viewport.transform();
		self.pan = PanState {
			active: true,
			moved: false,
			start_x: sx,
			start_y: sy,
			transform_start_x: t.x,
			transform_start_y: t.y,
			pressed_node: self.node_at_position(sx, sy),
		};
	}

	/// Pointer motion: hover when idle, pan once a press moves past the
	/// click tolerance.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if !self.pan.active {
			let hovered = self.node_at_position(sx, sy);
			self.set_hover(hovered);
			return;
		}
		let (dx, dy) = (sx - self.pan.start_x, sy - self.pan.start_y);
		if !self.pan.moved && dx.hypot(dy) <= self.config.viewport.click_tolerance {
			return;
		}
		self.pan.moved = true;
		let k = self.viewport.transform().k;
		self.viewport.set_transform(ViewTransform {
			x: self.pan.transform_start_x + dx,
			y: self.pan.transform_start_y + dy,
			k,
		});
	}

	/// Finish a press. A press that did not pan and ends on the card it
	/// started on activates that node, which is returned.
	pub fn pointer_up(&mut self, sx: f64, sy: f64) -> Option<Node> {
		let pan = std::mem::take(&mut self.pan);
		if !pan.active || pan.moved {
			return None;
		}
		let idx = pan.pressed_node.filter(|&i| self.node_at_position(sx, sy) == Some(i))?;
		let node = self.scene_node(idx)?.node.clone();
		debug!("node activated: {}", node.id);
		Some(node)
	}

	/// Pointer left the canvas: cancel the press and the hover.
	pub fn pointer_leave(&mut self) {
		self.pan = PanState::default();
		self.set_hover(None);
	}

	/// Wheel zoom around a screen point.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		self.viewport.wheel(sx, sy, delta_y);
	}

	/// Advance camera and hover transitions. Returns whether anything is
	/// still animating.
	pub fn tick(&mut self, dt: f64) -> bool {
		let camera = self.viewport.tick(dt);

		let (target, speed) = if self.hover.node.is_some() { (1.0, 9.0) } else { (0.0, 6.0) };
		self.hover.highlight_t += (target - self.hover.highlight_t) * (speed * dt).min(1.0);
		let hover = (target - self.hover.highlight_t).abs() > 0.01;
		if !hover {
			self.hover.highlight_t = target;
		}

		camera || hover
	}
}

impl GraphCommands for ProcessGraphState {
	fn zoom_in(&mut self) {
		self.viewport.zoom_in();
	}

	fn zoom_out(&mut self) {
		self.viewport.zoom_out();
	}

	fn center_graph(&mut self) {
		let bounds = self.scene.as_ref().map(|s| s.bounds);
		self.viewport.center(bounds);
	}

	fn export_to_svg(&self) -> Option<String> {
		let (w, h) = self.viewport.size();
		export::export_svg(self.scene.as_ref(), self.viewport.transform(), w, h)
	}
}
