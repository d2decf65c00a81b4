use pollster::block_on;
use process_graph_canvas::components::process_graph::{
	Edge, EngineConfig, Graph, GraphCommands, Layout, LayoutConfig, Node, NodeKind,
	ProcessGraphState, Scene, Tree, export,
};
use process_graph_canvas::error::CollaboratorError;
use process_graph_canvas::mutation::{Analysis, Collaborator, Outcome, Session};

fn node(id: &str, kind: NodeKind) -> Node {
	Node::new(id, format!("Step {id}"), kind, format!("does {id}"))
}

fn engine(graph: &Graph) -> ProcessGraphState {
	let mut state = ProcessGraphState::new(graph, 800.0, 600.0, EngineConfig::default());
	while state.tick(0.016) {}
	state
}

fn chain() -> Graph {
	Graph {
		nodes: vec![
			node("1", NodeKind::BeginEnd),
			node("2", NodeKind::MainProcess),
			node("3", NodeKind::BeginEnd),
		],
		edges: vec![Edge::new("1", "2"), Edge::new("2", "3")],
	}
}

fn wide_tree() -> Graph {
	let mut nodes = vec![node("root", NodeKind::BeginEnd)];
	let mut edges = Vec::new();
	for i in 0..4 {
		let mid = format!("m{i}");
		nodes.push(node(&mid, NodeKind::Decision));
		edges.push(Edge::labelled("root", mid.clone(), format!("case {i}")));
		for j in 0..i {
			let leaf = format!("l{i}{j}");
			nodes.push(node(&leaf, NodeKind::MainProcess));
			edges.push(Edge::new(mid.clone(), leaf));
		}
	}
	Graph { nodes, edges }
}

#[test]
fn scenario_a_single_node() {
	let graph =
		Graph::from_json(r#"{"nodes":[{"id":"1","label":"Start","type":"beginEnd","description":"begin"}],"edges":[]}"#)
			.unwrap();
	let mut state = engine(&graph);

	let nodes = state.positioned_nodes();
	assert_eq!(nodes.len(), 1);
	assert_eq!(nodes[0].position.y, 0.0);

	state.center_graph();
	while state.tick(0.016) {}
	let k = state.viewport.transform().k;
	assert!((0.2..=2.0).contains(&k));

	let svg = state.export_to_svg().unwrap();
	assert!(svg.contains("<svg"));
}

#[test]
fn scenario_b_chain_is_three_levels() {
	let tree = Tree::build(&chain());
	assert_eq!(tree.root().map(|n| n.node.id.as_str()), Some("1"));
	assert_eq!(tree.height(), 2);

	let layout = Layout::compute(&tree, &LayoutConfig::default());
	let ys: Vec<f64> = layout.nodes.iter().map(|n| n.position.y).collect();
	assert!(ys.windows(2).all(|w| w[0] < w[1]), "{ys:?}");
}

#[test]
fn scenario_c_dangling_edge_is_skipped() {
	let mut graph = chain();
	graph.edges.push(Edge::new("2", "99"));
	graph.edges.push(Edge::new("99", "1"));
	let state = engine(&graph);

	assert_eq!(state.positioned_nodes().len(), 3);
	assert_eq!(state.layout().links.len(), 2);
	let scene = state.scene().unwrap();
	assert_eq!(scene.edges.len(), 2);
	assert!(scene.nodes.iter().all(|n| n.node.id != "99"));
}

#[test]
fn scenario_d_empty_graph_is_a_placeholder() {
	let graph = Graph::from_json(r#"{"nodes":[],"edges":[]}"#).unwrap();
	let mut state = engine(&graph);
	assert!(state.is_placeholder());

	state.zoom_in();
	state.zoom_out();
	state.center_graph();
	while state.tick(0.016) {}
	assert!(state.export_to_svg().is_none());
	let k = state.viewport.transform().k;
	assert!((0.2..=2.0).contains(&k));
}

#[test]
fn acyclic_single_parent_graphs_keep_every_node() {
	let graph = wide_tree();
	let tree = Tree::build(&graph);
	assert_eq!(tree.len(), graph.nodes.len());
	let layout = Layout::compute(&tree, &LayoutConfig::default());
	assert_eq!(layout.nodes.len(), graph.nodes.len());
	assert_eq!(layout.links.len(), graph.edges.len());
}

#[test]
fn layout_is_deterministic() {
	let tree = Tree::build(&wide_tree());
	let config = LayoutConfig::default();
	assert_eq!(Layout::compute(&tree, &config), Layout::compute(&tree, &config));
}

#[test]
fn center_stays_within_zoom_bounds() {
	let mut huge = Graph::default();
	for i in 0..60 {
		huge.nodes.push(node(&i.to_string(), NodeKind::MainProcess));
		if i > 0 {
			huge.edges.push(Edge::new("0", i.to_string()));
		}
	}
	for graph in [chain(), wide_tree(), huge] {
		let mut state = engine(&graph);
		state.center_graph();
		while state.tick(0.016) {}
		let k = state.viewport.transform().k;
		assert!((0.2..=2.0).contains(&k), "scale {k} out of range");
	}
}

#[test]
fn structured_export_round_trips() {
	let graph = wide_tree();
	let text = export::export_json(&graph).unwrap();
	assert_eq!(export::import_json(&text).unwrap(), graph);
}

#[test]
fn svg_contains_every_drawn_node() {
	let config = LayoutConfig::default();
	let graph = wide_tree();
	let scene = Scene::from_layout(&Layout::compute(&Tree::build(&graph), &config), &config).unwrap();
	let state = engine(&graph);
	let svg = state.export_to_svg().unwrap();
	assert_eq!(svg.matches("class=\"node\"").count(), scene.nodes.len());
	assert!(svg.contains(">case 3</text>"));
}

struct Echo;

impl Collaborator for Echo {
	async fn generate(&self, instruction: &str, _context: &str) -> Result<Graph, CollaboratorError> {
		Ok(Graph::from_json(instruction)?)
	}

	async fn analyze(
		&self,
		_instruction: &str,
		_context: &str,
		_graph: &Graph,
	) -> Result<Analysis, CollaboratorError> {
		Err(CollaboratorError::Transport("analysis offline".into()))
	}
}

#[test]
fn untrusted_collaborator_output_renders_partially() {
	let mut session = Session::new();
	let reply = r#"{"nodes":[
		{"id":"a","label":"A","type":"beginEnd","description":""},
		{"id":"a","label":"dup","type":"decision","description":""},
		{"id":"b","label":"B","type":"swimlane","description":""},
		{"id":"c","label":"no description","type":"decision"}
	],"edges":[{"source":"a","target":"b"},{"source":"b","target":"c"}]}"#;

	let request = session.request(reply).unwrap();
	let outcome = session.settle(block_on(request.run(&Echo, "")));
	assert_eq!(outcome, Some(Outcome::Generated { nodes: 2 }));

	let graph = session.graph().unwrap().clone();
	let state = engine(&graph);
	assert_eq!(state.positioned_nodes().len(), 2);
	assert_eq!(state.scene().unwrap().nodes[1].accent, "#6b7280");
}

#[test]
fn unparseable_collaborator_output_is_a_failure() {
	let mut session = Session::new();
	let request = session.request("not json").unwrap();
	let outcome = session.settle(block_on(request.run(&Echo, "")));
	assert!(matches!(outcome, Some(Outcome::Failed(_))));
	assert!(session.graph().is_none());
	assert!(!session.is_busy());
}
