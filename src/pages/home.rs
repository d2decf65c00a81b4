use leptos::ev::MouseEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;

use crate::components::process_graph::{
	Edge, ExportFormat, Graph, GraphCommands, Node, NodeKind, ProcessGraphCanvas, ProcessGraphHandle,
	style,
};
use crate::error::CollaboratorError;
use crate::mutation::{Analysis, Collaborator, Mode, Outcome, Role, Session};

/// Offline stand-in for the generating service: every comma separated
/// clause of the instruction becomes a step, with an approval gate in the
/// middle of longer processes.
struct SampleCollaborator;

impl Collaborator for SampleCollaborator {
	async fn generate(&self, instruction: &str, _context: &str) -> Result<Graph, CollaboratorError> {
		Ok(sample_process(instruction))
	}

	async fn analyze(
		&self,
		instruction: &str,
		_context: &str,
		graph: &Graph,
	) -> Result<Analysis, CollaboratorError> {
		let lowered = instruction.to_lowercase();
		if let Some(step) = lowered.strip_prefix("add ") {
			let mut edited = graph.clone();
			let id = format!("s{}", edited.nodes.len() + 1);
			if let Some(last) = edited.nodes.last().map(|n| n.id.clone()) {
				edited.edges.push(Edge::new(last, id.clone()));
			}
			edited
				.nodes
				.push(Node::new(id, step.trim(), NodeKind::MainProcess, "Added on request"));
			return Ok(Analysis {
				explanation: format!("Added the step \"{}\" at the end.", step.trim()),
				graph: edited,
			});
		}

		let count = |kind: NodeKind| graph.nodes.iter().filter(|n| n.kind == kind).count();
		Ok(Analysis {
			explanation: format!(
				"The process has {} steps: {} decisions and {} critical points.",
				graph.nodes.len(),
				count(NodeKind::Decision),
				count(NodeKind::Critical)
			),
			graph: Graph::default(),
		})
	}
}

/// Deterministic process graph for an instruction.
fn sample_process(instruction: &str) -> Graph {
	let steps: Vec<&str> = instruction
		.split([',', ';'])
		.map(str::trim)
		.filter(|s| s.chars().any(char::is_alphanumeric))
		.collect();
	if steps.is_empty() {
		return Graph::default();
	}

	let mut nodes = vec![Node::new("start", "Start", NodeKind::BeginEnd, "Process begins")];
	let mut edges = Vec::new();
	let mut prev = "start".to_owned();
	let gate = (steps.len() > 2).then_some(steps.len() / 2);

	for (i, step) in steps.iter().enumerate() {
		let id = format!("s{}", i + 1);
		if gate == Some(i) {
			nodes.push(Node::new("gate", "Approved?", NodeKind::Decision, "Check before continuing"));
			nodes.push(Node::new("rework", "Rework", NodeKind::Critical, "Send back for changes"));
			edges.push(Edge::new(prev, "gate"));
			edges.push(Edge::labelled("gate", "rework", "No"));
			edges.push(Edge::labelled("gate", id.clone(), "Yes"));
		} else {
			edges.push(Edge::new(prev, id.clone()));
		}
		nodes.push(Node::new(
			id.clone(),
			*step,
			NodeKind::MainProcess,
			format!("Step {} of {}", i + 1, steps.len()),
		));
		prev = id;
	}

	nodes.push(Node::new("end", "End", NodeKind::BeginEnd, "Process complete"));
	edges.push(Edge::new(prev, "end"));
	Graph { nodes, edges }
}

/// The graph to draw. Memoized so that session changes which leave the graph
/// alone (selection, transcript, mode) never reach the diagram.
fn current_graph(session: RwSignal<Session>) -> Memo<Graph> {
	Memo::new(move |_| session.with(|s| s.graph().cloned().unwrap_or_default()))
}

/// Process page: prompt, diagram, controls, legend and node details.
#[component]
pub fn Home() -> impl IntoView {
	let session = RwSignal::new(Session::new());
	let instruction = RwSignal::new(String::new());
	let context = RwSignal::new(String::new());
	let import_text = RwSignal::new(String::new());
	let notice = RwSignal::new(None::<String>);
	let handle = ProcessGraphHandle::default();

	let graph_data = current_graph(session);
	let busy = Signal::derive(move || session.with(Session::is_busy));
	let has_graph = Signal::derive(move || session.with(|s| s.graph().is_some()));

	let send = move |_: MouseEvent| {
		let text = instruction.get_untracked();
		let request = match session.try_update(|s| s.request(&text)) {
			Some(Ok(request)) => request,
			Some(Err(err)) => {
				warn!("not sending: {err}");
				return;
			}
			None => return,
		};
		instruction.set(String::new());
		notice.set(None);
		let ctx = context.get_untracked();
		spawn_local(async move {
			let response = request.run(&SampleCollaborator, &ctx).await;
			// None once the page is gone.
			match session.try_update(|s| s.settle(response)).flatten() {
				Some(Outcome::Empty(msg) | Outcome::Failed(msg)) => notice.set(Some(msg)),
				_ => {}
			}
		});
	};

	let import = move |_: MouseEvent| match Graph::from_json(&import_text.get_untracked()) {
		Ok(graph) => {
			session.update(|s| s.load(graph));
			notice.set(None);
		}
		Err(err) => notice.set(Some(err.to_string())),
	};

	let on_node_click = Callback::new(move |node: Node| session.update(|s| s.select(Some(node))));

	let (mut zoom_in, mut zoom_out, mut center) = (handle.clone(), handle.clone(), handle.clone());
	let (export_json, export_svg, reset_view) = (handle.clone(), handle.clone(), handle.clone());

	let legend = NodeKind::KNOWN
		.iter()
		.map(|kind| {
			view! {
				<li>
					<span class="swatch" style=format!("background: {}", style::accent(kind))></span>
					{kind.display_name().to_owned()}
				</li>
			}
		})
		.collect_view();

	view! {
		<div class="process-page">
			<aside class="prompt-panel">
				<h1>"Process Graph"</h1>
				<ol class="transcript">
					{move || {
						session
							.with(|s| {
								s.history()
									.iter()
									.map(|m| {
										let class = match m.role {
											Role::User => "message user",
											Role::Assistant => "message assistant",
										};
										view! { <li class=class>{m.content.clone()}</li> }
									})
									.collect_view()
							})
					}}
				</ol>
				<Show when=move || session.with(|s| s.mode() == Mode::Analyze)>
					<p class="mode-badge">"Analysis mode"</p>
				</Show>
				<textarea
					class="instruction"
					placeholder="Describe a process, e.g. receive order, check stock, ship"
					prop:value=move || instruction.get()
					on:input=move |ev| instruction.set(event_target_value(&ev))
				/>
				<button on:click=send disabled=move || busy.get()>
					{move || if busy.get() { "Working..." } else { "Send" }}
				</button>
				<Show when=move || has_graph.get() && session.with(|s| s.mode() == Mode::Generate)>
					<button on:click=move |_| {
						session.update(|s| {
							let _ = s.start_analysis();
						})
					}>"Analyze graph"</button>
				</Show>
				<details>
					<summary>"Document context"</summary>
					<textarea
						class="context"
						prop:value=move || context.get()
						on:input=move |ev| context.set(event_target_value(&ev))
					/>
				</details>
				<details>
					<summary>"Import JSON"</summary>
					<textarea
						class="import"
						prop:value=move || import_text.get()
						on:input=move |ev| import_text.set(event_target_value(&ev))
					/>
					<button on:click=import disabled=move || busy.get()>"Load"</button>
				</details>
				<button
					class="reset"
					on:click=move |_| {
						session.update(Session::reset);
						reset_view.reset();
						notice.set(None);
					}
				>
					"Reset"
				</button>
				{move || notice.get().map(|msg| view! { <p class="notice">{msg}</p> })}
			</aside>

			<main class="graph-area">
				<ProcessGraphCanvas data=graph_data handle=handle on_node_click=on_node_click />

				<Show when=move || !has_graph.get()>
					<div class="graph-placeholder">
						{move || {
							if busy.get() {
								"Generating the process graph..."
							} else {
								"Describe a process to see its diagram here."
							}
						}}
					</div>
				</Show>

				<div class="graph-controls">
					<button title="Zoom in" on:click=move |_| zoom_in.zoom_in()>"+"</button>
					<button title="Zoom out" on:click=move |_| zoom_out.zoom_out()>"-"</button>
					<button title="Center graph" on:click=move |_| center.center_graph()>"Fit"</button>
					<button
						title="Export JSON"
						disabled=move || !has_graph.get()
						on:click=move |_| {
							export_json.download(ExportFormat::Json);
						}
					>
						"JSON"
					</button>
					<button
						title="Export SVG"
						disabled=move || !has_graph.get()
						on:click=move |_| {
							export_svg.download(ExportFormat::Svg);
						}
					>
						"SVG"
					</button>
				</div>

				<div class="graph-legend">
					<h4>"Legend"</h4>
					<ul>{legend}</ul>
				</div>

				{move || {
					session
						.with(|s| s.selected().cloned())
						.map(|node| {
							view! {
								<aside class="node-detail" role="dialog" aria-labelledby="node-detail-title">
									<header>
										<h3 id="node-detail-title">"Node details"</h3>
										<button
											aria-label="Close details"
											on:click=move |_| session.update(|s| s.select(None))
										>
											"x"
										</button>
									</header>
									<dl>
										<dt>"Label"</dt>
										<dd>{node.label.clone()}</dd>
										<dt>"Type"</dt>
										<dd>
											<span
												class="swatch"
												style=format!("background: {}", style::accent(&node.kind))
											></span>
											{node.kind.display_name().to_owned()}
										</dd>
										<dt>"Description"</dt>
										<dd>{node.description.clone()}</dd>
									</dl>
								</aside>
							}
						})
				}}
			</main>
		</div>
	}
}
