//! Request/response contract with the external graph collaborator.
//!
//! A [`Session`] owns the current graph slot. It hands out at most one
//! [`Request`] at a time, the host drives the request against a
//! [`Collaborator`] wherever its async runtime lives, and the resulting
//! [`Response`] is settled back into the session. Anything the collaborator
//! returns is treated as untrusted and sanitized before it is stored.

use std::future::Future;

use log::{debug, error, info, warn};

use crate::components::process_graph::{Graph, Node};
use crate::error::{CollaboratorError, SessionError};

/// Shown after a successful generation.
pub const GENERATED_MESSAGE: &str =
	"I created a process graph for you. Click a node to see its details or start the analysis.";
/// Shown when the collaborator produced no nodes.
pub const EMPTY_MESSAGE: &str =
	"I could not generate a graph. Could you be more specific about a process in your documents?";
/// Shown for any collaborator failure.
pub const FAILED_MESSAGE: &str = "An unexpected error occurred. Please try again.";
/// Shown when analysis mode is entered.
pub const ANALYSIS_MESSAGE: &str =
	"Analysis mode enabled. You can now ask me specific questions about this graph.";

/// Edited graph plus the collaborator's explanation of it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Analysis {
	/// Free text answer to the instruction.
	pub explanation: String,
	/// Edited graph; an empty graph means "no change".
	pub graph: Graph,
}

/// The external service that writes and edits graphs.
///
/// Implementations are free to fail; failures never reach layout.
pub trait Collaborator {
	/// Produce a brand-new graph from `instruction` and the source documents.
	fn generate(
		&self,
		instruction: &str,
		context: &str,
	) -> impl Future<Output = Result<Graph, CollaboratorError>>;

	/// Answer `instruction` about `graph`, possibly editing it.
	fn analyze(
		&self,
		instruction: &str,
		context: &str,
		graph: &Graph,
	) -> impl Future<Output = Result<Analysis, CollaboratorError>>;
}

/// What the next instruction is sent as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
	/// Replace the graph with a new one.
	#[default]
	Generate,
	/// Ask about (and possibly edit) the current graph.
	Analyze,
}

/// Author of a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
	/// The person typing instructions.
	User,
	/// The collaborator, or the session speaking for it.
	Assistant,
}

/// One transcript entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
	/// Who said it.
	pub role: Role,
	/// What was said.
	pub content: String,
}

impl Message {
	fn new(role: Role, content: impl Into<String>) -> Self {
		Self {
			role,
			content: content.into(),
		}
	}
}

#[derive(Clone, Debug)]
enum RequestKind {
	Generate,
	Analyze(Graph),
}

/// A started request, tagged with the session epoch it belongs to.
#[derive(Clone, Debug)]
pub struct Request {
	epoch: u64,
	instruction: String,
	kind: RequestKind,
}

impl Request {
	/// The trimmed instruction being sent.
	pub fn instruction(&self) -> &str {
		&self.instruction
	}

	/// Which mode the request was started in.
	pub fn mode(&self) -> Mode {
		match self.kind {
			RequestKind::Generate => Mode::Generate,
			RequestKind::Analyze(_) => Mode::Analyze,
		}
	}

	/// Call the collaborator. This is the only suspension point.
	pub async fn run<C: Collaborator>(self, collaborator: &C, context: &str) -> Response {
		debug!("request #{} sent as {:?}", self.epoch, self.mode());
		let reply = match &self.kind {
			RequestKind::Generate => collaborator
				.generate(&self.instruction, context)
				.await
				.map(Reply::Generated),
			RequestKind::Analyze(graph) => collaborator
				.analyze(&self.instruction, context, graph)
				.await
				.map(Reply::Analyzed),
		};
		Response {
			epoch: self.epoch,
			reply,
		}
	}
}

#[derive(Debug)]
enum Reply {
	Generated(Graph),
	Analyzed(Analysis),
}

/// The collaborator's answer, waiting to be settled.
#[derive(Debug)]
pub struct Response {
	epoch: u64,
	reply: Result<Reply, CollaboratorError>,
}

/// What settling a response did to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
	/// A new graph replaced the old one.
	Generated {
		/// Nodes kept after sanitizing.
		nodes: usize,
	},
	/// The collaborator answered; the graph may have been edited.
	Analyzed {
		/// The collaborator's answer.
		explanation: String,
	},
	/// Generation produced nothing; the graph slot is now empty.
	Empty(String),
	/// The collaborator failed; the previous graph is untouched.
	Failed(String),
}

/// Host-side state of the process page: the graph slot, mode, selection,
/// transcript and the in-flight guard.
#[derive(Clone, Debug, Default)]
pub struct Session {
	graph: Option<Graph>,
	mode: Mode,
	selected: Option<Node>,
	history: Vec<Message>,
	in_flight: bool,
	epoch: u64,
}

impl Session {
	/// Empty session in generate mode.
	pub fn new() -> Self {
		Self::default()
	}

	/// Current graph, if any.
	pub fn graph(&self) -> Option<&Graph> {
		self.graph.as_ref()
	}

	/// What the next instruction is sent as.
	pub fn mode(&self) -> Mode {
		self.mode
	}

	/// Node shown in the detail panel.
	pub fn selected(&self) -> Option<&Node> {
		self.selected.as_ref()
	}

	/// Transcript, oldest first.
	pub fn history(&self) -> &[Message] {
		&self.history
	}

	/// True while a request is outstanding; the host disables input.
	pub fn is_busy(&self) -> bool {
		self.in_flight
	}

	/// Install a graph directly, e.g. from an imported file.
	pub fn load(&mut self, graph: Graph) {
		let graph = graph.sanitized();
		self.graph = (!graph.is_empty()).then_some(graph);
		if self.graph.is_none() {
			self.mode = Mode::Generate;
		}
		self.selected = None;
	}

	/// Remember the node the user activated.
	pub fn select(&mut self, node: Option<Node>) {
		self.selected = node;
	}

	/// Switch to analysis mode. Needs a current graph.
	pub fn start_analysis(&mut self) -> Result<(), SessionError> {
		if self.graph.is_none() {
			return Err(SessionError::NoGraph);
		}
		if self.mode != Mode::Analyze {
			self.mode = Mode::Analyze;
			self.history.push(Message::new(Role::Assistant, ANALYSIS_MESSAGE));
		}
		Ok(())
	}

	/// Start a request for `instruction`. At most one request is in flight;
	/// a second one is refused, never queued.
	pub fn request(&mut self, instruction: &str) -> Result<Request, SessionError> {
		let instruction = instruction.trim();
		if instruction.is_empty() {
			return Err(SessionError::EmptyInstruction);
		}
		if self.in_flight {
			return Err(SessionError::Busy);
		}

		let kind = match (self.mode, self.graph.as_ref()) {
			(Mode::Analyze, Some(graph)) => RequestKind::Analyze(graph.clone()),
			_ => RequestKind::Generate,
		};
		if matches!(kind, RequestKind::Generate) {
			self.mode = Mode::Generate;
			self.selected = None;
		}
		self.in_flight = true;
		self.history.push(Message::new(Role::User, instruction));
		Ok(Request {
			epoch: self.epoch,
			instruction: instruction.to_owned(),
			kind,
		})
	}

	/// Apply a finished request. Results from before the last reset are
	/// discarded and yield `None`.
	pub fn settle(&mut self, response: Response) -> Option<Outcome> {
		if response.epoch != self.epoch {
			warn!(
				"discarding stale collaborator result #{} (session is at #{})",
				response.epoch, self.epoch
			);
			return None;
		}
		self.in_flight = false;

		let outcome = match response.reply {
			Ok(Reply::Generated(graph)) => {
				let graph = graph.sanitized();
				if graph.is_empty() {
					warn!("collaborator generated an empty graph");
					self.graph = None;
					self.mode = Mode::Generate;
					self.say(EMPTY_MESSAGE);
					Outcome::Empty(EMPTY_MESSAGE.to_owned())
				} else {
					let nodes = graph.nodes.len();
					info!("generated graph with {nodes} nodes");
					self.graph = Some(graph);
					self.say(GENERATED_MESSAGE);
					Outcome::Generated { nodes }
				}
			}
			Ok(Reply::Analyzed(Analysis { explanation, graph })) => {
				let graph = graph.sanitized();
				if graph.is_empty() {
					debug!("analysis left the graph unchanged");
				} else {
					info!("analysis edited the graph: {} nodes", graph.nodes.len());
					self.graph = Some(graph);
				}
				self.say(&explanation);
				Outcome::Analyzed { explanation }
			}
			Err(err) => {
				error!("collaborator failed: {err}");
				self.say(FAILED_MESSAGE);
				Outcome::Failed(FAILED_MESSAGE.to_owned())
			}
		};
		Some(outcome)
	}

	/// Clear graph, mode, selection and transcript. Any request still in
	/// flight will be discarded when it settles.
	pub fn reset(&mut self) {
		self.epoch += 1;
		self.graph = None;
		self.mode = Mode::Generate;
		self.selected = None;
		self.history.clear();
		self.in_flight = false;
		info!("session reset");
	}

	fn say(&mut self, content: &str) {
		self.history.push(Message::new(Role::Assistant, content));
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use pollster::block_on;

	use super::*;
	use crate::components::process_graph::{Edge, NodeKind};

	#[derive(Default)]
	struct Scripted {
		generated: RefCell<Vec<Result<Graph, CollaboratorError>>>,
		analyses: RefCell<Vec<Result<Analysis, CollaboratorError>>>,
		seen: RefCell<Vec<(String, Option<usize>)>>,
	}

	impl Collaborator for Scripted {
		async fn generate(&self, instruction: &str, _context: &str) -> Result<Graph, CollaboratorError> {
			self.seen.borrow_mut().push((instruction.to_owned(), None));
			self.generated.borrow_mut().remove(0)
		}

		async fn analyze(
			&self,
			instruction: &str,
			_context: &str,
			graph: &Graph,
		) -> Result<Analysis, CollaboratorError> {
			self.seen
				.borrow_mut()
				.push((instruction.to_owned(), Some(graph.nodes.len())));
			self.analyses.borrow_mut().remove(0)
		}
	}

	fn two_steps() -> Graph {
		Graph {
			nodes: vec![
				Node::new("1", "Start", NodeKind::BeginEnd, "begin"),
				Node::new("2", "Review", NodeKind::MainProcess, "check it"),
			],
			edges: vec![Edge::new("1", "2"), Edge::new("2", "99")],
		}
	}

	#[test]
	fn generation_installs_a_sanitized_graph() {
		let bot = Scripted::default();
		bot.generated.borrow_mut().push(Ok(two_steps()));
		let mut session = Session::new();

		let request = session.request("  map the review  ").unwrap();
		assert!(session.is_busy());
		assert_eq!(request.instruction(), "map the review");
		let outcome = session.settle(block_on(request.run(&bot, "docs")));

		assert_eq!(outcome, Some(Outcome::Generated { nodes: 2 }));
		assert!(!session.is_busy());
		assert_eq!(session.graph().unwrap().edges, vec![Edge::new("1", "2")]);
		assert_eq!(session.history().last().unwrap().content, GENERATED_MESSAGE);
	}

	#[test]
	fn second_request_is_refused_while_busy() {
		let mut session = Session::new();
		let _first = session.request("one").unwrap();
		assert_eq!(session.request("two").unwrap_err(), SessionError::Busy);
		assert_eq!(session.request("   ").unwrap_err(), SessionError::EmptyInstruction);
	}

	#[test]
	fn failure_keeps_previous_graph() {
		let bot = Scripted::default();
		bot.generated.borrow_mut().push(Ok(two_steps()));
		bot.generated
			.borrow_mut()
			.push(Err(CollaboratorError::Transport("offline".into())));
		let mut session = Session::new();

		let r = session.request("first").unwrap();
		session.settle(block_on(r.run(&bot, "")));
		let r = session.request("second").unwrap();
		let outcome = session.settle(block_on(r.run(&bot, "")));

		assert_eq!(outcome, Some(Outcome::Failed(FAILED_MESSAGE.to_owned())));
		assert_eq!(session.graph().unwrap().nodes.len(), 2);
		assert!(!session.is_busy());
	}

	#[test]
	fn empty_generation_clears_the_slot() {
		let bot = Scripted::default();
		bot.generated.borrow_mut().push(Ok(two_steps()));
		bot.generated.borrow_mut().push(Ok(Graph::default()));
		let mut session = Session::new();

		let r = session.request("first").unwrap();
		session.settle(block_on(r.run(&bot, "")));
		let r = session.request("again").unwrap();
		let outcome = session.settle(block_on(r.run(&bot, "")));

		assert!(matches!(outcome, Some(Outcome::Empty(_))));
		assert!(session.graph().is_none());
	}

	#[test]
	fn analysis_sends_current_graph_and_applies_edit() {
		let bot = Scripted::default();
		bot.generated.borrow_mut().push(Ok(two_steps()));
		let mut edited = two_steps().sanitized();
		edited
			.nodes
			.push(Node::new("3", "Archive", NodeKind::BeginEnd, "done"));
		edited.edges.push(Edge::labelled("2", "3", "ok"));
		bot.analyses.borrow_mut().push(Ok(Analysis {
			explanation: "Added an archive step.".into(),
			graph: edited.clone(),
		}));
		let mut session = Session::new();
		assert_eq!(session.start_analysis(), Err(SessionError::NoGraph));

		let r = session.request("draw it").unwrap();
		session.settle(block_on(r.run(&bot, "")));
		session.start_analysis().unwrap();
		assert_eq!(session.history().last().unwrap().content, ANALYSIS_MESSAGE);

		let r = session.request("add archiving").unwrap();
		assert_eq!(r.mode(), Mode::Analyze);
		let outcome = session.settle(block_on(r.run(&bot, "")));

		assert_eq!(
			outcome,
			Some(Outcome::Analyzed {
				explanation: "Added an archive step.".into()
			})
		);
		assert_eq!(session.graph(), Some(&edited));
		assert_eq!(session.mode(), Mode::Analyze);
		assert_eq!(bot.seen.borrow()[1], ("add archiving".to_owned(), Some(2)));
	}

	#[test]
	fn analysis_without_graph_keeps_current_one() {
		let bot = Scripted::default();
		bot.generated.borrow_mut().push(Ok(two_steps()));
		bot.analyses.borrow_mut().push(Ok(Analysis {
			explanation: "It has two steps.".into(),
			graph: Graph::default(),
		}));
		let mut session = Session::new();
		let r = session.request("draw").unwrap();
		session.settle(block_on(r.run(&bot, "")));
		session.start_analysis().unwrap();

		let r = session.request("how many steps?").unwrap();
		session.settle(block_on(r.run(&bot, "")));
		assert_eq!(session.graph().unwrap().nodes.len(), 2);
	}

	#[test]
	fn generation_clears_selection() {
		let bot = Scripted::default();
		bot.generated.borrow_mut().push(Ok(two_steps()));
		bot.generated.borrow_mut().push(Ok(two_steps()));
		let mut session = Session::new();
		let r = session.request("draw").unwrap();
		session.settle(block_on(r.run(&bot, "")));

		let first = session.graph().unwrap().nodes[0].clone();
		session.select(Some(first));
		let r = session.request("draw again").unwrap();
		assert_eq!(r.mode(), Mode::Generate);
		assert!(session.selected().is_none());
		session.settle(block_on(r.run(&bot, "")));
	}

	#[test]
	fn loading_nothing_leaves_analysis() {
		let mut session = Session::new();
		session.load(two_steps());
		session.start_analysis().unwrap();
		assert_eq!(session.mode(), Mode::Analyze);

		session.load(Graph::default());
		assert_eq!(session.mode(), Mode::Generate);
		assert!(session.graph().is_none());
	}

	#[test]
	fn reset_discards_in_flight_result() {
		let bot = Scripted::default();
		bot.generated.borrow_mut().push(Ok(two_steps()));
		let mut session = Session::new();

		let request = session.request("draw").unwrap();
		session.reset();
		assert!(!session.is_busy());
		let response = block_on(request.run(&bot, ""));

		assert_eq!(session.settle(response), None);
		assert!(session.graph().is_none());
		assert!(session.history().is_empty());
	}
}
