//! Graph exchange model: the node/edge data produced and edited by the collaborator.

use std::collections::HashSet;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GraphError;

/// Closed set of node kinds, with unknown wire strings kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
	/// A regular process step (`mainProcess`).
	MainProcess,
	/// A branching point (`decision`).
	Decision,
	/// A start or end point (`beginEnd`).
	BeginEnd,
	/// A step flagged as crucial (`criticalNode`).
	Critical,
	/// Anything else the collaborator sent.
	Other(String),
}

impl NodeKind {
	/// Every known kind, in legend order.
	pub const KNOWN: [NodeKind; 4] = [
		NodeKind::MainProcess,
		NodeKind::Decision,
		NodeKind::BeginEnd,
		NodeKind::Critical,
	];

	/// Wire name of this kind.
	pub fn as_str(&self) -> &str {
		match self {
			Self::MainProcess => "mainProcess",
			Self::Decision => "decision",
			Self::BeginEnd => "beginEnd",
			Self::Critical => "criticalNode",
			Self::Other(s) => s,
		}
	}

	/// Human readable name for legends and detail panels.
	pub fn display_name(&self) -> &str {
		match self {
			Self::MainProcess => "Main process",
			Self::Decision => "Decision",
			Self::BeginEnd => "Start/End",
			Self::Critical => "Critical node",
			Self::Other(s) => s,
		}
	}
}

impl From<String> for NodeKind {
	fn from(s: String) -> Self {
		match s.as_str() {
			"mainProcess" => Self::MainProcess,
			"decision" => Self::Decision,
			"beginEnd" => Self::BeginEnd,
			"criticalNode" => Self::Critical,
			_ => Self::Other(s),
		}
	}
}

impl From<NodeKind> for String {
	fn from(kind: NodeKind) -> Self {
		match kind {
			NodeKind::Other(s) => s,
			known => known.as_str().to_owned(),
		}
	}
}

/// A process step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
	/// Unique within a graph.
	pub id: String,
	/// Short display text.
	pub label: String,
	/// Node kind; `type` on the wire.
	#[serde(rename = "type")]
	pub kind: NodeKind,
	/// Free text.
	pub description: String,
}

impl Node {
	/// Convenience constructor.
	pub fn new(
		id: impl Into<String>,
		label: impl Into<String>,
		kind: NodeKind,
		description: impl Into<String>,
	) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			kind,
			description: description.into(),
		}
	}
}

/// A directed relation between two nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
	/// Id of the source node.
	pub source: String,
	/// Id of the target node.
	pub target: String,
	/// Optional branch condition.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
}

impl Edge {
	/// Unlabelled edge.
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			label: None,
		}
	}

	/// Labelled edge.
	pub fn labelled(
		source: impl Into<String>,
		target: impl Into<String>,
		label: impl Into<String>,
	) -> Self {
		Self {
			label: Some(label.into()),
			..Self::new(source, target)
		}
	}
}

/// Ordered nodes plus edges, exactly as exchanged with the collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
	/// Nodes in input order.
	pub nodes: Vec<Node>,
	/// Edges in input order.
	pub edges: Vec<Edge>,
}

impl Graph {
	/// True when there is nothing to display.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Look a node up by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Read untrusted exchange text.
	///
	/// Missing `nodes` or `edges` arrays yield an empty graph. Entries missing a
	/// required field are dropped. Only non-JSON or non-object input is an error.
	pub fn from_json(text: &str) -> Result<Self, GraphError> {
		let value: Value = serde_json::from_str(text)?;
		Self::from_value(value)
	}

	/// Same as [`Graph::from_json`] for an already parsed value.
	pub fn from_value(value: Value) -> Result<Self, GraphError> {
		let Value::Object(mut obj) = value else {
			return Err(GraphError::NotAnObject);
		};
		let (Some(Value::Array(raw_nodes)), Some(Value::Array(raw_edges))) =
			(obj.remove("nodes"), obj.remove("edges"))
		else {
			warn!("graph is missing its nodes or edges array, treating as empty");
			return Ok(Self::default());
		};

		let nodes = collect_lenient::<Node>(raw_nodes, "node");
		let edges = collect_lenient::<Edge>(raw_edges, "edge");
		Ok(Self { nodes, edges })
	}

	/// Enforce the model invariants: unique ids (first occurrence wins) and
	/// edges whose endpoints both exist.
	pub fn sanitized(&self) -> Self {
		let mut seen = HashSet::new();
		let nodes: Vec<Node> = self
			.nodes
			.iter()
			.filter(|n| {
				let fresh = seen.insert(n.id.as_str());
				if !fresh {
					warn!("dropping duplicate node id {:?}", n.id);
				}
				fresh
			})
			.cloned()
			.collect();

		let edges: Vec<Edge> = self
			.edges
			.iter()
			.filter(|e| {
				let valid = seen.contains(e.source.as_str()) && seen.contains(e.target.as_str());
				if !valid {
					warn!("dropping dangling edge {} -> {}", e.source, e.target);
				}
				valid
			})
			.cloned()
			.collect();

		Self { nodes, edges }
	}
}

fn collect_lenient<T: serde::de::DeserializeOwned>(items: Vec<Value>, what: &str) -> Vec<T> {
	items
		.into_iter()
		.enumerate()
		.filter_map(|(i, item)| match serde_json::from_value(item) {
			Ok(v) => Some(v),
			Err(err) => {
				warn!("dropping malformed {what} #{i}: {err}");
				None
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_kind_survives_round_trip() {
		let text = r#"{"nodes":[{"id":"a","label":"A","type":"swimlane","description":""}],"edges":[]}"#;
		let graph = Graph::from_json(text).unwrap();
		assert_eq!(graph.nodes[0].kind, NodeKind::Other("swimlane".into()));
		let back = serde_json::to_value(&graph).unwrap();
		assert_eq!(back["nodes"][0]["type"], "swimlane");
	}

	#[test]
	fn missing_arrays_read_as_empty() {
		assert!(Graph::from_json(r#"{"nodes":[]}"#).unwrap().is_empty());
		assert!(Graph::from_json(r#"{"edges":[]}"#).unwrap().is_empty());
		assert!(Graph::from_json(r#"{"nodes":{},"edges":[]}"#).unwrap().is_empty());
	}

	#[test]
	fn non_object_is_an_error() {
		assert!(matches!(Graph::from_json("[1,2]"), Err(GraphError::NotAnObject)));
		assert!(matches!(Graph::from_json("nope"), Err(GraphError::Json(_))));
	}

	#[test]
	fn malformed_entries_are_dropped() {
		let text = r#"{
			"nodes": [
				{"id":"1","label":"Start","type":"beginEnd","description":"go"},
				{"id":"2","label":"No description","type":"decision"}
			],
			"edges": [{"source":"1"}, {"source":"1","target":"2","label":"yes"}]
		}"#;
		let graph = Graph::from_json(text).unwrap();
		assert_eq!(graph.nodes.len(), 1);
		assert_eq!(graph.edges, vec![Edge::labelled("1", "2", "yes")]);
	}

	#[test]
	fn sanitize_drops_duplicates_and_dangling_edges() {
		let graph = Graph {
			nodes: vec![
				Node::new("1", "first", NodeKind::BeginEnd, ""),
				Node::new("2", "second", NodeKind::MainProcess, ""),
				Node::new("1", "shadow", NodeKind::Critical, ""),
			],
			edges: vec![Edge::new("1", "2"), Edge::new("2", "99"), Edge::new("42", "1")],
		};
		let clean = graph.sanitized();
		assert_eq!(clean.nodes.len(), 2);
		assert_eq!(clean.nodes[0].label, "first");
		assert_eq!(clean.edges, vec![Edge::new("1", "2")]);
	}

	#[test]
	fn edge_label_is_omitted_when_absent() {
		let json = serde_json::to_string(&Edge::new("a", "b")).unwrap();
		assert_eq!(json, r#"{"source":"a","target":"b"}"#);
	}
}
