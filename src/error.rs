//! Error types shared by the engine and the mutation protocol.

/// Graph exchange text could not be read at all.
///
/// Malformed-but-parseable graphs never produce this; they are repaired instead.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
	/// The text is not JSON.
	#[error("graph is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),

	/// The JSON value is not an object.
	#[error("graph must be a JSON object")]
	NotAnObject,
}

/// Failure reported by an external graph collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
	/// The collaborator could not be reached.
	#[error("collaborator unreachable: {0}")]
	Transport(String),

	/// The collaborator answered with something unusable.
	#[error("invalid collaborator response: {0}")]
	InvalidResponse(String),
}

impl From<GraphError> for CollaboratorError {
	fn from(err: GraphError) -> Self {
		Self::InvalidResponse(err.to_string())
	}
}

/// A request the session refuses to start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
	/// Another generation or edit is still in flight.
	#[error("a request is already in flight")]
	Busy,

	/// The instruction is blank.
	#[error("instruction is empty")]
	EmptyInstruction,

	/// Analysis needs a current graph.
	#[error("no graph to analyze")]
	NoGraph,
}
