//! Reduction of an arbitrary edge list to a single rooted tree.
//!
//! A node's parent is the source of the first edge (in input order) that
//! targets it. The first node without a parent becomes the root; other roots
//! and anything unreachable from the chosen root are left out of the tree.

use std::collections::{HashMap, VecDeque};

use log::{debug, warn};

use super::types::{Graph, Node};

/// One node of the derived tree.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
	/// The original node data.
	pub node: Node,
	/// Index of the parent in [`Tree::nodes`].
	pub parent: Option<usize>,
	/// Indices of the children, in input order.
	pub children: Vec<usize>,
	/// Distance from the root.
	pub depth: usize,
	/// Label of the edge that made `parent` this node's parent.
	pub incoming_label: Option<String>,
}

/// A rooted tree stored breadth-first; index 0 is the root.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tree {
	/// Nodes in breadth-first order.
	pub nodes: Vec<TreeNode>,
}

impl Tree {
	/// Build the tree for `graph`, repairing it first.
	pub fn build(graph: &Graph) -> Self {
		let graph = graph.sanitized();
		if graph.nodes.is_empty() {
			return Self::default();
		}

		let index: HashMap<&str, usize> = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.as_str(), i))
			.collect();

		let mut parent: Vec<Option<(usize, Option<&str>)>> = vec![None; graph.nodes.len()];
		for edge in &graph.edges {
			let (Some(&src), Some(&tgt)) =
				(index.get(edge.source.as_str()), index.get(edge.target.as_str()))
			else {
				continue;
			};
			if parent[tgt].is_none() {
				parent[tgt] = Some((src, edge.label.as_deref()));
			}
		}

		let mut children: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
		for (i, p) in parent.iter().enumerate() {
			if let Some((src, _)) = p {
				children[*src].push(i);
			}
		}

		let root = match parent.iter().position(Option::is_none) {
			Some(root) => root,
			None => {
				warn!("every node has a parent, rooting the tree at the first node");
				0
			}
		};

		let mut queued = vec![false; graph.nodes.len()];
		let mut tree = Self::default();
		let mut queue = VecDeque::from([(root, None::<usize>, 0usize)]);
		queued[root] = true;

		while let Some((input_idx, tree_parent, depth)) = queue.pop_front() {
			let tree_idx = tree.nodes.len();
			let incoming_label = tree_parent
				.and(parent[input_idx])
				.and_then(|(_, label)| label.map(str::to_owned));
			tree.nodes.push(TreeNode {
				node: graph.nodes[input_idx].clone(),
				parent: tree_parent,
				children: Vec::new(),
				depth,
				incoming_label,
			});
			if let Some(p) = tree_parent {
				tree.nodes[p].children.push(tree_idx);
			}

			for &child in &children[input_idx] {
				if queued[child] {
					continue;
				}
				queued[child] = true;
				queue.push_back((child, Some(tree_idx), depth + 1));
			}
		}

		let dropped = graph.nodes.len() - tree.nodes.len();
		if dropped > 0 {
			warn!("{dropped} node(s) unreachable from root {:?} left out of the layout", graph.nodes[root].id);
		}
		debug!("hierarchy built: {} nodes, depth {}", tree.len(), tree.height());
		tree
	}

	/// Number of nodes in the tree.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// True when the tree holds no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// The root node, if any.
	pub fn root(&self) -> Option<&TreeNode> {
		self.nodes.first()
	}

	/// Deepest level, 0 for a lone root.
	pub fn height(&self) -> usize {
		self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
	}

	/// `(parent, child)` index pairs in breadth-first order.
	pub fn links(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
		self.nodes
			.iter()
			.enumerate()
			.filter_map(|(i, n)| n.parent.map(|p| (p, i)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::process_graph::types::{Edge, NodeKind};

	fn node(id: &str) -> Node {
		Node::new(id, id, NodeKind::MainProcess, "")
	}

	fn ids(tree: &Tree) -> Vec<&str> {
		tree.nodes.iter().map(|n| n.node.id.as_str()).collect()
	}

	#[test]
	fn chain_becomes_three_levels() {
		let graph = Graph {
			nodes: vec![node("1"), node("2"), node("3")],
			edges: vec![Edge::new("1", "2"), Edge::new("2", "3")],
		};
		let tree = Tree::build(&graph);
		assert_eq!(ids(&tree), ["1", "2", "3"]);
		assert_eq!(tree.nodes.iter().map(|n| n.depth).collect::<Vec<_>>(), [0, 1, 2]);
		assert_eq!(tree.links().collect::<Vec<_>>(), [(0, 1), (1, 2)]);
	}

	#[test]
	fn first_incoming_edge_wins() {
		let graph = Graph {
			nodes: vec![node("a"), node("b"), node("c")],
			edges: vec![
				Edge::new("a", "b"),
				Edge::labelled("b", "c", "first"),
				Edge::labelled("a", "c", "second"),
			],
		};
		let tree = Tree::build(&graph);
		let c = tree.nodes.iter().find(|n| n.node.id == "c").unwrap();
		assert_eq!(tree.nodes[c.parent.unwrap()].node.id, "b");
		assert_eq!(c.incoming_label.as_deref(), Some("first"));
	}

	#[test]
	fn children_keep_input_order() {
		let graph = Graph {
			nodes: vec![node("r"), node("z"), node("y"), node("x")],
			edges: vec![Edge::new("r", "x"), Edge::new("r", "z"), Edge::new("r", "y")],
		};
		let tree = Tree::build(&graph);
		assert_eq!(ids(&tree), ["r", "z", "y", "x"]);
	}

	#[test]
	fn extra_roots_are_dropped() {
		let graph = Graph {
			nodes: vec![node("1"), node("2"), node("lonely"), node("3")],
			edges: vec![Edge::new("1", "2"), Edge::new("lonely", "3")],
		};
		let tree = Tree::build(&graph);
		assert_eq!(ids(&tree), ["1", "2"]);
	}

	#[test]
	fn full_cycle_roots_at_first_node() {
		let graph = Graph {
			nodes: vec![node("1"), node("2"), node("3")],
			edges: vec![Edge::new("1", "2"), Edge::new("2", "3"), Edge::new("3", "1")],
		};
		let tree = Tree::build(&graph);
		assert_eq!(ids(&tree), ["1", "2", "3"]);
		assert_eq!(tree.root().unwrap().parent, None);
	}

	#[test]
	fn self_loop_node_is_unreachable() {
		let graph = Graph {
			nodes: vec![node("1"), node("loop")],
			edges: vec![Edge::new("loop", "loop")],
		};
		assert_eq!(ids(&Tree::build(&graph)), ["1"]);
	}

	#[test]
	fn dangling_edges_are_ignored() {
		let graph = Graph {
			nodes: vec![node("1"), node("2")],
			edges: vec![Edge::new("99", "2"), Edge::new("1", "2")],
		};
		let tree = Tree::build(&graph);
		assert_eq!(ids(&tree), ["1", "2"]);
	}

	#[test]
	fn empty_graph_gives_empty_tree() {
		let tree = Tree::build(&Graph::default());
		assert!(tree.is_empty());
		assert!(tree.root().is_none());
	}
}
