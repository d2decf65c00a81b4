//! Backend-independent description of what gets drawn: cards with fitted
//! text and connectors with optional label chips, all in layout space.

use super::config::LayoutConfig;
use super::layout::{Connector, EdgeLabel, Layout, Point, Rect};
use super::style;
use super::types::Node;

/// Height of the coloured strip on top of each card.
pub const HEADER_HEIGHT: f64 = 8.0;
/// Corner radius of cards.
pub const CARD_RADIUS: f64 = 12.0;
/// Horizontal inset of card text.
pub const TEXT_INSET: f64 = 10.0;
/// Title baseline, from the card top.
pub const TITLE_BASELINE: f64 = 36.0;
/// First description baseline, from the card top.
pub const DESCRIPTION_BASELINE: f64 = 56.0;
/// Distance between description baselines.
pub const DESCRIPTION_LEADING: f64 = 14.0;
/// Description lines that fit under the title.
pub const DESCRIPTION_LINES: usize = 2;
/// Size of the arrowhead at the child end of a connector.
pub const ARROW_SIZE: f64 = 9.0;

/// A card.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
	/// The node this card shows.
	pub node: Node,
	/// Card rectangle.
	pub card: Rect,
	/// Header strip colour.
	pub accent: &'static str,
	/// Header strip CSS class.
	pub accent_class: &'static str,
	/// Title, truncated to the card width.
	pub title: String,
	/// Description, wrapped and truncated to the card.
	pub description: Vec<String>,
}

/// A connector.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneEdge {
	/// Id of the parent node.
	pub source: String,
	/// Id of the child node.
	pub target: String,
	/// Curve.
	pub path: Connector,
	/// Optional label chip.
	pub label: Option<EdgeLabel>,
}

/// Everything needed to draw one diagram.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
	/// Cards, in drawing order.
	pub nodes: Vec<SceneNode>,
	/// Connectors, drawn beneath the cards.
	pub edges: Vec<SceneEdge>,
	/// Bounding box of cards and chips.
	pub bounds: Rect,
}

impl Scene {
	/// Build the scene for a layout; `None` when the layout is empty.
	pub fn from_layout(layout: &Layout, config: &LayoutConfig) -> Option<Self> {
		let bounds = layout.bounds()?;
		let text_width = config.node_width - 2.0 * TEXT_INSET;
		let title_chars = chars_fitting(text_width, config.glyph_width * 1.35);
		let description_chars = chars_fitting(text_width, config.glyph_width * 0.9);

		let nodes = layout
			.nodes
			.iter()
			.enumerate()
			.map(|(i, p)| SceneNode {
				node: p.node.clone(),
				card: layout.card(i),
				accent: style::accent(&p.node.kind),
				accent_class: style::accent_class(&p.node.kind),
				title: truncate(&p.node.label, title_chars),
				description: wrap(&p.node.description, description_chars, DESCRIPTION_LINES),
			})
			.collect();

		let edges = layout
			.links
			.iter()
			.map(|l| SceneEdge {
				source: layout.nodes[l.source].node.id.clone(),
				target: layout.nodes[l.target].node.id.clone(),
				path: l.path,
				label: l.label.clone(),
			})
			.collect();

		Some(Self { nodes, edges, bounds })
	}

	/// Index of the topmost card under `p` (layout space).
	pub fn node_at(&self, p: Point) -> Option<usize> {
		self.nodes.iter().rposition(|n| n.card.contains(p))
	}
}

/// The three corners of the arrowhead ending at `path.end`, tip first.
pub fn arrowhead(path: &Connector) -> [Point; 3] {
	let tip = path.end;
	let (dx, dy) = (tip.x - path.c2.x, tip.y - path.c2.y);
	let len = (dx * dx + dy * dy).sqrt();
	let (ux, uy) = if len < 1e-9 { (0.0, 1.0) } else { (dx / len, dy / len) };
	let back = Point::new(tip.x - ux * ARROW_SIZE, tip.y - uy * ARROW_SIZE);
	let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
	[tip, Point::new(back.x + px, back.y + py), Point::new(back.x - px, back.y - py)]
}

fn chars_fitting(width: f64, glyph: f64) -> usize {
	if glyph <= 0.0 {
		return usize::MAX;
	}
	((width / glyph).floor() as usize).max(1)
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
	if text.chars().count() <= max {
		return text.to_owned();
	}
	let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
	out.truncate(out.trim_end().len());
	out.push('…');
	out
}

/// Greedy word wrap into at most `lines` lines of `width` characters.
pub fn wrap(text: &str, width: usize, lines: usize) -> Vec<String> {
	let width = width.max(1);
	let mut out: Vec<String> = Vec::new();
	let mut current = String::new();
	let mut overflow = false;

	for word in text.split_whitespace() {
		let mut word = word.to_owned();
		loop {
			let needed = if current.is_empty() {
				word.chars().count()
			} else {
				current.chars().count() + 1 + word.chars().count()
			};
			if needed <= width {
				if !current.is_empty() {
					current.push(' ');
				}
				current.push_str(&word);
				break;
			}
			if !current.is_empty() {
				out.push(std::mem::take(&mut current));
				continue;
			}
			// A single word wider than the line: hard split.
			let head: String = word.chars().take(width).collect();
			word = word.chars().skip(width).collect();
			out.push(head);
			if word.is_empty() {
				break;
			}
		}
		if out.len() > lines {
			overflow = true;
			break;
		}
	}
	if !current.is_empty() {
		out.push(current);
	}
	if out.len() > lines {
		overflow = true;
		out.truncate(lines);
	}
	if overflow {
		if let Some(last) = out.last_mut() {
			let mut cut = truncate(last, width.saturating_sub(1));
			if !cut.ends_with('…') {
				cut.push('…');
			}
			*last = cut;
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::process_graph::hierarchy::Tree;
	use crate::components::process_graph::types::{Edge, Graph, NodeKind};

	#[test]
	fn wrap_fits_words_into_lines() {
		assert_eq!(wrap("check the order status", 10, 3), ["check the", "order", "status"]);
		assert_eq!(wrap("", 10, 2), Vec::<String>::new());
	}

	#[test]
	fn wrap_marks_overflow() {
		let lines = wrap("one two three four five six seven", 9, 2);
		assert_eq!(lines.len(), 2);
		assert_eq!(lines[0], "one two");
		assert!(lines[1].ends_with('…'));
		assert!(lines[1].chars().count() <= 9);
	}

	#[test]
	fn wrap_splits_long_words() {
		assert_eq!(wrap("abcdefghij", 4, 3), ["abcd", "efgh", "ij"]);
	}

	#[test]
	fn truncate_adds_ellipsis() {
		assert_eq!(truncate("short", 10), "short");
		assert_eq!(truncate("a very long title", 8), "a very…");
	}

	#[test]
	fn scene_mirrors_layout() {
		let graph = Graph {
			nodes: vec![
				Node::new("1", "Start", NodeKind::BeginEnd, "begin"),
				Node::new("2", "Check", NodeKind::Decision, "is it ok?"),
			],
			edges: vec![Edge::labelled("1", "2", "next")],
		};
		let config = LayoutConfig::default();
		let layout = Layout::compute(&Tree::build(&graph), &config);
		let scene = Scene::from_layout(&layout, &config).unwrap();

		assert_eq!(scene.nodes.len(), 2);
		assert_eq!(scene.nodes[1].accent, style::accent(&NodeKind::Decision));
		assert_eq!(scene.edges[0].source, "1");
		assert_eq!(scene.edges[0].label.as_ref().unwrap().text, "next");
		assert_eq!(scene.node_at(Point::new(0.0, 0.0)), Some(0));
		assert_eq!(scene.node_at(Point::new(0.0, 160.0)), Some(1));
		assert!(scene.node_at(Point::new(0.0, 80.0)).is_none());
	}

	#[test]
	fn empty_layout_has_no_scene() {
		let config = LayoutConfig::default();
		assert!(Scene::from_layout(&Layout::compute(&Tree::default(), &config), &config).is_none());
	}

	#[test]
	fn arrowhead_points_down_for_vertical_connectors() {
		let path = Connector {
			start: Point::new(0.0, 40.0),
			c1: Point::new(0.0, 80.0),
			c2: Point::new(100.0, 80.0),
			end: Point::new(100.0, 120.0),
		};
		let [tip, a, b] = arrowhead(&path);
		assert_eq!(tip, path.end);
		assert!(a.y < tip.y && b.y < tip.y);
	}
}
