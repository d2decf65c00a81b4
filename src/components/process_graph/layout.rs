//! Layered tidy-tree layout (Buchheim–Jünger–Leipert variant of Reingold–Tilford).
//!
//! Coordinates are node centres. The root sits at `(0, 0)` and every level is
//! one [`LayoutConfig::level_height`] further down.

use log::debug;

use super::config::LayoutConfig;
use super::hierarchy::Tree;
use super::types::Node;

/// A point in layout space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate, growing downwards.
	pub y: f64,
}

impl Point {
	/// Shorthand constructor.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Axis-aligned rectangle, `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	/// Left edge.
	pub x: f64,
	/// Top edge.
	pub y: f64,
	/// Width.
	pub width: f64,
	/// Height.
	pub height: f64,
}

impl Rect {
	/// Rectangle of the given size centred on `c`.
	pub fn centered(c: Point, width: f64, height: f64) -> Self {
		Self {
			x: c.x - width / 2.0,
			y: c.y - height / 2.0,
			width,
			height,
		}
	}

	/// Centre point.
	pub fn center(&self) -> Point {
		Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	/// Whether `p` lies inside (edges included).
	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
	}

	/// Smallest rectangle covering both.
	pub fn union(&self, other: &Rect) -> Rect {
		let (x0, y0) = (self.x.min(other.x), self.y.min(other.y));
		let x1 = (self.x + self.width).max(other.x + other.width);
		let y1 = (self.y + self.height).max(other.y + other.height);
		Rect {
			x: x0,
			y: y0,
			width: x1 - x0,
			height: y1 - y0,
		}
	}
}

/// A node with its computed centre.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedNode {
	/// Original node data.
	pub node: Node,
	/// Centre of the card.
	pub position: Point,
	/// Level in the tree.
	pub depth: usize,
	/// Index of the parent in [`Layout::nodes`].
	pub parent: Option<usize>,
}

/// Smooth vertical connector: a cubic Bézier from `start` to `end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connector {
	/// Bottom anchor of the parent card.
	pub start: Point,
	/// First control point.
	pub c1: Point,
	/// Second control point.
	pub c2: Point,
	/// Top anchor of the child card.
	pub end: Point,
}

impl Connector {
	fn vertical(start: Point, end: Point) -> Self {
		let mid_y = (start.y + end.y) / 2.0;
		Self {
			start,
			c1: Point::new(start.x, mid_y),
			c2: Point::new(end.x, mid_y),
			end,
		}
	}

	/// Point on the curve at `t = 0.5`.
	pub fn midpoint(&self) -> Point {
		let x = (self.start.x + 3.0 * self.c1.x + 3.0 * self.c2.x + self.end.x) / 8.0;
		let y = (self.start.y + 3.0 * self.c1.y + 3.0 * self.c2.y + self.end.y) / 8.0;
		Point::new(x, y)
	}
}

/// Label chip centred on a connector midpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeLabel {
	/// Label text.
	pub text: String,
	/// Background chip.
	pub chip: Rect,
}

/// A drawn parent/child relation.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	/// Parent index in [`Layout::nodes`].
	pub source: usize,
	/// Child index in [`Layout::nodes`].
	pub target: usize,
	/// Connector geometry.
	pub path: Connector,
	/// Optional midpoint label.
	pub label: Option<EdgeLabel>,
}

/// Result of one layout pass. A new pass replaces every position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
	/// Positioned nodes in breadth-first order, root first.
	pub nodes: Vec<PositionedNode>,
	/// Tree links in breadth-first order.
	pub links: Vec<Link>,
	/// Card width used for this pass.
	pub node_width: f64,
	/// Card height used for this pass.
	pub node_height: f64,
}

impl Layout {
	/// Lay `tree` out.
	pub fn compute(tree: &Tree, config: &LayoutConfig) -> Self {
		let mut layout = Self {
			node_width: config.node_width,
			node_height: config.node_height,
			..Self::default()
		};
		if tree.is_empty() {
			return layout;
		}

		let xs = TidyTree::new(tree, config).run();
		let dy = config.level_height();
		layout.nodes = tree
			.nodes
			.iter()
			.zip(xs)
			.map(|(t, x)| PositionedNode {
				node: t.node.clone(),
				position: Point::new(x * config.slot_width(), t.depth as f64 * dy),
				depth: t.depth,
				parent: t.parent,
			})
			.collect();

		let half = config.node_height / 2.0;
		layout.links = tree
			.links()
			.map(|(source, target)| {
				let (p, c) = (layout.nodes[source].position, layout.nodes[target].position);
				let path = Connector::vertical(Point::new(p.x, p.y + half), Point::new(c.x, c.y - half));
				let label = tree.nodes[target].incoming_label.as_ref().map(|text| {
					let width = (text.chars().count() as f64 * config.glyph_width + 16.0)
						.max(config.label_min_width);
					EdgeLabel {
						text: text.clone(),
						chip: Rect::centered(path.midpoint(), width, config.label_height),
					}
				});
				Link {
					source,
					target,
					path,
					label,
				}
			})
			.collect();

		debug!("layout computed for {} nodes", layout.nodes.len());
		layout
	}

	/// Card rectangle of node `idx`.
	pub fn card(&self, idx: usize) -> Rect {
		Rect::centered(self.nodes[idx].position, self.node_width, self.node_height)
	}

	/// Bounding box of every card and label chip; `None` when empty.
	pub fn bounds(&self) -> Option<Rect> {
		let cards = (0..self.nodes.len()).map(|i| self.card(i));
		let chips = self.links.iter().filter_map(|l| l.label.as_ref().map(|l| l.chip));
		cards.chain(chips).reduce(|acc, r| acc.union(&r))
	}
}

/// Working record per tree node; the slot after the real nodes is a virtual
/// parent of the root.
#[derive(Clone, Debug)]
struct Walker {
	parent: usize,
	children: Vec<usize>,
	number: usize,
	ancestor: usize,
	default_ancestor: Option<usize>,
	prelim: f64,
	modifier: f64,
	change: f64,
	shift: f64,
	thread: Option<usize>,
}

struct TidyTree<'a> {
	w: Vec<Walker>,
	tree: &'a Tree,
	sibling: f64,
	cousin: f64,
}

impl<'a> TidyTree<'a> {
	fn new(tree: &'a Tree, config: &LayoutConfig) -> Self {
		let n = tree.len();
		let mut w: Vec<Walker> = tree
			.nodes
			.iter()
			.enumerate()
			.map(|(i, t)| Walker {
				parent: t.parent.unwrap_or(n),
				children: t.children.clone(),
				number: 0,
				ancestor: i,
				default_ancestor: None,
				prelim: 0.0,
				modifier: 0.0,
				change: 0.0,
				shift: 0.0,
				thread: None,
			})
			.collect();
		w.push(Walker {
			parent: n,
			children: vec![0],
			number: 0,
			ancestor: n,
			default_ancestor: None,
			prelim: 0.0,
			modifier: 0.0,
			change: 0.0,
			shift: 0.0,
			thread: None,
		});
		for v in 0..=n {
			for (k, c) in w[v].children.clone().into_iter().enumerate() {
				w[c].number = k;
			}
		}
		Self {
			w,
			tree,
			sibling: config.sibling_separation,
			cousin: config.cousin_separation,
		}
	}

	/// Returns the x of every node in separation units.
	fn run(mut self) -> Vec<f64> {
		for v in self.post_order() {
			self.first_walk(v);
		}
		let n = self.tree.len();
		self.w[n].modifier = -self.w[0].prelim;

		// Breadth-first storage order visits parents before children.
		let mut xs = vec![0.0; n];
		for v in 0..n {
			let parent_mod = self.w[self.w[v].parent].modifier;
			xs[v] = self.w[v].prelim + parent_mod;
			self.w[v].modifier += parent_mod;
		}
		xs
	}

	fn post_order(&self) -> Vec<usize> {
		let mut order = Vec::with_capacity(self.tree.len());
		let mut stack = vec![(0usize, false)];
		while let Some((v, expanded)) = stack.pop() {
			if expanded {
				order.push(v);
				continue;
			}
			stack.push((v, true));
			stack.extend(self.w[v].children.iter().rev().map(|&c| (c, false)));
		}
		order
	}

	fn separation(&self, a: usize, b: usize) -> f64 {
		if self.tree.nodes[a].parent == self.tree.nodes[b].parent {
			self.sibling
		} else {
			self.cousin
		}
	}

	fn next_left(&self, v: usize) -> Option<usize> {
		self.w[v].children.first().copied().or(self.w[v].thread)
	}

	fn next_right(&self, v: usize) -> Option<usize> {
		self.w[v].children.last().copied().or(self.w[v].thread)
	}

	fn first_walk(&mut self, v: usize) {
		let parent = self.w[v].parent;
		let first_sibling = self.w[parent].children[0];
		let left = match self.w[v].number {
			0 => None,
			k => Some(self.w[parent].children[k - 1]),
		};

		let children = &self.w[v].children;
		let ends = children.first().copied().zip(children.last().copied());
		if let Some((first, last)) = ends {
			self.execute_shifts(v);
			let midpoint = (self.w[first].prelim + self.w[last].prelim) / 2.0;
			match left {
				Some(l) => {
					self.w[v].prelim = self.w[l].prelim + self.separation(v, l);
					self.w[v].modifier = self.w[v].prelim - midpoint;
				}
				None => self.w[v].prelim = midpoint,
			}
		} else if let Some(l) = left {
			self.w[v].prelim = self.w[l].prelim + self.separation(v, l);
		}

		let ancestor = self.w[parent].default_ancestor.unwrap_or(first_sibling);
		let ancestor = self.apportion(v, left, ancestor);
		self.w[parent].default_ancestor = Some(ancestor);
	}

	fn apportion(&mut self, v: usize, left: Option<usize>, mut ancestor: usize) -> usize {
		let Some(w) = left else {
			return ancestor;
		};
		let mut vop = v;
		let mut vom = self.w[self.w[v].parent].children[0];
		let mut vim = Some(w);
		let mut vip = Some(v);
		let mut sip = self.w[v].modifier;
		let mut sop = self.w[v].modifier;
		let mut sim = self.w[w].modifier;
		let mut som = self.w[vom].modifier;

		loop {
			vim = vim.and_then(|n| self.next_right(n));
			vip = vip.and_then(|n| self.next_left(n));
			let (Some(im), Some(ip)) = (vim, vip) else {
				break;
			};
			let (Some(om), Some(op)) = (self.next_left(vom), self.next_right(vop)) else {
				break;
			};
			vom = om;
			vop = op;
			self.w[vop].ancestor = v;
			let shift = self.w[im].prelim + sim - self.w[ip].prelim - sip + self.separation(im, ip);
			if shift > 0.0 {
				let wm = self.next_ancestor(im, v, ancestor);
				self.move_subtree(wm, v, shift);
				sip += shift;
				sop += shift;
			}
			sim += self.w[im].modifier;
			sip += self.w[ip].modifier;
			som += self.w[vom].modifier;
			sop += self.w[vop].modifier;
		}

		if let Some(im) = vim {
			if self.next_right(vop).is_none() {
				self.w[vop].thread = Some(im);
				self.w[vop].modifier += sim - sop;
			}
		}
		if let Some(ip) = vip {
			if self.next_left(vom).is_none() {
				self.w[vom].thread = Some(ip);
				self.w[vom].modifier += sip - som;
				ancestor = v;
			}
		}
		ancestor
	}

	fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
		let a = self.w[vim].ancestor;
		if self.w[a].parent == self.w[v].parent { a } else { ancestor }
	}

	fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
		let change = shift / (self.w[wp].number as f64 - self.w[wm].number as f64);
		self.w[wp].change -= change;
		self.w[wp].shift += shift;
		self.w[wm].change += change;
		self.w[wp].prelim += shift;
		self.w[wp].modifier += shift;
	}

	fn execute_shifts(&mut self, v: usize) {
		let (mut shift, mut change) = (0.0, 0.0);
		for c in self.w[v].children.clone().into_iter().rev() {
			self.w[c].prelim += shift;
			self.w[c].modifier += shift;
			change += self.w[c].change;
			shift += self.w[c].shift + change;
		}
	}
}
