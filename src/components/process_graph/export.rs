//! On-demand exports: the graph as exchange JSON and the drawn scene as a
//! self-contained SVG document.

use super::layout::Point;
use super::scene::{
	CARD_RADIUS, DESCRIPTION_BASELINE, DESCRIPTION_LEADING, HEADER_HEIGHT, Scene, SceneEdge,
	SceneNode, TITLE_BASELINE,
};
use super::style;
use super::types::Graph;
use super::viewport::ViewTransform;
use crate::error::GraphError;

/// Download formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
	/// Graph exchange JSON.
	Json,
	/// Vector snapshot.
	Svg,
}

impl ExportFormat {
	/// File extension, without the dot.
	pub fn extension(self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Svg => "svg",
		}
	}

	/// MIME type for the download blob.
	pub fn mime_type(self) -> &'static str {
		match self {
			Self::Json => "application/json",
			Self::Svg => "image/svg+xml",
		}
	}
}

/// `process-graph-<timestamp>.<ext>` with `:` and `.` in the ISO-8601
/// timestamp replaced by `-`.
pub fn export_file_name(iso_timestamp: &str, format: ExportFormat) -> String {
	let stamp: String = iso_timestamp
		.chars()
		.map(|c| if c == ':' || c == '.' { '-' } else { c })
		.collect();
	format!("process-graph-{stamp}.{}", format.extension())
}

/// Pretty-printed exchange JSON, lossless for every node and edge field.
pub fn export_json(graph: &Graph) -> Result<String, serde_json::Error> {
	serde_json::to_string_pretty(graph)
}

/// Read exchange JSON back.
pub fn import_json(text: &str) -> Result<Graph, GraphError> {
	Graph::from_json(text)
}

/// Serialize `scene` as seen through `transform` on a `width` x `height`
/// screen. `None` when nothing has been drawn.
pub fn export_svg(
	scene: Option<&Scene>,
	transform: ViewTransform,
	width: f64,
	height: f64,
) -> Option<String> {
	let scene = scene?;
	let mut svg = String::new();

	svg.push_str(&format!(
		"<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" preserveAspectRatio=\"xMidYMid meet\">",
	));
	svg.push_str("<defs>");
	svg.push_str("<style>");
	svg.push_str(&style::stylesheet());
	svg.push_str("</style>");
	svg.push_str(
		"<pattern id=\"bg-dots\" x=\"0\" y=\"0\" width=\"20\" height=\"20\" patternUnits=\"userSpaceOnUse\"><circle cx=\"2\" cy=\"2\" r=\"1\" class=\"background-dot\"/></pattern>",
	);
	svg.push_str(
		"<filter id=\"node-shadow\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\"><feDropShadow dx=\"0\" dy=\"3\" stdDeviation=\"6\" flood-color=\"#000000\" flood-opacity=\".12\"/></filter>",
	);
	svg.push_str(
		"<marker id=\"arrow\" viewBox=\"0 -5 10 10\" refX=\"10\" refY=\"0\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M0,-5L10,0L0,5\" class=\"arrow\"/></marker>",
	);
	svg.push_str("</defs>");
	svg.push_str("<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" class=\"background\"/>");
	svg.push_str("<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" fill=\"url(#bg-dots)\"/>");

	svg.push_str(&format!(
		"<g class=\"graph-content\" transform=\"translate({:.2},{:.2}) scale({:.4})\">",
		transform.x, transform.y, transform.k
	));
	for edge in &scene.edges {
		svg.push_str(&edge_svg(edge));
	}
	for (i, node) in scene.nodes.iter().enumerate() {
		svg.push_str(&node_svg(i, node));
	}
	svg.push_str("</g></svg>");
	Some(svg)
}

fn edge_svg(edge: &SceneEdge) -> String {
	let p = &edge.path;
	let mut out = format!(
		"<g class=\"edge-group\"><path d=\"M{},{}C{},{} {},{} {},{}\" class=\"edge\" marker-end=\"url(#arrow)\"/>",
		num(p.start.x),
		num(p.start.y),
		num(p.c1.x),
		num(p.c1.y),
		num(p.c2.x),
		num(p.c2.y),
		num(p.end.x),
		num(p.end.y),
	);
	if let Some(label) = &edge.label {
		let Point { x, y } = label.chip.center();
		out.push_str(&format!(
			"<g transform=\"translate({},{})\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"8\" class=\"edge-label-chip\"/><text class=\"edge-label\">{}</text></g>",
			num(x),
			num(y),
			num(-label.chip.width / 2.0),
			num(-label.chip.height / 2.0),
			num(label.chip.width),
			num(label.chip.height),
			escape_xml(&label.text)
		));
	}
	out.push_str("</g>");
	out
}

fn node_svg(i: usize, node: &SceneNode) -> String {
	let (w, h) = (node.card.width, node.card.height);
	let mut out = format!(
		"<g class=\"node\" transform=\"translate({},{})\" filter=\"url(#node-shadow)\">",
		num(node.card.x),
		num(node.card.y)
	);
	out.push_str(&format!(
		"<title>{}: {}</title>",
		escape_xml(&node.node.label),
		escape_xml(&node.node.description)
	));
	out.push_str(&format!(
		"<clipPath id=\"card-clip-{i}\"><rect width=\"{}\" height=\"{}\" rx=\"{CARD_RADIUS}\" ry=\"{CARD_RADIUS}\"/></clipPath>",
		num(w),
		num(h)
	));
	out.push_str(&format!(
		"<rect width=\"{}\" height=\"{}\" rx=\"{CARD_RADIUS}\" ry=\"{CARD_RADIUS}\" class=\"card\"/>",
		num(w),
		num(h)
	));
	out.push_str(&format!(
		"<rect width=\"{}\" height=\"{HEADER_HEIGHT}\" class=\"{}\" clip-path=\"url(#card-clip-{i})\"/>",
		num(w),
		node.accent_class
	));
	out.push_str(&format!(
		"<text x=\"{}\" y=\"{TITLE_BASELINE}\" class=\"node-title\">{}</text>",
		num(w / 2.0),
		escape_xml(&node.title)
	));
	for (j, line) in node.description.iter().enumerate() {
		out.push_str(&format!(
			"<text x=\"{}\" y=\"{}\" class=\"node-description\">{}</text>",
			num(w / 2.0),
			num(DESCRIPTION_BASELINE + j as f64 * DESCRIPTION_LEADING),
			escape_xml(line)
		));
	}
	out.push_str("</g>");
	out
}

/// Compact number: two decimals at most, no trailing zeros.
fn num(v: f64) -> String {
	let s = format!("{v:.2}");
	let s = s.trim_end_matches('0').trim_end_matches('.');
	if s == "-0" { "0".to_owned() } else { s.to_owned() }
}

/// Escape text for element content and attribute values.
pub fn escape_xml(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&apos;"),
			_ => out.push(c),
		}
	}
	out
}
