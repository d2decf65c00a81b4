//! Palette shared by the canvas painter and the vector snapshot.
//!
//! The snapshot references these through CSS classes and carries the rules
//! inline, so the exported document needs no external stylesheet.

use super::types::NodeKind;

/// Canvas background.
pub const BACKGROUND: &str = "#f9fafb";
/// Dot grid on the background.
pub const BACKGROUND_DOT: &str = "#e5e7eb";
/// Card body.
pub const CARD_FILL: &str = "#ffffff";
/// Card body while hovered.
pub const CARD_HOVER_FILL: &str = "#eef2ff";
/// Card outline.
pub const CARD_STROKE: &str = "#e5e7eb";
/// Connector line.
pub const EDGE_STROKE: &str = "#d1d5db";
/// Arrowhead.
pub const ARROW_FILL: &str = "#9ca3af";
/// Edge label chip.
pub const LABEL_CHIP_FILL: &str = "#ffffff";
/// Edge label text.
pub const LABEL_TEXT: &str = "#4b5563";
/// Card title.
pub const TITLE_TEXT: &str = "#1f2937";
/// Card description, also the placeholder text.
pub const DESCRIPTION_TEXT: &str = "#6b7280";
/// Card drop shadow.
pub const SHADOW: &str = "rgba(0, 0, 0, 0.12)";

/// Font stack for all text.
pub const FONT_FAMILY: &str = "ui-sans-serif, system-ui, sans-serif";
/// Title size in layout pixels.
pub const TITLE_FONT_PX: f64 = 16.0;
/// Description size in layout pixels.
pub const DESCRIPTION_FONT_PX: f64 = 12.0;
/// Edge label size in layout pixels.
pub const LABEL_FONT_PX: f64 = 12.0;

/// Accent colour of the card header strip.
pub fn accent(kind: &NodeKind) -> &'static str {
	match kind {
		NodeKind::MainProcess => "#4361ee",
		NodeKind::Decision => "#ffb703",
		NodeKind::BeginEnd => "#4cc9f0",
		NodeKind::Critical => "#f72585",
		NodeKind::Other(_) => "#6b7280",
	}
}

/// CSS class carrying [`accent`] in the snapshot.
pub fn accent_class(kind: &NodeKind) -> &'static str {
	match kind {
		NodeKind::MainProcess => "accent-main",
		NodeKind::Decision => "accent-decision",
		NodeKind::BeginEnd => "accent-beginend",
		NodeKind::Critical => "accent-critical",
		NodeKind::Other(_) => "accent-other",
	}
}

/// `(selector, declarations)` for every class the snapshot emits.
pub fn style_rules() -> Vec<(String, String)> {
	let fixed = [
		("background", format!("fill: {BACKGROUND};")),
		("background-dot", format!("fill: {BACKGROUND_DOT};")),
		("card", format!("fill: {CARD_FILL}; stroke: {CARD_STROKE}; stroke-width: 1;")),
		("edge", format!("fill: none; stroke: {EDGE_STROKE}; stroke-width: 2;")),
		("arrow", format!("fill: {ARROW_FILL};")),
		("edge-label-chip", format!("fill: {LABEL_CHIP_FILL};")),
		(
			"edge-label",
			format!(
				"fill: {LABEL_TEXT}; font-family: {FONT_FAMILY}; font-size: {LABEL_FONT_PX}px; font-weight: 600; text-anchor: middle; dominant-baseline: middle;"
			),
		),
		(
			"node-title",
			format!(
				"fill: {TITLE_TEXT}; font-family: {FONT_FAMILY}; font-size: {TITLE_FONT_PX}px; font-weight: 700; text-anchor: middle;"
			),
		),
		(
			"node-description",
			format!(
				"fill: {DESCRIPTION_TEXT}; font-family: {FONT_FAMILY}; font-size: {DESCRIPTION_FONT_PX}px; text-anchor: middle;"
			),
		),
	];
	let accents = NodeKind::KNOWN
		.into_iter()
		.chain([NodeKind::Other(String::new())])
		.map(|kind| (accent_class(&kind), format!("fill: {};", accent(&kind))));

	fixed
		.into_iter()
		.chain(accents)
		.map(|(class, body)| (format!(".{class}"), body))
		.collect()
}

/// The rules as one stylesheet.
pub fn stylesheet() -> String {
	style_rules()
		.into_iter()
		.map(|(selector, body)| format!("{selector} {{ {body} }}"))
		.collect::<Vec<_>>()
		.join("\n")
}
