use web_sys::CanvasRenderingContext2d;

use super::layout::Rect;
use super::scene::{
	CARD_RADIUS, DESCRIPTION_BASELINE, DESCRIPTION_LEADING, HEADER_HEIGHT, Scene, TITLE_BASELINE,
	arrowhead,
};
use super::state::ProcessGraphState;
use super::style;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Paint one frame of `state`.
pub fn render(state: &ProcessGraphState, ctx: &CanvasRenderingContext2d) {
	let (width, height) = state.viewport.size();
	ctx.set_fill_style_str(style::BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);

	let Some(scene) = state.scene() else {
		draw_placeholder(ctx, width, height);
		return;
	};

	let transform = state.viewport.transform();
	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);
	draw_edges(scene, ctx);
	draw_nodes(state, scene, ctx);
	ctx.restore();
}

fn draw_placeholder(ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	ctx.set_fill_style_str(style::DESCRIPTION_TEXT);
	ctx.set_font(&format!("{}px {}", style::TITLE_FONT_PX, style::FONT_FAMILY));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text("No data to display.", width / 2.0, height / 2.0);
}

fn draw_edges(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	ctx.set_line_width(2.0);
	ctx.set_stroke_style_str(style::EDGE_STROKE);
	for edge in &scene.edges {
		let p = &edge.path;
		ctx.begin_path();
		ctx.move_to(p.start.x, p.start.y);
		ctx.bezier_curve_to(p.c1.x, p.c1.y, p.c2.x, p.c2.y, p.end.x, p.end.y);
		ctx.stroke();

		let [tip, left, right] = arrowhead(p);
		ctx.set_fill_style_str(style::ARROW_FILL);
		ctx.begin_path();
		ctx.move_to(tip.x, tip.y);
		ctx.line_to(left.x, left.y);
		ctx.line_to(right.x, right.y);
		ctx.close_path();
		ctx.fill();
	}

	// Chips after all connectors.
	ctx.set_font(&format!("600 {}px {}", style::LABEL_FONT_PX, style::FONT_FAMILY));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for label in scene.edges.iter().filter_map(|e| e.label.as_ref()) {
		ctx.set_fill_style_str(style::LABEL_CHIP_FILL);
		rounded_rect(ctx, &label.chip, 8.0);
		ctx.fill();
		let c = label.chip.center();
		ctx.set_fill_style_str(style::LABEL_TEXT);
		let _ = ctx.fill_text(&label.text, c.x, c.y);
	}
}

fn draw_nodes(state: &ProcessGraphState, scene: &Scene, ctx: &CanvasRenderingContext2d) {
	let t = ease_out_cubic(state.hover.highlight_t);

	for (idx, node) in scene.nodes.iter().enumerate() {
		let card = node.card;
		let hovered = state.is_hovered(idx);

		ctx.save();
		ctx.set_shadow_color(style::SHADOW);
		ctx.set_shadow_blur(12.0);
		ctx.set_shadow_offset_y(3.0);
		ctx.set_fill_style_str(if hovered { style::CARD_HOVER_FILL } else { style::CARD_FILL });
		rounded_rect(ctx, &card, CARD_RADIUS);
		ctx.fill();
		ctx.restore();

		if hovered && t > 0.01 {
			ctx.set_stroke_style_str(node.accent);
			ctx.set_line_width(1.0 + 1.5 * t);
		} else {
			ctx.set_stroke_style_str(style::CARD_STROKE);
			ctx.set_line_width(1.0);
		}
		rounded_rect(ctx, &card, CARD_RADIUS);
		ctx.stroke();

		ctx.save();
		rounded_rect(ctx, &card, CARD_RADIUS);
		ctx.clip();
		ctx.set_fill_style_str(node.accent);
		ctx.fill_rect(card.x, card.y, card.width, HEADER_HEIGHT);
		ctx.restore();

		let cx = card.x + card.width / 2.0;
		ctx.set_text_align("center");
		ctx.set_text_baseline("alphabetic");
		ctx.set_fill_style_str(style::TITLE_TEXT);
		ctx.set_font(&format!("bold {}px {}", style::TITLE_FONT_PX, style::FONT_FAMILY));
		let _ = ctx.fill_text(&node.title, cx, card.y + TITLE_BASELINE);

		ctx.set_fill_style_str(style::DESCRIPTION_TEXT);
		ctx.set_font(&format!("{}px {}", style::DESCRIPTION_FONT_PX, style::FONT_FAMILY));
		for (i, line) in node.description.iter().enumerate() {
			let y = card.y + DESCRIPTION_BASELINE + i as f64 * DESCRIPTION_LEADING;
			let _ = ctx.fill_text(line, cx, y);
		}
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, r: &Rect, radius: f64) {
	let rad = radius.min(r.width / 2.0).min(r.height / 2.0);
	let (x0, y0, x1, y1) = (r.x, r.y, r.x + r.width, r.y + r.height);
	ctx.begin_path();
	ctx.move_to(x0 + rad, y0);
	let _ = ctx.arc_to(x1, y0, x1, y1, rad);
	let _ = ctx.arc_to(x1, y1, x0, y1, rad);
	let _ = ctx.arc_to(x0, y1, x0, y0, rad);
	let _ = ctx.arc_to(x0, y0, x1, y0, rad);
	ctx.close_path();
}
