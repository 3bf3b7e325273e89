use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::labels::EdgeGeometry;
use super::state::{ForceGraphState, NODE_RADIUS};

const NODE_FILL: &str = "#4F46E5";
const SELECTED_FILL: &str = "#4338CA";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, selected: Option<&str>) {
	ctx.set_fill_style_str("#111827");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx, selected);
	ctx.restore();
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);
	let highlighting = state.has_active_highlight();

	for edge in &state.frame.edges {
		let g = &edge.geometry;
		let is_highlighted = state.is_highlighted(&edge.source) && state.is_highlighted(&edge.target);
		let (alpha, width) = match (highlighting, is_highlighted) {
			(false, _) => (0.7, line_width),
			(true, true) => (0.7 + 0.3 * t, line_width * (1.0 + 0.3 * t)),
			(true, false) => (0.7 - 0.5 * t, line_width * (1.0 - 0.3 * t)),
		};

		ctx.set_stroke_style_str(&format!("rgba(156, 163, 175, {})", alpha));
		ctx.set_line_width(width);
		// highlighted relationships flow toward their target
		if highlighting && is_highlighted {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		}
		ctx.begin_path();
		ctx.move_to(g.start.x, g.start.y);
		ctx.quadratic_curve_to(g.control.x, g.control.y, g.end.x, g.end.y);
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());

		// arrowhead sits on the target's rim, aligned with the curve's end tangent
		let (tx, ty) = (g.end.x - g.control.x, g.end.y - g.control.y);
		let tangent = (tx * tx + ty * ty).sqrt();
		if tangent > 0.001 {
			let (ux, uy) = (tx / tangent, ty / tangent);
			let (tip_x, tip_y) = (g.end.x - ux * NODE_RADIUS, g.end.y - uy * NODE_RADIUS);
			let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
			let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
			ctx.set_fill_style_str(&format!("rgba(156, 163, 175, {})", alpha));
			ctx.begin_path();
			ctx.move_to(tip_x, tip_y);
			ctx.line_to(back_x + px, back_y + py);
			ctx.line_to(back_x - px, back_y - py);
			ctx.close_path();
			ctx.fill();
		}

		draw_label(ctx, &edge.label, g, k, alpha);
	}
}

fn draw_label(ctx: &CanvasRenderingContext2d, text: &str, g: &EdgeGeometry, k: f64, alpha: f64) {
	let (x, y) = (g.label.x, g.label.y);
	let font_size = 11.0 / k.max(0.5);
	ctx.set_font(&format!("{}px sans-serif", font_size));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let width = ctx
		.measure_text(text)
		.map(|m| m.width())
		.unwrap_or(text.len() as f64 * font_size * 0.6);
	let (pad_x, pad_y) = (6.0 / k, 3.0 / k);
	ctx.set_fill_style_str(&format!("rgba(31, 41, 55, {})", 0.9 * alpha));
	ctx.fill_rect(
		x - width / 2.0 - pad_x,
		y - font_size / 2.0 - pad_y,
		width + 2.0 * pad_x,
		font_size + 2.0 * pad_y,
	);
	ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha));
	let _ = ctx.fill_text(text, x, y);
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, selected: Option<&str>) {
	let (highlighting, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);

	for node in &state.frame.nodes {
		let (x, y) = (node.position.x, node.position.y);
		let is_selected = selected == Some(node.id.as_str());
		let (alpha, radius) = if !highlighting || state.is_highlighted(&node.id) {
			let grow = if state.is_hovered(&node.id) { 0.15 * t } else { 0.0 };
			(1.0, NODE_RADIUS * (1.0 + grow))
		} else {
			(1.0 - 0.6 * t, NODE_RADIUS * (1.0 - 0.1 * t))
		};

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(if is_selected { SELECTED_FILL } else { NODE_FILL });
		ctx.fill();

		if is_selected || node.pinned {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 3.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.8)");
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		}

		ctx.set_fill_style_str("white");
		ctx.set_font(&format!("{}px sans-serif", 12.0 / k.max(0.5)));
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let _ = ctx.fill_text(&node.name, x, y);
		ctx.set_global_alpha(1.0);
	}
}
