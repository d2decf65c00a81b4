//! Tunables for layout, camera and canvas sizing.

use serde::Deserialize;

/// All engine settings. Every section falls back to its defaults, so a
/// partial JSON document is enough to override a single value.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Tree layout geometry.
	pub layout: LayoutConfig,
	/// Camera behaviour.
	pub viewport: ViewportConfig,
	/// Canvas sizing.
	pub canvas: CanvasConfig,
}

impl EngineConfig {
	/// Parse a (possibly partial) JSON override.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}
}

/// Node footprint and spacing.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Card width.
	pub node_width: f64,
	/// Card height.
	pub node_height: f64,
	/// Extra horizontal room per node.
	pub padding_x: f64,
	/// Extra vertical room per level.
	pub padding_y: f64,
	/// Separation between siblings, in node slots.
	pub sibling_separation: f64,
	/// Separation between nodes of different parents, in node slots.
	pub cousin_separation: f64,
	/// Minimum edge label chip width.
	pub label_min_width: f64,
	/// Edge label chip height.
	pub label_height: f64,
	/// Approximate glyph advance used to size chips and wrap text.
	pub glyph_width: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			node_width: 220.0,
			node_height: 80.0,
			padding_x: 60.0,
			padding_y: 80.0,
			sibling_separation: 1.2,
			cousin_separation: 1.5,
			label_min_width: 70.0,
			label_height: 24.0,
			glyph_width: 7.0,
		}
	}
}

impl LayoutConfig {
	/// Horizontal distance of one separation unit.
	pub fn slot_width(&self) -> f64 {
		self.node_width + self.padding_x
	}

	/// Vertical distance between levels.
	pub fn level_height(&self) -> f64 {
		self.node_height + self.padding_y
	}
}

/// Zoom range, gesture factors and transition timing.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
	/// Smallest allowed scale.
	pub min_scale: f64,
	/// Largest allowed scale.
	pub max_scale: f64,
	/// Factor applied by `zoom_in`.
	pub zoom_in_factor: f64,
	/// Factor applied by `zoom_out`.
	pub zoom_out_factor: f64,
	/// Factor per wheel notch towards the user.
	pub wheel_in_factor: f64,
	/// Factor per wheel notch away from the user.
	pub wheel_out_factor: f64,
	/// Share of the viewport the fitted content may fill.
	pub fit_padding: f64,
	/// Duration of zoom transitions, seconds.
	pub zoom_duration: f64,
	/// Duration of centre transitions, seconds.
	pub center_duration: f64,
	/// Pointer travel in pixels after which a press is a pan, not a click.
	pub click_tolerance: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.2,
			max_scale: 2.0,
			zoom_in_factor: 1.2,
			zoom_out_factor: 0.8,
			wheel_in_factor: 1.1,
			wheel_out_factor: 0.9,
			fit_padding: 0.85,
			zoom_duration: 0.25,
			center_duration: 0.75,
			click_tolerance: 3.0,
		}
	}
}

/// Canvas sizing.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
	/// Width used when the container reports none.
	pub fallback_width: f64,
	/// Height used when the container reports none.
	pub fallback_height: f64,
}

impl Default for CanvasConfig {
	fn default() -> Self {
		Self {
			fallback_width: 800.0,
			fallback_height: 600.0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_override_keeps_other_defaults() {
		let config = EngineConfig::from_json(r#"{"viewport":{"max_scale":4.0}}"#).unwrap();
		assert_eq!(config.viewport.max_scale, 4.0);
		assert_eq!(config.viewport.min_scale, 0.2);
		assert_eq!(config.layout, LayoutConfig::default());
	}

	#[test]
	fn sibling_spacing_is_tighter_than_cousin_spacing() {
		let layout = LayoutConfig::default();
		assert!((layout.cousin_separation / layout.sibling_separation - 1.25).abs() < 1e-9);
	}
}
