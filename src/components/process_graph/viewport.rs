//! Camera state: pan, zoom, fit-to-content and animated transitions.

use log::debug;

use super::config::ViewportConfig;
use super::layout::{Point, Rect};

/// Screen = world * k + (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal translation in screen pixels.
	pub x: f64,
	/// Vertical translation in screen pixels.
	pub y: f64,
	/// Scale factor.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewTransform {
	/// No pan, unit scale.
	pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, k: 1.0 };

	/// Map a screen point into layout space.
	pub fn invert(&self, sx: f64, sy: f64) -> Point {
		Point::new((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Map a layout point onto the screen.
	pub fn apply(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	fn lerp(&self, to: &Self, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

fn ease_cubic_in_out(t: f64) -> f64 {
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

#[derive(Clone, Debug)]
struct Transition {
	from: ViewTransform,
	to: ViewTransform,
	elapsed: f64,
	duration: f64,
}

/// Owns the transform of one diagram instance.
#[derive(Clone, Debug)]
pub struct Viewport {
	transform: ViewTransform,
	transition: Option<Transition>,
	width: f64,
	height: f64,
	config: ViewportConfig,
}

impl Viewport {
	/// Identity camera over a `width` x `height` screen area.
	pub fn new(width: f64, height: f64, config: ViewportConfig) -> Self {
		Self {
			transform: ViewTransform::IDENTITY,
			transition: None,
			width,
			height,
			config,
		}
	}

	/// Current (possibly mid-transition) transform.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Where the camera will rest once any transition finishes.
	pub fn target(&self) -> ViewTransform {
		self.transition.as_ref().map_or(self.transform, |t| t.to)
	}

	/// Jump to `transform` (scale clamped), cancelling any transition.
	pub fn set_transform(&mut self, transform: ViewTransform) {
		self.transition = None;
		self.transform = ViewTransform {
			k: self.clamp_scale(transform.k),
			..transform
		};
	}

	/// Screen size.
	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	/// Record a new screen size. Node positions are untouched.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Camera settings in use.
	pub fn config(&self) -> &ViewportConfig {
		&self.config
	}

	/// True while a transition is running.
	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	/// Back to identity, immediately.
	pub fn reset(&mut self) {
		self.transition = None;
		self.transform = ViewTransform::IDENTITY;
	}

	/// Animated zoom in around the screen centre.
	pub fn zoom_in(&mut self) {
		self.scale_by(self.config.zoom_in_factor);
	}

	/// Animated zoom out around the screen centre.
	pub fn zoom_out(&mut self) {
		self.scale_by(self.config.zoom_out_factor);
	}

	/// Animated zoom by `factor` around the screen centre.
	pub fn scale_by(&mut self, factor: f64) {
		let to = self.scaled_about(self.transform, self.width / 2.0, self.height / 2.0, factor);
		self.animate_to(to, self.config.zoom_duration);
	}

	/// Wheel gesture: instant zoom keeping the pointer fixed.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 {
			self.config.wheel_out_factor
		} else {
			self.config.wheel_in_factor
		};
		let to = self.scaled_about(self.transform, sx, sy, factor);
		self.set_transform(to);
	}

	/// Drag gesture: instant pan by a screen delta.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		let t = self.transform;
		self.set_transform(ViewTransform {
			x: t.x + dx,
			y: t.y + dy,
			k: t.k,
		});
	}

	/// Fit `bounds` into the screen, centred, with an animated transition.
	///
	/// No-op when there is nothing to fit or the box is degenerate.
	pub fn center(&mut self, bounds: Option<Rect>) -> bool {
		let Some(b) = bounds else {
			return false;
		};
		if b.width <= 0.0 || b.height <= 0.0 {
			return false;
		}
		let fit = self.config.fit_padding * (self.width / b.width).min(self.height / b.height);
		let k = self.clamp_scale(fit);
		let mid = b.center();
		let to = ViewTransform {
			x: self.width / 2.0 - k * mid.x,
			y: self.height / 2.0 - k * mid.y,
			k,
		};
		debug!("centering on {b:?} at scale {k:.3}");
		self.animate_to(to, self.config.center_duration);
		true
	}

	/// Advance the running transition by `dt` seconds. Returns whether one is
	/// still in progress.
	pub fn tick(&mut self, dt: f64) -> bool {
		let Some(tr) = self.transition.as_mut() else {
			return false;
		};
		tr.elapsed += dt;
		let t = if tr.duration > 0.0 {
			(tr.elapsed / tr.duration).min(1.0)
		} else {
			1.0
		};
		self.transform = tr.from.lerp(&tr.to, ease_cubic_in_out(t));
		if t >= 1.0 {
			self.transform = tr.to;
			self.transition = None;
		}
		self.transition.is_some()
	}

	fn animate_to(&mut self, to: ViewTransform, duration: f64) {
		self.transition = Some(Transition {
			from: self.transform,
			to,
			elapsed: 0.0,
			duration,
		});
	}

	fn scaled_about(&self, from: ViewTransform, sx: f64, sy: f64, factor: f64) -> ViewTransform {
		let k = self.clamp_scale(from.k * factor);
		let anchor = from.invert(sx, sy);
		ViewTransform {
			x: sx - anchor.x * k,
			y: sy - anchor.y * k,
			k,
		}
	}

	fn clamp_scale(&self, k: f64) -> f64 {
		k.max(self.config.min_scale).min(self.config.max_scale)
	}
}
