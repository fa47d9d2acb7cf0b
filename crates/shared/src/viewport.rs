use serde::{Deserialize, Serialize};

use crate::config;

/// Map camera: center, zoom and the pixel size of the map element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            latitude: config::DEFAULT_LATITUDE,
            longitude: config::DEFAULT_LONGITUDE,
            zoom: config::DEFAULT_ZOOM,
            width: config::DEFAULT_WIDTH,
            height: config::DEFAULT_HEIGHT,
        }
    }
}

impl Viewport {
    /// Overwrite only the fields present in `patch`.
    pub fn apply(&mut self, patch: &ViewportPatch) {
        if let Some(v) = patch.latitude {
            self.latitude = v;
        }
        if let Some(v) = patch.longitude {
            self.longitude = v;
        }
        if let Some(v) = patch.zoom {
            self.zoom = v;
        }
        if let Some(v) = patch.width {
            self.width = v;
        }
        if let Some(v) = patch.height {
            self.height = v;
        }
    }
}

/// Partial camera update. Drag, zoom and fly-to all go through this.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportPatch {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub zoom: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl ViewportPatch {
    pub fn center(latitude: f64, longitude: f64) -> Self {
        ViewportPatch {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Default::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        ViewportPatch {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn zoom(zoom: f64) -> Self {
        ViewportPatch {
            zoom: Some(zoom),
            ..Default::default()
        }
    }
}

/// Smooth start and stop, used for the fly-to animation.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Animated camera move. Purely visual: the controller already holds `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Viewport,
    pub to: Viewport,
    pub duration_ms: f64,
}

impl Transition {
    /// Camera to draw `elapsed_ms` after the transition started.
    pub fn sample(&self, elapsed_ms: f64) -> Viewport {
        if self.is_finished(elapsed_ms) {
            return self.to;
        }
        let t = ease_in_out_cubic(elapsed_ms / self.duration_ms);
        Viewport {
            latitude: lerp(self.from.latitude, self.to.latitude, t),
            longitude: lerp(self.from.longitude, self.to.longitude, t),
            zoom: lerp(self.from.zoom, self.to.zoom, t),
            width: self.to.width,
            height: self.to.height,
        }
    }

    pub fn is_finished(&self, elapsed_ms: f64) -> bool {
        self.duration_ms <= 0.0 || elapsed_ms >= self.duration_ms
    }
}

/// Trailing-edge throttle for window resizes.
///
/// The first sample opens a window of `interval_ms`; every sample inside the
/// window replaces the pending size. When the window has elapsed, `poll`
/// hands back the latest size and closes the window.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeThrottle {
    interval_ms: f64,
    window_end: Option<f64>,
    pending: Option<(f64, f64)>,
}

impl ResizeThrottle {
    pub fn new(interval_ms: f64) -> Self {
        ResizeThrottle {
            interval_ms,
            window_end: None,
            pending: None,
        }
    }

    /// Record a size. Returns the deadline when this sample opened a new window.
    pub fn sample(&mut self, width: f64, height: f64, now_ms: f64) -> Option<f64> {
        self.pending = Some((width, height));
        if self.window_end.is_some() {
            return None;
        }
        let end = now_ms + self.interval_ms;
        self.window_end = Some(end);
        Some(end)
    }

    pub fn poll(&mut self, now_ms: f64) -> Option<(f64, f64)> {
        match self.window_end {
            Some(end) if now_ms >= end => {
                self.window_end = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<f64> {
        self.window_end
    }
}

pub struct ViewportController {
    viewport: Viewport,
    throttle: ResizeThrottle,
    fly_to_duration_ms: f64,
}

impl ViewportController {
    pub fn new(initial: Viewport, resize_interval_ms: f64, fly_to_duration_ms: f64) -> Self {
        ViewportController {
            viewport: initial,
            throttle: ResizeThrottle::new(resize_interval_ms),
            fly_to_duration_ms,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_camera(&mut self, patch: ViewportPatch) -> Viewport {
        self.viewport.apply(&patch);
        self.viewport
    }

    pub fn fly_to(&mut self, latitude: f64, longitude: f64) -> Transition {
        let from = self.viewport;
        let to = self.set_camera(ViewportPatch::center(latitude, longitude));
        Transition {
            from,
            to,
            duration_ms: self.fly_to_duration_ms,
        }
    }

    /// Feed a window size. Returns the time at which `flush_resize` must run
    /// when this call opened a new throttle window.
    pub fn on_resize(&mut self, width: f64, height: f64, now_ms: f64) -> Option<f64> {
        // A window whose timer never fired is settled before starting another.
        self.flush_resize(now_ms);
        self.throttle.sample(width, height, now_ms)
    }

    pub fn flush_resize(&mut self, now_ms: f64) -> Option<Viewport> {
        let (width, height) = self.throttle.poll(now_ms)?;
        tracing::debug!(width, height, "applying throttled resize");
        Some(self.set_camera(ViewportPatch::size(width, height)))
    }

    pub fn resize_deadline(&self) -> Option<f64> {
        self.throttle.deadline()
    }
}
