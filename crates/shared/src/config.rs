use crate::viewport::Viewport;

/// Minimum spacing between two applied window-resize updates.
pub const RESIZE_INTERVAL_MS: f64 = 2000.0;

/// Length of the animated camera move when a marker is clicked.
pub const FLY_TO_DURATION_MS: f64 = 200.0;

/// Local storage key holding the logged-in username.
pub const SESSION_KEY: &str = "user";

// Camera on a fresh load: Seoul, country-level zoom.
pub const DEFAULT_LATITUDE: f64 = 37.5326;
pub const DEFAULT_LONGITUDE: f64 = 127.024612;
pub const DEFAULT_ZOOM: f64 = 4.0;
pub const DEFAULT_WIDTH: f64 = 1024.0;
pub const DEFAULT_HEIGHT: f64 = 768.0;

/// Tunables for the map state controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub resize_interval_ms: f64,
    pub fly_to_duration_ms: f64,
    pub initial_viewport: Viewport,
    pub session_key: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            resize_interval_ms: RESIZE_INTERVAL_MS,
            fly_to_duration_ms: FLY_TO_DURATION_MS,
            initial_viewport: Viewport::default(),
            session_key: SESSION_KEY.to_string(),
        }
    }
}
