use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use pinmap_shared::models::Pin;
use pinmap_shared::orchestrator::MapEvent;
use pinmap_shared::session::Session;
use pinmap_shared::viewport::{Viewport, ViewportPatch};

use crate::coords;

pub const MAP_CONTAINER_ID: &str = "pin-map-container";

/// Movement below this many pixels still counts as a click.
const DRAG_THRESHOLD: f64 = 3.0;

const ZOOM_STEP: f64 = 0.5;

/// Marker glyph size per zoom level.
const MARKER_SCALE: f64 = 7.0;

const OWN_PIN_COLOR: &str = "tomato";
const OTHER_PIN_COLOR: &str = "slateblue";

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragStart {
    client: (f64, f64),
    view: Viewport,
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

fn marker_color(session: &Session, pin: &Pin) -> &'static str {
    if session.is_owner(pin) {
        OWN_PIN_COLOR
    } else {
        OTHER_PIN_COLOR
    }
}

fn marker_size(zoom: f64) -> f64 {
    MARKER_SCALE * zoom
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

fn step_zoom(zoom: f64, direction: f64) -> f64 {
    (zoom + direction * ZOOM_STEP).clamp(coords::MIN_ZOOM, coords::MAX_ZOOM)
}

/// Camera change for zooming to `new_zoom` while the point under the cursor
/// at `(sx, sy)` stays put.
fn zoom_at(view: &Viewport, sx: f64, sy: f64, new_zoom: f64) -> ViewportPatch {
    let anchor = coords::from_screen(view, sx, sy);
    let zoomed = Viewport {
        zoom: new_zoom,
        ..*view
    };
    let (ax, ay) = coords::to_screen(&zoomed, anchor);
    let center = coords::pan_center(&zoomed, sx - ax, sy - ay);
    ViewportPatch {
        latitude: Some(center.lat),
        longitude: Some(center.long),
        zoom: Some(new_zoom),
        ..Default::default()
    }
}

/// A pin projected onto the map element.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker {
    pub id: String,
    pub title: String,
    pub x: f64,
    pub y: f64,
    pub color: &'static str,
}

/// Project every pin and drop the ones that cannot be seen.
fn place_markers(view: &Viewport, pins: &[Pin], session: &Session) -> Vec<PlacedMarker> {
    let margin = marker_size(view.zoom);
    pins.iter()
        .filter_map(|pin| {
            let (x, y) = coords::to_screen(view, pin.location());
            on_screen(view, x, y, margin).then(|| PlacedMarker {
                id: pin.id.clone(),
                title: pin.title.clone(),
                x,
                y,
                color: marker_color(session, pin),
            })
        })
        .collect()
}

/// Whether a marker at `(x, y)` could be visible at all.
fn on_screen(view: &Viewport, x: f64, y: f64, margin: f64) -> bool {
    x >= -margin && y >= -margin && x <= view.width + margin && y <= view.height + margin
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
pub fn MapView(
    view: Viewport,
    pins: Vec<Pin>,
    session: Session,
    on_event: EventHandler<MapEvent>,
    children: Element,
) -> Element {
    let mut drag = use_signal(|| None::<DragStart>);

    let tiles: Vec<(String, String, coords::Tile)> = coords::visible_tiles(&view)
        .into_iter()
        .map(|tile| (tile.key(), tile.url(), tile))
        .collect();
    let size = marker_size(view.zoom);
    let markers = place_markers(&view, &pins, &session);

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "map-container",
            style: "width: {view.width}px; height: {view.height}px;",
            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                drag.set(Some(DragStart {
                    client: (client.x, client.y),
                    view,
                }));
            },
            onmousemove: move |evt: Event<MouseData>| {
                let Some(start) = *drag.read() else {
                    return;
                };
                let client = evt.client_coordinates();
                let dx = client.x - start.client.0;
                let dy = client.y - start.client.1;
                if dx.abs() < DRAG_THRESHOLD && dy.abs() < DRAG_THRESHOLD {
                    return;
                }
                let center = coords::pan_center(&start.view, dx, dy);
                on_event.call(MapEvent::ViewportChange(ViewportPatch::center(center.lat, center.long)));
            },
            onmouseup: move |_| drag.set(None),
            onmouseleave: move |_| drag.set(None),
            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();
                let dy = wheel_delta_y(evt.data().delta());
                if dy == 0.0 {
                    return;
                }
                let new_zoom = step_zoom(view.zoom, -dy.signum());
                let client = evt.data().client_coordinates();
                let Some((sx, sy)) = coords::client_to_container(client.x, client.y, MAP_CONTAINER_ID) else {
                    return;
                };
                on_event.call(MapEvent::ViewportChange(zoom_at(&view, sx, sy, new_zoom)));
            },
            ondoubleclick: move |evt: Event<MouseData>| {
                evt.prevent_default();
                let client = evt.client_coordinates();
                if let Some((sx, sy)) = coords::client_to_container(client.x, client.y, MAP_CONTAINER_ID) {
                    on_event.call(MapEvent::DoubleClick(coords::from_screen(&view, sx, sy)));
                }
            },

            // Base layer
            div { class: "tiles",
                for (key, url, tile) in tiles {
                    img {
                        key: "{key}",
                        class: "tile",
                        src: "{url}",
                        draggable: "false",
                        style: "left: {tile.left}px; top: {tile.top}px; width: {tile.size}px; height: {tile.size}px;",
                    }
                }
            }

            // Markers, tip anchored on the pin's location
            for marker in markers {
                Marker {
                    key: "{marker.id}",
                    marker: marker.clone(),
                    size,
                    on_event,
                }
            }

            {children}

            // Zoom control
            div {
                class: "nav-control",
                onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
                ondoubleclick: move |evt: Event<MouseData>| evt.stop_propagation(),
                button {
                    title: "Zoom in",
                    onclick: move |_| on_event.call(MapEvent::ViewportChange(ViewportPatch::zoom(step_zoom(view.zoom, 1.0)))),
                    "+"
                }
                button {
                    title: "Zoom out",
                    onclick: move |_| on_event.call(MapEvent::ViewportChange(ViewportPatch::zoom(step_zoom(view.zoom, -1.0)))),
                    "−"
                }
            }
        }
    }
}

#[component]
fn Marker(marker: PlacedMarker, size: f64, on_event: EventHandler<MapEvent>) -> Element {
    let left = marker.x - size / 2.0;
    let top = marker.y - size;
    let id = marker.id.clone();
    rsx! {
        div {
            class: "marker",
            title: "{marker.title}",
            style: "left: {left}px; top: {top}px; font-size: {size}px; color: {marker.color};",
            onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
            ondoubleclick: move |evt: Event<MouseData>| evt.stop_propagation(),
            onclick: move |evt: Event<MouseData>| {
                evt.stop_propagation();
                on_event.call(MapEvent::MarkerClick(id.clone()));
            },
            svg {
                view_box: "0 0 24 24",
                width: "1em",
                height: "1em",
                path {
                    fill: "currentColor",
                    d: "M12 2C8.13 2 5 5.13 5 9c0 5.25 7 13 7 13s7-7.75 7-13c0-3.87-3.13-7-7-7zm0 9.5a2.5 2.5 0 0 1 0-5 2.5 2.5 0 0 1 0 5z",
                }
            }
        }
    }
}
