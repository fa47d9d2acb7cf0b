use chrono::{DateTime, Utc};
use dioxus::prelude::*;
use pinmap_shared::models::{LatLng, Pin, MAX_RATING};
use pinmap_shared::time::time_ago;
use pinmap_shared::viewport::Viewport;

use crate::coords;

/// Popups open to the right of their anchor, like a map tooltip.
const POPUP_OFFSET_X: f64 = 12.0;

/// CSS placement for a popup anchored at `at`.
pub fn anchor_style(view: &Viewport, at: LatLng) -> String {
    let (x, y) = coords::to_screen(view, at);
    format!("left: {}px; top: {}px;", x + POPUP_OFFSET_X, y)
}

/// Seconds between `created_at` (RFC 3339) and `now`, if the timestamp parses.
fn elapsed_since(created_at: &str, now: DateTime<Utc>) -> Option<i64> {
    let created = DateTime::parse_from_rfc3339(created_at).ok()?;
    Some((now - created.with_timezone(&Utc)).num_seconds())
}

fn created_label(created_at: &str, now: DateTime<Utc>) -> String {
    match elapsed_since(created_at, now) {
        Some(secs) => time_ago(secs),
        None => created_at.to_string(),
    }
}

fn stars(rating: u8) -> String {
    "★".repeat(rating.min(MAX_RATING) as usize)
}

#[component]
pub fn PinPopup(pin: Pin, view: Viewport, owner: bool, on_close: EventHandler<()>) -> Element {
    let style = anchor_style(&view, pin.location());
    let created = created_label(&pin.created_at, Utc::now());
    let rating = stars(pin.rating);

    rsx! {
        div {
            class: "popup pin-card",
            style: "{style}",
            onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
            ondoubleclick: move |evt: Event<MouseData>| evt.stop_propagation(),
            onwheel: move |evt: Event<WheelData>| evt.stop_propagation(),
            button {
                class: "popup-close",
                title: "Close",
                onclick: move |_| on_close.call(()),
                "×"
            }
            label { "Place" }
            h4 { class: "place", "{pin.title}" }
            label { "Review" }
            p { class: "desc", "{pin.desc}" }
            label { "Rating" }
            div { class: "stars", "{rating}" }
            label { "Information" }
            span { class: "username",
                "Created by "
                b { "{pin.username}" }
            }
            span { class: "date", "{created}" }
            // Owner-only controls; edit and delete are not wired to the API.
            if owner {
                div { class: "owner-actions",
                    button { class: "icon", title: "Edit", disabled: true, "✎" }
                    button { class: "icon", title: "Delete", disabled: true, "🗑" }
                }
            }
        }
    }
}
