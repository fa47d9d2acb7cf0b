use dioxus::prelude::*;
use pinmap_shared::draft::{Draft, DraftField};
use pinmap_shared::models::{MAX_RATING, MIN_RATING};
use pinmap_shared::orchestrator::MapEvent;
use pinmap_shared::viewport::Viewport;

use crate::components::pin_popup::anchor_style;

/// The "new pin" form, anchored where the user double-clicked.
#[component]
pub fn DraftForm(
    draft: Draft,
    view: Viewport,
    saving: bool,
    error: Option<String>,
    on_event: EventHandler<MapEvent>,
) -> Element {
    let style = anchor_style(&view, draft.location);
    let title = draft.title.clone().unwrap_or_default();
    let desc = draft.desc.clone().unwrap_or_default();
    let rating = if draft.rating == 0 {
        String::new()
    } else {
        draft.rating.to_string()
    };

    rsx! {
        div {
            class: "popup draft-form",
            style: "{style}",
            onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
            ondoubleclick: move |evt: Event<MouseData>| evt.stop_propagation(),
            onwheel: move |evt: Event<WheelData>| evt.stop_propagation(),
            button {
                class: "popup-close",
                title: "Close",
                onclick: move |_| on_event.call(MapEvent::CloseDraftPopup),
                "×"
            }
            form {
                onsubmit: move |evt: Event<FormData>| {
                    evt.prevent_default();
                    on_event.call(MapEvent::SubmitDraft);
                },
                label { "Title" }
                input {
                    r#type: "text",
                    placeholder: "Enter a title",
                    value: "{title}",
                    oninput: move |evt: Event<FormData>| {
                        on_event.call(MapEvent::DraftFieldChanged(DraftField::Title(evt.value())));
                    },
                }
                label { "Review" }
                textarea {
                    placeholder: "Say us something about this place.",
                    value: "{desc}",
                    oninput: move |evt: Event<FormData>| {
                        on_event.call(MapEvent::DraftFieldChanged(DraftField::Desc(evt.value())));
                    },
                }
                label { "Rating" }
                select {
                    value: "{rating}",
                    onchange: move |evt: Event<FormData>| match DraftField::parse_rating(&evt.value()) {
                        Ok(field) => on_event.call(MapEvent::DraftFieldChanged(field)),
                        Err(e) => tracing::warn!(error = %e, "ignored rating choice"),
                    },
                    option { value: "", disabled: true, "Choose a rating" }
                    for n in MIN_RATING..=MAX_RATING {
                        option { value: "{n}", "{n}" }
                    }
                }
                if let Some(message) = error {
                    p { class: "failure", "{message}" }
                }
                button {
                    class: "submit-button",
                    r#type: "submit",
                    disabled: saving,
                    if saving { "Saving…" } else { "Add Pin" }
                }
            }
        }
    }
}
