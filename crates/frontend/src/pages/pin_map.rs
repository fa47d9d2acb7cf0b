use dioxus::prelude::*;
use futures::StreamExt;
use gloo_timers::future::TimeoutFuture;
use pinmap_shared::config::ControllerConfig;
use pinmap_shared::orchestrator::{Command, MapEvent, Orchestrator};
use pinmap_shared::pins::PinBackend;
use pinmap_shared::viewport::{Transition, Viewport};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use crate::api::HttpPinBackend;
use crate::components::auth_forms::AuthBar;
use crate::components::draft_form::DraftForm;
use crate::components::map_view::MapView;
use crate::components::pin_popup::PinPopup;
use crate::storage::LocalStorage;

type MapState = Orchestrator<LocalStorage>;

/// ~60 fps for the fly-to animation.
const FRAME_MS: u32 = 16;

fn now_ms() -> f64 {
    js_sys::Date::now()
}

fn window_size() -> Option<(f64, f64)> {
    let window = web_sys::window()?;
    let width = window.inner_width().ok()?.as_f64()?;
    let height = window.inner_height().ok()?.as_f64()?;
    Some((width, height))
}

/// Controller config with the initial viewport sized to the browser window.
fn initial_config() -> ControllerConfig {
    let mut config = ControllerConfig::default();
    if let Some((width, height)) = window_size() {
        config.initial_viewport.width = width;
        config.initial_viewport.height = height;
    }
    config
}

/// Camera override drawn while a fly-to transition plays.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Animation {
    id: u64,
    frame: Viewport,
}

/// Carry out a command returned by the orchestrator.
fn run_command(mut map: Signal<MapState>, animation: Signal<Option<Animation>>, command: Command) {
    match command {
        Command::CreatePin(request) => {
            spawn(async move {
                let result = HttpPinBackend::same_origin().create_pin(&request).await;
                let outcome = map.write().finish_submit(result).map(|pin| pin.id.clone());
                match outcome {
                    Ok(id) => tracing::info!(%id, "pin saved"),
                    Err(e) => tracing::warn!(error = %e, "pin was not saved"),
                }
            });
        }
        Command::ScheduleResizeFlush { at_ms } => {
            spawn(async move {
                let delay = (at_ms - now_ms()).max(0.0);
                TimeoutFuture::new(delay.ceil() as u32).await;
                // Report the deadline itself; the clock may read a hair early.
                let command = map.write().dispatch(MapEvent::ResizeTimer {
                    at_ms: at_ms.max(now_ms()),
                });
                if let Some(command) = command {
                    run_command(map, animation, command);
                }
            });
        }
        Command::Animate(transition) => play(animation, transition),
    }
}

fn play(mut animation: Signal<Option<Animation>>, transition: Transition) {
    // A newer transition supersedes the one still playing.
    let id = animation.peek().map_or(0, |a| a.id) + 1;
    animation.set(Some(Animation {
        id,
        frame: transition.from,
    }));
    spawn(async move {
        let started = now_ms();
        loop {
            TimeoutFuture::new(FRAME_MS).await;
            if animation.peek().as_ref().map(|a| a.id) != Some(id) {
                return;
            }
            let elapsed = now_ms() - started;
            if transition.is_finished(elapsed) {
                animation.set(None);
                return;
            }
            animation.set(Some(Animation {
                id,
                frame: transition.sample(elapsed),
            }));
        }
    });
}

#[component]
pub fn PinMap() -> Element {
    let mut map = use_signal(|| {
        let mut state = Orchestrator::new(LocalStorage, initial_config());
        state.restore_session();
        state
    });
    let mut animation = use_signal(|| None::<Animation>);

    let mut dispatch = move |event: MapEvent| {
        if matches!(event, MapEvent::ViewportChange(_)) {
            // The user took over the camera.
            animation.set(None);
        }
        let command = map.write().dispatch(event);
        if let Some(command) = command {
            run_command(map, animation, command);
        }
    };

    // Initial load. Never retried; a failure leaves the map empty.
    use_future(move || async move {
        let result = HttpPinBackend::same_origin().list_pins().await;
        let count = map.write().pins_loaded(result);
        tracing::info!(count, "pins loaded");
    });

    let resize = use_coroutine(move |mut rx: UnboundedReceiver<(f64, f64)>| async move {
        while let Some((width, height)) = rx.next().await {
            dispatch(MapEvent::Resize {
                width,
                height,
                at_ms: now_ms(),
            });
        }
    });

    use_hook(move || {
        let tx = resize.tx();
        let on_resize = Closure::<dyn FnMut()>::new(move || {
            if let Some(size) = window_size() {
                if let Err(e) = tx.unbounded_send(size) {
                    tracing::debug!(error = %e, "resize listener outlived the map");
                }
            }
        });
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref()) {
                tracing::warn!(error = ?e, "could not watch window size");
            }
        }
        // Lives as long as the page.
        on_resize.forget();
    });

    let state = map.read();
    let view = animation.read().map_or(*state.viewport(), |a| a.frame);
    let session = state.session().clone();
    let pins = state.pins().as_slice().to_vec();
    let selected = state.selected_pin().cloned();
    let owner = selected.as_ref().is_some_and(|pin| state.is_owner(pin));
    let draft = state.draft().cloned();
    let saving = state.is_saving();
    let error = state.last_error().map(str::to_string);
    drop(state);

    rsx! {
        div { class: "app",
            MapView {
                view,
                pins,
                session: session.clone(),
                on_event: move |event| dispatch(event),
                if let Some(pin) = selected {
                    PinPopup {
                        pin,
                        view,
                        owner,
                        on_close: move |_| dispatch(MapEvent::ClosePinPopup),
                    }
                }
                if let Some(draft) = draft {
                    DraftForm {
                        draft,
                        view,
                        saving,
                        error,
                        on_event: move |event| dispatch(event),
                    }
                }
            }
            AuthBar { session, on_event: move |event| dispatch(event) }
        }
    }
}
