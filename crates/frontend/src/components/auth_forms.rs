use dioxus::prelude::*;
use pinmap_shared::models::{LoginRequest, RegisterRequest};
use pinmap_shared::orchestrator::MapEvent;
use pinmap_shared::session::Session;

use crate::api::HttpPinBackend;

#[derive(Debug, Clone, Copy, PartialEq)]
enum AuthDialog {
    Login,
    Register,
}

/// Top-right buttons: log in / register, or the current user and log out.
#[component]
pub fn AuthBar(session: Session, on_event: EventHandler<MapEvent>) -> Element {
    let mut dialog = use_signal(|| None::<AuthDialog>);

    rsx! {
        div { class: "auth-bar",
            if let Some(username) = session.username.clone() {
                span { class: "current-user", "{username}" }
                button {
                    class: "button logout",
                    onclick: move |_| on_event.call(MapEvent::Logout),
                    "Log out"
                }
            } else {
                button {
                    class: "button login",
                    onclick: move |_| dialog.set(Some(AuthDialog::Login)),
                    "Log in"
                }
                button {
                    class: "button register",
                    onclick: move |_| dialog.set(Some(AuthDialog::Register)),
                    "Register"
                }
            }
        }
        {match *dialog.read() {
            Some(AuthDialog::Login) if !session.is_logged_in() => rsx! {
                LoginForm {
                    on_success: move |username: String| {
                        dialog.set(None);
                        on_event.call(MapEvent::LoginSucceeded(username));
                    },
                    on_close: move |_| dialog.set(None),
                }
            },
            Some(AuthDialog::Register) => rsx! {
                RegisterForm { on_close: move |_| dialog.set(None) }
            },
            _ => rsx! {},
        }}
    }
}

#[component]
fn LoginForm(on_success: EventHandler<String>, on_close: EventHandler<()>) -> Element {
    let mut username = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut failure = use_signal(|| None::<String>);

    rsx! {
        div { class: "auth-dialog",
            button { class: "popup-close", onclick: move |_| on_close.call(()), "×" }
            h3 { "Pin Map" }
            form {
                onsubmit: move |evt: Event<FormData>| {
                    evt.prevent_default();
                    let request = LoginRequest {
                        username: username.read().trim().to_string(),
                        password: password.read().clone(),
                    };
                    spawn(async move {
                        match HttpPinBackend::same_origin().login(&request).await {
                            Ok(user) => on_success.call(user.username),
                            Err(e) => {
                                tracing::warn!(error = %e, "login failed");
                                failure.set(Some("Something went wrong!".to_string()));
                            }
                        }
                    });
                },
                input {
                    r#type: "text",
                    placeholder: "username",
                    value: "{username}",
                    oninput: move |evt: Event<FormData>| username.set(evt.value()),
                }
                input {
                    r#type: "password",
                    placeholder: "password",
                    value: "{password}",
                    oninput: move |evt: Event<FormData>| password.set(evt.value()),
                }
                button { class: "button", r#type: "submit", "Log in" }
                if let Some(message) = failure() {
                    span { class: "failure", "{message}" }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RegisterOutcome {
    Success,
    Failure,
}

#[component]
fn RegisterForm(on_close: EventHandler<()>) -> Element {
    let mut username = use_signal(String::new);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut outcome = use_signal(|| None::<RegisterOutcome>);

    rsx! {
        div { class: "auth-dialog",
            button { class: "popup-close", onclick: move |_| on_close.call(()), "×" }
            h3 { "Pin Map" }
            form {
                onsubmit: move |evt: Event<FormData>| {
                    evt.prevent_default();
                    let request = RegisterRequest {
                        username: username.read().trim().to_string(),
                        email: email.read().trim().to_string(),
                        password: password.read().clone(),
                    };
                    spawn(async move {
                        match HttpPinBackend::same_origin().register(&request).await {
                            Ok(_) => outcome.set(Some(RegisterOutcome::Success)),
                            Err(e) => {
                                tracing::warn!(error = %e, "registration failed");
                                outcome.set(Some(RegisterOutcome::Failure));
                            }
                        }
                    });
                },
                input {
                    r#type: "text",
                    placeholder: "username",
                    value: "{username}",
                    oninput: move |evt: Event<FormData>| username.set(evt.value()),
                }
                input {
                    r#type: "email",
                    placeholder: "email",
                    value: "{email}",
                    oninput: move |evt: Event<FormData>| email.set(evt.value()),
                }
                input {
                    r#type: "password",
                    placeholder: "password",
                    value: "{password}",
                    oninput: move |evt: Event<FormData>| password.set(evt.value()),
                }
                button { class: "button", r#type: "submit", "Register" }
                {match outcome() {
                    Some(RegisterOutcome::Success) => rsx! {
                        span { class: "success", "Successful. You can log in now!" }
                    },
                    Some(RegisterOutcome::Failure) => rsx! {
                        span { class: "failure", "Something went wrong!" }
                    },
                    None => rsx! {},
                }}
            }
        }
    }
}
