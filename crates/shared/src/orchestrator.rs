//! Map interaction state: wires raw map and form events to the session,
//! viewport, pin cache, draft and selection controllers.
//!
//! The orchestrator performs no I/O itself. Events that need the network or a
//! timer return a [`Command`] for the host to carry out, and the host reports
//! the outcome back through `pins_loaded` / `finish_submit` / `resize_timer`.

use crate::config::ControllerConfig;
use crate::draft::{Draft, DraftController, DraftField};
use crate::error::{BackendError, DraftError, SubmitError};
use crate::models::{LatLng, NewPin, Pin, PinId};
use crate::pins::{PinBackend, PinRepository};
use crate::selection::SelectionController;
use crate::session::{Session, SessionStorage, SessionStore};
use crate::viewport::{Transition, Viewport, ViewportController, ViewportPatch};

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    DoubleClick(LatLng),
    MarkerClick(PinId),
    ViewportChange(ViewportPatch),
    DraftFieldChanged(DraftField),
    SubmitDraft,
    ClosePinPopup,
    CloseDraftPopup,
    Resize { width: f64, height: f64, at_ms: f64 },
    ResizeTimer { at_ms: f64 },
    LoginSucceeded(String),
    Logout,
}

/// Work the host has to do on the orchestrator's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Send the request, then call `finish_submit` with the result.
    CreatePin(NewPin),
    /// Call `resize_timer` once the clock reaches `at_ms`.
    ScheduleResizeFlush { at_ms: f64 },
    Animate(Transition),
}

/// A create call that has been handed to the host and not yet resolved.
#[derive(Debug, Clone)]
struct PendingCreate {
    draft_generation: u64,
}

pub struct Orchestrator<S> {
    session: SessionStore<S>,
    viewport: ViewportController,
    pins: PinRepository,
    draft: DraftController,
    selection: SelectionController,
    // Bumped on every arm so a late create result cannot close a newer draft.
    draft_generation: u64,
    pending: Option<PendingCreate>,
    last_error: Option<String>,
}

impl<S: SessionStorage> Orchestrator<S> {
    pub fn new(storage: S, config: ControllerConfig) -> Self {
        Orchestrator {
            session: SessionStore::new(storage, config.session_key),
            viewport: ViewportController::new(
                config.initial_viewport,
                config.resize_interval_ms,
                config.fly_to_duration_ms,
            ),
            pins: PinRepository::new(),
            draft: DraftController::new(),
            selection: SelectionController::new(),
            draft_generation: 0,
            pending: None,
            last_error: None,
        }
    }

    // --- read side -------------------------------------------------------

    pub fn session(&self) -> &Session {
        self.session.session()
    }

    pub fn viewport(&self) -> &Viewport {
        self.viewport.viewport()
    }

    pub fn pins(&self) -> &PinRepository {
        &self.pins
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.current()
    }

    pub fn selected_pin(&self) -> Option<&Pin> {
        self.selection.selected_pin(&self.pins)
    }

    pub fn is_owner(&self, pin: &Pin) -> bool {
        self.session().is_owner(pin)
    }

    pub fn is_saving(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn storage(&self) -> &S {
        self.session.storage()
    }

    // --- startup ---------------------------------------------------------

    pub fn restore_session(&mut self) -> &Session {
        self.session.restore()
    }

    pub fn pins_loaded(&mut self, result: Result<Vec<Pin>, BackendError>) -> usize {
        self.pins.hydrate(result)
    }

    /// Restore the session and load every pin.
    ///
    /// For hosts that can await while holding the orchestrator, such as a
    /// native shell or tests. The web page cannot keep a signal borrowed
    /// across a fetch, so it calls [`restore_session`](Self::restore_session)
    /// and later [`pins_loaded`](Self::pins_loaded) instead.
    pub async fn start<B: PinBackend>(&mut self, backend: &B) {
        self.restore_session();
        self.pins.load_all(backend).await;
    }

    // --- events ----------------------------------------------------------

    pub fn dispatch(&mut self, event: MapEvent) -> Option<Command> {
        match event {
            MapEvent::DoubleClick(at) => {
                self.double_click(at);
                None
            }
            MapEvent::MarkerClick(id) => self.marker_click(&id).map(Command::Animate),
            MapEvent::ViewportChange(patch) => {
                self.change_viewport(patch);
                None
            }
            MapEvent::DraftFieldChanged(field) => {
                if let Err(e) = self.update_draft(field) {
                    tracing::warn!(error = %e, "ignored draft edit");
                }
                None
            }
            MapEvent::SubmitDraft => match self.begin_submit() {
                Ok(request) => Some(Command::CreatePin(request)),
                Err(e) => {
                    tracing::warn!(error = %e, "submit rejected");
                    None
                }
            },
            MapEvent::ClosePinPopup => {
                self.close_pin_popup();
                None
            }
            MapEvent::CloseDraftPopup => {
                self.close_draft();
                None
            }
            MapEvent::Resize {
                width,
                height,
                at_ms,
            } => self
                .resize(width, height, at_ms)
                .map(|at_ms| Command::ScheduleResizeFlush { at_ms }),
            MapEvent::ResizeTimer { at_ms } => {
                self.resize_timer(at_ms);
                // A timer that fired before the deadline leaves the window open.
                self.viewport
                    .resize_deadline()
                    .map(|at_ms| Command::ScheduleResizeFlush { at_ms })
            }
            MapEvent::LoginSucceeded(username) => {
                self.login(username);
                None
            }
            MapEvent::Logout => {
                self.logout();
                None
            }
        }
    }

    /// Open a draft at `at`. Only live while someone is logged in.
    pub fn double_click(&mut self, at: LatLng) -> bool {
        if !self.session().is_logged_in() {
            return false;
        }
        self.draft_generation += 1;
        self.last_error = None;
        self.draft.arm(at);
        true
    }

    /// Open the popup for `id` and center the camera on it.
    pub fn marker_click(&mut self, id: &str) -> Option<Transition> {
        let Some(location) = self.pins.get(id).map(Pin::location) else {
            tracing::warn!(%id, "click on unknown pin");
            return None;
        };
        self.selection.select(id);
        Some(self.viewport.fly_to(location.lat, location.long))
    }

    pub fn change_viewport(&mut self, patch: ViewportPatch) -> Viewport {
        self.viewport.set_camera(patch)
    }

    pub fn update_draft(&mut self, field: DraftField) -> Result<&Draft, DraftError> {
        self.draft.update_field(field)
    }

    /// Snapshot the draft into a create request and mark it in flight.
    pub fn begin_submit(&mut self) -> Result<NewPin, SubmitError> {
        if self.pending.is_some() {
            return Err(SubmitError::InFlight);
        }
        let draft = self.draft.submit().ok_or(SubmitError::NoDraft)?;
        let username = self
            .session()
            .username
            .as_deref()
            .ok_or(SubmitError::NotLoggedIn)?;
        let request = draft.to_new_pin(username);
        self.pending = Some(PendingCreate {
            draft_generation: self.draft_generation,
        });
        Ok(request)
    }

    /// Apply the outcome of the create call started by `begin_submit`.
    ///
    /// Success appends the pin and closes the draft it was made from. Failure
    /// keeps the draft, fields intact, so the user can submit again.
    pub fn finish_submit(&mut self, result: Result<Pin, BackendError>) -> Result<&Pin, BackendError> {
        let pending = self.pending.take();
        match self.pins.record_created(result) {
            Ok(pin) => {
                if pending.is_some_and(|p| p.draft_generation == self.draft_generation) {
                    self.draft.cancel();
                }
                self.last_error = None;
                Ok(pin)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Submit the open draft through `backend` and wait for the result.
    ///
    /// The web page splits this into [`begin_submit`](Self::begin_submit),
    /// its own request, and [`finish_submit`](Self::finish_submit).
    pub async fn submit<B: PinBackend>(&mut self, backend: &B) -> Result<Pin, SubmitError> {
        let request = self.begin_submit()?;
        let result = backend.create_pin(&request).await;
        Ok(self.finish_submit(result)?.clone())
    }

    pub fn close_pin_popup(&mut self) {
        self.selection.clear();
    }

    pub fn close_draft(&mut self) {
        self.last_error = None;
        self.draft.cancel();
    }

    /// Throttled window resize. Returns the deadline for `resize_timer`
    /// when a new throttle window opened.
    pub fn resize(&mut self, width: f64, height: f64, now_ms: f64) -> Option<f64> {
        self.viewport.on_resize(width, height, now_ms)
    }

    pub fn resize_timer(&mut self, now_ms: f64) -> Option<Viewport> {
        self.viewport.flush_resize(now_ms)
    }

    pub fn login(&mut self, username: impl Into<String>) -> &Session {
        self.session.login(username)
    }

    pub fn logout(&mut self) -> &Session {
        self.session.logout()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::pins::testing::{pin, FakeBackend};
    use crate::session::MemoryStorage;

    fn orchestrator() -> Orchestrator<MemoryStorage> {
        Orchestrator::new(MemoryStorage::default(), ControllerConfig::default())
    }

    fn logged_in(username: &str) -> Orchestrator<MemoryStorage> {
        let mut o = orchestrator();
        o.login(username);
        o
    }

    #[test]
    fn test_start_restores_session_and_loads_pins() {
        let mut o = Orchestrator::new(
            MemoryStorage::with_value("user", "alice"),
            ControllerConfig::default(),
        );
        let backend = FakeBackend {
            listed: vec![pin("p1", "alice", 10.0, 20.0)],
            ..Default::default()
        };
        block_on(o.start(&backend));
        assert_eq!(o.session().username.as_deref(), Some("alice"));
        assert_eq!(o.pins().len(), 1);
    }

    #[test]
    fn test_split_host_path_matches_awaited_entry_points() {
        let backend = FakeBackend {
            listed: vec![pin("p1", "alice", 10.0, 20.0)],
            ..Default::default()
        };
        let storage = || MemoryStorage::with_value("user", "alice");

        let mut awaited = Orchestrator::new(storage(), ControllerConfig::default());
        block_on(awaited.start(&backend));
        awaited.double_click(LatLng::new(5.0, 5.0));
        block_on(awaited.submit(&backend)).unwrap();

        let mut split = Orchestrator::new(storage(), ControllerConfig::default());
        split.restore_session();
        split.pins_loaded(block_on(backend.list_pins()));
        split.double_click(LatLng::new(5.0, 5.0));
        let Some(Command::CreatePin(request)) = split.dispatch(MapEvent::SubmitDraft) else {
            panic!("submit should ask the host to create the pin");
        };
        split.finish_submit(block_on(backend.create_pin(&request))).unwrap();

        assert_eq!(split.session(), awaited.session());
        assert_eq!(split.pins().len(), 2);
        assert_eq!(split.pins().as_slice()[0], awaited.pins().as_slice()[0]);
        assert_eq!(split.draft(), awaited.draft());
        assert!(!split.is_saving());
    }

    #[test]
    fn test_start_with_failing_backend_is_not_fatal() {
        let mut o = orchestrator();
        let backend = FakeBackend {
            fail_list: true,
            ..Default::default()
        };
        block_on(o.start(&backend));
        assert!(o.pins().is_empty());
        assert_eq!(o.viewport(), &Viewport::default());
    }

    #[test]
    fn test_double_click_without_session_does_nothing() {
        let mut o = orchestrator();
        assert!(!o.double_click(LatLng::new(1.0, 2.0)));
        assert!(o.dispatch(MapEvent::DoubleClick(LatLng::new(1.0, 2.0))).is_none());
        assert!(o.draft().is_none());
    }

    #[test]
    fn test_double_click_does_not_clear_selection() {
        let mut o = logged_in("bob");
        o.pins_loaded(Ok(vec![pin("p1", "alice", 10.0, 20.0)]));
        o.marker_click("p1");
        o.double_click(LatLng::new(5.0, 5.0));
        assert_eq!(o.selected_pin().map(|p| p.id.as_str()), Some("p1"));
        assert!(o.draft().is_some());
    }

    #[test]
    fn test_marker_click_switches_selection_and_centers() {
        let mut o = orchestrator();
        o.pins_loaded(Ok(vec![
            pin("a", "alice", 1.0, 2.0),
            pin("b", "bob", 30.0, 40.0),
        ]));
        o.dispatch(MapEvent::MarkerClick("a".to_string()));
        let cmd = o.dispatch(MapEvent::MarkerClick("b".to_string()));
        assert!(matches!(cmd, Some(Command::Animate(t)) if t.to.latitude == 30.0));
        assert_eq!(o.selected_pin().map(|p| p.id.as_str()), Some("b"));
        assert_eq!((o.viewport().latitude, o.viewport().longitude), (30.0, 40.0));
    }

    #[test]
    fn test_marker_click_on_unknown_pin_is_ignored() {
        let mut o = orchestrator();
        assert!(o.marker_click("nope").is_none());
        assert!(o.selected_pin().is_none());
        assert_eq!(o.viewport(), &Viewport::default());
    }

    #[test]
    fn test_close_popups() {
        let mut o = logged_in("bob");
        o.pins_loaded(Ok(vec![pin("a", "alice", 1.0, 2.0)]));
        o.dispatch(MapEvent::MarkerClick("a".to_string()));
        o.dispatch(MapEvent::DoubleClick(LatLng::new(0.0, 0.0)));
        o.dispatch(MapEvent::ClosePinPopup);
        assert!(o.selected_pin().is_none());
        assert!(o.draft().is_some());
        o.dispatch(MapEvent::CloseDraftPopup);
        assert!(o.draft().is_none());
    }

    #[test]
    fn test_submit_success_appends_and_closes_draft() {
        let mut o = logged_in("bob");
        let backend = FakeBackend::default();
        o.double_click(LatLng::new(5.0, 5.0));
        let created = block_on(o.submit(&backend)).unwrap();
        assert_eq!(created.id, "srv-1");
        assert_eq!(o.pins().len(), 1);
        assert!(o.draft().is_none());
        assert!(!o.is_saving());
    }

    #[test]
    fn test_submit_failure_keeps_draft_fields() {
        let mut o = logged_in("bob");
        let backend = FakeBackend {
            fail_create: true,
            ..Default::default()
        };
        o.double_click(LatLng::new(5.0, 5.0));
        o.update_draft(DraftField::Title("Park".to_string())).unwrap();
        o.update_draft(DraftField::Rating(5)).unwrap();
        let before = o.draft().cloned();

        assert!(block_on(o.submit(&backend)).is_err());
        assert_eq!(o.pins().len(), 0);
        assert_eq!(o.draft().cloned(), before);
        assert!(o.last_error().is_some());
        assert!(!o.is_saving());

        // Retry without re-entering the location.
        let backend = FakeBackend::default();
        block_on(o.submit(&backend)).unwrap();
        assert!(o.draft().is_none());
        assert!(o.last_error().is_none());
    }

    #[test]
    fn test_second_submit_rejected_while_in_flight() {
        let mut o = logged_in("bob");
        o.double_click(LatLng::new(5.0, 5.0));
        assert!(matches!(o.dispatch(MapEvent::SubmitDraft), Some(Command::CreatePin(_))));
        assert!(o.is_saving());
        assert!(o.dispatch(MapEvent::SubmitDraft).is_none());
        assert_eq!(o.begin_submit(), Err(SubmitError::InFlight));
    }

    #[test]
    fn test_submit_without_draft() {
        let mut o = logged_in("bob");
        assert_eq!(o.begin_submit(), Err(SubmitError::NoDraft));
        assert!(!o.is_saving());
    }

    #[test]
    fn test_submit_after_logout_is_rejected() {
        let mut o = logged_in("bob");
        o.double_click(LatLng::new(5.0, 5.0));
        o.logout();
        assert_eq!(o.begin_submit(), Err(SubmitError::NotLoggedIn));
        assert!(o.draft().is_some());
    }

    #[test]
    fn test_late_result_does_not_close_newer_draft() {
        let mut o = logged_in("bob");
        o.double_click(LatLng::new(5.0, 5.0));
        o.begin_submit().unwrap();
        o.double_click(LatLng::new(7.0, 7.0));
        o.finish_submit(Ok(pin("srv-1", "bob", 5.0, 5.0))).unwrap();
        assert_eq!(o.pins().len(), 1);
        assert_eq!(o.draft().map(|d| d.location), Some(LatLng::new(7.0, 7.0)));
    }

    #[test]
    fn test_result_after_cancel_still_appends() {
        let mut o = logged_in("bob");
        o.double_click(LatLng::new(5.0, 5.0));
        o.begin_submit().unwrap();
        o.close_draft();
        o.finish_submit(Ok(pin("srv-1", "bob", 5.0, 5.0))).unwrap();
        assert_eq!(o.pins().len(), 1);
        assert!(o.draft().is_none());
    }

    #[test]
    fn test_invalid_rating_event_is_ignored() {
        let mut o = logged_in("bob");
        o.double_click(LatLng::new(5.0, 5.0));
        o.dispatch(MapEvent::DraftFieldChanged(DraftField::Rating(9)));
        assert_eq!(o.draft().map(|d| d.rating), Some(0));
    }

    #[test]
    fn test_resize_events_schedule_one_flush() {
        let mut o = orchestrator();
        let first = o.dispatch(MapEvent::Resize {
            width: 800.0,
            height: 600.0,
            at_ms: 100.0,
        });
        assert_eq!(first, Some(Command::ScheduleResizeFlush { at_ms: 2100.0 }));
        for (i, w) in [900.0, 1000.0, 1100.0].into_iter().enumerate() {
            let cmd = o.dispatch(MapEvent::Resize {
                width: w,
                height: 500.0,
                at_ms: 200.0 + i as f64 * 100.0,
            });
            assert!(cmd.is_none());
        }
        o.dispatch(MapEvent::ResizeTimer { at_ms: 2100.0 });
        assert_eq!((o.viewport().width, o.viewport().height), (1100.0, 500.0));
    }

    #[test]
    fn test_early_resize_timer_reschedules_flush() {
        let mut o = orchestrator();
        let cmd = o.dispatch(MapEvent::Resize {
            width: 640.0,
            height: 480.0,
            at_ms: 1000.0,
        });
        assert_eq!(cmd, Some(Command::ScheduleResizeFlush { at_ms: 3000.0 }));

        let early = o.dispatch(MapEvent::ResizeTimer { at_ms: 2999.0 });
        assert_eq!(early, Some(Command::ScheduleResizeFlush { at_ms: 3000.0 }));
        assert_eq!(o.viewport().width, Viewport::default().width);

        assert!(o.dispatch(MapEvent::ResizeTimer { at_ms: 3000.0 }).is_none());
        assert_eq!((o.viewport().width, o.viewport().height), (640.0, 480.0));
    }

    #[test]
    fn test_viewport_change_merges() {
        let mut o = orchestrator();
        o.dispatch(MapEvent::ViewportChange(ViewportPatch::zoom(8.0)));
        assert_eq!(o.viewport().zoom, 8.0);
        assert_eq!(o.viewport().latitude, Viewport::default().latitude);
    }

    #[test]
    fn test_login_and_logout_events() {
        let mut o = orchestrator();
        o.dispatch(MapEvent::LoginSucceeded("carol".to_string()));
        assert_eq!(o.storage().get("user").as_deref(), Some("carol"));
        assert!(o.double_click(LatLng::new(0.0, 0.0)));
        o.dispatch(MapEvent::Logout);
        assert!(o.session().username.is_none());
        assert!(o.storage().get("user").is_none());
        o.dispatch(MapEvent::Logout);
        assert!(o.session().username.is_none());
    }

    #[test]
    fn test_ownership_check() {
        let mut o = logged_in("alice");
        o.pins_loaded(Ok(vec![pin("a", "alice", 1.0, 2.0), pin("b", "bob", 1.0, 2.0)]));
        let owned: Vec<bool> = o.pins().iter().map(|p| o.is_owner(p)).collect();
        assert_eq!(owned, vec![true, false]);
    }

    #[test]
    fn test_browse_select_and_add_scenario() {
        let mut o = orchestrator();
        let backend = FakeBackend {
            listed: vec![pin("p1", "alice", 10.0, 20.0)],
            ..Default::default()
        };
        block_on(o.start(&backend));
        assert_eq!(o.pins().len(), 1);
        assert_eq!(o.pins().get("p1").map(|p| p.rating), Some(4));

        o.dispatch(MapEvent::MarkerClick("p1".to_string()));
        assert_eq!(o.selected_pin().map(|p| p.id.as_str()), Some("p1"));
        assert_eq!((o.viewport().latitude, o.viewport().longitude), (10.0, 20.0));

        o.dispatch(MapEvent::LoginSucceeded("bob".to_string()));
        o.dispatch(MapEvent::DoubleClick(LatLng::new(5.0, 5.0)));
        assert_eq!(o.draft(), Some(&Draft::at(LatLng::new(5.0, 5.0))));

        o.dispatch(MapEvent::DraftFieldChanged(DraftField::Title("Park".to_string())));
        o.dispatch(MapEvent::DraftFieldChanged(DraftField::Rating(5)));
        let Some(Command::CreatePin(request)) = o.dispatch(MapEvent::SubmitDraft) else {
            panic!("expected a create command");
        };
        assert_eq!(
            request,
            NewPin {
                username: "bob".to_string(),
                title: Some("Park".to_string()),
                desc: None,
                rating: 5,
                lat: 5.0,
                long: 5.0,
            }
        );
        let result = block_on(backend.create_pin(&request));
        o.finish_submit(result).unwrap();
        assert_eq!(o.pins().len(), 2);
        assert!(o.draft().is_none());
    }
}
