use crate::draft::Draft;
use crate::error::{BackendError, SubmitError};
use crate::models::{NewPin, Pin};
use crate::session::Session;

/// The pins API as seen from the client.
#[allow(async_fn_in_trait)]
pub trait PinBackend {
    async fn list_pins(&self) -> Result<Vec<Pin>, BackendError>;
    async fn create_pin(&self, pin: &NewPin) -> Result<Pin, BackendError>;
}

/// Client-side cache of pins in arrival order.
///
/// Filled once at startup and appended to after each successful create.
/// It is never re-fetched; a failed initial load leaves it empty until reload.
#[derive(Debug, Default)]
pub struct PinRepository {
    pins: Vec<Pin>,
}

impl PinRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch and [`hydrate`](Self::hydrate) in one step, for hosts that can
    /// hold the repository across the await. The web page fetches on its own
    /// task and calls `hydrate` when the answer lands.
    pub async fn load_all<B: PinBackend>(&mut self, backend: &B) -> &[Pin] {
        let result = backend.list_pins().await;
        self.hydrate(result);
        &self.pins
    }

    /// Apply the result of the startup fetch.
    ///
    /// Pins created locally while the fetch was in flight are kept after the
    /// fetched ones unless the server already returned them.
    pub fn hydrate(&mut self, result: Result<Vec<Pin>, BackendError>) -> usize {
        match result {
            Ok(fetched) => {
                let local = std::mem::replace(&mut self.pins, fetched);
                for pin in local {
                    if !self.contains(&pin.id) {
                        self.pins.push(pin);
                    }
                }
                tracing::info!(count = self.pins.len(), "loaded pins");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load pins");
            }
        }
        self.pins.len()
    }

    /// Validate, send and [`record_created`](Self::record_created) in one step.
    /// Same caveat as [`load_all`](Self::load_all): the web page sends the
    /// request itself and records the result afterwards.
    pub async fn create<B: PinBackend>(
        &mut self,
        backend: &B,
        draft: &Draft,
        session: &Session,
    ) -> Result<&Pin, SubmitError> {
        let username = session.username.as_deref().ok_or(SubmitError::NotLoggedIn)?;
        let request = draft.to_new_pin(username);
        let result = backend.create_pin(&request).await;
        Ok(self.record_created(result)?)
    }

    /// Apply the result of a create call. The repository is untouched on failure.
    pub fn record_created(&mut self, result: Result<Pin, BackendError>) -> Result<&Pin, BackendError> {
        let pin = result.inspect_err(|e| {
            tracing::error!(error = %e, "failed to create pin");
        })?;
        let index = match self.pins.iter().position(|p| p.id == pin.id) {
            Some(existing) => existing,
            None => {
                tracing::info!(id = %pin.id, "pin created");
                self.pins.push(pin);
                self.pins.len() - 1
            }
        };
        Ok(&self.pins[index])
    }

    pub fn get(&self, id: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter()
    }

    pub fn as_slice(&self) -> &[Pin] {
        &self.pins
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::testing::{pin, FakeBackend};
    use super::*;
    use crate::models::LatLng;

    fn bob() -> Session {
        Session {
            username: Some("bob".to_string()),
        }
    }

    #[test]
    fn test_load_all_fills_in_order() {
        let backend = FakeBackend {
            listed: vec![pin("a", "alice", 1.0, 1.0), pin("b", "bob", 2.0, 2.0)],
            ..Default::default()
        };
        let mut repo = PinRepository::new();
        block_on(repo.load_all(&backend));
        let ids: Vec<&str> = repo.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_load_failure_leaves_empty() {
        let backend = FakeBackend {
            fail_list: true,
            ..Default::default()
        };
        let mut repo = PinRepository::new();
        assert!(block_on(repo.load_all(&backend)).is_empty());
        assert!(repo.is_empty());
    }

    #[test]
    fn test_hydrate_keeps_pins_created_during_load() {
        let mut repo = PinRepository::new();
        repo.record_created(Ok(pin("local", "bob", 0.0, 0.0))).unwrap();
        repo.hydrate(Ok(vec![pin("a", "alice", 1.0, 1.0), pin("local", "bob", 0.0, 0.0)]));
        let ids: Vec<&str> = repo.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "local"]);
    }

    #[test]
    fn test_create_appends_server_pin() {
        let backend = FakeBackend::default();
        let mut repo = PinRepository::new();
        let draft = Draft::at(LatLng::new(5.0, 6.0));
        let created = block_on(repo.create(&backend, &draft, &bob())).unwrap().clone();
        assert_eq!(created.id, "srv-1");
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get("srv-1"), Some(&created));
        assert_eq!(backend.created.borrow()[0].username, "bob");
    }

    #[test]
    fn test_create_failure_leaves_repository_unchanged() {
        let backend = FakeBackend {
            fail_create: true,
            ..Default::default()
        };
        let mut repo = PinRepository::new();
        repo.hydrate(Ok(vec![pin("a", "alice", 1.0, 1.0)]));
        let draft = Draft::at(LatLng::new(5.0, 6.0));
        let err = block_on(repo.create(&backend, &draft, &bob())).unwrap_err();
        assert!(matches!(err, SubmitError::Backend(BackendError::Status { status: 500, .. })));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_create_requires_session() {
        let backend = FakeBackend::default();
        let mut repo = PinRepository::new();
        let draft = Draft::at(LatLng::new(5.0, 6.0));
        let err = block_on(repo.create(&backend, &draft, &Session::default())).unwrap_err();
        assert_eq!(err, SubmitError::NotLoggedIn);
        assert!(backend.created.borrow().is_empty());
    }

    #[test]
    fn test_record_created_ignores_duplicate_id() {
        let mut repo = PinRepository::new();
        repo.record_created(Ok(pin("a", "alice", 1.0, 1.0))).unwrap();
        repo.record_created(Ok(pin("a", "alice", 1.0, 1.0))).unwrap();
        assert_eq!(repo.len(), 1);
    }
}
