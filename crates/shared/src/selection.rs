use crate::models::{Pin, PinId};
use crate::pins::PinRepository;

/// The pin whose popup is open, if any. Holds the id only.
#[derive(Debug, Default)]
pub struct SelectionController {
    selected: Option<PinId>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: impl Into<PinId>) {
        self.selected = Some(id.into());
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The open pin, resolved against `pins`. An id missing from the
    /// repository reads as no selection.
    pub fn selected_pin<'a>(&self, pins: &'a PinRepository) -> Option<&'a Pin> {
        pins.get(self.selected.as_deref()?)
    }

    pub fn is_open(&self, id: &str, pins: &PinRepository) -> bool {
        self.selected_pin(pins).is_some_and(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pins::testing::pin;

    fn repo() -> PinRepository {
        let mut repo = PinRepository::new();
        repo.hydrate(Ok(vec![pin("a", "alice", 1.0, 1.0), pin("b", "bob", 2.0, 2.0)]));
        repo
    }

    #[test]
    fn test_select_overwrites() {
        let pins = repo();
        let mut sel = SelectionController::new();
        sel.select("a");
        sel.select("b");
        assert_eq!(sel.selected_id(), Some("b"));
        assert!(!sel.is_open("a", &pins));
        assert!(sel.is_open("b", &pins));
    }

    #[test]
    fn test_clear() {
        let pins = repo();
        let mut sel = SelectionController::new();
        sel.select("a");
        sel.clear();
        assert!(sel.selected_pin(&pins).is_none());
    }

    #[test]
    fn test_unknown_id_reads_as_closed() {
        let pins = repo();
        let mut sel = SelectionController::new();
        sel.select("gone");
        assert_eq!(sel.selected_id(), Some("gone"));
        assert!(sel.selected_pin(&pins).is_none());
        assert!(!sel.is_open("gone", &pins));
    }
}
