use crate::error::DraftError;
use crate::models::{is_valid_rating, LatLng, NewPin};

/// An unsaved pin anchored where the user double-clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub location: LatLng,
    pub title: Option<String>,
    pub desc: Option<String>,
    /// 0 until the user picks a star rating.
    pub rating: u8,
}

impl Draft {
    pub fn at(location: LatLng) -> Self {
        Draft {
            location,
            title: None,
            desc: None,
            rating: 0,
        }
    }

    pub fn to_new_pin(&self, username: &str) -> NewPin {
        NewPin {
            username: username.to_string(),
            title: self.title.clone(),
            desc: self.desc.clone(),
            rating: self.rating,
            lat: self.location.lat,
            long: self.location.long,
        }
    }
}

/// One edit coming from the draft form.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftField {
    Title(String),
    Desc(String),
    Rating(u8),
}

impl DraftField {
    /// Build a rating edit from a `<select>` value such as `"4"`.
    pub fn parse_rating(value: &str) -> Result<Self, DraftError> {
        let rating: u8 = value
            .trim()
            .parse()
            .map_err(|_| DraftError::UnparsableRating(value.to_string()))?;
        if !is_valid_rating(rating) {
            return Err(DraftError::InvalidRating(rating));
        }
        Ok(DraftField::Rating(rating))
    }
}

/// The single in-progress "new pin" workflow: absent, or armed at a location.
#[derive(Debug, Default)]
pub struct DraftController {
    draft: Option<Draft>,
}

impl DraftController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        self.draft.is_some()
    }

    /// Start a fresh draft, discarding any previous one.
    pub fn arm(&mut self, location: LatLng) -> &Draft {
        self.draft.insert(Draft::at(location))
    }

    pub fn update_field(&mut self, field: DraftField) -> Result<&Draft, DraftError> {
        let draft = self.draft.as_mut().ok_or(DraftError::NotArmed)?;
        match field {
            DraftField::Title(title) => draft.title = Some(title),
            DraftField::Desc(desc) => draft.desc = Some(desc),
            DraftField::Rating(rating) => {
                if !is_valid_rating(rating) {
                    return Err(DraftError::InvalidRating(rating));
                }
                draft.rating = rating;
            }
        }
        Ok(draft)
    }

    pub fn cancel(&mut self) -> Option<Draft> {
        self.draft.take()
    }

    /// Snapshot for persisting. The draft stays armed until the caller
    /// confirms the save.
    pub fn submit(&self) -> Option<Draft> {
        self.draft.clone()
    }
}
