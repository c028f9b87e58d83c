//! Holds tagged on a wall photo.

use serde::{Deserialize, Serialize};

use super::ProblemValidationError;

/// Maximum holds per problem.
pub const MAX_HOLDS: usize = 100;

/// Role a hold plays in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldType {
    /// Starting hold.
    Start,
    /// Intermediate hold.
    Middle,
    /// Finishing hold.
    Finish,
    /// Usable for feet only.
    FeetOnly,
}

impl HoldType {
    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::Finish => "finish",
            Self::FeetOnly => "feet_only",
        }
    }
}

/// A hold marked on the wall photo.
///
/// Coordinates are in the photo's own frame; the origin is the top-left
/// corner, so both are non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hold {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// What the hold looks like.
    pub description: String,
    /// Tape or hold colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Role in the sequence.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub hold_type: Option<HoldType>,
}

impl Hold {
    /// Validate a hold list supplied by a client.
    ///
    /// Descriptions and colours are trimmed; a blank colour is dropped.
    ///
    /// # Examples
    /// ```
    /// use addon_backend::domain::{Hold, HoldType};
    ///
    /// let holds = Hold::validate_all(vec![Hold {
    ///     x: 0.25,
    ///     y: 0.5,
    ///     description: " sloper ".into(),
    ///     color: Some(" ".into()),
    ///     hold_type: Some(HoldType::Start),
    /// }])
    /// .expect("valid holds");
    /// assert_eq!(holds[0].description, "sloper");
    /// assert!(holds[0].color.is_none());
    /// ```
    pub fn validate_all(holds: Vec<Self>) -> Result<Vec<Self>, ProblemValidationError> {
        if holds.len() > MAX_HOLDS {
            return Err(ProblemValidationError::TooManyHolds { max: MAX_HOLDS });
        }
        holds
            .into_iter()
            .enumerate()
            .map(|(index, hold)| hold.validated(index))
            .collect()
    }

    fn validated(self, index: usize) -> Result<Self, ProblemValidationError> {
        let coordinate_ok = |value: f64| value.is_finite() && value >= 0.0;
        if !coordinate_ok(self.x) || !coordinate_ok(self.y) {
            return Err(ProblemValidationError::InvalidHoldCoordinate { index });
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ProblemValidationError::EmptyHoldDescription { index });
        }
        let color = self
            .color
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        Ok(Self {
            x: self.x,
            y: self.y,
            description: description.to_owned(),
            color,
            hold_type: self.hold_type,
        })
    }
}
