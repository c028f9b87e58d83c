//! Climbing problems: photographed walls with a tagged hold sequence.
//!
//! A problem belongs to the user who created it. Public problems are listed
//! and searched for everyone; private ones are visible to their creator only.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Location, PhotoUrl, UserId};

mod filter;
mod hold;
mod values;

pub use filter::{PROBLEM_LIST_LIMIT, PROBLEM_SEARCH_LIMIT, ProblemFilter};
pub use hold::{Hold, HoldType, MAX_HOLDS};
pub use values::{
    Difficulty, MAX_TAGS, PROBLEM_NAME_MAX, ProblemId, ProblemName, TAG_MAX, Tag, normalise_tags,
};

/// Validation errors raised by problem constructors.
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemValidationError {
    /// The problem id was not a UUID.
    InvalidProblemId,
    /// The name was blank.
    EmptyName,
    /// The name exceeded [`PROBLEM_NAME_MAX`] characters.
    NameTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// A difficulty grade was supplied but blank.
    EmptyDifficulty,
    /// A hold coordinate was negative or not a finite number.
    InvalidHoldCoordinate {
        /// Zero-based hold position.
        index: usize,
    },
    /// A hold had no description.
    EmptyHoldDescription {
        /// Zero-based hold position.
        index: usize,
    },
    /// More than [`MAX_HOLDS`] holds were supplied.
    TooManyHolds {
        /// Maximum permitted count.
        max: usize,
    },
    /// A tag was blank.
    EmptyTag,
    /// A tag exceeded [`TAG_MAX`] characters.
    TagTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// More than [`MAX_TAGS`] distinct tags were supplied.
    TooManyTags {
        /// Maximum permitted count.
        max: usize,
    },
    /// A search term was blank.
    EmptyQuery,
}

impl fmt::Display for ProblemValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProblemId => write!(f, "problem id must be a valid UUID"),
            Self::EmptyName => write!(f, "problem name must not be empty"),
            Self::NameTooLong { max } => {
                write!(f, "problem name must be at most {max} characters")
            }
            Self::EmptyDifficulty => write!(f, "difficulty must not be empty when provided"),
            Self::InvalidHoldCoordinate { index } => {
                write!(f, "hold {index} must have finite, non-negative coordinates")
            }
            Self::EmptyHoldDescription { index } => {
                write!(f, "hold {index} must have a description")
            }
            Self::TooManyHolds { max } => write!(f, "a problem may have at most {max} holds"),
            Self::EmptyTag => write!(f, "tags must not be empty"),
            Self::TagTooLong { max } => write!(f, "tags must be at most {max} characters"),
            Self::TooManyTags { max } => write!(f, "a problem may have at most {max} tags"),
            Self::EmptyQuery => write!(f, "search term must not be empty"),
        }
    }
}

impl std::error::Error for ProblemValidationError {}

/// Persisted climbing problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    /// Store-assigned identifier.
    pub id: ProblemId,
    /// User who created the problem.
    pub creator_id: UserId,
    /// Short display name.
    pub name: ProblemName,
    /// Gym or crag.
    pub location: Location,
    /// Free-text notes.
    pub description: Option<String>,
    /// Grade as written by the setter, e.g. `V4`.
    pub difficulty: Option<Difficulty>,
    /// Photo of the wall the holds were tagged on.
    pub wall_photo_url: Option<PhotoUrl>,
    /// Tagged holds in climbing order.
    pub holds: Vec<Hold>,
    /// Whether other users can see the problem.
    pub is_public: bool,
    /// Distinct labels.
    pub tags: Vec<Tag>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last edit timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Problem {
    /// Whether `user_id` created the problem.
    pub fn is_created_by(&self, user_id: &UserId) -> bool {
        &self.creator_id == user_id
    }

    /// Whether `viewer` may read the problem.
    pub fn is_visible_to(&self, viewer: &UserId) -> bool {
        self.is_public || self.is_created_by(viewer)
    }
}

/// Insert payload for a new problem.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProblem {
    /// Creating user.
    pub creator_id: UserId,
    /// Short display name.
    pub name: ProblemName,
    /// Gym or crag.
    pub location: Location,
    /// Free-text notes.
    pub description: Option<String>,
    /// Grade.
    pub difficulty: Option<Difficulty>,
    /// Wall photo.
    pub wall_photo_url: Option<PhotoUrl>,
    /// Tagged holds.
    pub holds: Vec<Hold>,
    /// Visibility.
    pub is_public: bool,
    /// Labels.
    pub tags: Vec<Tag>,
    /// Creation timestamp, also used as the first `updated_at`.
    pub created_at: DateTime<Utc>,
}

impl NewProblem {
    /// Materialise the record under the store-assigned id.
    pub fn into_problem(self, id: ProblemId) -> Problem {
        Problem {
            id,
            creator_id: self.creator_id,
            name: self.name,
            location: self.location,
            description: self.description,
            difficulty: self.difficulty,
            wall_photo_url: self.wall_photo_url,
            holds: self.holds,
            is_public: self.is_public,
            tags: self.tags,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Partial edit of a problem.
///
/// `None` leaves a field untouched. For the optional text fields,
/// `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemChanges {
    /// Replacement name.
    pub name: Option<ProblemName>,
    /// Replacement location.
    pub location: Option<Location>,
    /// Replacement or cleared description.
    pub description: Option<Option<String>>,
    /// Replacement or cleared grade.
    pub difficulty: Option<Option<Difficulty>>,
    /// Replacement or cleared wall photo.
    pub wall_photo_url: Option<Option<PhotoUrl>>,
    /// Replacement hold list.
    pub holds: Option<Vec<Hold>>,
    /// Replacement visibility.
    pub is_public: Option<bool>,
    /// Replacement tag list.
    pub tags: Option<Vec<Tag>>,
}

impl ProblemChanges {
    /// Whether the edit changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the edit and stamp `updated_at`.
    pub fn apply_to(self, problem: &mut Problem, updated_at: DateTime<Utc>) {
        let Self {
            name,
            location,
            description,
            difficulty,
            wall_photo_url,
            holds,
            is_public,
            tags,
        } = self;
        if let Some(value) = name {
            problem.name = value;
        }
        if let Some(value) = location {
            problem.location = value;
        }
        if let Some(value) = description {
            problem.description = value;
        }
        if let Some(value) = difficulty {
            problem.difficulty = value;
        }
        if let Some(value) = wall_photo_url {
            problem.wall_photo_url = value;
        }
        if let Some(value) = holds {
            problem.holds = value;
        }
        if let Some(value) = is_public {
            problem.is_public = value;
        }
        if let Some(value) = tags {
            problem.tags = value;
        }
        problem.updated_at = updated_at;
    }
}
