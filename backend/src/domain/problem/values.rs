//! Validated scalar values used by problem records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ProblemValidationError;

/// Maximum characters in a [`ProblemName`].
pub const PROBLEM_NAME_MAX: usize = 120;
/// Maximum characters in a [`Tag`].
pub const TAG_MAX: usize = 32;
/// Maximum distinct tags per problem.
pub const MAX_TAGS: usize = 20;

/// Stable problem identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(Uuid);

impl ProblemId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProblemId {
    type Err = ProblemValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ProblemValidationError::InvalidProblemId)
    }
}

/// Problem display name, trimmed, 1 to [`PROBLEM_NAME_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProblemName(String);

impl ProblemName {
    /// Validate and construct a [`ProblemName`].
    ///
    /// # Examples
    /// ```
    /// use addon_backend::domain::ProblemName;
    ///
    /// assert_eq!(ProblemName::new("  Crimp line ").expect("valid").as_ref(), "Crimp line");
    /// assert!(ProblemName::new(" ").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self, ProblemValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ProblemValidationError::EmptyName);
        }
        if trimmed.chars().count() > PROBLEM_NAME_MAX {
            return Err(ProblemValidationError::NameTooLong {
                max: PROBLEM_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for ProblemName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ProblemName> for String {
    fn from(value: ProblemName) -> Self {
        value.0
    }
}

impl TryFrom<String> for ProblemName {
    type Error = ProblemValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Free-text grade, trimmed and non-empty. Grading systems vary by gym.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Difficulty(String);

impl Difficulty {
    /// Validate and construct a [`Difficulty`].
    pub fn new(grade: impl Into<String>) -> Result<Self, ProblemValidationError> {
        let grade = grade.into();
        let trimmed = grade.trim();
        if trimmed.is_empty() {
            return Err(ProblemValidationError::EmptyDifficulty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Optional grade from client input; blank input means "no grade".
    pub fn parse_optional(grade: Option<String>) -> Option<Self> {
        grade.and_then(|value| Self::new(value).ok())
    }
}

impl AsRef<str> for Difficulty {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Difficulty> for String {
    fn from(value: Difficulty) -> Self {
        value.0
    }
}

impl TryFrom<String> for Difficulty {
    type Error = ProblemValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Label attached to a problem, trimmed, 1 to [`TAG_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// Validate and construct a [`Tag`].
    pub fn new(tag: impl Into<String>) -> Result<Self, ProblemValidationError> {
        let tag = tag.into();
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(ProblemValidationError::EmptyTag);
        }
        if trimmed.chars().count() > TAG_MAX {
            return Err(ProblemValidationError::TagTooLong { max: TAG_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Tag> for String {
    fn from(value: Tag) -> Self {
        value.0
    }
}

impl TryFrom<String> for Tag {
    type Error = ProblemValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validate raw tags, dropping case-insensitive duplicates and keeping the
/// first spelling of each.
///
/// # Examples
/// ```
/// use addon_backend::domain::normalise_tags;
///
/// let tags = normalise_tags(vec!["Crimpy".into(), " crimpy ".into(), "slab".into()])
///     .expect("valid tags");
/// let names: Vec<&str> = tags.iter().map(AsRef::as_ref).collect();
/// assert_eq!(names, ["Crimpy", "slab"]);
/// ```
pub fn normalise_tags(raw: Vec<String>) -> Result<Vec<Tag>, ProblemValidationError> {
    let mut tags: Vec<Tag> = Vec::with_capacity(raw.len());
    for value in raw {
        let tag = Tag::new(value)?;
        if !tags
            .iter()
            .any(|existing| existing.0.eq_ignore_ascii_case(&tag.0))
        {
            tags.push(tag);
        }
    }
    if tags.len() > MAX_TAGS {
        return Err(ProblemValidationError::TooManyTags { max: MAX_TAGS });
    }
    Ok(tags)
}
