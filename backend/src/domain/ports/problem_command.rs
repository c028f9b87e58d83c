//! Driving port for creating, editing and deleting climbing problems.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    Actor, Difficulty, Error, Hold, Location, NewProblem, PhotoUrl, Problem, ProblemChanges,
    ProblemId, ProblemName, ProblemValidationError, UserId, normalise_tags,
};

const fn visible_by_default() -> bool {
    true
}

/// Client fields for a new problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProblemPayload {
    /// Display name.
    pub name: String,
    /// Gym or crag.
    pub location: String,
    /// Optional notes.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional grade; blank means ungraded.
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Optional wall photo URL.
    #[serde(default)]
    pub wall_photo_url: Option<String>,
    /// Tagged holds in order.
    #[serde(default)]
    pub holds: Vec<Hold>,
    /// Visibility; problems are public unless marked otherwise.
    #[serde(default = "visible_by_default")]
    pub is_public: bool,
    /// Labels.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Client fields for a partial edit. Absent fields stay unchanged; an empty
/// string clears description, difficulty or wall photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProblemPayload {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New location.
    #[serde(default)]
    pub location: Option<String>,
    /// New notes.
    #[serde(default)]
    pub description: Option<String>,
    /// New grade.
    #[serde(default)]
    pub difficulty: Option<String>,
    /// New wall photo URL.
    #[serde(default)]
    pub wall_photo_url: Option<String>,
    /// Replacement hold list.
    #[serde(default)]
    pub holds: Option<Vec<Hold>>,
    /// New visibility.
    #[serde(default)]
    pub is_public: Option<bool>,
    /// Replacement tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Request to create a problem owned by the actor.
#[derive(Debug, Clone)]
pub struct CreateProblemRequest {
    /// Creating user.
    pub actor: Actor,
    /// Client fields.
    pub payload: CreateProblemPayload,
}

/// Request to edit a problem; creator only.
#[derive(Debug, Clone)]
pub struct UpdateProblemRequest {
    /// Editing user.
    pub actor: Actor,
    /// Target problem.
    pub problem_id: ProblemId,
    /// Fields to change.
    pub payload: UpdateProblemPayload,
}

/// Request to delete a problem; creator only.
#[derive(Debug, Clone)]
pub struct DeleteProblemRequest {
    /// Deleting user.
    pub actor: Actor,
    /// Target problem.
    pub problem_id: ProblemId,
}

/// Driving port for problem mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProblemCommand: Send + Sync {
    /// Store a new problem owned by the actor.
    async fn create_problem(&self, request: CreateProblemRequest) -> Result<Problem, Error>;

    /// Apply a partial edit and return the stored result.
    async fn update_problem(&self, request: UpdateProblemRequest) -> Result<Problem, Error>;

    /// Remove a problem.
    async fn delete_problem(&self, request: DeleteProblemRequest) -> Result<(), Error>;
}

fn validation_code(err: &ProblemValidationError) -> &'static str {
    match err {
        ProblemValidationError::InvalidProblemId => "invalid_uuid",
        ProblemValidationError::EmptyName => "empty_name",
        ProblemValidationError::NameTooLong { .. } => "name_too_long",
        ProblemValidationError::EmptyDifficulty => "empty_difficulty",
        ProblemValidationError::InvalidHoldCoordinate { .. } => "invalid_hold_coordinate",
        ProblemValidationError::EmptyHoldDescription { .. } => "empty_hold_description",
        ProblemValidationError::TooManyHolds { .. } => "too_many_holds",
        ProblemValidationError::EmptyTag => "empty_tag",
        ProblemValidationError::TagTooLong { .. } => "tag_too_long",
        ProblemValidationError::TooManyTags { .. } => "too_many_tags",
        ProblemValidationError::EmptyQuery => "empty_query",
    }
}

/// Map a problem validation failure on `field` to an invalid-request error.
pub(crate) fn problem_field_error(field: &str, err: &ProblemValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({
        "field": field,
        "code": validation_code(err),
    }))
}

fn parse_location(raw: &str) -> Result<Location, Error> {
    Location::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "location", "code": "empty_location" }))
    })
}

fn parse_photo(raw: &str) -> Result<Option<PhotoUrl>, Error> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    PhotoUrl::new(raw).map(Some).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "wallPhotoUrl", "code": "empty_photo_url" }))
    })
}

fn parse_description(raw: Option<String>) -> Option<String> {
    raw.map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Validate a create payload into an insert record.
pub(crate) fn parse_new_problem(
    creator_id: UserId,
    payload: CreateProblemPayload,
    created_at: DateTime<Utc>,
) -> Result<NewProblem, Error> {
    let CreateProblemPayload {
        name,
        location,
        description,
        difficulty,
        wall_photo_url,
        holds,
        is_public,
        tags,
    } = payload;
    Ok(NewProblem {
        creator_id,
        name: ProblemName::new(name).map_err(|err| problem_field_error("name", &err))?,
        location: parse_location(&location)?,
        description: parse_description(description),
        difficulty: Difficulty::parse_optional(difficulty),
        wall_photo_url: wall_photo_url.as_deref().map(parse_photo).transpose()?.flatten(),
        holds: Hold::validate_all(holds).map_err(|err| problem_field_error("holds", &err))?,
        is_public,
        tags: normalise_tags(tags).map_err(|err| problem_field_error("tags", &err))?,
        created_at,
    })
}

/// Validate an edit payload into field changes.
pub(crate) fn parse_problem_changes(payload: UpdateProblemPayload) -> Result<ProblemChanges, Error> {
    let UpdateProblemPayload {
        name,
        location,
        description,
        difficulty,
        wall_photo_url,
        holds,
        is_public,
        tags,
    } = payload;
    Ok(ProblemChanges {
        name: name
            .map(ProblemName::new)
            .transpose()
            .map_err(|err| problem_field_error("name", &err))?,
        location: location.as_deref().map(parse_location).transpose()?,
        description: description.map(|text| parse_description(Some(text))),
        difficulty: difficulty.map(|grade| Difficulty::parse_optional(Some(grade))),
        wall_photo_url: wall_photo_url.as_deref().map(parse_photo).transpose()?,
        holds: holds
            .map(Hold::validate_all)
            .transpose()
            .map_err(|err| problem_field_error("holds", &err))?,
        is_public,
        tags: tags
            .map(normalise_tags)
            .transpose()
            .map_err(|err| problem_field_error("tags", &err))?,
    })
}

/// Fixture command that validates input and echoes the created problem.
///
/// Nothing is stored, so edits and deletes report the problem as unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProblemCommand;

#[async_trait]
impl ProblemCommand for FixtureProblemCommand {
    async fn create_problem(&self, request: CreateProblemRequest) -> Result<Problem, Error> {
        let new = parse_new_problem(request.actor.user_id, request.payload, Utc::now())?;
        Ok(new.into_problem(ProblemId::random()))
    }

    async fn update_problem(&self, request: UpdateProblemRequest) -> Result<Problem, Error> {
        parse_problem_changes(request.payload)?;
        Err(Error::not_found(format!("problem {} not found", request.problem_id)))
    }

    async fn delete_problem(&self, request: DeleteProblemRequest) -> Result<(), Error> {
        Err(Error::not_found(format!("problem {} not found", request.problem_id)))
    }
}
