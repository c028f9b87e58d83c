//! Climbing problem service implementing the problem driving ports.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    CreateProblemRequest, DeleteProblemRequest, ProblemCommand, ProblemQuery, ProblemRepository,
    ProblemRepositoryError, UpdateProblemRequest, parse_new_problem, parse_problem_changes,
    problem_field_error,
};
use crate::domain::{
    Error, PROBLEM_LIST_LIMIT, PROBLEM_SEARCH_LIMIT, Problem, ProblemFilter, ProblemId, UserId,
};

fn map_repository_error(error: ProblemRepositoryError) -> Error {
    match error {
        ProblemRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("problem store unavailable: {message}"))
        }
        ProblemRepositoryError::Query { message } => {
            Error::internal(format!("problem store error: {message}"))
        }
        ProblemRepositoryError::NotFound { problem_id } => {
            Error::not_found(format!("problem {problem_id} not found"))
        }
    }
}

fn not_found(id: &ProblemId) -> Error {
    Error::not_found(format!("problem {id} not found"))
}

/// Problem use-cases over a [`ProblemRepository`].
#[derive(Clone)]
pub struct ProblemService {
    repository: Arc<dyn ProblemRepository>,
    clock: Arc<dyn Clock>,
}

impl ProblemService {
    /// Build the service.
    pub fn new(repository: Arc<dyn ProblemRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    async fn list(&self, filter: ProblemFilter, limit: u32) -> Result<Vec<Problem>, Error> {
        self.repository
            .list(&filter, limit)
            .await
            .map_err(map_repository_error)
    }

    async fn text_listing(
        &self,
        variant: fn(String) -> ProblemFilter,
        field: &str,
        term: &str,
        limit: u32,
    ) -> Result<Vec<Problem>, Error> {
        let filter =
            ProblemFilter::text(variant, term).map_err(|err| problem_field_error(field, &err))?;
        self.list(filter, limit).await
    }

    /// Load a problem the actor is allowed to change.
    ///
    /// Private problems of other users read as missing; public ones are
    /// forbidden.
    async fn owned_problem(&self, actor: &UserId, id: &ProblemId) -> Result<Problem, Error> {
        let problem = self
            .repository
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .filter(|problem| problem.is_visible_to(actor))
            .ok_or_else(|| not_found(id))?;
        if !problem.is_created_by(actor) {
            return Err(Error::forbidden("only the creator can change a problem"));
        }
        Ok(problem)
    }
}

#[async_trait]
impl ProblemCommand for ProblemService {
    async fn create_problem(&self, request: CreateProblemRequest) -> Result<Problem, Error> {
        let CreateProblemRequest { actor, payload } = request;
        let new = parse_new_problem(actor.user_id, payload, self.clock.utc())?;
        let problem = self
            .repository
            .insert(new)
            .await
            .map_err(map_repository_error)?;
        info!(problem = %problem.id, creator = %problem.creator_id, "problem created");
        Ok(problem)
    }

    async fn update_problem(&self, request: UpdateProblemRequest) -> Result<Problem, Error> {
        let UpdateProblemRequest {
            actor,
            problem_id,
            payload,
        } = request;
        let changes = parse_problem_changes(payload)?;
        let mut problem = self.owned_problem(&actor.user_id, &problem_id).await?;
        if changes.is_empty() {
            return Ok(problem);
        }
        changes.apply_to(&mut problem, self.clock.utc());
        self.repository
            .update(&problem)
            .await
            .map_err(map_repository_error)?;
        info!(problem = %problem.id, "problem updated");
        Ok(problem)
    }

    async fn delete_problem(&self, request: DeleteProblemRequest) -> Result<(), Error> {
        let DeleteProblemRequest { actor, problem_id } = request;
        self.owned_problem(&actor.user_id, &problem_id).await?;
        let removed = self
            .repository
            .delete(&problem_id)
            .await
            .map_err(map_repository_error)?;
        if !removed {
            return Err(not_found(&problem_id));
        }
        info!(problem = %problem_id, "problem deleted");
        Ok(())
    }
}

#[async_trait]
impl ProblemQuery for ProblemService {
    async fn get_problem(&self, viewer: &UserId, id: &ProblemId) -> Result<Problem, Error> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .filter(|problem| problem.is_visible_to(viewer))
            .ok_or_else(|| not_found(id))
    }

    async fn list_public(
        &self,
        location: Option<String>,
        limit: Option<u32>,
    ) -> Result<Vec<Problem>, Error> {
        let limit = limit.map_or(PROBLEM_LIST_LIMIT, |value| {
            value.clamp(1, PROBLEM_LIST_LIMIT)
        });
        match location.filter(|term| !term.trim().is_empty()) {
            Some(term) => {
                self.text_listing(ProblemFilter::PublicAtLocation, "location", &term, limit)
                    .await
            }
            None => self.list(ProblemFilter::Public, limit).await,
        }
    }

    async fn list_mine(&self, viewer: &UserId) -> Result<Vec<Problem>, Error> {
        self.list(ProblemFilter::CreatedBy(viewer.clone()), PROBLEM_LIST_LIMIT)
            .await
    }

    async fn search(&self, term: &str) -> Result<Vec<Problem>, Error> {
        self.text_listing(ProblemFilter::PublicMatching, "q", term, PROBLEM_SEARCH_LIMIT)
            .await
    }

    async fn by_difficulty(&self, difficulty: &str) -> Result<Vec<Problem>, Error> {
        self.text_listing(
            ProblemFilter::PublicWithDifficulty,
            "difficulty",
            difficulty,
            PROBLEM_LIST_LIMIT,
        )
        .await
    }

    async fn by_location(&self, location: &str) -> Result<Vec<Problem>, Error> {
        self.text_listing(
            ProblemFilter::PublicAtLocation,
            "location",
            location,
            PROBLEM_LIST_LIMIT,
        )
        .await
    }
}

#[cfg(test)]
#[path = "problem_service_tests.rs"]
mod tests;
