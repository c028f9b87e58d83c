//! Driven port for climbing problem persistence.

use async_trait::async_trait;

use crate::domain::{NewProblem, Problem, ProblemFilter, ProblemId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by problem repository adapters.
    pub enum ProblemRepositoryError {
        /// The store could not be reached.
        Connection { message: String } => "problem repository connection failed: {message}",
        /// A read or write failed while executing.
        Query { message: String } => "problem repository query failed: {message}",
        /// The problem to update no longer exists.
        NotFound { problem_id: String } => "problem {problem_id} not found",
    }
}

/// Port for storing and listing climbing problems.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProblemRepository: Send + Sync {
    /// Insert a problem; the store assigns its id.
    async fn insert(&self, problem: NewProblem) -> Result<Problem, ProblemRepositoryError>;

    /// Fetch one problem by id regardless of visibility.
    async fn find_by_id(&self, id: &ProblemId) -> Result<Option<Problem>, ProblemRepositoryError>;

    /// Problems matching `filter`, newest first, at most `limit` of them.
    async fn list(
        &self,
        filter: &ProblemFilter,
        limit: u32,
    ) -> Result<Vec<Problem>, ProblemRepositoryError>;

    /// Overwrite an existing problem.
    ///
    /// Fails with [`ProblemRepositoryError::NotFound`] when it was deleted.
    async fn update(&self, problem: &Problem) -> Result<(), ProblemRepositoryError>;

    /// Delete a problem, reporting whether a row was removed.
    async fn delete(&self, id: &ProblemId) -> Result<bool, ProblemRepositoryError>;
}

/// Fixture repository that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProblemRepository;

#[async_trait]
impl ProblemRepository for FixtureProblemRepository {
    async fn insert(&self, problem: NewProblem) -> Result<Problem, ProblemRepositoryError> {
        Ok(problem.into_problem(ProblemId::random()))
    }

    async fn find_by_id(&self, _id: &ProblemId) -> Result<Option<Problem>, ProblemRepositoryError> {
        Ok(None)
    }

    async fn list(
        &self,
        _filter: &ProblemFilter,
        _limit: u32,
    ) -> Result<Vec<Problem>, ProblemRepositoryError> {
        Ok(Vec::new())
    }

    async fn update(&self, problem: &Problem) -> Result<(), ProblemRepositoryError> {
        Err(ProblemRepositoryError::not_found(problem.id.to_string()))
    }

    async fn delete(&self, _id: &ProblemId) -> Result<bool, ProblemRepositoryError> {
        Ok(false)
    }
}
