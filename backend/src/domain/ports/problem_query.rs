//! Driving port for reading climbing problems.

use async_trait::async_trait;

use crate::domain::{Error, Problem, ProblemId, UserId};

/// Driving port for problem lookups and listings.
///
/// Listings other than [`ProblemQuery::list_mine`] return public problems
/// only, newest first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProblemQuery: Send + Sync {
    /// One problem, if it is public or `viewer` created it.
    async fn get_problem(&self, viewer: &UserId, id: &ProblemId) -> Result<Problem, Error>;

    /// Public problems, optionally narrowed to a location, capped at `limit`.
    async fn list_public(
        &self,
        location: Option<String>,
        limit: Option<u32>,
    ) -> Result<Vec<Problem>, Error>;

    /// Every problem `viewer` created.
    async fn list_mine(&self, viewer: &UserId) -> Result<Vec<Problem>, Error>;

    /// Public problems whose name, location, description or grade contains
    /// `term`.
    async fn search(&self, term: &str) -> Result<Vec<Problem>, Error>;

    /// Public problems with exactly this grade.
    async fn by_difficulty(&self, difficulty: &str) -> Result<Vec<Problem>, Error>;

    /// Public problems whose location contains `location`.
    async fn by_location(&self, location: &str) -> Result<Vec<Problem>, Error>;
}

/// Fixture query that knows no problems.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProblemQuery;

#[async_trait]
impl ProblemQuery for FixtureProblemQuery {
    async fn get_problem(&self, _viewer: &UserId, id: &ProblemId) -> Result<Problem, Error> {
        Err(Error::not_found(format!("problem {id} not found")))
    }

    async fn list_public(
        &self,
        _location: Option<String>,
        _limit: Option<u32>,
    ) -> Result<Vec<Problem>, Error> {
        Ok(Vec::new())
    }

    async fn list_mine(&self, _viewer: &UserId) -> Result<Vec<Problem>, Error> {
        Ok(Vec::new())
    }

    async fn search(&self, _term: &str) -> Result<Vec<Problem>, Error> {
        Ok(Vec::new())
    }

    async fn by_difficulty(&self, _difficulty: &str) -> Result<Vec<Problem>, Error> {
        Ok(Vec::new())
    }

    async fn by_location(&self, _location: &str) -> Result<Vec<Problem>, Error> {
        Ok(Vec::new())
    }
}
