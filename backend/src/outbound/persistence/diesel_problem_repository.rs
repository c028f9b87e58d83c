//! PostgreSQL-backed [`ProblemRepository`].
//!
//! Holds and tags are stored as JSON arrays on the problem row. Text filters
//! use `ILIKE` with the user's term escaped, so `%` and `_` match literally.

use std::fmt;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ProblemRepository, ProblemRepositoryError};
use crate::domain::{
    Difficulty, Hold, Location, NewProblem, PhotoUrl, Problem, ProblemFilter, ProblemId,
    ProblemName, Tag, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{ProblemRow, ProblemUpdateRow};
use super::pool::{DbPool, PoolError};
use super::schema::problems;

/// Diesel implementation of the [`ProblemRepository`] port.
#[derive(Clone)]
pub struct DieselProblemRepository {
    pool: DbPool,
}

impl DieselProblemRepository {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProblemRepositoryError {
    map_basic_pool_error(error, ProblemRepositoryError::connection)
}

fn map_diesel_error(error: DieselError) -> ProblemRepositoryError {
    map_basic_diesel_error(
        error,
        ProblemRepositoryError::query,
        ProblemRepositoryError::connection,
    )
}

fn corrupt(column: &str, err: impl fmt::Display) -> ProblemRepositoryError {
    ProblemRepositoryError::query(format!("invalid {column} in database: {err}"))
}

/// `%term%` with LIKE metacharacters escaped.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len().saturating_add(2));
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn to_json<T: serde::Serialize>(
    column: &str,
    value: &T,
) -> Result<serde_json::Value, ProblemRepositoryError> {
    serde_json::to_value(value)
        .map_err(|err| ProblemRepositoryError::query(format!("encode {column}: {err}")))
}

fn problem_to_row(problem: &Problem) -> Result<ProblemRow, ProblemRepositoryError> {
    Ok(ProblemRow {
        id: *problem.id.as_uuid(),
        creator_id: *problem.creator_id.as_uuid(),
        name: problem.name.as_ref().to_owned(),
        location: problem.location.as_ref().to_owned(),
        description: problem.description.clone(),
        difficulty: problem
            .difficulty
            .as_ref()
            .map(|grade| grade.as_ref().to_owned()),
        wall_photo_url: problem
            .wall_photo_url
            .as_ref()
            .map(|url| url.as_ref().to_owned()),
        holds: to_json("holds", &problem.holds)?,
        is_public: problem.is_public,
        tags: to_json("tags", &problem.tags)?,
        created_at: problem.created_at,
        updated_at: problem.updated_at,
    })
}

fn row_to_problem(row: ProblemRow) -> Result<Problem, ProblemRepositoryError> {
    let holds: Vec<Hold> =
        serde_json::from_value(row.holds).map_err(|err| corrupt("holds", err))?;
    let tags: Vec<Tag> = serde_json::from_value(row.tags).map_err(|err| corrupt("tags", err))?;
    Ok(Problem {
        id: ProblemId::from_uuid(row.id),
        creator_id: UserId::from_uuid(row.creator_id),
        name: ProblemName::new(row.name).map_err(|err| corrupt("name", err))?,
        location: Location::new(row.location).map_err(|err| corrupt("location", err))?,
        description: row.description,
        difficulty: row
            .difficulty
            .map(Difficulty::new)
            .transpose()
            .map_err(|err| corrupt("difficulty", err))?,
        wall_photo_url: row
            .wall_photo_url
            .map(PhotoUrl::new)
            .transpose()
            .map_err(|err| corrupt("wall_photo_url", err))?,
        holds,
        is_public: row.is_public,
        tags,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn filtered(filter: &ProblemFilter) -> problems::BoxedQuery<'static, diesel::pg::Pg> {
    let query = problems::table.into_boxed();
    match filter {
        ProblemFilter::Public => query.filter(problems::is_public),
        ProblemFilter::PublicAtLocation(term) => query
            .filter(problems::is_public)
            .filter(problems::location.ilike(contains_pattern(term))),
        ProblemFilter::PublicWithDifficulty(grade) => query
            .filter(problems::is_public)
            .filter(problems::difficulty.eq(grade.clone())),
        ProblemFilter::PublicMatching(term) => {
            let pattern = contains_pattern(term);
            query.filter(problems::is_public).filter(
                problems::name
                    .ilike(pattern.clone())
                    .or(problems::location.ilike(pattern.clone()))
                    .or(problems::description.ilike(pattern.clone()))
                    .or(problems::difficulty.ilike(pattern)),
            )
        }
        ProblemFilter::CreatedBy(user_id) => {
            query.filter(problems::creator_id.eq(*user_id.as_uuid()))
        }
    }
}

#[async_trait]
impl ProblemRepository for DieselProblemRepository {
    async fn insert(&self, problem: NewProblem) -> Result<Problem, ProblemRepositoryError> {
        let stored = problem.into_problem(ProblemId::from_uuid(Uuid::new_v4()));
        let row = problem_to_row(&stored)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let inserted = diesel::insert_into(problems::table)
            .values(&row)
            .returning(ProblemRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_problem(inserted)
    }

    async fn find_by_id(&self, id: &ProblemId) -> Result<Option<Problem>, ProblemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        problems::table
            .find(id.as_uuid())
            .select(ProblemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_problem)
            .transpose()
    }

    async fn list(
        &self,
        filter: &ProblemFilter,
        limit: u32,
    ) -> Result<Vec<Problem>, ProblemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = filtered(filter)
            .order_by((problems::created_at.desc(), problems::id.desc()))
            .limit(i64::from(limit))
            .select(ProblemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_problem).collect()
    }

    async fn update(&self, problem: &Problem) -> Result<(), ProblemRepositoryError> {
        let changes = ProblemUpdateRow {
            name: problem.name.as_ref(),
            location: problem.location.as_ref(),
            description: problem.description.as_deref(),
            difficulty: problem.difficulty.as_ref().map(AsRef::as_ref),
            wall_photo_url: problem.wall_photo_url.as_ref().map(AsRef::as_ref),
            holds: to_json("holds", &problem.holds)?,
            is_public: problem.is_public,
            tags: to_json("tags", &problem.tags)?,
            updated_at: problem.updated_at,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(problems::table.find(problem.id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(ProblemRepositoryError::not_found(problem.id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &ProblemId) -> Result<bool, ProblemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(problems::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
