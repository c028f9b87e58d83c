//! Mutex-guarded [`ProblemRepository`] adapter.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{ProblemRepository, ProblemRepositoryError};
use crate::domain::{NewProblem, Problem, ProblemFilter, ProblemId};

/// Problem repository holding every record in process memory.
#[derive(Debug, Default)]
pub struct InMemoryProblemRepository {
    problems: Mutex<HashMap<ProblemId, Problem>>,
}

impl InMemoryProblemRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn problems(&self) -> Result<MutexGuard<'_, HashMap<ProblemId, Problem>>, ProblemRepositoryError> {
        self.problems
            .lock()
            .map_err(|_| ProblemRepositoryError::query("problem store lock poisoned"))
    }
}

#[async_trait]
impl ProblemRepository for InMemoryProblemRepository {
    async fn insert(&self, problem: NewProblem) -> Result<Problem, ProblemRepositoryError> {
        let stored = problem.into_problem(ProblemId::random());
        self.problems()?.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: &ProblemId) -> Result<Option<Problem>, ProblemRepositoryError> {
        Ok(self.problems()?.get(id).cloned())
    }

    async fn list(
        &self,
        filter: &ProblemFilter,
        limit: u32,
    ) -> Result<Vec<Problem>, ProblemRepositoryError> {
        let mut matching: Vec<Problem> = self
            .problems()?
            .values()
            .filter(|problem| filter.matches(problem))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        matching.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(matching)
    }

    async fn update(&self, problem: &Problem) -> Result<(), ProblemRepositoryError> {
        let mut problems = self.problems()?;
        let slot = problems
            .get_mut(&problem.id)
            .ok_or_else(|| ProblemRepositoryError::not_found(problem.id.to_string()))?;
        *slot = problem.clone();
        Ok(())
    }

    async fn delete(&self, id: &ProblemId) -> Result<bool, ProblemRepositoryError> {
        Ok(self.problems()?.remove(id).is_some())
    }
}
