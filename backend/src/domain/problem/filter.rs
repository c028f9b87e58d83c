//! Listing filters shared by every problem repository adapter.

use crate::domain::UserId;

use super::{Problem, ProblemValidationError};

/// Page size for listings.
pub const PROBLEM_LIST_LIMIT: u32 = 50;
/// Page size for free-text search.
pub const PROBLEM_SEARCH_LIMIT: u32 = 20;

/// Which problems a listing returns. Every listing is newest first.
///
/// Text matches are case-insensitive substring matches except
/// [`ProblemFilter::PublicWithDifficulty`], which compares grades exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemFilter {
    /// Every public problem.
    Public,
    /// Public problems whose location contains the text.
    PublicAtLocation(String),
    /// Public problems whose grade equals the text.
    PublicWithDifficulty(String),
    /// Public problems whose name, location, description or grade contains
    /// the text.
    PublicMatching(String),
    /// Every problem the user created, public or not.
    CreatedBy(UserId),
}

impl ProblemFilter {
    /// Build a text filter, rejecting blank terms.
    ///
    /// # Examples
    /// ```
    /// use addon_backend::domain::ProblemFilter;
    ///
    /// let filter = ProblemFilter::text(ProblemFilter::PublicMatching, "  crimp ")
    ///     .expect("non-blank");
    /// assert_eq!(filter, ProblemFilter::PublicMatching("crimp".into()));
    /// assert!(ProblemFilter::text(ProblemFilter::PublicMatching, " ").is_err());
    /// ```
    pub fn text(
        variant: fn(String) -> Self,
        term: &str,
    ) -> Result<Self, ProblemValidationError> {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Err(ProblemValidationError::EmptyQuery);
        }
        Ok(variant(trimmed.to_owned()))
    }

    /// Whether `problem` belongs in the listing.
    pub fn matches(&self, problem: &Problem) -> bool {
        match self {
            Self::Public => problem.is_public,
            Self::PublicAtLocation(term) => {
                problem.is_public && contains_ignore_case(problem.location.as_ref(), term)
            }
            Self::PublicWithDifficulty(grade) => {
                problem.is_public
                    && problem
                        .difficulty
                        .as_ref()
                        .is_some_and(|difficulty| difficulty.as_ref() == grade)
            }
            Self::PublicMatching(term) => {
                problem.is_public
                    && (contains_ignore_case(problem.name.as_ref(), term)
                        || contains_ignore_case(problem.location.as_ref(), term)
                        || problem
                            .description
                            .as_deref()
                            .is_some_and(|text| contains_ignore_case(text, term))
                        || problem
                            .difficulty
                            .as_ref()
                            .is_some_and(|grade| contains_ignore_case(grade.as_ref(), term)))
            }
            Self::CreatedBy(user_id) => problem.is_created_by(user_id),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
