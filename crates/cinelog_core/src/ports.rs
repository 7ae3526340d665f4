//! crates/cinelog_core/src/ports.rs
//!
//! Defines the service contract (trait) for the application's content store.
//! This trait forms the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete database behind it.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{
    AdminCredentials, CastMember, CountryEarnings, Movie, MovieAction, Quiz, QuizDraft, User,
    UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations, mirroring the error taxonomy
/// the gateway maps onto HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Content Store Port
//=========================================================================================

#[async_trait]
pub trait ContentStore: Send + Sync {
    // --- Users and Admins ---
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> PortResult<User>;

    async fn user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn user_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    async fn touch_last_login(&self, user_id: Uuid) -> PortResult<()>;

    async fn admin_by_username(&self, username: &str) -> PortResult<AdminCredentials>;

    // --- Movies ---
    async fn movie_by_id(&self, movie_id: Uuid) -> PortResult<Movie>;

    async fn cast_for_movie(&self, movie_id: Uuid) -> PortResult<Vec<CastMember>>;

    async fn earnings_for_movie(&self, movie_id: Uuid) -> PortResult<Vec<CountryEarnings>>;

    // --- Action Ledger ---
    //
    // Both operations are transactional as a unit: the membership change and
    // the counter change either both apply or neither does. Adding an action
    // already present, or removing one absent, is a no-op.

    async fn apply_action(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        action: MovieAction,
    ) -> PortResult<Movie>;

    async fn remove_action(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        action: MovieAction,
    ) -> PortResult<Movie>;

    // --- Quizzes ---
    async fn quiz_by_id(&self, quiz_id: Uuid) -> PortResult<Quiz>;

    /// Active quizzes scheduled for the given calendar day, all categories.
    async fn quizzes_for_day(&self, day: NaiveDate) -> PortResult<Vec<Quiz>>;

    async fn create_quiz(&self, draft: QuizDraft) -> PortResult<Quiz>;

    async fn update_quiz(&self, quiz_id: Uuid, draft: QuizDraft) -> PortResult<Quiz>;

    async fn delete_quiz(&self, quiz_id: Uuid) -> PortResult<()>;

    // --- XP Award ---

    /// Atomically awards `points` to the user, stamps `last_quiz_answered_on`
    /// with `today`, and appends the attempt record, but only if the user has
    /// not already been stamped for `today`. Returns `true` when the award
    /// was applied and `false` when the user had already answered today.
    ///
    /// The whole check-and-award must execute as one conditional store
    /// operation so two racing final submissions can never both award.
    async fn award_daily_xp(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
        score: u32,
        points: u64,
        today: NaiveDate,
    ) -> PortResult<bool>;
}
