//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `ContentStore` port from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.
//!
//! The two multi-step operations (the action ledger and the daily XP award)
//! run inside transactions; the XP award additionally folds its once-per-day
//! check into the `UPDATE`'s `WHERE` clause so two racing final submissions
//! can never both award.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

use cinelog_core::domain::{
    AdminCredentials, CastMember, CountryEarnings, Movie, MovieAction, Question, Quiz, QuizDraft,
    User, UserCredentials,
};
use cinelog_core::ports::{ContentStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ContentStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or(e: sqlx::Error, what: impl FnOnce() -> String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what()),
        _ => PortError::Unexpected(e.to_string()),
    }
}

/// Maps a unique-constraint violation (SQLSTATE 23505) to `Conflict`.
fn conflict_or(e: sqlx::Error, conflict_message: &str) -> PortError {
    if let sqlx::Error::Database(db_error) = &e {
        if db_error.code().as_deref() == Some("23505") {
            return PortError::Conflict(conflict_message.to_string());
        }
    }
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const MOVIE_COLUMNS: &str = "id, title, description, release_date, poster_url, budget, earnings, \
                             likes, saves, dislikes, trend_daily, trend_weekly, trend_monthly";

#[derive(FromRow)]
struct MovieRecord {
    id: Uuid,
    title: String,
    description: String,
    release_date: Option<NaiveDate>,
    poster_url: Option<String>,
    budget: i64,
    earnings: i64,
    likes: i32,
    saves: i32,
    dislikes: i32,
    trend_daily: Json<BTreeMap<String, f64>>,
    trend_weekly: Json<BTreeMap<String, f64>>,
    trend_monthly: Json<BTreeMap<String, f64>>,
}

impl MovieRecord {
    fn to_domain(self) -> Movie {
        Movie {
            id: self.id,
            title: self.title,
            description: self.description,
            release_date: self.release_date,
            poster_url: self.poster_url,
            budget: self.budget as u64,
            earnings: self.earnings as u64,
            likes: self.likes as u32,
            saves: self.saves as u32,
            dislikes: self.dislikes as u32,
            trend_daily: self.trend_daily.0,
            trend_weekly: self.trend_weekly.0,
            trend_monthly: self.trend_monthly.0,
        }
    }
}

#[derive(FromRow)]
struct CastMemberRecord {
    id: Uuid,
    movie_id: Uuid,
    actor_name: String,
    character_name: Option<String>,
    billing_order: i32,
}

impl CastMemberRecord {
    fn to_domain(self) -> CastMember {
        CastMember {
            id: self.id,
            movie_id: self.movie_id,
            actor_name: self.actor_name,
            character_name: self.character_name,
            billing_order: self.billing_order as u32,
        }
    }
}

#[derive(FromRow)]
struct CountryEarningsRecord {
    movie_id: Uuid,
    country_code: String,
    gross: i64,
}

impl CountryEarningsRecord {
    fn to_domain(self) -> CountryEarnings {
        CountryEarnings {
            movie_id: self.movie_id,
            country_code: self.country_code,
            gross: self.gross as u64,
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, xp, last_login, last_quiz_answered_on";

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    xp: i64,
    last_login: Option<DateTime<Utc>>,
    last_quiz_answered_on: Option<NaiveDate>,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            xp: self.xp as u64,
            last_login: self.last_login,
            last_quiz_answered_on: self.last_quiz_answered_on,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    username: String,
    password_hash: String,
}

const QUIZ_COLUMNS: &str = "id, title, scheduled_on, category, status, questions";

#[derive(FromRow)]
struct QuizRecord {
    id: Uuid,
    title: String,
    scheduled_on: NaiveDate,
    category: String,
    status: String,
    questions: Json<Vec<Question>>,
}

impl QuizRecord {
    fn to_domain(self) -> PortResult<Quiz> {
        let category = self
            .category
            .parse()
            .map_err(|e: String| PortError::Unexpected(e))?;
        let status = self
            .status
            .parse()
            .map_err(|e: String| PortError::Unexpected(e))?;
        Ok(Quiz {
            id: self.id,
            title: self.title,
            scheduled_on: self.scheduled_on,
            category,
            status,
            questions: self.questions.0,
        })
    }
}

//=========================================================================================
// `ContentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentStore for PgStore {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or(e, "username or email is already taken"))?;
        Ok(record.to_domain())
    }

    async fn user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| not_found_or(e, || format!("User {user_id} not found")))?;
        Ok(record.to_domain())
    }

    async fn user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, || format!("User '{username}' not found")))?;
        Ok(UserCredentials {
            id: record.id,
            username: record.username,
            password_hash: record.password_hash,
        })
    }

    async fn touch_last_login(&self, user_id: Uuid) -> PortResult<()> {
        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn admin_by_username(&self, username: &str) -> PortResult<AdminCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, username, password_hash FROM admins WHERE username = $1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, || format!("Admin '{username}' not found")))?;
        Ok(AdminCredentials {
            id: record.id,
            username: record.username,
            password_hash: record.password_hash,
        })
    }

    async fn movie_by_id(&self, movie_id: Uuid) -> PortResult<Movie> {
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1");
        let record = sqlx::query_as::<_, MovieRecord>(&sql)
            .bind(movie_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| not_found_or(e, || format!("Movie {movie_id} not found")))?;
        Ok(record.to_domain())
    }

    async fn cast_for_movie(&self, movie_id: Uuid) -> PortResult<Vec<CastMember>> {
        let records = sqlx::query_as::<_, CastMemberRecord>(
            "SELECT id, movie_id, actor_name, character_name, billing_order \
             FROM movie_cast WHERE movie_id = $1 ORDER BY billing_order ASC",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn earnings_for_movie(&self, movie_id: Uuid) -> PortResult<Vec<CountryEarnings>> {
        let records = sqlx::query_as::<_, CountryEarningsRecord>(
            "SELECT movie_id, country_code, gross \
             FROM movie_country_earnings WHERE movie_id = $1 ORDER BY gross DESC",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn apply_action(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        action: MovieAction,
    ) -> PortResult<Movie> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query_as::<_, (Uuid,)>("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("User {user_id} not found")))?;

        // Lock the movie row so the membership check and the counter change
        // see the same state.
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, MovieRecord>(&sql)
            .bind(movie_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Movie {movie_id} not found")))?;

        let inserted = sqlx::query(
            "INSERT INTO user_movie_actions (user_id, movie_id, action) VALUES ($1, $2, $3) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(action.as_str())
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?
        .rows_affected();

        // Counter moves only when the set actually changed.
        let movie = if inserted == 1 {
            let column = action.counter_column();
            let sql = format!(
                "UPDATE movies SET {column} = {column} + 1 WHERE id = $1 RETURNING {MOVIE_COLUMNS}"
            );
            sqlx::query_as::<_, MovieRecord>(&sql)
                .bind(movie_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?
        } else {
            current
        };

        tx.commit().await.map_err(unexpected)?;
        Ok(movie.to_domain())
    }

    async fn remove_action(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        action: MovieAction,
    ) -> PortResult<Movie> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query_as::<_, (Uuid,)>("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("User {user_id} not found")))?;

        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, MovieRecord>(&sql)
            .bind(movie_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Movie {movie_id} not found")))?;

        let deleted = sqlx::query(
            "DELETE FROM user_movie_actions WHERE user_id = $1 AND movie_id = $2 AND action = $3",
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(action.as_str())
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?
        .rows_affected();

        let movie = if deleted == 1 {
            let column = action.counter_column();
            // GREATEST floors the counter at zero even if it ever drifts.
            let sql = format!(
                "UPDATE movies SET {column} = GREATEST({column} - 1, 0) WHERE id = $1 \
                 RETURNING {MOVIE_COLUMNS}"
            );
            sqlx::query_as::<_, MovieRecord>(&sql)
                .bind(movie_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?
        } else {
            current
        };

        tx.commit().await.map_err(unexpected)?;
        Ok(movie.to_domain())
    }

    async fn quiz_by_id(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1");
        let record = sqlx::query_as::<_, QuizRecord>(&sql)
            .bind(quiz_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| not_found_or(e, || format!("Quiz {quiz_id} not found")))?;
        record.to_domain()
    }

    async fn quizzes_for_day(&self, day: NaiveDate) -> PortResult<Vec<Quiz>> {
        let sql = format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes \
             WHERE scheduled_on = $1 AND status = 'active' ORDER BY category ASC"
        );
        let records = sqlx::query_as::<_, QuizRecord>(&sql)
            .bind(day)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(QuizRecord::to_domain).collect()
    }

    async fn create_quiz(&self, draft: QuizDraft) -> PortResult<Quiz> {
        let sql = format!(
            "INSERT INTO quizzes (id, title, scheduled_on, category, status, questions) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {QUIZ_COLUMNS}"
        );
        let record = sqlx::query_as::<_, QuizRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&draft.title)
            .bind(draft.scheduled_on)
            .bind(draft.category.as_str())
            .bind(draft.status.as_str())
            .bind(Json(&draft.questions))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or(e, "a quiz already exists for this date and category"))?;
        record.to_domain()
    }

    async fn update_quiz(&self, quiz_id: Uuid, draft: QuizDraft) -> PortResult<Quiz> {
        let sql = format!(
            "UPDATE quizzes SET title = $2, scheduled_on = $3, category = $4, status = $5, \
             questions = $6 WHERE id = $1 RETURNING {QUIZ_COLUMNS}"
        );
        let record = sqlx::query_as::<_, QuizRecord>(&sql)
            .bind(quiz_id)
            .bind(&draft.title)
            .bind(draft.scheduled_on)
            .bind(draft.category.as_str())
            .bind(draft.status.as_str())
            .bind(Json(&draft.questions))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_or(e, "a quiz already exists for this date and category"))?
            .ok_or_else(|| PortError::NotFound(format!("Quiz {quiz_id} not found")))?;
        record.to_domain()
    }

    async fn delete_quiz(&self, quiz_id: Uuid) -> PortResult<()> {
        let deleted = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(quiz_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?
            .rows_affected();
        if deleted == 0 {
            return Err(PortError::NotFound(format!("Quiz {quiz_id} not found")));
        }
        Ok(())
    }

    async fn award_daily_xp(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
        score: u32,
        points: u64,
        today: NaiveDate,
    ) -> PortResult<bool> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // The once-per-day check is part of the UPDATE itself: the guard and
        // the stamp commit together, so a concurrent final submission either
        // sees today's stamp or loses the row-level race and matches nothing.
        let awarded = sqlx::query(
            "UPDATE users SET xp = xp + $1, last_quiz_answered_on = $2 \
             WHERE id = $3 AND (last_quiz_answered_on IS NULL OR last_quiz_answered_on < $2)",
        )
        .bind(points as i64)
        .bind(today)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?
        .rows_affected()
            == 1;

        if awarded {
            sqlx::query(
                "INSERT INTO quiz_attempts (id, user_id, quiz_id, score) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(quiz_id)
            .bind(score as i32)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(awarded)
    }
}
