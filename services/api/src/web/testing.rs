//! services/api/src/web/testing.rs
//!
//! Shared fixtures for handler tests: an in-memory stand-in for the content
//! store and builders for the domain documents the tests need.
//!
//! The stub models the same semantics the Postgres adapter implements —
//! set membership for the action ledger with counters moving only on a real
//! set change (floored at zero), and the calendar-day guard for the XP
//! award — so handler tests can observe idempotency and exactly-once
//! behavior end to end.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use cinelog_core::domain::{
    AdminCredentials, CastMember, CountryEarnings, Movie, MovieAction, Question, QuestionKind,
    QuestionOption, Quiz, QuizCategory, QuizDraft, QuizStatus, User, UserCredentials,
};
use cinelog_core::engine;
use cinelog_core::ports::{ContentStore, PortError, PortResult};

use crate::config::Config;
use crate::web::state::AppState;

/// A stub `ContentStore` holding at most one user, quiz, and movie, with
/// call counters so tests can assert which store paths were exercised.
pub struct StubStore {
    pub user: Option<User>,
    pub quiz: Option<Quiz>,
    movie: Mutex<Option<Movie>>,
    actions: Mutex<HashSet<(Uuid, Uuid, MovieAction)>>,
    last_answered: Mutex<Option<NaiveDate>>,
    pub award_calls: AtomicUsize,
    pub action_calls: AtomicUsize,
    pub quiz_writes: AtomicUsize,
}

impl StubStore {
    pub fn new() -> Self {
        Self {
            user: None,
            quiz: None,
            movie: Mutex::new(None),
            actions: Mutex::new(HashSet::new()),
            last_answered: Mutex::new(None),
            award_calls: AtomicUsize::new(0),
            action_calls: AtomicUsize::new(0),
            quiz_writes: AtomicUsize::new(0),
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_quiz(mut self, quiz: Quiz) -> Self {
        self.quiz = Some(quiz);
        self
    }

    pub fn with_movie(self, movie: Movie) -> Self {
        *self.movie.lock().unwrap() = Some(movie);
        self
    }

    /// Pre-stamps the user's last completed-quiz day.
    pub fn with_last_answered(self, day: NaiveDate) -> Self {
        *self.last_answered.lock().unwrap() = Some(day);
        self
    }

    fn known_user(&self, user_id: Uuid) -> PortResult<&User> {
        self.user
            .as_ref()
            .filter(|u| u.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {user_id} not found")))
    }
}

#[async_trait]
impl ContentStore for StubStore {
    async fn create_user(&self, _: &str, _: &str, _: &str) -> PortResult<User> {
        unimplemented!("not exercised by these tests")
    }

    async fn user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.known_user(user_id).cloned()
    }

    async fn user_by_username(&self, _: &str) -> PortResult<UserCredentials> {
        unimplemented!("not exercised by these tests")
    }

    async fn touch_last_login(&self, _: Uuid) -> PortResult<()> {
        Ok(())
    }

    async fn admin_by_username(&self, _: &str) -> PortResult<AdminCredentials> {
        unimplemented!("not exercised by these tests")
    }

    async fn movie_by_id(&self, movie_id: Uuid) -> PortResult<Movie> {
        self.movie
            .lock()
            .unwrap()
            .clone()
            .filter(|m| m.id == movie_id)
            .ok_or_else(|| PortError::NotFound(format!("Movie {movie_id} not found")))
    }

    async fn cast_for_movie(&self, _: Uuid) -> PortResult<Vec<CastMember>> {
        Ok(Vec::new())
    }

    async fn earnings_for_movie(&self, _: Uuid) -> PortResult<Vec<CountryEarnings>> {
        Ok(Vec::new())
    }

    async fn apply_action(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        action: MovieAction,
    ) -> PortResult<Movie> {
        self.known_user(user_id)?;
        let mut slot = self.movie.lock().unwrap();
        let movie = slot
            .as_mut()
            .filter(|m| m.id == movie_id)
            .ok_or_else(|| PortError::NotFound(format!("Movie {movie_id} not found")))?;
        self.action_calls.fetch_add(1, Ordering::SeqCst);
        // Counter moves only when the set actually changed.
        if self.actions.lock().unwrap().insert((user_id, movie_id, action)) {
            match action {
                MovieAction::Like => movie.likes += 1,
                MovieAction::Save => movie.saves += 1,
                MovieAction::Dislike => movie.dislikes += 1,
            }
        }
        Ok(movie.clone())
    }

    async fn remove_action(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        action: MovieAction,
    ) -> PortResult<Movie> {
        self.known_user(user_id)?;
        let mut slot = self.movie.lock().unwrap();
        let movie = slot
            .as_mut()
            .filter(|m| m.id == movie_id)
            .ok_or_else(|| PortError::NotFound(format!("Movie {movie_id} not found")))?;
        self.action_calls.fetch_add(1, Ordering::SeqCst);
        if self.actions.lock().unwrap().remove(&(user_id, movie_id, action)) {
            match action {
                MovieAction::Like => movie.likes = movie.likes.saturating_sub(1),
                MovieAction::Save => movie.saves = movie.saves.saturating_sub(1),
                MovieAction::Dislike => movie.dislikes = movie.dislikes.saturating_sub(1),
            }
        }
        Ok(movie.clone())
    }

    async fn quiz_by_id(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        self.quiz
            .clone()
            .filter(|q| q.id == quiz_id)
            .ok_or_else(|| PortError::NotFound(format!("Quiz {quiz_id} not found")))
    }

    async fn quizzes_for_day(&self, _: NaiveDate) -> PortResult<Vec<Quiz>> {
        Ok(self.quiz.clone().into_iter().collect())
    }

    async fn create_quiz(&self, _: QuizDraft) -> PortResult<Quiz> {
        self.quiz_writes.fetch_add(1, Ordering::SeqCst);
        self.quiz
            .clone()
            .ok_or_else(|| PortError::Unexpected("stub has no quiz".to_string()))
    }

    async fn update_quiz(&self, _: Uuid, _: QuizDraft) -> PortResult<Quiz> {
        self.quiz_writes.fetch_add(1, Ordering::SeqCst);
        self.quiz
            .clone()
            .ok_or_else(|| PortError::Unexpected("stub has no quiz".to_string()))
    }

    async fn delete_quiz(&self, _: Uuid) -> PortResult<()> {
        self.quiz_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn award_daily_xp(
        &self,
        user_id: Uuid,
        _quiz_id: Uuid,
        _score: u32,
        _points: u64,
        today: NaiveDate,
    ) -> PortResult<bool> {
        self.known_user(user_id)?;
        self.award_calls.fetch_add(1, Ordering::SeqCst);
        // Same guard the Postgres adapter folds into its conditional UPDATE.
        let mut last = self.last_answered.lock().unwrap();
        if engine::awards_xp_today(*last, today) {
            *last = Some(today);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Wraps a stub store in an `AppState`, returning the store handle as well so
/// tests can read its counters afterwards.
pub fn test_state(stub: StubStore) -> (Arc<AppState>, Arc<StubStore>) {
    let store = Arc::new(stub);
    let config = Arc::new(Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        log_level: tracing::Level::INFO,
        token_secret: "test-secret".to_string(),
        cors_origin: "http://localhost:3000".to_string(),
    });
    let state = Arc::new(AppState {
        store: store.clone(),
        config,
    });
    (state, store)
}

pub fn claims_for(user_id: Uuid, is_admin: bool) -> crate::web::auth::Claims {
    crate::web::auth::Claims {
        sub: user_id,
        is_admin,
        exp: i64::MAX,
    }
}

pub fn sample_user() -> User {
    User {
        id: Uuid::new_v4(),
        username: "moviebuff".to_string(),
        email: "buff@example.com".to_string(),
        xp: 120,
        last_login: None,
        last_quiz_answered_on: None,
    }
}

pub fn sample_movie() -> Movie {
    Movie {
        id: Uuid::new_v4(),
        title: "The Long Take".to_string(),
        description: "A heist told in one shot.".to_string(),
        release_date: NaiveDate::from_ymd_opt(2024, 11, 8),
        poster_url: None,
        budget: 40_000_000,
        earnings: 128_500_000,
        likes: 3,
        saves: 1,
        dislikes: 0,
        trend_daily: BTreeMap::new(),
        trend_weekly: BTreeMap::new(),
        trend_monthly: BTreeMap::new(),
    }
}

pub fn sample_quiz(correct: &[u32]) -> Quiz {
    let questions = correct
        .iter()
        .map(|&answer| Question {
            text: "Pick one".to_string(),
            kind: QuestionKind::MultipleChoiceText,
            options: vec![
                QuestionOption::Text { text: "A".to_string() },
                QuestionOption::Text { text: "B".to_string() },
                QuestionOption::Text { text: "C".to_string() },
            ],
            correct_answer: answer,
        })
        .collect();
    Quiz {
        id: Uuid::new_v4(),
        title: "Daily box-office quiz".to_string(),
        scheduled_on: chrono::Local::now().date_naive(),
        category: QuizCategory::BoxOffice,
        status: QuizStatus::Active,
        questions,
    }
}
