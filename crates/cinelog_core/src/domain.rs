//! crates/cinelog_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or web framework; the quiz
//! question types also carry `serde` derives because questions are stored as a
//! JSON document and travel over the wire in the same shape.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Movies
//=========================================================================================

/// A movie document, including the denormalized like/save/dislike counters and
/// the box-office trend maps (period label -> gross).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub release_date: Option<NaiveDate>,
    pub poster_url: Option<String>,
    pub budget: u64,
    pub earnings: u64,
    pub likes: u32,
    pub saves: u32,
    pub dislikes: u32,
    pub trend_daily: BTreeMap<String, f64>,
    pub trend_weekly: BTreeMap<String, f64>,
    pub trend_monthly: BTreeMap<String, f64>,
}

/// One credited cast entry for a movie.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastMember {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub actor_name: String,
    pub character_name: Option<String>,
    pub billing_order: u32,
}

/// Box-office gross for one movie in one country.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryEarnings {
    pub movie_id: Uuid,
    pub country_code: String,
    pub gross: u64,
}

/// The three user-to-movie relations tracked by the action ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovieAction {
    Like,
    Save,
    Dislike,
}

impl MovieAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Save => "save",
            Self::Dislike => "dislike",
        }
    }

    /// Name of the denormalized counter column kept in lockstep with the set.
    pub fn counter_column(&self) -> &'static str {
        match self {
            Self::Like => "likes",
            Self::Save => "saves",
            Self::Dislike => "dislikes",
        }
    }
}

impl FromStr for MovieAction {
    type Err = InvalidMovieAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "save" => Ok(Self::Save),
            "dislike" => Ok(Self::Dislike),
            other => Err(InvalidMovieAction(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("'{0}' is not a valid action type (expected like, save, or dislike)")]
pub struct InvalidMovieAction(pub String);

impl fmt::Display for MovieAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Quizzes
//=========================================================================================

/// The fixed set of daily-quiz categories. At most one quiz exists per
/// (scheduled date, category) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuizCategory {
    Movies,
    Actors,
    BoxOffice,
    Trivia,
}

impl QuizCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movies => "movies",
            Self::Actors => "actors",
            Self::BoxOffice => "boxOffice",
            Self::Trivia => "trivia",
        }
    }
}

impl FromStr for QuizCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movies" => Ok(Self::Movies),
            "actors" => Ok(Self::Actors),
            "boxOffice" => Ok(Self::BoxOffice),
            "trivia" => Ok(Self::Trivia),
            other => Err(format!("unknown quiz category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuizStatus {
    Active,
    Inactive,
}

impl QuizStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for QuizStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("unknown quiz status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKind {
    MultipleChoiceText,
    MultipleChoiceImage,
    TrueFalse,
}

/// One answer option. The variant must agree with the parent question's
/// `kind`; `QuizDraft::validate` enforces the agreement at creation time so
/// a text option can never appear in an image question and vice versa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum QuestionOption {
    Text { text: String },
    Image { image_url: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<QuestionOption>,
    /// Index into `options`. Validated in bounds at creation time and never
    /// sent to clients on the read path.
    pub correct_answer: u32,
}

/// A daily quiz as stored: the questions (with answer key) live in a single
/// JSON document, mirroring the embedded-document shape of the content store.
#[derive(Debug, Clone)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub scheduled_on: NaiveDate,
    pub category: QuizCategory,
    pub status: QuizStatus,
    pub questions: Vec<Question>,
}

/// The admin-supplied fields of a quiz, before it has an identity. Used for
/// both creation and full update.
#[derive(Debug, Clone)]
pub struct QuizDraft {
    pub title: String,
    pub scheduled_on: NaiveDate,
    pub category: QuizCategory,
    pub status: QuizStatus,
    pub questions: Vec<Question>,
}

impl QuizDraft {
    /// Checks the structural invariants a quiz must satisfy before it is
    /// persisted. Zero-question quizzes are rejected here so the submission
    /// path never has to reason about a vacuously-final empty answer vector.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("quiz title must not be empty".to_string());
        }
        if self.questions.is_empty() {
            return Err("a quiz must contain at least one question".to_string());
        }
        for (i, question) in self.questions.iter().enumerate() {
            question
                .validate()
                .map_err(|e| format!("question {i}: {e}"))?;
        }
        Ok(())
    }
}

impl Question {
    fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("question text must not be empty".to_string());
        }
        if self.options.len() < 2 {
            return Err("a question needs at least two options".to_string());
        }
        if self.kind == QuestionKind::TrueFalse && self.options.len() != 2 {
            return Err("a true/false question must have exactly two options".to_string());
        }
        if self.correct_answer as usize >= self.options.len() {
            return Err(format!(
                "correct answer index {} is out of bounds for {} options",
                self.correct_answer,
                self.options.len()
            ));
        }
        let image_kind = self.kind == QuestionKind::MultipleChoiceImage;
        for option in &self.options {
            let is_image = matches!(option, QuestionOption::Image { .. });
            if is_image != image_kind {
                return Err("option variant does not match the question kind".to_string());
            }
        }
        Ok(())
    }
}

//=========================================================================================
// Users, admins, and quiz attempts
//=========================================================================================

/// An end-user account as used throughout the app.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub xp: u64,
    pub last_login: Option<DateTime<Utc>>,
    pub last_quiz_answered_on: Option<NaiveDate>,
}

/// Only used internally for login/registration - contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// Back-office accounts live in their own collection, separate from end users.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// One completed quiz for one user. Append-only once written.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub score: u32,
    pub answered_at: DateTime<Utc>,
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text_option(text: &str) -> QuestionOption {
        QuestionOption::Text {
            text: text.to_string(),
        }
    }

    fn draft_with_questions(questions: Vec<Question>) -> QuizDraft {
        QuizDraft {
            title: "Opening weekend trivia".to_string(),
            scheduled_on: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            category: QuizCategory::BoxOffice,
            status: QuizStatus::Active,
            questions,
        }
    }

    fn valid_question() -> Question {
        Question {
            text: "Which movie opened highest?".to_string(),
            kind: QuestionKind::MultipleChoiceText,
            options: vec![text_option("A"), text_option("B"), text_option("C")],
            correct_answer: 1,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft_with_questions(vec![valid_question()]).validate().is_ok());
    }

    #[test]
    fn zero_question_quiz_is_rejected() {
        let err = draft_with_questions(vec![]).validate().unwrap_err();
        assert!(err.contains("at least one question"));
    }

    #[test]
    fn out_of_bounds_correct_answer_is_rejected() {
        let mut q = valid_question();
        q.correct_answer = 3;
        assert!(draft_with_questions(vec![q]).validate().is_err());
    }

    #[test]
    fn single_option_question_is_rejected() {
        let mut q = valid_question();
        q.options.truncate(1);
        q.correct_answer = 0;
        assert!(draft_with_questions(vec![q]).validate().is_err());
    }

    #[test]
    fn image_option_in_text_question_is_rejected() {
        let mut q = valid_question();
        q.options[0] = QuestionOption::Image {
            image_url: "https://example.com/poster.jpg".to_string(),
        };
        assert!(draft_with_questions(vec![q]).validate().is_err());
    }

    #[test]
    fn true_false_must_have_two_options() {
        let q = Question {
            text: "The sequel out-grossed the original.".to_string(),
            kind: QuestionKind::TrueFalse,
            options: vec![text_option("True"), text_option("False"), text_option("Maybe")],
            correct_answer: 0,
        };
        assert!(draft_with_questions(vec![q]).validate().is_err());
    }

    #[test]
    fn movie_action_parses_known_values_only() {
        assert_eq!("like".parse::<MovieAction>().unwrap(), MovieAction::Like);
        assert_eq!("save".parse::<MovieAction>().unwrap(), MovieAction::Save);
        assert_eq!(
            "dislike".parse::<MovieAction>().unwrap(),
            MovieAction::Dislike
        );
        assert!("favorite".parse::<MovieAction>().is_err());
        assert!("LIKE".parse::<MovieAction>().is_err());
    }

    #[test]
    fn question_option_serializes_with_camel_case_tag() {
        let opt = QuestionOption::Image {
            image_url: "https://example.com/a.jpg".to_string(),
        };
        let json = serde_json::to_value(&opt).unwrap();
        assert_eq!(json["kind"], "image");
        assert_eq!(json["imageUrl"], "https://example.com/a.jpg");
    }
}
