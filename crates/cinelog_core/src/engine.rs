//! crates/cinelog_core/src/engine.rs
//!
//! The daily-quiz scoring engine. Everything here is pure: the service layer
//! loads the quiz and user, calls into these functions, and performs the
//! single atomic award operation through the `ContentStore` port.

use chrono::NaiveDate;

use crate::domain::Quiz;

/// XP granted per correctly answered question.
pub const CORRECT_ANSWER_XP: u64 = 10;

/// Flat XP bonus granted for completing a quiz.
pub const QUIZ_COMPLETION_XP: u64 = 5;

/// An answer vector as submitted by the client: one slot per question, `None`
/// meaning "not answered yet" during progressive submission.
pub type Answers = [Option<u32>];

/// Counts the correct answers in `answers` against the quiz's answer key.
///
/// The score is computed fresh from the full vector on every call, never
/// accumulated, so a client that revises an earlier answer before the final
/// submission changes the final score accordingly. Unanswered slots and
/// out-of-range indices score zero.
pub fn score(quiz: &Quiz, answers: &Answers) -> u32 {
    quiz.questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| **answer == Some(question.correct_answer))
        .count() as u32
}

/// A submission is final once every slot holds an answer, correct or not.
pub fn is_final(answers: &Answers) -> bool {
    answers.iter().all(Option::is_some)
}

/// XP awarded for a first completed attempt of the day.
pub fn points_for(score: u32) -> u64 {
    u64::from(score) * CORRECT_ANSWER_XP + QUIZ_COMPLETION_XP
}

/// Whether a final submission on `today` earns XP, given the calendar day
/// the user last completed a quiz. Calendar-day equality, not a rolling
/// 24-hour window: answering shortly after each midnight earns on both days.
///
/// The Postgres adapter folds this same predicate into its conditional
/// `UPDATE` so the check and the stamp commit atomically.
pub fn awards_xp_today(last_answered_on: Option<NaiveDate>, today: NaiveDate) -> bool {
    last_answered_on.map_or(true, |last| last < today)
}

/// The full answer key, revealed to the client after each submission so it
/// can render per-question feedback. The read endpoint never exposes this;
/// the submission endpoint is the authoritative post-answer channel.
pub fn correct_answers(quiz: &Quiz) -> Vec<u32> {
    quiz.questions.iter().map(|q| q.correct_answer).collect()
}
