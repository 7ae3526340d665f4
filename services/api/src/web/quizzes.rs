//! services/api/src/web/quizzes.rs
//!
//! The daily-quiz endpoints: the public read of today's quizzes (answer key
//! stripped), the authenticated submission endpoint driving the XP-award
//! workflow, and the admin CRUD surface.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use cinelog_core::domain::{Question, Quiz, QuizCategory, QuizDraft, QuizStatus};
use cinelog_core::engine;

use crate::error::ApiError;
use crate::web::auth::Claims;
use crate::web::protocol::{AppJson, Envelope};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// A question as shown to players: everything except the correct index.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub text: String,
    #[schema(value_type = String)]
    pub kind: cinelog_core::domain::QuestionKind,
    #[schema(value_type = Vec<Object>)]
    pub options: Vec<cinelog_core::domain::QuestionOption>,
}

impl From<Question> for QuestionView {
    fn from(question: Question) -> Self {
        Self {
            text: question.text,
            kind: question.kind,
            options: question.options,
        }
    }
}

/// A quiz as shown to players on the read path.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub id: Uuid,
    pub title: String,
    pub scheduled_on: NaiveDate,
    #[schema(value_type = String)]
    pub category: QuizCategory,
    pub total_questions: u32,
    pub questions: Vec<QuestionView>,
}

impl From<Quiz> for QuizView {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            scheduled_on: quiz.scheduled_on,
            category: quiz.category,
            total_questions: quiz.questions.len() as u32,
            questions: quiz.questions.into_iter().map(QuestionView::from).collect(),
        }
    }
}

/// A quiz as returned to the back office, answer key included.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuizView {
    pub id: Uuid,
    pub title: String,
    pub scheduled_on: NaiveDate,
    #[schema(value_type = String)]
    pub category: QuizCategory,
    #[schema(value_type = String)]
    pub status: QuizStatus,
    #[schema(value_type = Vec<Object>)]
    pub questions: Vec<Question>,
}

impl From<Quiz> for AdminQuizView {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            scheduled_on: quiz.scheduled_on,
            category: quiz.category,
            status: quiz.status,
            questions: quiz.questions,
        }
    }
}

/// The admin-supplied body for quiz creation and update.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizPayload {
    pub title: String,
    pub scheduled_on: NaiveDate,
    #[schema(value_type = String)]
    pub category: QuizCategory,
    #[serde(default = "default_status")]
    #[schema(value_type = String)]
    pub status: QuizStatus,
    #[schema(value_type = Vec<Object>)]
    pub questions: Vec<Question>,
}

fn default_status() -> QuizStatus {
    QuizStatus::Active
}

impl QuizPayload {
    fn into_draft(self) -> Result<QuizDraft, ApiError> {
        let draft = QuizDraft {
            title: self.title,
            scheduled_on: self.scheduled_on,
            category: self.category,
            status: self.status,
            questions: self.questions,
        };
        draft.validate().map_err(ApiError::Validation)?;
        Ok(draft)
    }
}

/// A progressive or final answer submission. `null` entries mean "not
/// answered yet".
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub answers: Vec<Option<u32>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizResponse {
    pub points_awarded: u64,
    pub score: u32,
    pub total_questions: u32,
    pub correct_answers: Vec<u32>,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub deleted: bool,
}

//=========================================================================================
// Player-facing Handlers
//=========================================================================================

/// GET /quizzes/today - Today's active quizzes across all categories.
///
/// The answer key never travels on this path; clients learn correct answers
/// only through the submission endpoint.
#[utoipa::path(
    get,
    path = "/quizzes/today",
    responses(
        (status = 200, description = "Active quizzes scheduled for today", body = Vec<QuizView>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn today_quizzes_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<QuizView>>>, ApiError> {
    // Server-local calendar day, matching the award boundary.
    let today = Local::now().date_naive();
    let quizzes = state.store.quizzes_for_day(today).await?;
    let views = quizzes.into_iter().map(QuizView::from).collect();
    Ok(Json(Envelope::ok(views)))
}

/// POST /quizzes/submit - Score an answer vector and run the award workflow.
///
/// Intermediate submissions (any `null` slot left) are scored but never
/// persisted. The first final submission of the calendar day awards
/// `score * 10 + 5` XP through one atomic conditional update; later final
/// submissions the same day score normally but award nothing.
#[utoipa::path(
    post,
    path = "/quizzes/submit",
    request_body = SubmitQuizRequest,
    responses(
        (status = 200, description = "Submission scored", body = SubmitQuizResponse),
        (status = 400, description = "Malformed submission"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Submitting for another user"),
        (status = 404, description = "User or quiz not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = []))
)]
pub async fn submit_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<SubmitQuizRequest>,
) -> Result<Json<Envelope<SubmitQuizResponse>>, ApiError> {
    if claims.sub != req.user_id {
        return Err(ApiError::Forbidden(
            "cannot submit answers for another user".to_string(),
        ));
    }

    let user = state.store.user_by_id(req.user_id).await?;
    let quiz = state.store.quiz_by_id(req.quiz_id).await?;

    if req.answers.len() != quiz.questions.len() {
        return Err(ApiError::Validation(format!(
            "expected {} answers, got {}",
            quiz.questions.len(),
            req.answers.len()
        )));
    }

    let score = engine::score(&quiz, &req.answers);
    let total_questions = quiz.questions.len() as u32;
    let correct_answers = engine::correct_answers(&quiz);

    let (points_awarded, message) = if !engine::is_final(&req.answers) {
        // Progressive submission: feedback only, nothing persisted.
        (0, "progress scored".to_string())
    } else {
        let today = Local::now().date_naive();
        let points = engine::points_for(score);
        let awarded = state
            .store
            .award_daily_xp(user.id, quiz.id, score, points, today)
            .await?;
        if awarded {
            info!(user = %user.id, quiz = %quiz.id, score, points, "daily quiz XP awarded");
            (points, "quiz completed, points awarded".to_string())
        } else {
            (0, "you already earned points for today's quiz".to_string())
        }
    };

    Ok(Json(Envelope::ok(SubmitQuizResponse {
        points_awarded,
        score,
        total_questions,
        correct_answers,
        message,
    })))
}

//=========================================================================================
// Admin Handlers
//=========================================================================================

/// POST /quizzes - Create a quiz (back office).
#[utoipa::path(
    post,
    path = "/quizzes",
    request_body = QuizPayload,
    responses(
        (status = 201, description = "Quiz created", body = AdminQuizView),
        (status = 400, description = "Invalid quiz"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not an admin"),
        (status = 409, description = "A quiz already exists for this date and category"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = []))
)]
pub async fn create_quiz_handler(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<QuizPayload>,
) -> Result<(StatusCode, Json<Envelope<AdminQuizView>>), ApiError> {
    let draft = payload.into_draft()?;
    let quiz = state.store.create_quiz(draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(AdminQuizView::from(quiz))),
    ))
}

/// PUT /quizzes/{id} - Replace a quiz (back office).
#[utoipa::path(
    put,
    path = "/quizzes/{id}",
    request_body = QuizPayload,
    params(("id" = Uuid, Path, description = "Quiz identifier")),
    responses(
        (status = 200, description = "Quiz updated", body = AdminQuizView),
        (status = 400, description = "Invalid quiz"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Quiz not found"),
        (status = 409, description = "A quiz already exists for this date and category"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = []))
)]
pub async fn update_quiz_handler(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
    AppJson(payload): AppJson<QuizPayload>,
) -> Result<Json<Envelope<AdminQuizView>>, ApiError> {
    let draft = payload.into_draft()?;
    let quiz = state.store.update_quiz(quiz_id, draft).await?;
    Ok(Json(Envelope::ok(AdminQuizView::from(quiz))))
}

/// DELETE /quizzes/{id} - Delete a quiz (back office).
#[utoipa::path(
    delete,
    path = "/quizzes/{id}",
    params(("id" = Uuid, Path, description = "Quiz identifier")),
    responses(
        (status = 200, description = "Quiz deleted", body = DeletedResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Quiz not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = []))
)]
pub async fn delete_quiz_handler(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<Envelope<DeletedResponse>>, ApiError> {
    state.store.delete_quiz(quiz_id).await?;
    Ok(Json(Envelope::ok(DeletedResponse { deleted: true })))
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::testing::{claims_for, sample_quiz, sample_user, test_state, StubStore};
    use std::sync::atomic::Ordering;

    fn request(user_id: Uuid, quiz_id: Uuid, answers: Vec<Option<u32>>) -> SubmitQuizRequest {
        SubmitQuizRequest {
            user_id,
            quiz_id,
            answers,
        }
    }

    #[tokio::test]
    async fn final_submission_awards_the_documented_points() {
        let user = sample_user();
        let quiz = sample_quiz(&[0, 1, 2]);
        let stub = StubStore::new().with_user(user.clone()).with_quiz(quiz.clone());
        let (state, store) = test_state(stub);

        let response = submit_quiz_handler(
            State(state),
            Extension(claims_for(user.id, false)),
            AppJson(request(user.id, quiz.id, vec![Some(0), Some(1), Some(2)])),
        )
        .await
        .unwrap();

        let data = response.0.data.unwrap();
        assert_eq!(data.score, 3);
        assert_eq!(data.points_awarded, 35);
        assert_eq!(data.total_questions, 3);
        assert_eq!(data.correct_answers, vec![0, 1, 2]);
        assert_eq!(store.award_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_final_submission_of_the_day_awards_nothing() {
        let user = sample_user();
        let quiz = sample_quiz(&[0, 1, 2]);
        let stub = StubStore::new().with_user(user.clone()).with_quiz(quiz.clone());
        let (state, store) = test_state(stub);

        let first = submit_quiz_handler(
            State(state.clone()),
            Extension(claims_for(user.id, false)),
            AppJson(request(user.id, quiz.id, vec![Some(0), Some(1), Some(2)])),
        )
        .await
        .unwrap();
        assert_eq!(first.0.data.unwrap().points_awarded, 35);

        let second = submit_quiz_handler(
            State(state),
            Extension(claims_for(user.id, false)),
            AppJson(request(user.id, quiz.id, vec![Some(0), Some(1), Some(2)])),
        )
        .await
        .unwrap();

        let data = second.0.data.unwrap();
        assert_eq!(data.score, 3);
        assert_eq!(data.points_awarded, 0);
        assert!(data.message.contains("already earned"));
        assert_eq!(store.award_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn completion_on_a_new_day_awards_again() {
        let user = sample_user();
        let quiz = sample_quiz(&[0, 1]);
        let yesterday = Local::now().date_naive().pred_opt().unwrap();
        let stub = StubStore::new()
            .with_user(user.clone())
            .with_quiz(quiz.clone())
            .with_last_answered(yesterday);
        let (state, _) = test_state(stub);

        let response = submit_quiz_handler(
            State(state),
            Extension(claims_for(user.id, false)),
            AppJson(request(user.id, quiz.id, vec![Some(0), Some(1)])),
        )
        .await
        .unwrap();

        assert_eq!(response.0.data.unwrap().points_awarded, 25);
    }

    #[tokio::test]
    async fn intermediate_submission_never_touches_the_award_path() {
        let user = sample_user();
        let quiz = sample_quiz(&[0, 1, 2]);
        let stub = StubStore::new().with_user(user.clone()).with_quiz(quiz.clone());
        let (state, store) = test_state(stub);

        let response = submit_quiz_handler(
            State(state),
            Extension(claims_for(user.id, false)),
            AppJson(request(user.id, quiz.id, vec![Some(0), None, None])),
        )
        .await
        .unwrap();

        let data = response.0.data.unwrap();
        assert_eq!(data.score, 1);
        assert_eq!(data.points_awarded, 0);
        // Feedback is still revealed for the answered question.
        assert_eq!(data.correct_answers, vec![0, 1, 2]);
        assert_eq!(store.award_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn submitting_for_another_user_is_forbidden() {
        let user = sample_user();
        let quiz = sample_quiz(&[0]);
        let stub = StubStore::new().with_user(user.clone()).with_quiz(quiz.clone());
        let (state, store) = test_state(stub);

        let err = submit_quiz_handler(
            State(state),
            Extension(claims_for(Uuid::new_v4(), false)),
            AppJson(request(user.id, quiz.id, vec![Some(0)])),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(store.award_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_answer_count_is_a_validation_error() {
        let user = sample_user();
        let quiz = sample_quiz(&[0, 1, 2]);
        let stub = StubStore::new().with_user(user.clone()).with_quiz(quiz.clone());
        let (state, _) = test_state(stub);

        let err = submit_quiz_handler(
            State(state),
            Extension(claims_for(user.id, false)),
            AppJson(request(user.id, quiz.id, vec![Some(0)])),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_quiz_is_not_found() {
        let user = sample_user();
        let stub = StubStore::new().with_user(user.clone());
        let (state, _) = test_state(stub);

        let err = submit_quiz_handler(
            State(state),
            Extension(claims_for(user.id, false)),
            AppJson(request(user.id, Uuid::new_v4(), vec![Some(0)])),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn create_rejects_a_zero_question_quiz_before_the_store() {
        let (state, store) = test_state(StubStore::new());
        let payload = QuizPayload {
            title: "Empty".to_string(),
            scheduled_on: Local::now().date_naive(),
            category: QuizCategory::Trivia,
            status: QuizStatus::Active,
            questions: vec![],
        };

        let err = create_quiz_handler(State(state), AppJson(payload))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(store.quiz_writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_submission_body_is_rejected_inside_the_envelope() {
        use axum::body::Body;
        use axum::extract::FromRequest;
        use axum::http::header;
        use axum::response::IntoResponse;

        // `answers` must be an array; a string fails deserialization.
        let body = format!(
            r#"{{"userId":"{}","quizId":"{}","answers":"zero"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let request = axum::http::Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();

        let err = AppJson::<SubmitQuizRequest>::from_request(request, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }
}
