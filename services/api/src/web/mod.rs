//! services/api/src/web/mod.rs
//!
//! The REST gateway: handlers, middleware, shared state, and the master
//! definition of the OpenAPI specification.

pub mod actions;
pub mod auth;
pub mod middleware;
pub mod movies;
pub mod protocol;
pub mod quizzes;
pub mod state;

#[cfg(test)]
pub mod testing;

pub use middleware::{require_admin, require_auth};

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the bearer-token security scheme referenced by the protected
/// paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::admin_login_handler,
        movies::movie_detail_handler,
        quizzes::today_quizzes_handler,
        quizzes::submit_quiz_handler,
        quizzes::create_quiz_handler,
        quizzes::update_quiz_handler,
        quizzes::delete_quiz_handler,
        actions::add_action_handler,
        actions::remove_action_handler,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            movies::MovieDetailResponse,
            quizzes::QuizView,
            quizzes::QuestionView,
            quizzes::AdminQuizView,
            quizzes::QuizPayload,
            quizzes::SubmitQuizRequest,
            quizzes::SubmitQuizResponse,
            quizzes::DeletedResponse,
            actions::MovieActionRequest,
            actions::MovieActionResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Cinelog API", description = "Movie reviews, box-office tracking, and the daily quiz.")
    )
)]
pub struct ApiDoc;
