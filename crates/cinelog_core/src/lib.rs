pub mod domain;
pub mod engine;
pub mod ports;

pub use domain::{
    AdminCredentials, CastMember, CountryEarnings, InvalidMovieAction, Movie, MovieAction,
    Question, QuestionKind, QuestionOption, Quiz, QuizAttempt, QuizCategory, QuizDraft,
    QuizStatus, User, UserCredentials,
};
pub use ports::{ContentStore, PortError, PortResult};
