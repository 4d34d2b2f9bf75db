pub type Time = chrono::DateTime<chrono::Utc>;

mod action;
pub use action::Action;

mod auth;
pub use auth::{AuthReply, AuthToken, NewSession};

mod comment;
pub use comment::{Comment, CommentId, NewComment};

mod error;
pub use error::Error;

mod project;
pub use project::ProjectId;

mod server;
pub use server::Server;

mod user;
pub use user::{Author, UserId};

// Rejects strings that the server could not store
pub(crate) fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(s.to_string()));
    }
    Ok(())
}

/// Validates user-submitted text, which must not be blank
pub fn validate_text(s: &str) -> Result<(), Error> {
    if s.trim().is_empty() {
        return Err(Error::EmptyText);
    }
    validate_string(s)
}
