use anyhow::anyhow;
use serde_json::json;

use crate::{CommentId, ProjectId};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not logged in")]
    Unauthenticated,

    #[error("Comment not found {0:?}")]
    NotFound(CommentId),

    #[error("Project not found {0:?}")]
    ProjectNotFound(ProjectId),

    #[error("Name already used {0}")]
    NameAlreadyUsed(String),

    #[error("Text must not be empty")]
    EmptyText,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::ProjectNotFound(_) => StatusCode::NOT_FOUND,
            Error::NameAlreadyUsed(_) => StatusCode::CONFLICT,
            Error::EmptyText => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::Unauthenticated => json!({
                "message": "not logged in",
                "type": "unauthenticated",
            }),
            Error::NotFound(id) => json!({
                "message": "comment not found",
                "type": "not-found",
                "id": id,
            }),
            Error::ProjectNotFound(id) => json!({
                "message": "project not found",
                "type": "project-not-found",
                "id": id,
            }),
            Error::NameAlreadyUsed(n) => json!({
                "message": "name already used",
                "type": "conflict-name",
                "name": n,
            }),
            Error::EmptyText => json!({
                "message": "text must not be empty",
                "type": "empty-text",
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::Network(msg) => json!({
                "message": msg,
                "type": "network",
            }),
        })
        .expect("serializing error")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value = serde_json::from_slice(body)?;
        let field = |name: &str| -> anyhow::Result<String> {
            data.get(name)
                .and_then(|v| v.as_str())
                .map(String::from)
                .ok_or_else(|| anyhow!("error contents is missing its {name:?} field"))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(field("message").unwrap_or_default()),
                "permission-denied" => Error::PermissionDenied,
                "unauthenticated" => Error::Unauthenticated,
                "not-found" => Error::NotFound(CommentId(field("id")?)),
                "project-not-found" => Error::ProjectNotFound(ProjectId(field("id")?)),
                "conflict-name" => Error::NameAlreadyUsed(field("name")?),
                "empty-text" => Error::EmptyText,
                "null-byte" => Error::NullByteInString(field("string")?),
                "network" => Error::Network(field("message").unwrap_or_default()),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
