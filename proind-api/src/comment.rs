use crate::{Author, Error, ProjectId, Time, UserId};

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct CommentId(pub String);

impl CommentId {
    pub fn new(id: impl Into<String>) -> CommentId {
        CommentId(id.into())
    }
}

/// A comment as the server sends it
///
/// The wire shape is recursive, but only one level of replies is ever
/// produced by the server.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: CommentId,
    pub text: String,
    pub user: Author,
    pub created_at: Time,
    #[serde(default)]
    pub likes: Vec<UserId>,
    #[serde(default)]
    pub dislikes: Vec<UserId>,
    #[serde(default)]
    pub parent_comment: Option<CommentId>,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

/// Body of `POST /comments`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub project: ProjectId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment: Option<CommentId>,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.project.0)?;
        crate::validate_text(&self.text)?;
        if let Some(parent) = &self.parent_comment {
            crate::validate_string(&parent.0)?;
        }
        Ok(())
    }
}
