use crate::{CommentId, NewComment};

/// One call against the comment endpoints
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Action {
    CreateComment(NewComment),
    Like(CommentId),
    Dislike(CommentId),
    Delete(CommentId),
}
