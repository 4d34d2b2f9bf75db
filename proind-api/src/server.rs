use async_trait::async_trait;

use crate::{
    Action, AuthReply, AuthToken, Comment, CommentId, Error, NewComment, NewSession, ProjectId,
};

/// The comment REST API, as seen from a client
#[async_trait]
pub trait Server: Send + Sync {
    async fn login(&self, session: NewSession) -> Result<AuthReply, Error>;

    async fn list_comments(&self, project: &ProjectId) -> Result<Vec<Comment>, Error>;

    /// Returns the created comment with its server-assigned id
    async fn create_comment(&self, token: &AuthToken, c: &NewComment) -> Result<Comment, Error>;

    /// Returns the comment with its updated reactions
    async fn like(&self, token: &AuthToken, id: &CommentId) -> Result<Comment, Error>;

    /// Returns the comment with its updated reactions
    async fn dislike(&self, token: &AuthToken, id: &CommentId) -> Result<Comment, Error>;

    async fn delete(&self, token: &AuthToken, id: &CommentId) -> Result<(), Error>;

    async fn submit(&self, token: &AuthToken, action: &Action) -> Result<Option<Comment>, Error> {
        match action {
            Action::CreateComment(c) => self.create_comment(token, c).await.map(Some),
            Action::Like(id) => self.like(token, id).await.map(Some),
            Action::Dislike(id) => self.dislike(token, id).await.map(Some),
            Action::Delete(id) => self.delete(token, id).await.map(|()| None),
        }
    }
}
