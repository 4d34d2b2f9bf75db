use crate::{
    api::{CommentId, UserId},
    Comment, Reaction, Reply,
};

/// One user-driven mutation of a comment tree
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LocalAction {
    AddTopLevel(Comment),
    AddReply { parent: CommentId, reply: Reply },
    ToggleLike { comment: CommentId, user: UserId },
    ToggleDislike { comment: CommentId, user: UserId },

    /// Leaves `user` with exactly `reaction` on `comment`
    SetReaction {
        comment: CommentId,
        user: UserId,
        reaction: Option<Reaction>,
    },
    Delete(CommentId),
}
