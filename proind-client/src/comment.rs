use std::collections::BTreeSet;

use crate::api::{self, Author, CommentId, Time, UserId};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reaction {
    Like,
    Dislike,
}

/// Like/dislike state of one comment
///
/// A user is never in both sets at once.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Reactions {
    likes: BTreeSet<UserId>,
    dislikes: BTreeSet<UserId>,
}

impl Reactions {
    /// Builds reactions from server lists, resolving users found in both
    /// lists as a like
    pub fn from_lists(likes: Vec<UserId>, dislikes: Vec<UserId>) -> Reactions {
        let likes = likes.into_iter().collect::<BTreeSet<_>>();
        let mut dislikes = dislikes.into_iter().collect::<BTreeSet<_>>();
        let num_dislikes = dislikes.len();
        dislikes.retain(|u| !likes.contains(u));
        if dislikes.len() != num_dislikes {
            tracing::warn!(
                num_conflicts = num_dislikes - dislikes.len(),
                "server sent users that both like and dislike a comment"
            );
        }
        Reactions { likes, dislikes }
    }

    pub fn likes(&self) -> &BTreeSet<UserId> {
        &self.likes
    }

    pub fn dislikes(&self) -> &BTreeSet<UserId> {
        &self.dislikes
    }

    pub fn of(&self, user: &UserId) -> Option<Reaction> {
        if self.likes.contains(user) {
            Some(Reaction::Like)
        } else if self.dislikes.contains(user) {
            Some(Reaction::Dislike)
        } else {
            None
        }
    }

    /// Puts `user` in exactly the set `reaction` names, or in neither
    pub fn set(&mut self, user: &UserId, reaction: Option<Reaction>) {
        self.likes.remove(user);
        self.dislikes.remove(user);
        match reaction {
            Some(Reaction::Like) => {
                self.likes.insert(user.clone());
            }
            Some(Reaction::Dislike) => {
                self.dislikes.insert(user.clone());
            }
            None => (),
        }
    }

    pub fn toggle_like(&mut self, user: &UserId) {
        if !self.likes.remove(user) {
            self.likes.insert(user.clone());
            self.dislikes.remove(user);
        }
    }

    pub fn toggle_dislike(&mut self, user: &UserId) {
        if !self.dislikes.remove(user) {
            self.dislikes.insert(user.clone());
            self.likes.remove(user);
        }
    }

    fn to_lists(&self) -> (Vec<UserId>, Vec<UserId>) {
        (
            self.likes.iter().cloned().collect(),
            self.dislikes.iter().cloned().collect(),
        )
    }
}

/// A reply to a top-level comment. Replies never have replies of their own.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reply {
    pub id: CommentId,
    pub parent_id: CommentId,
    pub text: String,
    pub author: Author,
    pub date: Time,
    pub reactions: Reactions,
}

impl Reply {
    /// Nested replies of `c` are ignored, see `Comment::from`
    pub fn from_api(c: api::Comment, parent_id: &CommentId) -> Reply {
        Reply {
            id: c.id,
            parent_id: parent_id.clone(),
            text: c.text,
            author: c.user,
            date: c.created_at,
            reactions: Reactions::from_lists(c.likes, c.dislikes),
        }
    }

    pub fn to_api(&self) -> api::Comment {
        let (likes, dislikes) = self.reactions.to_lists();
        api::Comment {
            id: self.id.clone(),
            text: self.text.clone(),
            user: self.author.clone(),
            created_at: self.date,
            likes,
            dislikes,
            parent_comment: Some(self.parent_id.clone()),
            replies: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub author: Author,
    pub date: Time,
    pub reactions: Reactions,

    /// Replies, oldest first
    pub replies: Vec<Reply>,
}

impl From<api::Comment> for Comment {
    /// Replies of replies get flattened right after their parent, so the
    /// result is always two levels deep
    fn from(c: api::Comment) -> Comment {
        let mut replies = Vec::with_capacity(c.replies.len());
        let mut todo = c.replies.into_iter().rev().collect::<Vec<_>>();
        while let Some(mut r) = todo.pop() {
            let nested = std::mem::take(&mut r.replies);
            if !nested.is_empty() {
                tracing::warn!(
                    reply = ?r.id,
                    num_nested = nested.len(),
                    "flattening replies nested below a reply"
                );
                todo.extend(nested.into_iter().rev());
            }
            replies.push(Reply::from_api(r, &c.id));
        }
        Comment {
            id: c.id,
            text: c.text,
            author: c.user,
            date: c.created_at,
            reactions: Reactions::from_lists(c.likes, c.dislikes),
            replies,
        }
    }
}

impl Comment {
    pub fn to_api(&self) -> api::Comment {
        let (likes, dislikes) = self.reactions.to_lists();
        api::Comment {
            id: self.id.clone(),
            text: self.text.clone(),
            user: self.author.clone(),
            created_at: self.date,
            likes,
            dislikes,
            parent_comment: None,
            replies: self.replies.iter().map(Reply::to_api).collect(),
        }
    }
}

/// Borrowed view of either level of the tree
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Node<'a> {
    Comment(&'a Comment),
    Reply(&'a Reply),
}

impl<'a> Node<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Node::Comment(c) => &c.text,
            Node::Reply(r) => &r.text,
        }
    }

    pub fn author(&self) -> &'a Author {
        match self {
            Node::Comment(c) => &c.author,
            Node::Reply(r) => &r.author,
        }
    }

    pub fn reactions(&self) -> &'a Reactions {
        match self {
            Node::Comment(c) => &c.reactions,
            Node::Reply(r) => &r.reactions,
        }
    }

    pub fn to_api(&self) -> api::Comment {
        match self {
            Node::Comment(c) => c.to_api(),
            Node::Reply(r) => r.to_api(),
        }
    }
}
