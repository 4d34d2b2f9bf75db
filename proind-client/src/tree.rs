use crate::{
    api::{self, CommentId, UserId},
    Comment, LocalAction, Node, Reaction, Reactions, Reply,
};

/// Cheap summary of a top-level comment list, used to tell a real change of
/// the server data apart from a mere re-send of the same list
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Signature {
    len: usize,
    ids: Vec<CommentId>,
}

impl Signature {
    pub fn of(comments: &[api::Comment]) -> Signature {
        Signature {
            len: comments.len(),
            ids: comments.iter().map(|c| c.id.clone()).collect(),
        }
    }
}

/// Comments of one project: top-level comments most recent first, each
/// owning its replies oldest first
///
/// None of the mutations fail. Targeting an id that is not in the tree leaves
/// the tree untouched, and the mutation returns `false`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommentTree {
    comments: Vec<Comment>,
}

impl From<Vec<api::Comment>> for CommentTree {
    fn from(comments: Vec<api::Comment>) -> CommentTree {
        CommentTree {
            comments: comments.into_iter().map(Comment::from).collect(),
        }
    }
}

impl CommentTree {
    pub fn new() -> CommentTree {
        CommentTree::default()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Comment> {
        self.comments.iter()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn reply_count(&self) -> usize {
        self.comments.iter().map(|c| c.replies.len()).sum()
    }

    pub fn signature(&self) -> Signature {
        Signature {
            len: self.comments.len(),
            ids: self.comments.iter().map(|c| c.id.clone()).collect(),
        }
    }

    pub fn to_api(&self) -> Vec<api::Comment> {
        self.comments.iter().map(Comment::to_api).collect()
    }

    /// Looks up a comment, checking each top-level comment before its replies
    pub fn find(&self, id: &CommentId) -> Option<Node<'_>> {
        for c in self.comments.iter() {
            if c.id == *id {
                return Some(Node::Comment(c));
            }
            if let Some(r) = c.replies.iter().find(|r| r.id == *id) {
                return Some(Node::Reply(r));
            }
        }
        None
    }

    /// Returns the top-level comment a node belongs to
    pub fn top_level_of(&self, id: &CommentId) -> Option<&Comment> {
        self.comments
            .iter()
            .find(|c| c.id == *id || c.replies.iter().any(|r| r.id == *id))
    }

    fn reactions_mut(&mut self, id: &CommentId) -> Option<&mut Reactions> {
        for c in self.comments.iter_mut() {
            if c.id == *id {
                return Some(&mut c.reactions);
            }
            if let Some(r) = c.replies.iter_mut().find(|r| r.id == *id) {
                return Some(&mut r.reactions);
            }
        }
        None
    }

    pub fn add_top_level_comment(&mut self, comment: Comment) {
        self.comments.insert(0, comment);
    }

    /// Only top-level comments can be replied to
    pub fn add_reply(&mut self, parent: &CommentId, reply: Reply) -> bool {
        match self.comments.iter_mut().find(|c| c.id == *parent) {
            Some(c) => {
                c.replies.push(reply);
                true
            }
            None => false,
        }
    }

    pub fn toggle_like(&mut self, id: &CommentId, user: &UserId) -> bool {
        match self.reactions_mut(id) {
            Some(r) => {
                r.toggle_like(user);
                true
            }
            None => false,
        }
    }

    pub fn toggle_dislike(&mut self, id: &CommentId, user: &UserId) -> bool {
        match self.reactions_mut(id) {
            Some(r) => {
                r.toggle_dislike(user);
                true
            }
            None => false,
        }
    }

    pub fn set_reaction(
        &mut self,
        id: &CommentId,
        user: &UserId,
        reaction: Option<Reaction>,
    ) -> bool {
        match self.reactions_mut(id) {
            Some(r) => {
                r.set(user, reaction);
                true
            }
            None => false,
        }
    }

    /// Top-level matches take precedence: replies are only searched when no
    /// top-level comment was removed, and then at most one reply goes away
    pub fn delete_comment(&mut self, id: &CommentId) -> bool {
        let num_comments = self.comments.len();
        self.comments.retain(|c| c.id != *id);
        if self.comments.len() != num_comments {
            return true;
        }
        for c in self.comments.iter_mut() {
            if let Some(pos) = c.replies.iter().position(|r| r.id == *id) {
                c.replies.remove(pos);
                return true;
            }
        }
        false
    }

    /// Swaps a node for its server-confirmed version
    ///
    /// A top-level comment sent without replies keeps the replies already
    /// known locally.
    pub fn replace(&mut self, c: api::Comment) -> bool {
        if let Some(old) = self.comments.iter_mut().find(|old| old.id == c.id) {
            let mut new = Comment::from(c);
            if new.replies.is_empty() {
                new.replies = std::mem::take(&mut old.replies);
            }
            *old = new;
            return true;
        }
        for top in self.comments.iter_mut() {
            if let Some(old) = top.replies.iter_mut().find(|old| old.id == c.id) {
                *old = Reply::from_api(c, &top.id);
                return true;
            }
        }
        false
    }

    /// Inserts a comment the server just created, as a reply if it has a
    /// parent and as the newest top-level comment otherwise
    pub fn insert_confirmed(&mut self, c: api::Comment) -> bool {
        match c.parent_comment.clone() {
            None => {
                self.add_top_level_comment(Comment::from(c));
                true
            }
            Some(parent) => {
                let inserted = self.add_reply(&parent, Reply::from_api(c, &parent));
                if !inserted {
                    tracing::warn!(?parent, "dropping confirmed reply to unknown comment");
                }
                inserted
            }
        }
    }

    pub fn apply(&mut self, action: &LocalAction) -> bool {
        match action {
            LocalAction::AddTopLevel(c) => {
                self.add_top_level_comment(c.clone());
                true
            }
            LocalAction::AddReply { parent, reply } => self.add_reply(parent, reply.clone()),
            LocalAction::ToggleLike { comment, user } => self.toggle_like(comment, user),
            LocalAction::ToggleDislike { comment, user } => self.toggle_dislike(comment, user),
            LocalAction::SetReaction {
                comment,
                user,
                reaction,
            } => self.set_reaction(comment, user, *reaction),
            LocalAction::Delete(id) => self.delete_comment(id),
        }
    }
}
