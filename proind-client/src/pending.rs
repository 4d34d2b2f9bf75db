use crate::{
    api::{self, CommentId, NewComment, ProjectId, Time, UserId},
    CommentTree, LocalAction, Reaction,
};

/// Local handle on an in-flight action, unique within a `MirrorStore`
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ActionId(pub u64);

/// What the user asked the server to do
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Mutation {
    /// New top-level comment, or reply if `parent` is set
    Post {
        text: String,
        parent: Option<CommentId>,
    },
    Like(CommentId),
    Dislike(CommentId),
    Delete(CommentId),
}

impl Mutation {
    /// The change to apply locally before the server answers, given the
    /// tree the user is looking at
    ///
    /// Reactions become the state the toggle leads to, so that replaying them
    /// over a server copy that already has them changes nothing. Posts have
    /// no effect: new comments only show up once the server gave them an id.
    pub fn optimistic_effect(&self, user: &UserId, tree: &CommentTree) -> Option<LocalAction> {
        let toggled = |id: &CommentId, reaction: Reaction| {
            let current = tree.find(id).and_then(|n| n.reactions().of(user));
            LocalAction::SetReaction {
                comment: id.clone(),
                user: user.clone(),
                reaction: (current != Some(reaction)).then_some(reaction),
            }
        };
        match self {
            Mutation::Post { .. } => None,
            Mutation::Like(id) => Some(toggled(id, Reaction::Like)),
            Mutation::Dislike(id) => Some(toggled(id, Reaction::Dislike)),
            Mutation::Delete(id) => Some(LocalAction::Delete(id.clone())),
        }
    }

    pub fn to_api(&self, project: &ProjectId) -> api::Action {
        match self {
            Mutation::Post { text, parent } => api::Action::CreateComment(NewComment {
                project: project.clone(),
                text: text.clone(),
                parent_comment: parent.clone(),
            }),
            Mutation::Like(id) => api::Action::Like(id.clone()),
            Mutation::Dislike(id) => api::Action::Dislike(id.clone()),
            Mutation::Delete(id) => api::Action::Delete(id.clone()),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Failure {
    /// The request did not reach the server or its answer did not come back
    Network(String),

    /// The server refused the action
    Rejected(api::Error),

    TimedOut,
}

impl From<api::Error> for Failure {
    fn from(e: api::Error) -> Failure {
        match e {
            api::Error::Network(msg) => Failure::Network(msg),
            e => Failure::Rejected(e),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ActionState {
    Pending { deadline: Time },
    Confirmed,
    Failed(Failure),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingAction {
    pub id: ActionId,
    pub project: ProjectId,
    pub user: UserId,
    pub mutation: Mutation,

    /// Computed once at submission, see `Mutation::optimistic_effect`
    pub effect: Option<LocalAction>,
    pub state: ActionState,
}

impl PendingAction {
    pub fn is_overdue(&self, now: Time) -> bool {
        match self.state {
            ActionState::Pending { deadline } => deadline <= now,
            _ => false,
        }
    }

    pub fn optimistic_effect(&self) -> Option<&LocalAction> {
        self.effect.as_ref()
    }
}
