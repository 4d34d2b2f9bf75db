mod comment;
pub use comment::{Comment, Node, Reaction, Reactions, Reply};

mod action;
pub use action::LocalAction;

mod tree;
pub use tree::{CommentTree, Signature};

mod pending;
pub use pending::{ActionId, ActionState, Failure, Mutation, PendingAction};

mod store;
pub use store::{MirrorStore, Reconciled, DEFAULT_TIMEOUT_SECS};

mod session;
pub use session::{send, Outcome, Session, Ticket};


pub mod api {
    pub use proind_api::*;
}
