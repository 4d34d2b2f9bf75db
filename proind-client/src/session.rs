use crate::{
    api::{self, AuthToken, ProjectId, Server, Time, UserId},
    ActionId, MirrorStore, Mutation, PendingAction, Reconciled,
};

/// A dispatched action waiting to be sent to the server
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ticket {
    pub action: ActionId,
    pub call: api::Action,
}

/// The server's answer to a `Ticket`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Outcome {
    pub action: ActionId,
    pub result: Result<Option<api::Comment>, api::Error>,
}

/// Sends a ticket's call to the server
///
/// This does not touch the session, so any number of tickets can be in
/// flight at once; hand the outcomes back to `Session::complete` in whatever
/// order they arrive.
pub async fn send<S>(server: &S, token: &AuthToken, ticket: &Ticket) -> Outcome
where
    S: Server + ?Sized,
{
    Outcome {
        action: ticket.action,
        result: server.submit(token, &ticket.call).await,
    }
}

/// The signed-in user's view of the comment trees
pub struct Session {
    store: MirrorStore,
    user: Option<UserId>,
}

impl Session {
    pub fn new(store: MirrorStore, user: Option<UserId>) -> Session {
        Session { store, user }
    }

    pub fn store(&self) -> &MirrorStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MirrorStore {
        &mut self.store
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn log_in(&mut self, user: UserId) {
        self.user = Some(user);
    }

    pub fn log_out(&mut self) {
        self.user = None;
    }

    /// Applies `mutation` locally and returns the call that makes it durable
    pub fn dispatch(
        &mut self,
        project: &ProjectId,
        mutation: Mutation,
        now: Time,
    ) -> Result<Ticket, api::Error> {
        let user = self.user.clone().ok_or(api::Error::Unauthenticated)?;
        let call = mutation.to_api(project);
        if let api::Action::CreateComment(c) = &call {
            c.validate()?;
        }
        let action = self.store.submit(project.clone(), user, mutation, now);
        Ok(Ticket { action, call })
    }

    pub fn complete(&mut self, outcome: Outcome) -> Option<PendingAction> {
        match outcome.result {
            Ok(c) => self.store.confirm(outcome.action, c),
            Err(e) => self.store.fail(outcome.action, e.into()),
        }
    }

    /// Fetches the comments of `project` and reconciles the local tree
    pub async fn refresh<S>(
        &mut self,
        server: &S,
        project: &ProjectId,
    ) -> Result<Reconciled, api::Error>
    where
        S: Server + ?Sized,
    {
        let comments = server.list_comments(project).await?;
        Ok(self.store.initialize(project.clone(), comments))
    }
}
