use std::{
    collections::{hash_map, HashMap, VecDeque},
    sync::Arc,
};

use crate::{
    api::{self, ProjectId, Time, UserId},
    ActionId, ActionState, CommentTree, Failure, LocalAction, Mutation, PendingAction, Signature,
};

/// How long an action may stay pending before `MirrorStore::expire` fails it
pub const DEFAULT_TIMEOUT_SECS: i64 = 10;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reconciled {
    /// The visible tree was rebuilt from the server payload
    Replaced,

    /// The payload had the same signature, the visible tree was left alone
    Kept,
}

#[derive(Clone, Debug)]
struct Mirror {
    /// Last server-confirmed state
    base: CommentTree,

    /// What the user sees: `base` with the pending actions replayed on top
    current: Arc<CommentTree>,

    /// Signature of the last server payload, `None` until one arrived
    signature: Option<Signature>,

    /// In dispatch order
    pending: VecDeque<PendingAction>,
}

impl Mirror {
    fn empty() -> Mirror {
        Mirror {
            base: CommentTree::new(),
            current: Arc::new(CommentTree::new()),
            signature: None,
            pending: VecDeque::new(),
        }
    }

    fn apply_to_current(&mut self, action: &LocalAction) -> bool {
        let mut tree = CommentTree::clone(&self.current);
        let changed = tree.apply(action);
        if changed {
            self.current = Arc::new(tree);
        }
        changed
    }

    fn rebuild(&mut self) {
        let mut tree = self.base.clone();
        for a in self.pending.iter() {
            if let Some(effect) = a.optimistic_effect() {
                tree.apply(effect);
            }
        }
        if tree != *self.current {
            self.current = Arc::new(tree);
        }
    }
}

/// Local copy of the comment trees of every project the user looks at
///
/// Readers get `Arc` snapshots of the trees; the `Arc` is swapped only when
/// the content of a tree actually changes.
#[derive(Clone, Debug)]
pub struct MirrorStore {
    mirrors: HashMap<ProjectId, Mirror>,
    timeout: chrono::Duration,
    next_action_id: u64,
}

impl Default for MirrorStore {
    fn default() -> MirrorStore {
        MirrorStore::new(chrono::Duration::seconds(DEFAULT_TIMEOUT_SECS))
    }
}

impl MirrorStore {
    pub fn new(timeout: chrono::Duration) -> MirrorStore {
        MirrorStore {
            mirrors: HashMap::new(),
            timeout,
            next_action_id: 0,
        }
    }

    pub fn tree(&self, project: &ProjectId) -> Option<Arc<CommentTree>> {
        self.mirrors.get(project).map(|m| m.current.clone())
    }

    pub fn projects(&self) -> impl Iterator<Item = &ProjectId> {
        self.mirrors.keys()
    }

    /// Records `comments` as the authoritative state of `project`
    ///
    /// The visible tree is only rebuilt if the project was not mirrored yet
    /// or if the top-level ids differ from the previous payload. Pending
    /// actions are replayed on the rebuilt tree.
    pub fn initialize(&mut self, project: ProjectId, comments: Vec<api::Comment>) -> Reconciled {
        let signature = Signature::of(&comments);
        let base = CommentTree::from(comments);
        match self.mirrors.entry(project) {
            hash_map::Entry::Vacant(e) => {
                tracing::debug!(project = ?e.key(), "mirroring new project");
                e.insert(Mirror {
                    current: Arc::new(base.clone()),
                    base,
                    signature: Some(signature),
                    pending: VecDeque::new(),
                });
                Reconciled::Replaced
            }
            hash_map::Entry::Occupied(e) => {
                let project = e.key().clone();
                let m = e.into_mut();
                m.base = base;
                if m.signature.as_ref() == Some(&signature) {
                    tracing::trace!(?project, "server payload unchanged, keeping local tree");
                    return Reconciled::Kept;
                }
                tracing::info!(
                    ?project,
                    num_pending = m.pending.len(),
                    "server payload changed, rebuilding local tree"
                );
                m.signature = Some(signature);
                m.rebuild();
                Reconciled::Replaced
            }
        }
    }

    /// Applies `action` to the visible tree right away, without tracking it
    ///
    /// Reconciling with the server is up to the caller: the next rebuild of
    /// the tree (on a changed payload, a confirmation or a failure) starts
    /// over from the server state. Use `submit` for tracked actions.
    pub fn apply_local_action(&mut self, project: &ProjectId, action: &LocalAction) -> bool {
        match self.mirrors.get_mut(project) {
            Some(m) => m.apply_to_current(action),
            None => {
                tracing::warn!(
                    ?project,
                    ?action,
                    "local action on a project that is not mirrored"
                );
                false
            }
        }
    }

    /// Starts tracking `mutation`, applying its optimistic effect
    pub fn submit(
        &mut self,
        project: ProjectId,
        user: UserId,
        mutation: Mutation,
        now: Time,
    ) -> ActionId {
        let id = ActionId(self.next_action_id);
        self.next_action_id += 1;
        tracing::debug!(?id, ?project, ?mutation, "submitting action");
        let m = self.mirrors.entry(project.clone()).or_insert_with(Mirror::empty);
        let effect = mutation.optimistic_effect(&user, &m.current);
        if let Some(effect) = &effect {
            if !m.apply_to_current(effect) {
                tracing::debug!(?id, "optimistic effect did not find its target");
            }
        }
        m.pending.push_back(PendingAction {
            id,
            project,
            user,
            mutation,
            effect,
            state: ActionState::Pending {
                deadline: now + self.timeout,
            },
        });
        id
    }

    pub fn pending(&self, project: &ProjectId) -> impl Iterator<Item = &PendingAction> {
        self.mirrors
            .get(project)
            .into_iter()
            .flat_map(|m| m.pending.iter())
    }

    pub fn state(&self, id: ActionId) -> Option<&ActionState> {
        self.mirrors
            .values()
            .flat_map(|m| m.pending.iter())
            .find(|a| a.id == id)
            .map(|a| &a.state)
    }

    fn take_pending(&mut self, id: ActionId) -> Option<(&mut Mirror, PendingAction)> {
        for m in self.mirrors.values_mut() {
            if let Some(pos) = m.pending.iter().position(|a| a.id == id) {
                let action = m.pending.remove(pos)?;
                return Some((m, action));
            }
        }
        None
    }

    /// Folds a server success into the confirmed state
    ///
    /// `server` is what the server answered with: the created comment for a
    /// post, the updated comment for a reaction, nothing for a delete.
    pub fn confirm(
        &mut self,
        id: ActionId,
        server: Option<api::Comment>,
    ) -> Option<PendingAction> {
        let Some((m, mut action)) = self.take_pending(id) else {
            tracing::debug!(?id, "confirmation for an action that is no longer pending");
            return None;
        };
        match (&action.mutation, server) {
            (Mutation::Post { .. }, Some(c)) => {
                m.base.insert_confirmed(c);
            }
            (Mutation::Post { .. }, None) => {
                tracing::warn!(?id, "post confirmed without the created comment");
            }
            (Mutation::Like(_) | Mutation::Dislike(_), Some(c)) => {
                m.base.replace(c);
            }
            (_, _) => {
                if let Some(effect) = action.optimistic_effect() {
                    m.base.apply(effect);
                }
            }
        }
        m.rebuild();
        tracing::debug!(?id, "action confirmed");
        action.state = ActionState::Confirmed;
        Some(action)
    }

    /// Drops a failed action, reverting its optimistic effect
    pub fn fail(&mut self, id: ActionId, failure: Failure) -> Option<PendingAction> {
        let Some((m, mut action)) = self.take_pending(id) else {
            tracing::debug!(?id, "failure for an action that is no longer pending");
            return None;
        };
        m.rebuild();
        tracing::error!(?id, mutation = ?action.mutation, ?failure, "action failed");
        action.state = ActionState::Failed(failure);
        Some(action)
    }

    /// Fails every action whose deadline has passed
    pub fn expire(&mut self, now: Time) -> Vec<PendingAction> {
        let overdue = self
            .mirrors
            .values()
            .flat_map(|m| m.pending.iter())
            .filter(|a| a.is_overdue(now))
            .map(|a| a.id)
            .collect::<Vec<_>>();
        overdue
            .into_iter()
            .filter_map(|id| self.fail(id, Failure::TimedOut))
            .collect()
    }

    /// Forgets everything about `project`, including its pending actions
    pub fn teardown(&mut self, project: &ProjectId) -> bool {
        self.mirrors.remove(project).is_some()
    }
}
