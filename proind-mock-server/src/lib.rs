use std::{
    collections::{hash_map, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use proind_client::{
    api::{
        self, AuthReply, AuthToken, Author, CommentId, Error, NewComment, NewSession, ProjectId,
        Server, UserId,
    },
    Comment, CommentTree, Reply,
};
use uuid::Uuid;

#[derive(Debug)]
struct DbUser {
    password: String,
    author: Author,
}

/// In-memory stand-in for the comment backend
#[derive(Debug, Default)]
pub struct MockServer {
    /// Keyed by email
    users: HashMap<String, DbUser>,
    sessions: HashMap<AuthToken, UserId>,
    projects: HashMap<ProjectId, CommentTree>,

    /// Number of upcoming calls that fail with a network error
    failures: usize,
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer::default()
    }

    pub fn create_user(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Author, Error> {
        api::validate_text(email)?;
        api::validate_text(name)?;
        match self.users.entry(String::from(email)) {
            hash_map::Entry::Occupied(_) => Err(Error::NameAlreadyUsed(String::from(email))),
            hash_map::Entry::Vacant(e) => {
                let author = Author {
                    id: UserId(Uuid::new_v4().to_string()),
                    name: String::from(name),
                    avatar: None,
                };
                e.insert(DbUser {
                    password: String::from(password),
                    author: author.clone(),
                });
                Ok(author)
            }
        }
    }

    /// Returns false if the project already existed
    pub fn create_project(&mut self, project: ProjectId) -> bool {
        match self.projects.entry(project) {
            hash_map::Entry::Occupied(_) => false,
            hash_map::Entry::Vacant(e) => {
                e.insert(CommentTree::new());
                true
            }
        }
    }

    /// Replaces the comments of `project`, creating it if needed
    pub fn seed(&mut self, project: ProjectId, comments: Vec<api::Comment>) {
        self.projects.insert(project, CommentTree::from(comments));
    }

    /// Makes the next `n` calls fail with `Error::Network`
    pub fn fail_next(&mut self, n: usize) {
        self.failures = n;
    }

    fn check_failure(&mut self) -> Result<(), Error> {
        if self.failures == 0 {
            return Ok(());
        }
        self.failures -= 1;
        tracing::debug!(remaining = self.failures, "injecting network failure");
        Err(Error::Network(String::from("injected failure")))
    }

    fn resolve(&self, tok: &AuthToken) -> Result<&Author, Error> {
        let uid = self.sessions.get(tok).ok_or(Error::Unauthenticated)?;
        self.users
            .values()
            .map(|u| &u.author)
            .find(|a| a.id == *uid)
            .ok_or(Error::Unauthenticated)
    }

    /// Finds the project holding comment `id`
    fn locate(&mut self, id: &CommentId) -> Result<&mut CommentTree, Error> {
        self.projects
            .values_mut()
            .find(|t| t.find(id).is_some())
            .ok_or_else(|| Error::NotFound(id.clone()))
    }

    pub fn auth(&mut self, s: NewSession) -> Result<AuthReply, Error> {
        self.check_failure()?;
        s.validate()?;
        let u = self
            .users
            .get(&s.email)
            .filter(|u| u.password == s.password)
            .ok_or(Error::PermissionDenied)?;
        let token = AuthToken(Uuid::new_v4().to_string());
        self.sessions.insert(token.clone(), u.author.id.clone());
        Ok(AuthReply {
            token,
            user: u.author.clone(),
        })
    }

    pub fn unauth(&mut self, tok: &AuthToken) -> Result<(), Error> {
        self.sessions
            .remove(tok)
            .map(|_| ())
            .ok_or(Error::Unauthenticated)
    }

    pub fn list_comments(&mut self, project: &ProjectId) -> Result<Vec<api::Comment>, Error> {
        self.check_failure()?;
        self.projects
            .get(project)
            .map(CommentTree::to_api)
            .ok_or_else(|| Error::ProjectNotFound(project.clone()))
    }

    pub fn create_comment(
        &mut self,
        tok: &AuthToken,
        c: &NewComment,
    ) -> Result<api::Comment, Error> {
        self.check_failure()?;
        let author = self.resolve(tok)?.clone();
        c.validate()?;
        let tree = self
            .projects
            .get_mut(&c.project)
            .ok_or_else(|| Error::ProjectNotFound(c.project.clone()))?;
        let created = api::Comment {
            id: CommentId(Uuid::new_v4().to_string()),
            text: c.text.clone(),
            user: author,
            created_at: chrono::Utc::now(),
            likes: Vec::new(),
            dislikes: Vec::new(),
            parent_comment: c.parent_comment.clone(),
            replies: Vec::new(),
        };
        match &c.parent_comment {
            None => tree.add_top_level_comment(Comment::from(created.clone())),
            Some(parent) => {
                let reply = Reply::from_api(created.clone(), parent);
                if !tree.add_reply(parent, reply) {
                    return Err(Error::NotFound(parent.clone()));
                }
            }
        }
        tracing::debug!(id = ?created.id, project = ?c.project, "created comment");
        Ok(created)
    }

    pub fn like(&mut self, tok: &AuthToken, id: &CommentId) -> Result<api::Comment, Error> {
        self.react(tok, id, CommentTree::toggle_like)
    }

    pub fn dislike(&mut self, tok: &AuthToken, id: &CommentId) -> Result<api::Comment, Error> {
        self.react(tok, id, CommentTree::toggle_dislike)
    }

    fn react(
        &mut self,
        tok: &AuthToken,
        id: &CommentId,
        toggle: fn(&mut CommentTree, &CommentId, &UserId) -> bool,
    ) -> Result<api::Comment, Error> {
        self.check_failure()?;
        let user = self.resolve(tok)?.id.clone();
        let tree = self.locate(id)?;
        toggle(tree, id, &user);
        tree.find(id)
            .map(|n| n.to_api())
            .ok_or_else(|| Error::NotFound(id.clone()))
    }

    /// Only the author may delete a comment; replies go away with their parent
    pub fn delete(&mut self, tok: &AuthToken, id: &CommentId) -> Result<(), Error> {
        self.check_failure()?;
        let user = self.resolve(tok)?.id.clone();
        let tree = self.locate(id)?;
        let is_author = tree
            .find(id)
            .map(|n| n.author().id == user)
            .unwrap_or(false);
        if !is_author {
            return Err(Error::PermissionDenied);
        }
        tree.delete_comment(id);
        Ok(())
    }
}

/// `MockServer` behind a lock, usable wherever a `Server` is expected
#[derive(Clone, Debug, Default)]
pub struct SharedMockServer(pub Arc<parking_lot::Mutex<MockServer>>);

impl SharedMockServer {
    pub fn new(server: MockServer) -> SharedMockServer {
        SharedMockServer(Arc::new(parking_lot::Mutex::new(server)))
    }

    pub fn lock(&self) -> parking_lot::MutexGuard<'_, MockServer> {
        self.0.lock()
    }
}

#[async_trait]
impl Server for SharedMockServer {
    async fn login(&self, session: NewSession) -> Result<AuthReply, Error> {
        self.lock().auth(session)
    }

    async fn list_comments(&self, project: &ProjectId) -> Result<Vec<api::Comment>, Error> {
        self.lock().list_comments(project)
    }

    async fn create_comment(
        &self,
        token: &AuthToken,
        c: &NewComment,
    ) -> Result<api::Comment, Error> {
        self.lock().create_comment(token, c)
    }

    async fn like(&self, token: &AuthToken, id: &CommentId) -> Result<api::Comment, Error> {
        self.lock().like(token, id)
    }

    async fn dislike(&self, token: &AuthToken, id: &CommentId) -> Result<api::Comment, Error> {
        self.lock().dislike(token, id)
    }

    async fn delete(&self, token: &AuthToken, id: &CommentId) -> Result<(), Error> {
        self.lock().delete(token, id)
    }
}
