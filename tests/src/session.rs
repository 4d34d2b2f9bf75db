use chrono::{Duration, Utc};
use proind_client::{
    api::{self, Author, AuthToken, CommentId, Error, NewSession, ProjectId, Server, UserId},
    send, ActionState, Failure, MirrorStore, Mutation, Reconciled, Session,
};
use proind_mock_server::{MockServer, SharedMockServer};

fn project() -> ProjectId {
    ProjectId::new("clean-the-river")
}

/// A shared server with one project and the given users, all with password
/// "pass"
fn server(users: &[&str]) -> SharedMockServer {
    let mut s = MockServer::new();
    s.create_project(project());
    for u in users {
        s.create_user(&format!("{u}@example.org"), "pass", u)
            .expect("creating user");
    }
    SharedMockServer::new(s)
}

async fn log_in(server: &SharedMockServer, user: &str) -> (Session, AuthToken) {
    let reply = server
        .login(NewSession {
            email: format!("{user}@example.org"),
            password: String::from("pass"),
        })
        .await
        .expect("logging in");
    let mut session = Session::new(MirrorStore::default(), Some(reply.user.id));
    let r = session.refresh(server, &project()).await.expect("refreshing");
    assert_eq!(r, Reconciled::Replaced);
    (session, reply.token)
}

async fn post(session: &mut Session, server: &SharedMockServer, tok: &AuthToken, text: &str) {
    let ticket = session
        .dispatch(
            &project(),
            Mutation::Post {
                text: String::from(text),
                parent: None,
            },
            Utc::now(),
        )
        .expect("dispatching post");
    let done = session.complete(send(server, tok, &ticket).await);
    assert_eq!(done.map(|a| a.state), Some(ActionState::Confirmed));
}

fn top_level_ids(session: &Session) -> Vec<CommentId> {
    session
        .store()
        .tree(&project())
        .expect("project is mirrored")
        .iter()
        .map(|c| c.id.clone())
        .collect()
}

fn likes_of(session: &Session, id: &CommentId) -> Vec<UserId> {
    session
        .store()
        .tree(&project())
        .expect("project is mirrored")
        .find(id)
        .expect("comment is mirrored")
        .reactions()
        .likes()
        .iter()
        .cloned()
        .collect()
}

#[tokio::test]
async fn posts_show_up_for_everyone() {
    let server = server(&["alice", "bob"]);
    let (mut alice, alice_tok) = log_in(&server, "alice").await;
    let (mut bob, bob_tok) = log_in(&server, "bob").await;

    post(&mut alice, &server, &alice_tok, "the river is dirty").await;
    assert_eq!(top_level_ids(&alice).len(), 1);

    assert_eq!(
        bob.refresh(&server, &project()).await.unwrap(),
        Reconciled::Replaced
    );
    assert_eq!(top_level_ids(&bob), top_level_ids(&alice));

    post(&mut bob, &server, &bob_tok, "let's clean it").await;
    alice.refresh(&server, &project()).await.unwrap();
    assert_eq!(top_level_ids(&alice), top_level_ids(&bob));
    assert_eq!(top_level_ids(&alice).len(), 2);
}

#[tokio::test]
async fn confirmed_like_survives_refresh() {
    let server = server(&["alice"]);
    let (mut alice, tok) = log_in(&server, "alice").await;
    post(&mut alice, &server, &tok, "hello").await;
    // the payload now differs from the one seen at login
    assert_eq!(
        alice.refresh(&server, &project()).await.unwrap(),
        Reconciled::Replaced
    );
    let id = top_level_ids(&alice)[0].clone();
    let me = alice.user().cloned().unwrap();

    let ticket = alice
        .dispatch(&project(), Mutation::Like(id.clone()), Utc::now())
        .unwrap();
    assert_eq!(likes_of(&alice, &id), [me.clone()]);
    let done = alice.complete(send(&server, &tok, &ticket).await).unwrap();
    assert_eq!(done.state, ActionState::Confirmed);

    assert_eq!(
        alice.refresh(&server, &project()).await.unwrap(),
        Reconciled::Kept
    );
    assert_eq!(likes_of(&alice, &id), [me]);
}

#[tokio::test]
async fn network_failure_reverts_like() {
    let server = server(&["alice"]);
    let (mut alice, tok) = log_in(&server, "alice").await;
    post(&mut alice, &server, &tok, "hello").await;
    let id = top_level_ids(&alice)[0].clone();

    server.lock().fail_next(1);
    let ticket = alice
        .dispatch(&project(), Mutation::Like(id.clone()), Utc::now())
        .unwrap();
    assert_eq!(likes_of(&alice, &id).len(), 1);
    let done = alice.complete(send(&server, &tok, &ticket).await).unwrap();
    assert!(matches!(done.state, ActionState::Failed(Failure::Network(_))));
    assert!(likes_of(&alice, &id).is_empty());

    alice.refresh(&server, &project()).await.unwrap();
    assert!(likes_of(&alice, &id).is_empty());
}

#[tokio::test]
async fn unanswered_actions_time_out() {
    let server = server(&["alice"]);
    let (mut alice, tok) = log_in(&server, "alice").await;
    post(&mut alice, &server, &tok, "hello").await;
    let id = top_level_ids(&alice)[0].clone();

    let now = Utc::now();
    let ticket = alice
        .dispatch(&project(), Mutation::Delete(id.clone()), now)
        .unwrap();
    assert!(top_level_ids(&alice).is_empty());

    assert!(alice.store_mut().expire(now + Duration::seconds(1)).is_empty());
    let expired = alice.store_mut().expire(now + Duration::seconds(11));
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].state, ActionState::Failed(Failure::TimedOut));
    assert_eq!(top_level_ids(&alice), [id]);

    // the late answer no longer matters
    let late = send(&server, &tok, &ticket).await;
    assert_eq!(alice.complete(late), None);
}

#[tokio::test]
async fn others_cannot_delete_my_comments() {
    let server = server(&["alice", "bob"]);
    let (mut alice, alice_tok) = log_in(&server, "alice").await;
    post(&mut alice, &server, &alice_tok, "mine").await;
    let id = top_level_ids(&alice)[0].clone();

    let (mut bob, bob_tok) = log_in(&server, "bob").await;
    let ticket = bob
        .dispatch(&project(), Mutation::Delete(id.clone()), Utc::now())
        .unwrap();
    assert!(top_level_ids(&bob).is_empty());
    let done = bob.complete(send(&server, &bob_tok, &ticket).await).unwrap();
    assert_eq!(
        done.state,
        ActionState::Failed(Failure::Rejected(Error::PermissionDenied))
    );
    assert_eq!(top_level_ids(&bob), [id]);
}

#[tokio::test]
async fn answers_can_arrive_in_any_order() {
    let server = server(&["alice"]);
    let (mut alice, tok) = log_in(&server, "alice").await;
    post(&mut alice, &server, &tok, "first").await;
    post(&mut alice, &server, &tok, "second").await;
    let ids = top_level_ids(&alice);
    let me = alice.user().cloned().unwrap();

    let t1 = alice
        .dispatch(&project(), Mutation::Like(ids[0].clone()), Utc::now())
        .unwrap();
    let t2 = alice
        .dispatch(&project(), Mutation::Like(ids[1].clone()), Utc::now())
        .unwrap();
    let (o1, o2) = tokio::join!(send(&server, &tok, &t1), send(&server, &tok, &t2));

    alice.complete(o2).unwrap();
    assert_eq!(alice.store().pending(&project()).count(), 1);
    assert_eq!(likes_of(&alice, &ids[0]), [me.clone()]);
    alice.complete(o1).unwrap();
    assert_eq!(alice.store().pending(&project()).count(), 0);
    assert_eq!(likes_of(&alice, &ids[0]), [me.clone()]);
    assert_eq!(likes_of(&alice, &ids[1]), [me]);
}

#[tokio::test]
async fn replies_stay_two_levels_deep() {
    let server = server(&["alice"]);
    let (mut alice, tok) = log_in(&server, "alice").await;
    post(&mut alice, &server, &tok, "top").await;
    let top = top_level_ids(&alice)[0].clone();

    let reply = |parent: &CommentId| Mutation::Post {
        text: String::from("reply"),
        parent: Some(parent.clone()),
    };
    let ticket = alice.dispatch(&project(), reply(&top), Utc::now()).unwrap();
    let created = send(&server, &tok, &ticket).await;
    let reply_id = match &created.result {
        Ok(Some(c)) => c.id.clone(),
        other => panic!("unexpected answer {other:?}"),
    };
    alice.complete(created).unwrap();
    let tree = alice.store().tree(&project()).unwrap();
    assert_eq!(tree.reply_count(), 1);
    assert_eq!(tree.top_level_of(&reply_id).map(|c| c.id.clone()), Some(top));

    let ticket = alice
        .dispatch(&project(), reply(&reply_id), Utc::now())
        .unwrap();
    let done = alice.complete(send(&server, &tok, &ticket).await).unwrap();
    assert_eq!(
        done.state,
        ActionState::Failed(Failure::Rejected(Error::NotFound(reply_id)))
    );
    assert_eq!(alice.store().tree(&project()).unwrap().reply_count(), 1);
}

fn imported(id: &str, replies: Vec<api::Comment>) -> api::Comment {
    api::Comment {
        id: CommentId::new(id),
        text: format!("imported {id}"),
        user: Author {
            id: UserId::new("carol"),
            name: String::from("Carol"),
            avatar: None,
        },
        created_at: Utc::now() - Duration::days(3),
        likes: vec![UserId::new("carol")],
        dislikes: Vec::new(),
        parent_comment: None,
        replies,
    }
}

#[tokio::test]
async fn refresh_during_a_like_keeps_it() {
    let server = server(&["alice"]);
    let mut reply = imported("r1", Vec::new());
    reply.parent_comment = Some(CommentId::new("c1"));
    server.lock().seed(
        project(),
        vec![imported("c2", Vec::new()), imported("c1", vec![reply])],
    );
    let (mut alice, tok) = log_in(&server, "alice").await;
    assert_eq!(
        top_level_ids(&alice),
        [CommentId::new("c2"), CommentId::new("c1")]
    );
    let r1 = CommentId::new("r1");
    let me = alice.user().cloned().unwrap();
    let mut both = vec![me, UserId::new("carol")];
    both.sort();

    let ticket = alice
        .dispatch(&project(), Mutation::Like(r1.clone()), Utc::now())
        .unwrap();
    let outcome = send(&server, &tok, &ticket).await;

    // the server already holds the like, its answer is not processed yet
    alice.refresh(&server, &project()).await.unwrap();
    let mut likes = likes_of(&alice, &r1);
    likes.sort();
    assert_eq!(likes, both);

    let done = alice.complete(outcome).unwrap();
    assert_eq!(done.state, ActionState::Confirmed);
    let mut likes = likes_of(&alice, &r1);
    likes.sort();
    assert_eq!(likes, both);
}
