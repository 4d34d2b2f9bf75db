use chrono::{Duration, Utc};
use proind_client::api::{Author, Comment, CommentId, UserId};
use rand::{seq::SliceRandom, Rng};

const NUM_USERS: usize = 5;
const NUM_COMMENTS: usize = 20;
const MAX_REPLIES: usize = 4;
const COMMENT_WORD_COUNT: usize = 25;

/// Comments are spread over this many hours before now
const MAX_AGE_HOURS: i64 = 24 * 14;

fn gen_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn gen_reactions(rng: &mut impl Rng, users: &[Author]) -> (Vec<UserId>, Vec<UserId>) {
    let mut likes = Vec::new();
    let mut dislikes = Vec::new();
    for u in users {
        match rng.gen_range(0..4) {
            0 => likes.push(u.id.clone()),
            1 => dislikes.push(u.id.clone()),
            _ => (),
        }
    }
    (likes, dislikes)
}

fn gen_comment(rng: &mut impl Rng, users: &[Author], parent: Option<&CommentId>) -> Comment {
    let (likes, dislikes) = gen_reactions(rng, users);
    let age = Duration::minutes(rng.gen_range(0..MAX_AGE_HOURS * 60));
    Comment {
        id: CommentId(gen_id()),
        text: lipsum::lipsum_words(rng.gen_range(1..COMMENT_WORD_COUNT)),
        user: users
            .choose(rng)
            .cloned()
            .expect("there is at least one user"),
        created_at: Utc::now() - age,
        likes,
        dislikes,
        parent_comment: parent.cloned(),
        replies: Vec::new(),
    }
}

fn main() {
    let mut rng = rand::thread_rng();

    let users = (0..NUM_USERS)
        .map(|i| Author {
            id: UserId(gen_id()),
            name: format!("user{i}"),
            avatar: None,
        })
        .collect::<Vec<_>>();

    let mut comments = (0..NUM_COMMENTS)
        .map(|_| {
            let mut c = gen_comment(&mut rng, &users, None);
            c.replies = (0..rng.gen_range(0..=MAX_REPLIES))
                .map(|_| gen_comment(&mut rng, &users, Some(&c.id)))
                .collect();
            c.replies.sort_by_key(|r| r.created_at);
            c
        })
        .collect::<Vec<_>>();
    comments.sort_by_key(|c| std::cmp::Reverse(c.created_at));

    println!(
        "{}",
        serde_json::to_string_pretty(&comments).expect("serializing comments")
    );
}
