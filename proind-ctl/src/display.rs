use proind_client::{api::Time, CommentTree, Reactions};

pub fn time_ago(date: Time, now: Time) -> String {
    let secs = (now - date).num_seconds();
    if secs < 60 {
        return String::from("just now");
    }
    let (n, unit) = match secs {
        s if s < 3600 => (s / 60, "minute"),
        s if s < 86400 => (s / 3600, "hour"),
        s if s < 30 * 86400 => (s / 86400, "day"),
        s if s < 365 * 86400 => (s / (30 * 86400), "month"),
        s => (s / (365 * 86400), "year"),
    };
    match n {
        1 => format!("1 {unit} ago"),
        n => format!("{n} {unit}s ago"),
    }
}

fn counts(r: &Reactions) -> String {
    format!("+{} -{}", r.likes().len(), r.dislikes().len())
}

/// Human-readable listing of a comment tree, newest top-level comment first
pub fn render(tree: &CommentTree, now: Time) -> String {
    if tree.is_empty() {
        return String::from("no comments yet\n");
    }
    let mut res = String::new();
    for c in tree.iter() {
        res.push_str(&format!(
            "[{}] {}, {} ({})\n    {}\n",
            c.id.0,
            c.author.name,
            time_ago(c.date, now),
            counts(&c.reactions),
            c.text
        ));
        for r in c.replies.iter() {
            res.push_str(&format!(
                "    > [{}] {}, {} ({})\n          {}\n",
                r.id.0,
                r.author.name,
                time_ago(r.date, now),
                counts(&r.reactions),
                r.text
            ));
        }
    }
    res
}
