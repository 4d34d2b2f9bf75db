use anyhow::Context;
use chrono::Utc;
use proind_client::{
    api::{CommentId, NewSession, ProjectId, Server},
    send, ActionState, MirrorStore, Mutation, Session,
};

mod api;
mod display;
mod login;

use api::HttpServer;
use login::LoginInfo;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Base url of the server, defaults to the one used at login
    #[structopt(short, long, env = "PROIND_HOST")]
    host: Option<String>,

    /// Seconds to wait for the server before giving up on an action
    #[structopt(long, default_value = "10")]
    timeout_secs: i64,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Log in and remember the session
    Login { email: String, password: String },

    /// Forget the saved session
    Logout,

    /// Show the comments of a project
    List { project: String },

    /// Post a top-level comment
    Comment { project: String, text: String },

    /// Reply to a top-level comment
    Reply {
        project: String,
        parent: String,
        text: String,
    },

    /// Toggle a like
    Like { project: String, comment: String },

    /// Toggle a dislike
    Dislike { project: String, comment: String },

    /// Delete one of your comments
    Delete { project: String, comment: String },
}

fn server(host: Option<&str>) -> anyhow::Result<HttpServer> {
    host.map(HttpServer::new)
        .context("no host given, pass --host or log in first")
}

fn require_login(login: Option<LoginInfo>) -> anyhow::Result<LoginInfo> {
    login.context("not logged in, run `proind-ctl login` first")
}

async fn list(server: &HttpServer, project: ProjectId) -> anyhow::Result<()> {
    let mut session = Session::new(MirrorStore::default(), None);
    session
        .refresh(server, &project)
        .await
        .with_context(|| format!("fetching comments of {project:?}"))?;
    if let Some(tree) = session.store().tree(&project) {
        print!("{}", display::render(&tree, Utc::now()));
    }
    Ok(())
}

async fn mutate(
    server: &HttpServer,
    login: &LoginInfo,
    timeout: chrono::Duration,
    project: ProjectId,
    mutation: Mutation,
) -> anyhow::Result<()> {
    let mut session = Session::new(MirrorStore::new(timeout), Some(login.user.id.clone()));
    session
        .refresh(server, &project)
        .await
        .with_context(|| format!("fetching comments of {project:?}"))?;

    let ticket = session.dispatch(&project, mutation, Utc::now())?;
    let wait = timeout.to_std().context("timeout must not be negative")?;
    let done = match tokio::time::timeout(wait, send(server, &login.token, &ticket)).await {
        Ok(outcome) => session.complete(outcome),
        Err(_) => {
            let deadline = match session.store().state(ticket.action) {
                Some(ActionState::Pending { deadline }) => *deadline,
                _ => Utc::now(),
            };
            session.store_mut().expire(deadline).pop()
        }
    };

    if let Some(tree) = session.store().tree(&project) {
        print!("{}", display::render(&tree, Utc::now()));
    }
    match done.map(|a| (a.mutation, a.state)) {
        Some((_, ActionState::Confirmed)) => Ok(()),
        Some((mutation, ActionState::Failed(failure))) => {
            anyhow::bail!("{mutation:?} failed: {failure:?}")
        }
        other => anyhow::bail!("action did not complete: {other:?}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    let login_path = LoginInfo::default_path()?;
    let login = LoginInfo::load(&login_path)?;
    let timeout = chrono::Duration::seconds(opt.timeout_secs.max(0));
    let host = opt
        .host
        .clone()
        .or_else(|| login.as_ref().map(|l| l.host.clone()));

    match opt.cmd {
        Command::Login { email, password } => {
            let server = server(host.as_deref())?;
            let reply = server
                .login(NewSession { email, password })
                .await
                .context("logging in")?;
            let info = LoginInfo {
                host: server.host().to_string(),
                token: reply.token,
                user: reply.user,
            };
            info.save(&login_path)?;
            println!("logged in as {}", info.user.name);
        }
        Command::Logout => {
            if !LoginInfo::delete(&login_path)? {
                println!("was not logged in");
            }
        }
        Command::List { project } => list(&server(host.as_deref())?, ProjectId(project)).await?,
        Command::Comment { project, text } => {
            let login = require_login(login)?;
            let m = Mutation::Post { text, parent: None };
            mutate(&server(host.as_deref())?, &login, timeout, ProjectId(project), m).await?;
        }
        Command::Reply {
            project,
            parent,
            text,
        } => {
            let login = require_login(login)?;
            let m = Mutation::Post {
                text,
                parent: Some(CommentId(parent)),
            };
            mutate(&server(host.as_deref())?, &login, timeout, ProjectId(project), m).await?;
        }
        Command::Like { project, comment } => {
            let login = require_login(login)?;
            let m = Mutation::Like(CommentId(comment));
            mutate(&server(host.as_deref())?, &login, timeout, ProjectId(project), m).await?;
        }
        Command::Dislike { project, comment } => {
            let login = require_login(login)?;
            let m = Mutation::Dislike(CommentId(comment));
            mutate(&server(host.as_deref())?, &login, timeout, ProjectId(project), m).await?;
        }
        Command::Delete { project, comment } => {
            let login = require_login(login)?;
            let m = Mutation::Delete(CommentId(comment));
            mutate(&server(host.as_deref())?, &login, timeout, ProjectId(project), m).await?;
        }
    }

    Ok(())
}
