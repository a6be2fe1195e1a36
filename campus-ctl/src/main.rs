use std::path::{Path, PathBuf};

use anyhow::Context;
use campus_client::{
    api::{PostId, PostKind, UserId, Uuid},
    FeedDump, FeedFile, Thread,
};
use tracing_subscriber::EnvFilter;

#[derive(structopt::StructOpt)]
struct Opt {
    /// JSON snapshot of the feed, as exported from the backend
    #[structopt(short, long, env = "CAMPUS_DUMP", parse(from_os_str))]
    dump: PathBuf,

    /// Look at the feed as this user instead of the snapshot's owner
    #[structopt(long)]
    as_user: Option<Uuid>,

    /// Output JSON instead of text
    #[structopt(long)]
    json: bool,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// List the posts visible to the viewer, newest first
    Feed {
        /// Only list posts of this kind (event, schedule, bulletin, announcement)
        #[structopt(long)]
        kind: Option<PostKind>,
    },

    /// Show the comment threads of a post
    Threads {
        post: Uuid,

        /// Only show the most active threads and their latest replies
        #[structopt(long)]
        preview: bool,
    },
}

// Rows that fail validation are dropped with a warning rather than failing the load
fn load(path: &Path) -> anyhow::Result<FeedDump> {
    let raw = std::fs::read(path).with_context(|| format!("reading dump {path:?}"))?;
    let mut file: FeedFile =
        serde_json::from_slice(&raw).with_context(|| format!("parsing dump {path:?}"))?;
    file.users.retain(|u| match u.validate() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(user_id = ?u.id, %err, "skipping invalid user");
            false
        }
    });
    file.posts.retain(|p| match p.validate() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(post_id = ?p.id, %err, "skipping invalid post");
            false
        }
    });
    file.comments.retain(|c| match c.validate() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(comment_id = ?c.id, %err, "skipping invalid comment");
            false
        }
    });
    tracing::debug!(
        users = file.users.len(),
        posts = file.posts.len(),
        comments = file.comments.len(),
        "loaded dump"
    );
    Ok(FeedDump::from(file))
}

fn print_thread(t: &Thread, depth: usize) {
    let indent = "    ".repeat(depth);
    match &t.replying_to {
        None => println!(
            "{indent}{} at {}:",
            t.comment.author_name,
            t.comment.created_at.format("%Y-%m-%d %H:%M")
        ),
        Some(parent) => println!(
            "{indent}{} replying to {parent} at {}:",
            t.comment.author_name,
            t.comment.created_at.format("%Y-%m-%d %H:%M")
        ),
    }
    for line in t.comment.text.lines() {
        println!("{indent}  {line}");
    }
    for r in &t.replies {
        print_thread(r, depth + 1);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_client=info,campus_ctl=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let opt = <Opt as structopt::StructOpt>::from_args();

    let mut db = load(&opt.dump)?;
    if let Some(user) = opt.as_user {
        db = db.as_user(UserId(user));
    }
    if !db.users.contains_key(&db.owner) {
        tracing::warn!(
            owner = ?db.owner,
            "viewer is not in the dump, only public posts will show"
        );
    }

    match opt.cmd {
        Command::Feed { kind } => {
            let posts = db.visible_posts(kind);
            if opt.json {
                let posts = posts.iter().map(|p| &**p).collect::<Vec<_>>();
                println!("{}", serde_json::to_string_pretty(&posts)?);
            } else {
                for p in posts {
                    println!(
                        "{} [{:?}] {} ({})",
                        p.date.format("%Y-%m-%d %H:%M"),
                        p.kind,
                        p.title,
                        p.id.0,
                    );
                }
            }
        }
        Command::Threads { post, preview } => {
            let post = PostId(post);
            let threads = match preview {
                true => db.preview(&post),
                false => db.threads(&post),
            }
            .with_context(|| format!("listing threads of post {}", post.0))?;
            if opt.json {
                println!("{}", serde_json::to_string_pretty(&threads)?);
            } else {
                for t in &threads {
                    print_thread(t, 0);
                    println!();
                }
            }
        }
    }

    Ok(())
}
