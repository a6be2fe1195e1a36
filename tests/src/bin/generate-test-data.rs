use std::collections::HashSet;

use campus_client::{
    api::{Audience, AudienceKind, Comment, CommentId, Post, PostId, PostKind, User, UserId},
    FeedFile,
};
use chrono::{Duration, TimeZone, Utc};
use rand::{seq::SliceRandom, Rng};
use uuid::Uuid;

const NUM_USERS: usize = 20;
const ADMIN_PROBABILITY: f64 = 0.05;

const DEPARTMENTS: &[&str] = &["CS", "ECE", "ME", "MATH", "PHYS"];
const COURSES: &[&str] = &["CS101", "CS240", "ECE270", "MA261", "PHYS172", "ME200"];
const ORGANIZATIONS: &[&str] = &["acm", "ieee", "robotics", "chess", "debate", "choir"];

const NUM_POSTS: usize = 60;
const POST_TITLE_LEN: usize = 6;
const FEED_SPAN_DAYS: i64 = 30;

const NUM_COMMENTS: usize = 400;
const REPLY_PROBABILITY: f64 = 0.6;
const COMMENT_WORD_COUNT: usize = 25;

fn pick<R: Rng>(rng: &mut R, from: &[&str]) -> String {
    String::from(*from.choose(rng).expect("picking from an empty list"))
}

fn pick_some<R: Rng>(rng: &mut R, from: &[&str], max: usize) -> HashSet<String> {
    let n = rng.gen_range(0..=max);
    from.choose_multiple(rng, n)
        .map(|s| String::from(*s))
        .collect()
}

fn gen_user<R: Rng>(rng: &mut R) -> User {
    let name = lipsum::lipsum_words(1)
        .trim_end_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    User {
        id: UserId(Uuid::new_v4()),
        name,
        is_admin: rng.gen_bool(ADMIN_PROBABILITY),
        department_code: rng.gen_bool(0.9).then(|| pick(rng, DEPARTMENTS)),
        course_code: rng.gen_bool(0.7).then(|| pick(rng, COURSES)),
        org_memberships: pick_some(rng, ORGANIZATIONS, 3),
    }
}

fn gen_audience<R: Rng>(rng: &mut R) -> Audience {
    match rng.gen_range(0..5) {
        0 => Audience::public(),
        1 => Audience::organizations(pick_some(rng, ORGANIZATIONS, 2)),
        2 => Audience::departments(pick_some(rng, DEPARTMENTS, 2)),
        3 => Audience::courses(pick_some(rng, COURSES, 2)),
        _ => {
            let mut a = Audience::mixed(
                pick_some(rng, ORGANIZATIONS, 1),
                pick_some(rng, DEPARTMENTS, 1),
                pick_some(rng, COURSES, 1),
            );
            // Some rows in the wild carry an empty restricted audience
            if rng.gen_bool(0.1) {
                a = Audience {
                    kind: AudienceKind::Mixed,
                    ..Audience::public()
                };
            }
            a
        }
    }
}

fn main() {
    let mut rng = rand::thread_rng();
    let start = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();

    // Generate users
    let users = (0..NUM_USERS).map(|_| gen_user(&mut rng)).collect::<Vec<_>>();

    // Generate posts
    let kinds = [
        PostKind::Event,
        PostKind::Schedule,
        PostKind::Bulletin,
        PostKind::Announcement,
    ];
    let posts = (0..NUM_POSTS)
        .map(|_| Post {
            id: PostId(Uuid::new_v4()),
            kind: *kinds.choose(&mut rng).unwrap(),
            owner_id: users.choose(&mut rng).unwrap().id,
            date: start + Duration::minutes(rng.gen_range(0..FEED_SPAN_DAYS * 24 * 60)),
            title: lipsum::lipsum_words(POST_TITLE_LEN),
            audience: gen_audience(&mut rng),
        })
        .collect::<Vec<_>>();

    // Generate comments, replies always coming after their parent on the same post
    let mut comments: Vec<Comment> = Vec::with_capacity(NUM_COMMENTS);
    for _ in 0..NUM_COMMENTS {
        let author = users.choose(&mut rng).unwrap();
        let parent = match rng.gen_bool(REPLY_PROBABILITY) {
            true => comments.choose(&mut rng).cloned(),
            false => None,
        };
        let (post_id, after) = match &parent {
            Some(p) => (p.post_id, p.created_at),
            None => {
                let p = posts.choose(&mut rng).unwrap();
                (p.id, p.date)
            }
        };
        comments.push(Comment {
            id: CommentId(Uuid::new_v4()),
            post_id,
            parent_id: parent.map(|p| p.id),
            author_id: author.id,
            author_name: author.name.clone(),
            created_at: after + Duration::minutes(rng.gen_range(1..3 * 24 * 60)),
            text: lipsum::lipsum_words(rng.gen_range(1..=COMMENT_WORD_COUNT)),
        });
    }
    comments.shuffle(&mut rng);

    let owner = users.choose(&mut rng).unwrap().id;
    let file = FeedFile {
        owner,
        users,
        posts,
        comments,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&file).expect("serializing generated feed")
    );
}
