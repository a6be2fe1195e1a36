use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use anyhow::{anyhow, Context};

use crate::{
    api::{Comment, Error, Post, PostId, PostKind, User, UserId, Viewer},
    build_threads, can_participate, preview, Thread, VisibilityExt,
};

/// Everything the backend returned for one signed-in user
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeedDump {
    pub owner: UserId,
    pub users: Arc<HashMap<UserId, User>>,
    pub posts: Arc<HashMap<PostId, Arc<Post>>>,

    /// Flat comment rows, by post, in the order the backend sent them
    pub comments: Arc<HashMap<PostId, Vec<Comment>>>,
}

/// On-disk form of a `FeedDump`
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct FeedFile {
    pub owner: UserId,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl From<FeedFile> for FeedDump {
    fn from(f: FeedFile) -> FeedDump {
        let mut res = FeedDump::new(f.owner);
        res.add_users(f.users);
        res.add_posts(f.posts);
        res.add_comments(f.comments);
        res
    }
}

impl FeedDump {
    pub fn new(owner: UserId) -> FeedDump {
        FeedDump {
            owner,
            users: Arc::new(HashMap::new()),
            posts: Arc::new(HashMap::new()),
            comments: Arc::new(HashMap::new()),
        }
    }

    pub fn stub() -> FeedDump {
        FeedDump::new(UserId::stub())
    }

    /// The same snapshot, seen by another user
    pub fn as_user(&self, owner: UserId) -> FeedDump {
        FeedDump {
            owner,
            ..self.clone()
        }
    }

    pub fn add_users(&mut self, users: Vec<User>) {
        Arc::make_mut(&mut self.users).extend(users.into_iter().map(|u| (u.id, u)));
    }

    pub fn add_posts(&mut self, posts: Vec<Post>) {
        let all = Arc::make_mut(&mut self.posts);
        all.reserve(posts.len());
        for p in posts {
            if p.audience.has_stray_codes() {
                tracing::warn!(
                    post_id = ?p.id,
                    kind = ?p.audience.kind,
                    "audience lists codes that do not match its kind, they still grant access"
                );
            }
            all.insert(p.id, Arc::new(p));
        }
    }

    pub fn add_comments(&mut self, comments: Vec<Comment>) {
        let all = Arc::make_mut(&mut self.comments);
        for c in comments {
            all.entry(c.post_id).or_insert_with(Vec::new).push(c);
        }
    }

    pub fn user_name(&self, id: &UserId) -> Option<&str> {
        self.users.get(id).map(|u| &u.name as &str)
    }

    pub fn viewer(&self) -> Viewer {
        self.users
            .get(&self.owner)
            .map(User::viewer)
            .unwrap_or_else(Viewer::anonymous)
    }

    /// Posts the owner may see, optionally of only one kind, newest first
    pub fn visible_posts(&self, kind: Option<PostKind>) -> Vec<Arc<Post>> {
        let viewer = self.viewer();
        let mut res = self
            .posts
            .values()
            .filter(|p| kind.map_or(true, |k| p.kind == k))
            .filter(|p| p.is_visible_to(&viewer))
            .cloned()
            .collect::<Vec<_>>();
        res.sort_unstable_by_key(|p| (Reverse(p.date), p.id));
        res
    }

    fn visible_post(&self, post: &PostId) -> anyhow::Result<&Arc<Post>> {
        let p = self
            .posts
            .get(post)
            .ok_or_else(|| anyhow!("requested post {post:?} that is not in db"))?;
        if !p.is_visible_to(&self.viewer()) {
            return Err(Error::PermissionDenied)
                .with_context(|| format!("post {post:?} is not visible to {:?}", self.owner));
        }
        Ok(p)
    }

    /// All comment threads of a post the owner may see
    pub fn threads(&self, post: &PostId) -> anyhow::Result<Vec<Thread>> {
        self.visible_post(post)?;
        Ok(self
            .comments
            .get(post)
            .map(|c| build_threads(c))
            .unwrap_or_default())
    }

    /// The few most active threads of a post, for feed cards
    pub fn preview(&self, post: &PostId) -> anyhow::Result<Vec<Thread>> {
        Ok(preview(&self.threads(post)?))
    }

    /// Checks that the owner may submit `comment`
    pub fn check_comment(&self, comment: &Comment) -> Result<(), Error> {
        comment.validate()?;
        if comment.author_id != self.owner {
            return Err(Error::PermissionDenied);
        }
        let post = self
            .posts
            .get(&comment.post_id)
            .ok_or(Error::UnknownPost(comment.post_id))?;
        if !can_participate(&post.audience, &self.viewer()) {
            return Err(Error::PermissionDenied);
        }
        let parent_id = match comment.parent_id {
            None => return Ok(()),
            Some(p) => p,
        };
        let parent = self
            .comments
            .get(&comment.post_id)
            .and_then(|cs| cs.iter().find(|c| c.id == parent_id));
        match parent {
            Some(parent) if parent.created_at >= comment.created_at => {
                Err(Error::ParentAfterChild {
                    parent: parent_id,
                    child: comment.id,
                })
            }
            Some(_) => Ok(()),
            None if self
                .comments
                .values()
                .flatten()
                .any(|c| c.id == parent_id) =>
            {
                Err(Error::ParentOnOtherPost {
                    parent: parent_id,
                    post: comment.post_id,
                })
            }
            None => Err(Error::UnknownComment(parent_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::api::{Audience, CommentId, Time, Uuid};

    fn at(hours: i64) -> Time {
        Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).unwrap() + Duration::hours(hours)
    }

    fn user(n: u128, name: &str, dept: Option<&str>, orgs: &[&str]) -> User {
        User {
            id: UserId(Uuid::from_u128(n)),
            name: String::from(name),
            is_admin: false,
            department_code: dept.map(String::from),
            course_code: None,
            org_memberships: orgs.iter().map(|o| String::from(*o)).collect::<HashSet<_>>(),
        }
    }

    fn post(n: u128, kind: PostKind, hours: i64, audience: Audience) -> Post {
        Post {
            id: PostId(Uuid::from_u128(n)),
            kind,
            owner_id: UserId(Uuid::from_u128(1)),
            date: at(hours),
            title: format!("post {n}"),
            audience,
        }
    }

    fn comment(n: u128, post: u128, parent: Option<u128>, author: &User, hours: i64) -> Comment {
        Comment {
            id: CommentId(Uuid::from_u128(n)),
            post_id: PostId(Uuid::from_u128(post)),
            parent_id: parent.map(|p| CommentId(Uuid::from_u128(p))),
            author_id: author.id,
            author_name: author.name.clone(),
            created_at: at(hours),
            text: String::from("hello"),
        }
    }

    fn example_db() -> FeedDump {
        let alice = user(1, "alice", Some("CS"), &["acm"]);
        let bob = user(2, "bob", Some("ECE"), &[]);
        let mut db = FeedDump::new(alice.id);
        db.add_posts(vec![
            post(10, PostKind::Event, 0, Audience::public()),
            post(11, PostKind::Bulletin, 1, Audience::departments(["CS"])),
            post(12, PostKind::Bulletin, 2, Audience::departments(["ECE"])),
            post(13, PostKind::Schedule, 3, Audience::organizations(["acm"])),
            post(14, PostKind::Announcement, 4, Audience::mixed([], ["ECE"], ["EE200"])),
        ]);
        db.add_comments(vec![
            comment(100, 11, None, &alice, 5),
            comment(101, 11, Some(100), &bob, 6),
            comment(102, 11, None, &bob, 7),
            comment(103, 12, None, &bob, 5),
        ]);
        db.add_users(vec![alice, bob]);
        db
    }

    fn post_ids(posts: &[Arc<Post>]) -> Vec<u128> {
        posts.iter().map(|p| p.id.0.as_u128()).collect()
    }

    #[test]
    fn visible_posts_for_owner() {
        let db = example_db();
        assert_eq!(post_ids(&db.visible_posts(None)), vec![13, 11, 10]);
        assert_eq!(
            post_ids(&db.visible_posts(Some(PostKind::Bulletin))),
            vec![11]
        );

        let bob = db.as_user(UserId(Uuid::from_u128(2)));
        assert_eq!(post_ids(&bob.visible_posts(None)), vec![14, 12, 10]);
    }

    #[test]
    fn unknown_owner_sees_public_only() {
        let db = example_db().as_user(UserId(Uuid::from_u128(99)));
        assert_eq!(db.viewer(), Viewer::anonymous());
        assert_eq!(post_ids(&db.visible_posts(None)), vec![10]);
    }

    #[test]
    fn threads_of_visible_post() {
        let db = example_db();
        let threads = db.threads(&PostId(Uuid::from_u128(11))).unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].id(), CommentId(Uuid::from_u128(102)));
        assert_eq!(threads[1].replies[0].replying_to.as_deref(), Some("alice"));
        assert!(db.threads(&PostId(Uuid::from_u128(10))).unwrap().is_empty());
        assert_eq!(db.preview(&PostId(Uuid::from_u128(11))).unwrap(), threads);
    }

    #[test]
    fn threads_of_hidden_post() {
        let db = example_db();
        let err = db.threads(&PostId(Uuid::from_u128(12))).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::PermissionDenied)
        );
        assert!(db.threads(&PostId(Uuid::from_u128(42))).is_err());
    }

    #[test]
    fn check_comment() {
        let db = example_db();
        let alice = db.users[&db.owner].clone();
        let bob = db.users[&UserId(Uuid::from_u128(2))].clone();

        assert_eq!(db.check_comment(&comment(200, 13, None, &alice, 8)), Ok(()));
        assert_eq!(
            db.check_comment(&comment(200, 11, Some(101), &alice, 8)),
            Ok(())
        );
        assert_eq!(
            db.check_comment(&comment(200, 13, None, &bob, 8)),
            Err(Error::PermissionDenied)
        );
        assert_eq!(
            db.check_comment(&comment(200, 12, None, &alice, 8)),
            Err(Error::PermissionDenied)
        );
        assert_eq!(
            db.check_comment(&comment(200, 42, None, &alice, 8)),
            Err(Error::UnknownPost(PostId(Uuid::from_u128(42))))
        );
        assert_eq!(
            db.check_comment(&comment(200, 11, Some(102), &alice, 7)),
            Err(Error::ParentAfterChild {
                parent: CommentId(Uuid::from_u128(102)),
                child: CommentId(Uuid::from_u128(200)),
            })
        );
        assert_eq!(
            db.check_comment(&comment(200, 10, Some(100), &alice, 8)),
            Err(Error::ParentOnOtherPost {
                parent: CommentId(Uuid::from_u128(100)),
                post: PostId(Uuid::from_u128(10)),
            })
        );
        assert_eq!(
            db.check_comment(&comment(200, 10, Some(300), &alice, 8)),
            Err(Error::UnknownComment(CommentId(Uuid::from_u128(300))))
        );
    }

    #[test]
    fn load_feed_file() {
        let file: FeedFile = serde_json::from_str(
            r#"{
                "owner": "00000000-0000-0000-0000-000000000001",
                "users": [{
                    "id": "00000000-0000-0000-0000-000000000001",
                    "name": "alice",
                    "department_code": "CS",
                    "course_code": null,
                    "org_memberships": null
                }],
                "posts": [{
                    "id": "00000000-0000-0000-0000-00000000000a",
                    "kind": "schedule",
                    "owner_id": "00000000-0000-0000-0000-000000000002",
                    "date": "2024-09-02T08:00:00Z",
                    "title": "Office hours",
                    "audience": {"participant_type": "mixed", "dept_codes": ["CS"], "course_codes": []}
                }]
            }"#,
        )
        .unwrap();
        let db = FeedDump::from(file);
        assert_eq!(post_ids(&db.visible_posts(None)), vec![10]);
        assert!(db.comments.is_empty());
    }
}
