#![cfg(test)]

use std::collections::{HashMap, HashSet};

use chrono::{Duration, TimeZone, Utc};

use crate::{
    api::{Audience, AudienceKind, Comment, CommentId, PostId, UserId, Uuid, Viewer},
    build_threads, is_visible, preview, Thread,
};

// Small code and id spaces, so that the fuzzer actually hits matches,
// duplicates and cycles
const NUM_CODES: u8 = 6;
const NUM_IDS: u8 = 24;

fn code(c: u8) -> String {
    format!("code-{}", c % NUM_CODES)
}

fn codes(cs: &[u8]) -> HashSet<String> {
    cs.iter().copied().map(code).collect()
}

fn kind(k: u8) -> AudienceKind {
    match k % 5 {
        0 => AudienceKind::Public,
        1 => AudienceKind::Organization,
        2 => AudienceKind::Department,
        3 => AudienceKind::Course,
        _ => AudienceKind::Mixed,
    }
}

type AudienceSeed = (u8, Vec<u8>, Vec<u8>, Vec<u8>);
type ViewerSeed = (bool, Vec<u8>, Option<u8>, Option<u8>);

#[test]
fn visibility_rules() {
    bolero::check!()
        .with_type::<(AudienceSeed, ViewerSeed)>()
        .cloned()
        .for_each(|((k, orgs, depts, courses), (admin, member_of, dept, course))| {
            let audience = Audience {
                kind: kind(k),
                org_codes: codes(&orgs),
                dept_codes: codes(&depts),
                course_codes: codes(&courses),
            };
            let viewer = Viewer {
                is_admin: admin,
                org_memberships: codes(&member_of),
                department_code: dept.map(code),
                course_code: course.map(code),
            };
            let visible = is_visible(&audience, &viewer);

            if admin || audience.kind == AudienceKind::Public {
                assert!(visible, "{audience:?} hidden from {viewer:?}");
                return;
            }
            let no_codes = audience.org_codes.is_empty()
                && audience.dept_codes.is_empty()
                && audience.course_codes.is_empty();
            if no_codes {
                assert!(!visible, "empty {audience:?} visible to {viewer:?}");
            }
            let shares_code = !audience.org_codes.is_disjoint(&viewer.org_memberships)
                || viewer
                    .department_code
                    .as_ref()
                    .map_or(false, |d| audience.dept_codes.contains(d))
                || viewer
                    .course_code
                    .as_ref()
                    .map_or(false, |c| audience.course_codes.contains(c));
            assert_eq!(visible, shares_code, "{audience:?} vs {viewer:?}");

            // Dropping the viewer's memberships never grants more access
            if !visible {
                assert!(!is_visible(&audience, &Viewer::anonymous()));
            }
        });
}

fn comments_from(seed: &[(u8, Option<u8>, u16)]) -> Vec<Comment> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    seed.iter()
        .map(|&(id, parent, secs)| Comment {
            id: CommentId(Uuid::from_u128(u128::from(id % NUM_IDS))),
            post_id: PostId(Uuid::nil()),
            parent_id: parent.map(|p| CommentId(Uuid::from_u128(u128::from(p % (NUM_IDS + 4))))),
            author_id: UserId(Uuid::from_u128(u128::from(id % NUM_IDS) + 1000)),
            author_name: format!("author-{}", id % NUM_IDS),
            created_at: base + Duration::seconds(i64::from(secs)),
            text: String::new(),
        })
        .collect()
}

fn check_subtree(t: &Thread, depth: usize, by_id: &HashMap<CommentId, &Comment>) {
    let newest = t
        .iter()
        .map(|d| d.comment.created_at)
        .max()
        .expect("subtree has at least its root");
    assert_eq!(t.last_activity, newest);
    for pair in t.replies.windows(2) {
        assert!(pair[0].comment.created_at <= pair[1].comment.created_at);
    }
    for r in &t.replies {
        if depth < crate::MAX_DEPTH {
            assert_eq!(r.comment.parent_id, Some(t.id()));
        } else {
            assert!(r.replies.is_empty());
        }
        let parent = r.comment.parent_id.and_then(|p| by_id.get(&p));
        assert_eq!(
            r.replying_to.as_deref(),
            parent.map(|p| &p.author_name as &str)
        );
        check_subtree(r, depth + 1, by_id);
    }
    assert_eq!(by_id.get(&t.id()), Some(&&t.comment));
}

#[test]
fn thread_building() {
    bolero::check!()
        .with_type::<Vec<(u8, Option<u8>, u16)>>()
        .cloned()
        .for_each(|seed| {
            let comments = comments_from(&seed);
            let mut by_id = HashMap::new();
            for c in &comments {
                by_id.entry(c.id).or_insert(c);
            }

            let threads = build_threads(&comments);

            // every unique comment shows up exactly once
            let mut seen = HashSet::new();
            for t in &threads {
                for d in t.iter() {
                    assert!(seen.insert(d.id()), "{:?} shows up twice", d.id());
                }
            }
            assert_eq!(seen.len(), by_id.len());

            for pair in threads.windows(2) {
                assert!(pair[0].last_activity >= pair[1].last_activity);
            }
            for t in &threads {
                assert_eq!(t.replying_to, None);
                check_subtree(t, 0, &by_id);
            }

            // comments replying to nothing known are top-level
            let top = threads.iter().map(Thread::id).collect::<HashSet<_>>();
            for c in by_id.values() {
                if c.parent_id.map_or(true, |p| !by_id.contains_key(&p)) {
                    assert!(top.contains(&c.id), "{:?} is not top-level", c.id);
                }
            }

            let short = preview(&threads);
            assert_eq!(short.len(), threads.len().min(crate::PREVIEW_THREADS));
            for (s, t) in short.iter().zip(threads.iter()) {
                assert_eq!(s.id(), t.id());
                assert!(s.replies.len() <= crate::PREVIEW_REPLIES);
                assert_eq!(s.len(), t.len().min(1 + crate::PREVIEW_REPLIES));
                assert_eq!(s.last_activity, t.last_activity);
            }
        });
}
