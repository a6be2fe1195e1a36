use std::{
    cmp::Reverse,
    collections::{hash_map, HashMap, HashSet},
};

use crate::api::{Comment, CommentId, Time};

/// Number of threads shown in a post preview
pub const PREVIEW_THREADS: usize = 3;

/// Number of replies shown per thread in a post preview
pub const PREVIEW_REPLIES: usize = 3;

/// Nesting depth past which replies are attached to their ancestor at this
/// depth instead of to their own parent
pub const MAX_DEPTH: usize = 32;

/// A comment along with all the replies it received, computed on each read
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct Thread {
    pub comment: Comment,

    /// Author of the comment this one replies to, None for top-level threads
    pub replying_to: Option<String>,

    /// Replies in chronological order
    pub replies: Vec<Thread>,

    /// Latest creation time anywhere in this subtree
    pub last_activity: Time,
}

impl Thread {
    pub fn id(&self) -> CommentId {
        self.comment.id
    }

    /// Number of comments in this subtree, including this one
    pub fn len(&self) -> usize {
        1 + self.replies.iter().map(Thread::len).sum::<usize>()
    }

    /// Depth-first walk over this subtree, parents before their replies
    pub fn iter(&self) -> ThreadIter<'_> {
        ThreadIter { stack: vec![self] }
    }
}

pub struct ThreadIter<'a> {
    stack: Vec<&'a Thread>,
}

impl<'a> Iterator for ThreadIter<'a> {
    type Item = &'a Thread;

    fn next(&mut self) -> Option<&'a Thread> {
        let t = self.stack.pop()?;
        self.stack.extend(t.replies.iter().rev());
        Some(t)
    }
}

struct Forest<'a> {
    comments: Vec<&'a Comment>,
    children: Vec<Vec<usize>>,
    visited: Vec<bool>,
}

impl<'a> Forest<'a> {
    fn grow(&mut self, idx: usize, replying_to: Option<String>, depth: usize) -> Thread {
        self.visited[idx] = true;
        let comment = self.comments[idx];
        let mut replies = match depth >= MAX_DEPTH {
            true => self.flatten(idx),
            false => {
                let mut replies = Vec::with_capacity(self.children[idx].len());
                for child in std::mem::take(&mut self.children[idx]) {
                    if self.visited[child] {
                        // only the comment promoted to break a cycle can be reached twice
                        tracing::debug!(
                            comment_id = ?self.comments[child].id,
                            "reply cycle closed"
                        );
                        continue;
                    }
                    replies.push(self.grow(child, Some(comment.author_name.clone()), depth + 1));
                }
                replies
            }
        };
        replies.sort_unstable_by_key(|r| (r.comment.created_at, r.comment.id));
        let last_activity = replies
            .iter()
            .map(|r| r.last_activity)
            .fold(comment.created_at, std::cmp::max);
        Thread {
            comment: comment.clone(),
            replying_to,
            replies,
            last_activity,
        }
    }

    /// Collects every descendant of `idx` as a leaf, each still naming the
    /// author it actually replied to
    fn flatten(&mut self, idx: usize) -> Vec<Thread> {
        let mut replies = Vec::new();
        let mut stack = std::mem::take(&mut self.children[idx])
            .into_iter()
            .map(|c| (idx, c))
            .collect::<Vec<_>>();
        while let Some((parent, child)) = stack.pop() {
            if self.visited[child] {
                tracing::debug!(comment_id = ?self.comments[child].id, "reply cycle closed");
                continue;
            }
            self.visited[child] = true;
            stack.extend(
                std::mem::take(&mut self.children[child])
                    .into_iter()
                    .map(|c| (child, c)),
            );
            let comment = self.comments[child];
            replies.push(Thread {
                comment: comment.clone(),
                replying_to: Some(self.comments[parent].author_name.clone()),
                replies: Vec::new(),
                last_activity: comment.created_at,
            });
        }
        if !replies.is_empty() {
            tracing::debug!(
                comment_id = ?self.comments[idx].id,
                flattened = replies.len(),
                "reply chain too deep, attaching the rest to this comment"
            );
        }
        replies
    }
}

/// Follows parent links from `start` until a comment repeats, returning that
/// comment, which is part of the cycle
fn cycle_entry(parents: &[Option<usize>], start: usize) -> usize {
    let mut seen = HashSet::new();
    let mut cur = start;
    while seen.insert(cur) {
        match parents[cur] {
            Some(p) => cur = p,
            None => return cur,
        }
    }
    cur
}

/// Assembles a flat list of comments into threads
///
/// Top-level threads come most-recently-active first; replies within a
/// thread are chronological. A comment whose parent is missing becomes a
/// top-level thread. Duplicate ids keep their first occurrence. Comments
/// whose parent chain loops are surfaced by promoting one member of the
/// loop to top-level. Replies nested deeper than [`MAX_DEPTH`] are listed
/// chronologically under their ancestor at that depth.
pub fn build_threads(comments: &[Comment]) -> Vec<Thread> {
    let mut index = HashMap::with_capacity(comments.len());
    let mut unique = Vec::with_capacity(comments.len());
    for c in comments {
        match index.entry(c.id) {
            hash_map::Entry::Vacant(e) => {
                e.insert(unique.len());
                unique.push(c);
            }
            hash_map::Entry::Occupied(_) => {
                tracing::warn!(comment_id = ?c.id, "dropping comment with duplicate id")
            }
        }
    }

    let parents = unique
        .iter()
        .map(|c| {
            let parent = c.parent_id.and_then(|p| index.get(&p).copied());
            if c.parent_id.is_some() && parent.is_none() {
                tracing::debug!(
                    comment_id = ?c.id,
                    parent_id = ?c.parent_id,
                    "parent comment not found"
                );
            }
            parent
        })
        .collect::<Vec<_>>();
    let mut children = vec![Vec::new(); unique.len()];
    for (i, p) in parents.iter().enumerate() {
        if let Some(p) = p {
            children[*p].push(i);
        }
    }

    let mut forest = Forest {
        visited: vec![false; unique.len()],
        comments: unique,
        children,
    };
    let mut threads = Vec::new();
    for (i, p) in parents.iter().enumerate() {
        if p.is_none() {
            threads.push(forest.grow(i, None, 0));
        }
    }

    // Everything not reached by now hangs off a parent cycle
    for i in 0..parents.len() {
        if forest.visited[i] {
            continue;
        }
        let entry = cycle_entry(&parents, i);
        tracing::warn!(
            comment_id = ?forest.comments[entry].id,
            "comment reply chain loops back on itself, showing it as top-level"
        );
        threads.push(forest.grow(entry, None, 0));
    }

    threads.sort_by_key(|t| Reverse(t.last_activity));
    threads
}

/// Shortened view of already-built threads, for feed cards
pub fn preview(threads: &[Thread]) -> Vec<Thread> {
    preview_with(threads, PREVIEW_THREADS, PREVIEW_REPLIES)
}

/// Keeps the first `max_threads` threads, each with only the `max_replies`
/// most recent replies found anywhere in it
///
/// Kept replies are listed directly under the top-level comment in
/// chronological order, still naming the author they replied to.
/// `last_activity` still covers the full thread.
pub fn preview_with(threads: &[Thread], max_threads: usize, max_replies: usize) -> Vec<Thread> {
    threads
        .iter()
        .take(max_threads)
        .map(|t| {
            let mut replies = t.iter().skip(1).collect::<Vec<_>>();
            replies.sort_unstable_by_key(|r| (r.comment.created_at, r.comment.id));
            let skip = replies.len().saturating_sub(max_replies);
            Thread {
                comment: t.comment.clone(),
                replying_to: t.replying_to.clone(),
                replies: replies[skip..]
                    .iter()
                    .map(|r| Thread {
                        comment: r.comment.clone(),
                        replying_to: r.replying_to.clone(),
                        replies: Vec::new(),
                        last_activity: r.comment.created_at,
                    })
                    .collect(),
                last_activity: t.last_activity,
            }
        })
        .collect()
}
