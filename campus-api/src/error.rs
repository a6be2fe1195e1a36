use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::json;
use uuid::Uuid;

use crate::{CommentId, PostId, Time};

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Permission denied")]
    PermissionDenied,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Time is out of range {0}")]
    TimeOutOfRange(Time),

    #[error("Unknown post {0:?}")]
    UnknownPost(PostId),

    #[error("Unknown comment {0:?}")]
    UnknownComment(CommentId),

    #[error("Comment {child:?} is older than the comment {parent:?} it replies to")]
    ParentAfterChild { parent: CommentId, child: CommentId },

    #[error("Comment {parent:?} does not belong to post {post:?}")]
    ParentOnOtherPost { parent: CommentId, post: PostId },
}

fn uuid_field(data: &serde_json::Value, field: &str) -> anyhow::Result<Uuid> {
    data.get(field)
        .and_then(|u| u.as_str())
        .and_then(|u| Uuid::from_str(u).ok())
        .ok_or_else(|| anyhow!("error has no proper uuid in field {field:?}"))
}

impl Error {
    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::TimeOutOfRange(t) => json!({
                "message": "time is out of range",
                "type": "time-out-of-range",
                "time": t,
            }),
            Error::UnknownPost(p) => json!({
                "message": "post does not exist",
                "type": "unknown-post",
                "post": p.0,
            }),
            Error::UnknownComment(c) => json!({
                "message": "comment does not exist",
                "type": "unknown-comment",
                "comment": c.0,
            }),
            Error::ParentAfterChild { parent, child } => json!({
                "message": "reply is older than the comment it replies to",
                "type": "parent-after-child",
                "parent": parent.0,
                "child": child.0,
            }),
            Error::ParentOnOtherPost { parent, post } => json!({
                "message": "parent comment belongs to another post",
                "type": "parent-on-other-post",
                "parent": parent.0,
                "post": post.0,
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "permission-denied" => Error::PermissionDenied,
                "null-byte" => Error::NullByteInString(String::from(
                    data.get("string").and_then(|s| s.as_str()).ok_or_else(|| {
                        anyhow!("error is a null-byte-in-string without a string")
                    })?,
                )),
                "time-out-of-range" => Error::TimeOutOfRange(
                    serde_json::from_value(
                        data.get("time")
                            .cloned()
                            .ok_or_else(|| anyhow!("error is a time-out-of-range without time"))?,
                    )
                    .context("parsing time of time-out-of-range error")?,
                ),
                "unknown-post" => Error::UnknownPost(PostId(uuid_field(&data, "post")?)),
                "unknown-comment" => {
                    Error::UnknownComment(CommentId(uuid_field(&data, "comment")?))
                }
                "parent-after-child" => Error::ParentAfterChild {
                    parent: CommentId(uuid_field(&data, "parent")?),
                    child: CommentId(uuid_field(&data, "child")?),
                },
                "parent-on-other-post" => Error::ParentOnOtherPost {
                    parent: CommentId(uuid_field(&data, "parent")?),
                    post: PostId(uuid_field(&data, "post")?),
                },
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
