use uuid::Uuid;

use crate::{Error, PostId, Time, UserId};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct CommentId(pub Uuid);

/// One comment row, flat: replies point to their parent through `parent_id`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,

    /// Comment this one replies to, if any. Not guaranteed to exist, nor to
    /// be acyclic.
    #[serde(default)]
    pub parent_id: Option<CommentId>,

    pub author_id: UserId,
    pub author_name: String,
    pub created_at: Time,
    pub text: String,
}

impl Comment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_time(&self.created_at)?;
        crate::validate_string(&self.author_name)?;
        crate::validate_string(&self.text)
    }
}
