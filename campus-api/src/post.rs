use uuid::Uuid;

use crate::{Audience, Error, Time, UserId};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct PostId(pub Uuid);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Event,
    Schedule,
    Bulletin,
    Announcement,
}

impl std::str::FromStr for PostKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<PostKind> {
        match s {
            "event" => Ok(PostKind::Event),
            "schedule" => Ok(PostKind::Schedule),
            "bulletin" => Ok(PostKind::Bulletin),
            "announcement" => Ok(PostKind::Announcement),
            _ => Err(anyhow::anyhow!("unknown post kind {s:?}")),
        }
    }
}

/// Any content item that carries an audience: calendar events, schedules,
/// bulletins and announcements
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Post {
    pub id: PostId,
    pub kind: PostKind,
    pub owner_id: UserId,
    pub date: Time,
    pub title: String,
    pub audience: Audience,
}

impl Post {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_time(&self.date)?;
        crate::validate_string(&self.title)?;
        self.audience.validate()
    }
}
