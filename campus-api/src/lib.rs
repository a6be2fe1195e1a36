use chrono::{Datelike, Utc};

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

mod audience;
pub use audience::{Audience, AudienceKind, Viewer};

mod comment;
pub use comment::{Comment, CommentId};

mod error;
pub use error::Error;

mod post;
pub use post::{Post, PostId, PostKind};

mod user;
pub use user::{User, UserId};

// Strings coming from the backend end up in text search and postgres, neither of
// which handle NUL bytes
pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}

pub fn validate_time(t: &Time) -> Result<(), Error> {
    match (0..=9999).contains(&t.year()) {
        true => Ok(()),
        false => Err(Error::TimeOutOfRange(*t)),
    }
}

/// Serde helpers used to normalize loosely-typed backend rows at the
/// deserialization boundary
pub(crate) mod normalize {
    use std::collections::HashSet;

    use serde::{Deserialize, Deserializer};

    /// `null`, missing and blank codes all mean "no code"
    pub fn code<'de, D>(d: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(d)?.and_then(clean))
    }

    /// `null` and missing lists are empty, blank entries are dropped
    pub fn code_set<'de, D>(d: D) -> Result<HashSet<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Vec<Option<String>>>::deserialize(d)?
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.and_then(clean))
            .collect())
    }

    pub fn clean(code: String) -> Option<String> {
        let trimmed = code.trim();
        match trimmed.is_empty() {
            true => None,
            false if trimmed.len() == code.len() => Some(code),
            false => Some(String::from(trimmed)),
        }
    }
}
