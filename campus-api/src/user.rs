use std::collections::HashSet;

use uuid::Uuid;

use crate::{normalize, Error, Viewer, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn stub() -> UserId {
        UserId(STUB_UUID)
    }
}

/// A profile row, as returned by the backend
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,

    #[serde(default)]
    pub is_admin: bool,

    #[serde(default, deserialize_with = "normalize::code")]
    pub department_code: Option<String>,

    #[serde(default, deserialize_with = "normalize::code")]
    pub course_code: Option<String>,

    #[serde(default, deserialize_with = "normalize::code_set")]
    pub org_memberships: HashSet<String>,
}

impl User {
    pub fn viewer(&self) -> Viewer {
        Viewer {
            is_admin: self.is_admin,
            org_memberships: self.org_memberships.clone(),
            department_code: self.department_code.clone(),
            course_code: self.course_code.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.name)?;
        for c in self
            .department_code
            .iter()
            .chain(self.course_code.iter())
            .chain(self.org_memberships.iter())
        {
            crate::validate_string(c)?;
        }
        Ok(())
    }
}
