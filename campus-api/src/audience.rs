use std::collections::HashSet;

use crate::{normalize, Error};

#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AudienceKind {
    Public,
    Organization,
    Department,
    Course,
    Mixed,
}

/// Who may see, or post to, a content item
///
/// Events and bulletins call the kind `visibility_type`, schedules call it
/// `participant_type`; both are accepted.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Audience {
    #[serde(alias = "visibility_type", alias = "participant_type")]
    pub kind: AudienceKind,

    #[serde(default, deserialize_with = "normalize::code_set")]
    pub org_codes: HashSet<String>,

    #[serde(default, deserialize_with = "normalize::code_set")]
    pub dept_codes: HashSet<String>,

    #[serde(default, deserialize_with = "normalize::code_set")]
    pub course_codes: HashSet<String>,
}

fn codes<I, S>(codes: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    codes
        .into_iter()
        .filter_map(|c| normalize::clean(c.into()))
        .collect()
}

impl Audience {
    pub fn public() -> Audience {
        Audience {
            kind: AudienceKind::Public,
            org_codes: HashSet::new(),
            dept_codes: HashSet::new(),
            course_codes: HashSet::new(),
        }
    }

    fn restricted(kind: AudienceKind) -> Audience {
        Audience {
            kind,
            ..Audience::public()
        }
    }

    pub fn organizations<I: IntoIterator<Item = S>, S: Into<String>>(orgs: I) -> Audience {
        Audience {
            org_codes: codes(orgs),
            ..Audience::restricted(AudienceKind::Organization)
        }
    }

    pub fn departments<I: IntoIterator<Item = S>, S: Into<String>>(depts: I) -> Audience {
        Audience {
            dept_codes: codes(depts),
            ..Audience::restricted(AudienceKind::Department)
        }
    }

    pub fn courses<I: IntoIterator<Item = S>, S: Into<String>>(courses: I) -> Audience {
        Audience {
            course_codes: codes(courses),
            ..Audience::restricted(AudienceKind::Course)
        }
    }

    pub fn mixed<O, D, C, S>(orgs: O, depts: D, courses: C) -> Audience
    where
        O: IntoIterator<Item = S>,
        D: IntoIterator<Item = S>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Audience {
            kind: AudienceKind::Mixed,
            org_codes: codes(orgs),
            dept_codes: codes(depts),
            course_codes: codes(courses),
        }
    }

    pub fn is_public(&self) -> bool {
        self.kind == AudienceKind::Public
    }

    /// Whether the code lists disagree with the declared kind, eg. an
    /// `organization` audience that also lists departments
    pub fn has_stray_codes(&self) -> bool {
        match self.kind {
            AudienceKind::Public | AudienceKind::Mixed => false,
            AudienceKind::Organization => {
                !self.dept_codes.is_empty() || !self.course_codes.is_empty()
            }
            AudienceKind::Department => {
                !self.org_codes.is_empty() || !self.course_codes.is_empty()
            }
            AudienceKind::Course => !self.org_codes.is_empty() || !self.dept_codes.is_empty(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        for c in self
            .org_codes
            .iter()
            .chain(self.dept_codes.iter())
            .chain(self.course_codes.iter())
        {
            crate::validate_string(c)?;
        }
        Ok(())
    }
}

/// The requesting user's affiliations
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Viewer {
    #[serde(default)]
    pub is_admin: bool,

    #[serde(default, deserialize_with = "normalize::code_set")]
    pub org_memberships: HashSet<String>,

    #[serde(default, deserialize_with = "normalize::code")]
    pub department_code: Option<String>,

    #[serde(default, deserialize_with = "normalize::code")]
    pub course_code: Option<String>,
}

impl Viewer {
    pub fn anonymous() -> Viewer {
        Viewer::default()
    }

    pub fn admin() -> Viewer {
        Viewer {
            is_admin: true,
            ..Viewer::default()
        }
    }
}
