use crate::api::{Audience, Post, Viewer};

/// Whether `viewer` may see the content item guarded by `audience`
///
/// Admins and public audiences always match. Otherwise any non-empty code
/// list matching the viewer grants access, whatever the declared kind says:
/// an `organization` audience that also lists departments lets those
/// departments in. Empty lists never match.
pub fn is_visible(audience: &Audience, viewer: &Viewer) -> bool {
    if viewer.is_admin || audience.is_public() {
        return true;
    }
    let org_match = audience
        .org_codes
        .iter()
        .any(|o| viewer.org_memberships.contains(o));
    let dept_match = viewer
        .department_code
        .as_ref()
        .map_or(false, |d| audience.dept_codes.contains(d));
    let course_match = viewer
        .course_code
        .as_ref()
        .map_or(false, |c| audience.course_codes.contains(c));
    org_match || dept_match || course_match
}

/// Whether `viewer` may post to (comment on, sign up for) the content item
pub fn can_participate(audience: &Audience, viewer: &Viewer) -> bool {
    is_visible(audience, viewer)
}

pub trait VisibilityExt {
    fn is_visible_to(&self, viewer: &Viewer) -> bool;
}

impl VisibilityExt for Audience {
    fn is_visible_to(&self, viewer: &Viewer) -> bool {
        is_visible(self, viewer)
    }
}

impl VisibilityExt for Post {
    fn is_visible_to(&self, viewer: &Viewer) -> bool {
        is_visible(&self.audience, viewer)
    }
}
