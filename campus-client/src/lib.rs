mod db;
pub use db::{FeedDump, FeedFile};

mod thread;
pub use thread::{
    build_threads, preview, preview_with, Thread, ThreadIter, MAX_DEPTH, PREVIEW_REPLIES,
    PREVIEW_THREADS,
};

mod visibility;
pub use visibility::{can_participate, is_visible, VisibilityExt};

mod fuzz;

pub mod api {
    pub use campus_api::*;
}

pub mod prelude {
    pub use crate::VisibilityExt;
}
