//! Notification dispatch: tag values, tag-to-line mapping, and the dispatcher.

mod dispatcher;
mod mapping;
mod value;

pub use dispatcher::{Dispatch, NotificationDispatcher};
pub use mapping::{LineState, TagBinding, TagMapping};
pub use value::TagValue;
