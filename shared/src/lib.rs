pub mod annotations;
pub mod preferences;
pub mod river;
pub mod runnable;
pub mod slug;
pub mod text;

pub use annotations::Annotations;
pub use preferences::{FavoriteRequest, NoteRequest, UserNote, UserPreferences};
pub use river::{RiverDetail, RiverLevel, latest_value, sort_levels_ascending};
pub use runnable::{AdvisedRange, FlowStatus, RunnableKey, runnable_key};
pub use slug::{slugify, wrapper_id};
