pub mod reducer;

pub use reducer::{reduce, ChatEvent, ChatState, DEFAULT_TITLE};
