//! Chat rooms over REST plus the per-room session state.

pub mod api;
pub mod log;
pub mod room;

pub use api::ChatApi;
pub use log::MessageLog;
pub use room::{RoomSession, invite_url};
