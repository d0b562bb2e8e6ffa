//! UI layer for desktop GUI: app shell and the four view states.

pub mod app;

pub use app::{MemojiApp, PersistedDesktopSettings};
