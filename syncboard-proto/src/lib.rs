//! Shared protocol definitions for the `SyncBoard` wire format.

pub mod api;
pub mod codec;
pub mod event;
pub mod task;
