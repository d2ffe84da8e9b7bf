//! `SyncBoard` Hub library.
//!
//! Exposes the hub server for use in tests and embedding.
//! The hub stores tasks, answers owner-scoped REST queries, and fans
//! board event frames out between connected WebSocket clients.

pub mod config;
pub mod server;
pub mod state;
