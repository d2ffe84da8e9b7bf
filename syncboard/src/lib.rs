//! `SyncBoard` engine: local board state, user mutations, and real-time
//! reconciliation against a shared persistence service.

pub mod board;
pub mod session;
pub mod sync;
