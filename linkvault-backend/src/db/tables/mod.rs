//! Database table modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod artifacts;  // artifacts
mod bookmarks;  // bookmarks
mod messages;   // task_messages
mod tasks;      // tasks
