//! Storage Adapters
//!
//! In-memory implementations of the persistence ports. Real deployments plug
//! SQL repositories in behind the same traits.
//!
//! ## Available Adapters
//!
//! - **InMemoryAgentDirectory** - Employee agents and skill cards
//! - **InMemoryTaskStore** - Tasks and pending-task queries
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{InMemoryAgentDirectory, InMemoryTaskStore};
//!
//! let agents = Arc::new(InMemoryAgentDirectory::new());
//! let tasks = Arc::new(InMemoryTaskStore::new());
//! ```

mod in_memory_agent_directory;
mod in_memory_task_store;

pub use in_memory_agent_directory::InMemoryAgentDirectory;
pub use in_memory_task_store::InMemoryTaskStore;
