//! User persistence
//!
//! PostgreSQL repository plus an in-memory store with the same semantics.

pub mod memory;
pub mod pool;
pub mod store;
pub mod users;

pub use memory::MemoryUserStore;
pub use pool::DatabasePool;
pub use store::{ReputationUpdate, StoreError, UserStore};
pub use users::{UserProfile, UserRepository};
