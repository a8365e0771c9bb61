//! In-memory implementations of the persistence ports.
//!
//! Used when no database URL is configured and by integration tests. State
//! lives behind one `RwLock`, so each port call is atomic with respect to
//! the others, matching the per-call transactions of the Diesel adapters.

mod store;

pub use store::{InMemoryStore, default_categories};
