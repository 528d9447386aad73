pub mod models;
pub mod store;
pub mod sweep;
pub mod memory;
pub mod error;
pub mod dbs;

pub use models::{Message, MessageRole, Thread, ThreadSummary};
pub use store::ThreadStore;
pub use sweep::{sweep_messages, MessageSweeper, SweepReport, DEFAULT_SWEEP_BATCH_SIZE};
pub use memory::InMemoryThreadStore;
pub use error::{PersistError, Result};

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoThreadStore;
