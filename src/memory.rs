//! In-memory record store and predicate evaluation.
//!
//! - **Record**: identity key plus value and meta bags
//! - **MemoryStore**: ordered record collection implementing `RecordSource`
//! - **SharedStore**: `RwLock`-guarded store for concurrent readers and writers
//! - **MemoryEvaluator**: bottom-up true-key-set evaluation of a plan

pub mod evaluator;
pub mod record;
pub mod store;

pub use evaluator::{like_matches, MemoryEvaluator};
pub use record::{Record, RecordKey, RecordSource};
pub use store::{MemoryStore, SharedStore};
