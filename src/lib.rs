pub mod catalog;
pub mod error;
pub mod expression;
pub mod filter;
pub mod memory;
pub mod planner;
pub mod sql;
pub mod value;

pub use error::{QueryError, QueryResult};
