//! Expense entries: the single-table store and the operations applied to it.
//!
//! [`Engine`] owns nothing but the location of the database. Every
//! operation opens its own connection and closes it before returning, so
//! the underlying file may be swapped or removed between calls.
pub use entry::{Entry, HistoryPoint};
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder};

mod amount;
mod entry;
mod error;
mod ops;

type ResultEngine<T> = Result<T, EngineError>;
