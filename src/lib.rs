#![deny(unsafe_op_in_unsafe_fn)]

#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod logging;
pub mod pool;

// not concurrent
pub mod non_concurrent;

// concurrency primitives
pub mod spinlock_mutex;

mod stats;
mod tree;

pub use config::{LogConfig, TreeConfig};
pub use error::{Result, TreeError};
pub use non_concurrent::rbtree::{Color, Comparator, Iter, NaturalOrder};
pub use pool::{NodeId, PoolError};
pub use stats::Statistics;
pub use tree::{Inserted, RbTree, TreeGuard};
