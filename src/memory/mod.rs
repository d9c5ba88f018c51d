//! Memory management for the parse search
//!
//! The only dynamic structure whose size the parser must bound is the pool
//! of reference edges; this module provides that pool.

pub mod edge_pool;

pub use edge_pool::{EdgeId, EdgePool, RefEdge};
