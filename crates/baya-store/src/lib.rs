//! Durable local storage for the BAYA SHOP storefront.
//!
//! The storefront keeps exactly one piece of client-side state, the cart
//! snapshot. This crate provides the key-value abstraction it is written to,
//! with automatic JSON serialization.
//!
//! # Example
//!
//! ```rust
//! use baya_store::{KvStore, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! store.set("cart", &vec![1, 2, 3]).unwrap();
//! let items: Option<Vec<u32>> = store.get("cart").unwrap();
//! assert_eq!(items, Some(vec![1, 2, 3]));
//! store.delete("cart").unwrap();
//! ```

mod error;
mod kv;

pub use error::StoreError;
pub use kv::{FileStore, KvStore, MemoryStore};
