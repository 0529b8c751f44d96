#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Hashing and equality policies, plus the built-in hash functions for
/// integers, strings and pointers.
pub mod hash;

/// A key-value map layered over the open-addressing [`HashTable`].
pub mod hash_map;

pub mod hash_table;

/// A set layered over the open-addressing [`HashTable`].
pub mod hash_set;

pub use hash::Builtin;
pub use hash::FnPolicy;
pub use hash::HashPolicy;
pub use hash::TableKey;
pub use hash_map::HashMap;
pub use hash_set::HashSet;
pub use hash_table::AllocError;
pub use hash_table::Entry;
pub use hash_table::HashTable;

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "index-tiny")] {
        /// Unsigned integer type used for hashes and bucket indices.
        ///
        /// Selected by the `index-tiny` / `index-huge` features; 32 bits by
        /// default. The width bounds the maximum bucket count.
        pub type HashUint = u16;
    } else if #[cfg(feature = "index-huge")] {
        /// Unsigned integer type used for hashes and bucket indices.
        ///
        /// Selected by the `index-tiny` / `index-huge` features; 32 bits by
        /// default. The width bounds the maximum bucket count.
        pub type HashUint = u64;
    } else {
        /// Unsigned integer type used for hashes and bucket indices.
        ///
        /// Selected by the `index-tiny` / `index-huge` features; 32 bits by
        /// default. The width bounds the maximum bucket count.
        pub type HashUint = u32;
    }
}

/// Index returned by [`HashTable::get`] when a key is absent.
///
/// Equal to the maximum value of [`HashUint`]; the bucket count is always
/// strictly smaller, so this can never collide with a real index.
pub const INDEX_MISSING: HashUint = HashUint::MAX;

cfg_if! {
    if #[cfg(feature = "load-sixty")] {
        /// Maximum ratio of non-empty buckets before a table resizes.
        pub const MAX_LOAD: f64 = 0.60;
    } else if #[cfg(feature = "load-ninety")] {
        /// Maximum ratio of non-empty buckets before a table resizes.
        pub const MAX_LOAD: f64 = 0.90;
    } else {
        /// Maximum ratio of non-empty buckets before a table resizes.
        pub const MAX_LOAD: f64 = 0.77;
    }
}
