//! Local keyed store for interactive demo components.
//!
//! Demo pages (the combobox, for one) need something that feels like
//! server-side persistence without being one: options created on the fly
//! must survive a reload, nothing more. [`KeyedStore`] provides exactly a
//! create/read-all surface over a named, persisted [`Slot`], with generated
//! ids from [`id`].
//!
//! This store is a local, single-consumer demo aid, not a shared system of
//! record: writes are synchronous read-modify-write with no locking, and two
//! processes sharing a slot race with last-writer-wins.

pub mod id;
pub mod keyed;
pub mod slot;

pub use keyed::{Entry, KeyedStore};
pub use slot::{DirSlot, Slot};
