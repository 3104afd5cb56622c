//! Thread membership and projection for a local mail-sync store.
//!
//! [`membership::refresh_membership`] keeps a thread's labels and folders in
//! step with its messages; [`view::project`] turns a loaded thread into the
//! record served to API clients.

pub mod config;
pub mod db;
pub mod error;
pub mod membership;
pub mod models;
pub mod store;
pub mod sync;
pub mod view;

pub use error::{Association, StoreError, ThreadError};
pub use membership::{refresh_membership, refresh_membership_serialized};
pub use store::ThreadStore;
pub use view::{DetailLevel, HydratedThread, ThreadRecord, project};
