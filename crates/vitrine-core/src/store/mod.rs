//! Storage abstractions
//!
//! The engine never talks to a database directly. It runs each operation
//! inside a [`Store::transact`] unit of work spanning both the image table
//! and the case-study table: the closure's `Ok` commits everything, any
//! `Err` rolls back everything performed so far. Backends decide what a
//! transaction is; the in-memory store snapshots and restores, the SQLite
//! backend uses real database transactions.

pub mod memory;

pub use memory::MemoryStore;

use crate::case_study::CaseStudy;
use crate::error::SyncResult;
use crate::image::{ImageBlob, NewImage};

/// Mutations available inside one transactional scope
pub trait UnitOfWork {
    fn insert_image(&mut self, image: &NewImage) -> SyncResult<i64>;
    fn update_image(&mut self, id: i64, image: &NewImage) -> SyncResult<()>;
    fn delete_image(&mut self, id: i64) -> SyncResult<()>;
    fn find_image(&mut self, id: i64) -> SyncResult<Option<ImageBlob>>;

    fn insert_case_study(&mut self, case_study: &CaseStudy) -> SyncResult<i64>;
    fn update_case_study(&mut self, case_study: &CaseStudy) -> SyncResult<()>;
    fn delete_case_study(&mut self, id: i64) -> SyncResult<()>;
    fn find_case_study(&mut self, id: i64) -> SyncResult<Option<CaseStudy>>;
}

/// A backend that can run closures as all-or-nothing units of work
pub trait Store {
    /// Run `f` inside one transaction. Commits when `f` returns `Ok`,
    /// rolls back every mutation when it returns `Err`.
    fn transact<T, F>(&self, f: F) -> SyncResult<T>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> SyncResult<T>;
}
