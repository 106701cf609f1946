//! In-memory store
//!
//! Backs the engine's unit tests and doubles as a reference implementation
//! of the transactional contract: the whole state is snapshotted when a
//! unit of work begins and restored wholesale if it fails.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::case_study::CaseStudy;
use crate::error::SyncResult;
use crate::image::{ImageBlob, NewImage};
use crate::store::{Store, UnitOfWork};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    images: BTreeMap<i64, ImageBlob>,
    case_studies: BTreeMap<i64, CaseStudy>,
    next_image_id: i64,
    next_case_study_id: i64,
}

/// In-memory [`Store`] implementation
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of image blobs currently stored
    pub fn image_count(&self) -> usize {
        self.state.lock().images.len()
    }

    /// Ids of all stored image blobs, ascending
    pub fn image_ids(&self) -> Vec<i64> {
        self.state.lock().images.keys().copied().collect()
    }

    /// Fetch a stored image blob
    pub fn image(&self, id: i64) -> Option<ImageBlob> {
        self.state.lock().images.get(&id).cloned()
    }

    /// Fetch a stored case study
    pub fn case_study(&self, id: i64) -> Option<CaseStudy> {
        self.state.lock().case_studies.get(&id).cloned()
    }
}

impl Store for MemoryStore {
    fn transact<T, F>(&self, f: F) -> SyncResult<T>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> SyncResult<T>,
    {
        let mut state = self.state.lock();
        let snapshot = state.clone();
        let mut uow = MemoryUnitOfWork { state: &mut state };
        match f(&mut uow) {
            Ok(value) => Ok(value),
            Err(err) => {
                *state = snapshot;
                Err(err)
            }
        }
    }
}

struct MemoryUnitOfWork<'a> {
    state: &'a mut MemoryState,
}

impl UnitOfWork for MemoryUnitOfWork<'_> {
    fn insert_image(&mut self, image: &NewImage) -> SyncResult<i64> {
        self.state.next_image_id += 1;
        let id = self.state.next_image_id;
        self.state.images.insert(
            id,
            ImageBlob {
                id,
                data: image.data.clone(),
                image_type: image.image_type,
            },
        );
        Ok(id)
    }

    fn update_image(&mut self, id: i64, image: &NewImage) -> SyncResult<()> {
        self.state.images.insert(
            id,
            ImageBlob {
                id,
                data: image.data.clone(),
                image_type: image.image_type,
            },
        );
        Ok(())
    }

    fn delete_image(&mut self, id: i64) -> SyncResult<()> {
        self.state.images.remove(&id);
        Ok(())
    }

    fn find_image(&mut self, id: i64) -> SyncResult<Option<ImageBlob>> {
        Ok(self.state.images.get(&id).cloned())
    }

    fn insert_case_study(&mut self, case_study: &CaseStudy) -> SyncResult<i64> {
        self.state.next_case_study_id += 1;
        let id = self.state.next_case_study_id;
        let mut stored = case_study.clone();
        stored.id = id;
        self.state.case_studies.insert(id, stored);
        Ok(id)
    }

    fn update_case_study(&mut self, case_study: &CaseStudy) -> SyncResult<()> {
        self.state
            .case_studies
            .insert(case_study.id, case_study.clone());
        Ok(())
    }

    fn delete_case_study(&mut self, id: i64) -> SyncResult<()> {
        self.state.case_studies.remove(&id);
        Ok(())
    }

    fn find_case_study(&mut self, id: i64) -> SyncResult<Option<CaseStudy>> {
        Ok(self.state.case_studies.get(&id).cloned())
    }
}
