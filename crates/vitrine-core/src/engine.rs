//! Embedded-image synchronization engine
//!
//! Orchestrates the lifecycle shared by a case study and its image blobs:
//! create persists inline images and canonicalizes their references, update
//! diffs the previously referenced id set against the new content and
//! deletes what fell out of use, delete cascades over every referenced
//! blob. Each operation runs inside one [`Store::transact`] unit of work —
//! either every blob and document mutation commits, or none do.
//!
//! The read path ([`SyncEngine::serve`] / [`render_image_links`]) rewrites
//! stored ids to public links on the way out and never touches storage.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::case_study::{CaseStudy, CaseStudyUpload, RICH_TEXT_FIELD_COUNT};
use crate::error::{SyncError, SyncResult};
use crate::image_ref::{decode_data_uri, encode_id, encode_link, ImageRef};
use crate::markup::RichText;
use crate::sanitize::sanitize;
use crate::store::{Store, UnitOfWork};

/// Synchronizes case-study writes with their embedded image blobs
pub struct SyncEngine<S> {
    store: S,
    // serializes concurrent writers of the same case study; the upstream
    // design provides no such guarantee, so the engine does
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl<S: Store> SyncEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a case study, persisting every inline image it embeds
    ///
    /// Rich-text fields are sanitized, then scanned; each inline data-URI
    /// reference is decoded, inserted as a blob, and rewritten to the new
    /// blob's id. Create accepts freshly embedded images only — a link or
    /// bare id here means the client echoed already-served content, which
    /// aborts the operation.
    pub fn create(&self, upload: &CaseStudyUpload) -> SyncResult<CaseStudy> {
        self.store.transact(|uow| {
            let mut case_study = scalar_fields_from(upload);

            if let Some(raw) = upload.logo_data_uri() {
                let logo = decode_data_uri(raw)?;
                case_study.client_logo_id = Some(uow.insert_image(&logo)?);
            }

            let mut inserted = 0usize;
            let mut new_fields: [Option<String>; RICH_TEXT_FIELD_COUNT] = Default::default();
            for (slot, field) in upload.rich_text_fields().into_iter().enumerate() {
                let Some(markup) = field else { continue };
                let rich = RichText::parse(&sanitize(markup));
                for i in 0..rich.image_count() {
                    let src = rich.image_src(i);
                    match ImageRef::classify(&src) {
                        ImageRef::Inline(raw) => {
                            let image = decode_data_uri(&raw)?;
                            let id = uow.insert_image(&image)?;
                            rich.set_image_src(i, &encode_id(id));
                            inserted += 1;
                        }
                        ImageRef::Stored(_) | ImageRef::Link(_) => {
                            return Err(SyncError::Decode(format!(
                                "already-stored image reference in new case study: {}",
                                src
                            )));
                        }
                    }
                }
                new_fields[slot] = Some(rich.html());
            }
            for (target, value) in case_study.rich_text_fields_mut().into_iter().zip(new_fields) {
                *target = value;
            }

            let id = uow.insert_case_study(&case_study)?;
            case_study.id = id;
            info!(case_study_id = id, images_inserted = inserted, "created case study");
            Ok(case_study)
        })
    }

    /// Update a case study, keeping its blob set in lock-step with the new
    /// field content
    ///
    /// Field slots absent from the upload are left untouched and their
    /// referenced images stay in use. For every supplied slot the stored
    /// content's image ids become deletion candidates; a candidate survives
    /// only when the new content references it back through its public link
    /// form. Inline references are decoded and inserted as new blobs. A bare
    /// numeric id in supplied content is kept verbatim but does not rescue
    /// its blob from deletion — see DESIGN.md for this asymmetry.
    pub fn update(&self, id: i64, upload: &CaseStudyUpload) -> SyncResult<CaseStudy> {
        let lock = self.document_lock(id);
        let _guard = lock.lock();

        self.store.transact(|uow| {
            let mut current = uow.find_case_study(id)?.ok_or(SyncError::NotFound(id))?;

            if let Some(raw) = upload.logo_data_uri() {
                let logo = decode_data_uri(raw)?;
                match current.client_logo_id {
                    // the only place an existing blob's payload is mutated
                    // rather than replaced by id churn
                    Some(logo_id) => uow.update_image(logo_id, &logo)?,
                    None => current.client_logo_id = Some(uow.insert_image(&logo)?),
                }
            }

            let mut prior_ids: BTreeSet<i64> = BTreeSet::new();
            for (stored, supplied) in current
                .rich_text_fields()
                .into_iter()
                .zip(upload.rich_text_fields())
            {
                if supplied.is_none() {
                    continue;
                }
                if let Some(markup) = stored {
                    prior_ids.extend(stored_image_ids(markup));
                }
            }

            let mut inserted = 0usize;
            let mut new_fields: [Option<String>; RICH_TEXT_FIELD_COUNT] = Default::default();
            for (slot, field) in upload.rich_text_fields().into_iter().enumerate() {
                let Some(markup) = field else { continue };
                let rich = RichText::parse(&sanitize(markup));
                for i in 0..rich.image_count() {
                    let src = rich.image_src(i);
                    match ImageRef::classify(&src) {
                        ImageRef::Inline(raw) => {
                            let image = decode_data_uri(&raw)?;
                            let new_id = uow.insert_image(&image)?;
                            rich.set_image_src(i, &encode_id(new_id));
                            inserted += 1;
                        }
                        ImageRef::Link(image_id) => {
                            // still referenced; canonicalize back to the bare id
                            prior_ids.remove(&image_id);
                            rich.set_image_src(i, &encode_id(image_id));
                        }
                        // a bare id does not confirm reuse; kept verbatim, and
                        // its blob remains a deletion candidate
                        ImageRef::Stored(_) => {}
                    }
                }
                new_fields[slot] = Some(rich.html());
            }

            for (target, value) in current.rich_text_fields_mut().into_iter().zip(new_fields) {
                if let Some(markup) = value {
                    *target = Some(markup);
                }
            }

            let deleted = prior_ids.len();
            for image_id in prior_ids {
                debug!(image_id, "deleting orphaned image");
                uow.delete_image(image_id)?;
            }

            merge_scalar_fields(&mut current, upload);
            uow.update_case_study(&current)?;
            info!(
                case_study_id = id,
                images_inserted = inserted,
                images_deleted = deleted,
                "updated case study"
            );
            Ok(current)
        })
    }

    /// Delete a case study together with every blob it references,
    /// including the client logo
    pub fn delete(&self, id: i64) -> SyncResult<()> {
        let lock = self.document_lock(id);
        let _guard = lock.lock();

        self.store.transact(|uow| {
            let current = uow.find_case_study(id)?.ok_or(SyncError::NotFound(id))?;

            let mut deleted = 0usize;
            for markup in current.rich_text_fields().into_iter().flatten() {
                for image_id in stored_image_ids(markup) {
                    uow.delete_image(image_id)?;
                    deleted += 1;
                }
            }

            uow.delete_case_study(id)?;

            if let Some(logo_id) = current.client_logo_id {
                uow.delete_image(logo_id)?;
                deleted += 1;
            }

            info!(case_study_id = id, images_deleted = deleted, "deleted case study");
            Ok(())
        })
    }

    /// Read path: load a case study with stored image ids rewritten to
    /// public links under `base_url`. Never mutates storage.
    pub fn serve(&self, id: i64, base_url: &str) -> SyncResult<Option<CaseStudy>> {
        let found = self.store.transact(|uow| uow.find_case_study(id))?;
        Ok(found.map(|case_study| render_image_links(case_study, base_url)))
    }

    fn document_lock(&self, id: i64) -> Arc<Mutex<()>> {
        self.locks.lock().entry(id).or_default().clone()
    }
}

/// Rewrite every bare-id image reference in the rich-text fields to its
/// public link form. Best-effort: references that are not bare ids are left
/// exactly as stored, and a field with no rewrites is returned untouched.
pub fn render_image_links(mut case_study: CaseStudy, base_url: &str) -> CaseStudy {
    for field in case_study.rich_text_fields_mut() {
        let Some(markup) = field.as_deref() else { continue };
        let rich = RichText::parse(markup);
        let mut rewritten = false;
        for i in 0..rich.image_count() {
            if let ImageRef::Stored(image_id) = ImageRef::classify(&rich.image_src(i)) {
                rich.set_image_src(i, &encode_link(base_url, image_id));
                rewritten = true;
            }
        }
        if rewritten {
            *field = Some(rich.html());
        }
    }
    case_study
}

/// Image ids referenced in canonical stored form by one field's markup
fn stored_image_ids(markup: &str) -> Vec<i64> {
    RichText::parse(markup)
        .image_srcs()
        .iter()
        .filter_map(|src| match ImageRef::classify(src) {
            ImageRef::Stored(id) => Some(id),
            _ => None,
        })
        .collect()
}

fn scalar_fields_from(upload: &CaseStudyUpload) -> CaseStudy {
    CaseStudy {
        id: 0,
        title: upload.title.clone().unwrap_or_default(),
        client_name: upload.client_name.clone(),
        client_link: upload.client_link.clone(),
        client_logo_id: None,
        industry: upload.industry.clone(),
        summary: upload.summary.clone(),
        start_date: upload.start_date,
        end_date: upload.end_date,
        problem_description: None,
        solution_description: None,
        outcomes: None,
        tools_used: None,
        project_learnings: None,
    }
}

fn merge_scalar_fields(current: &mut CaseStudy, upload: &CaseStudyUpload) {
    if let Some(title) = &upload.title {
        current.title = title.clone();
    }
    if upload.client_name.is_some() {
        current.client_name = upload.client_name.clone();
    }
    if upload.client_link.is_some() {
        current.client_link = upload.client_link.clone();
    }
    if upload.industry.is_some() {
        current.industry = upload.industry.clone();
    }
    if upload.summary.is_some() {
        current.summary = upload.summary.clone();
    }
    if upload.start_date.is_some() {
        current.start_date = upload.start_date;
    }
    if upload.end_date.is_some() {
        current.end_date = upload.end_date;
    }
}
