//! Vitrine core: portfolio case-study model and the embedded-image
//! lifecycle synchronizer
//!
//! A case study's rich-text fields may embed images inline; the image bytes
//! live as separate blobs keyed by numeric id. This crate keeps the two in
//! lock-step:
//!
//! - [`sanitize`] reduces untrusted markup to a safe allow-list, always
//!   preserving `img` elements and their `src` values,
//! - [`image_ref`] recognizes the three encodings an image reference can
//!   appear in (inline data URI, bare id, public link) and converts between
//!   them,
//! - [`markup::RichText`] scans a field's `img` elements in document order
//!   and rewrites individual `src` attributes,
//! - [`SyncEngine`] orchestrates create/update/delete/serve so that, after
//!   every successful operation, the stored blob set equals exactly the set
//!   of ids referenced by the document — with all mutations inside one
//!   all-or-nothing [`store::Store::transact`] unit of work.

pub mod case_study;
pub mod engine;
pub mod error;
pub mod image;
pub mod image_ref;
pub mod markup;
pub mod sanitize;
pub mod store;

pub use case_study::{CaseStudy, CaseStudyUpload, RICH_TEXT_FIELD_COUNT, RICH_TEXT_FIELD_NAMES};
pub use engine::{render_image_links, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use image::{ImageBlob, ImageType, NewImage};
pub use image_ref::{decode_data_uri, encode_id, encode_link, ImageRef};
pub use sanitize::sanitize;
pub use store::{MemoryStore, Store, UnitOfWork};
