//! Integration tests for the synchronization engine over real SQLite
//! transactions
//!
//! The core crate proves the engine's properties against the in-memory
//! store; these tests prove the same properties hold when the unit of work
//! is a real database transaction, with assertions made directly against
//! the tables.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tempfile::TempDir;

use vitrine_core::{CaseStudyUpload, SyncEngine, SyncError};
use vitrine_sqlite::{create_sync_engine, SqliteConfig, SqlitePool, SqliteStore};

fn engine() -> SyncEngine<SqliteStore> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    create_sync_engine(SqlitePool::memory().expect("memory pool"))
}

fn png_uri(data: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(data))
}

fn img(src: &str) -> String {
    format!(r#"<img src="{}">"#, src)
}

/// Ids of every stored image blob, ascending
fn image_ids(engine: &SyncEngine<SqliteStore>) -> Vec<i64> {
    engine
        .store()
        .pool()
        .with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT image_id FROM images ORDER BY image_id")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            Ok(rows.filter_map(Result::ok).collect())
        })
        .expect("image id query")
}

fn case_study_count(engine: &SyncEngine<SqliteStore>) -> i64 {
    engine
        .store()
        .pool()
        .with_connection(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM case_studies", [], |row| row.get(0))?)
        })
        .expect("count query")
}

// k inline images yield exactly k blobs, referenced in document order
#[test]
fn test_create_round_trip() {
    let engine = engine();
    let upload = CaseStudyUpload {
        title: Some("Acme rollout".into()),
        problem_description: Some(format!("{}{}", img(&png_uri(b"one")), img(&png_uri(b"two")))),
        tools_used: Some(img(&png_uri(b"three"))),
        ..Default::default()
    };

    let created = engine.create(&upload).unwrap();

    assert_eq!(image_ids(&engine), vec![1, 2, 3]);
    assert_eq!(
        created.problem_description.as_deref(),
        Some(r#"<img src="1"><img src="2">"#)
    );
    assert_eq!(created.tools_used.as_deref(), Some(r#"<img src="3">"#));

    let stored = engine.store().transact_find(created.id);
    assert_eq!(stored.problem_description, created.problem_description);
}

// resubmitting served (link-form) content changes zero blobs
#[test]
fn test_noop_resubmission() {
    let engine = engine();
    let created = engine
        .create(&CaseStudyUpload {
            outcomes: Some(format!("{}{}", img(&png_uri(b"a")), img(&png_uri(b"b")))),
            ..Default::default()
        })
        .unwrap();

    let served = engine.serve(created.id, "http://x").unwrap().unwrap();
    let updated = engine
        .update(
            created.id,
            &CaseStudyUpload {
                outcomes: served.outcomes.clone(),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(image_ids(&engine), vec![1, 2]);
    assert_eq!(updated.outcomes, created.outcomes);
}

// new content keeping {2,3} as links deletes exactly blob 1
#[test]
fn test_targeted_deletion() {
    let engine = engine();
    let created = engine
        .create(&CaseStudyUpload {
            outcomes: Some(format!(
                "{}{}{}",
                img(&png_uri(b"a")),
                img(&png_uri(b"b")),
                img(&png_uri(b"c"))
            )),
            ..Default::default()
        })
        .unwrap();

    engine
        .update(
            created.id,
            &CaseStudyUpload {
                outcomes: Some(format!(
                    "{}{}",
                    img("http://x/api/images/2"),
                    img("http://x/api/images/3")
                )),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(image_ids(&engine), vec![2, 3]);
}

// a decode failure mid-update leaves zero net changes in the database
#[test]
fn test_atomic_rollback() {
    let engine = engine();
    let created = engine
        .create(&CaseStudyUpload {
            outcomes: Some(img(&png_uri(b"old"))),
            ..Default::default()
        })
        .unwrap();

    let result = engine.update(
        created.id,
        &CaseStudyUpload {
            outcomes: Some(format!("{}{}", img(&png_uri(b"new")), img("broken-ref"))),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(SyncError::Decode(_))));

    // the valid inline insert that preceded the failure was rolled back
    assert_eq!(image_ids(&engine), vec![1]);
    let stored = engine.store().transact_find(created.id);
    assert_eq!(stored.outcomes, created.outcomes);
}

// delete cascades over field blobs and the logo; missing ids are reported
// without mutating anything
#[test]
fn test_delete_cascade() {
    let engine = engine();
    let created = engine
        .create(&CaseStudyUpload {
            client_logo: Some(png_uri(b"logo")),
            problem_description: Some(img(&png_uri(b"a"))),
            outcomes: Some(img(&png_uri(b"b"))),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(image_ids(&engine).len(), 3);

    engine.delete(created.id).unwrap();
    assert!(image_ids(&engine).is_empty());
    assert_eq!(case_study_count(&engine), 0);

    assert_eq!(engine.delete(created.id), Err(SyncError::NotFound(created.id)));
}

// the read path rewrites ids to links and never touches storage
#[test]
fn test_serve_rewrites_links() {
    let engine = engine();
    let created = engine
        .create(&CaseStudyUpload {
            outcomes: Some(img(&png_uri(b"a"))),
            ..Default::default()
        })
        .unwrap();

    let served = engine.serve(created.id, "http://x").unwrap().unwrap();
    assert_eq!(
        served.outcomes.as_deref(),
        Some(r#"<img src="http://x/api/images/1">"#)
    );

    let stored = engine.store().transact_find(created.id);
    assert_eq!(stored.outcomes.as_deref(), Some(r#"<img src="1">"#));
}

#[test]
fn test_logo_overwrite_keeps_id() {
    let engine = engine();
    let created = engine
        .create(&CaseStudyUpload {
            client_logo: Some(png_uri(b"first")),
            ..Default::default()
        })
        .unwrap();
    let logo_id = created.client_logo_id.expect("logo inserted");

    let updated = engine
        .update(
            created.id,
            &CaseStudyUpload {
                client_logo: Some(png_uri(b"second")),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.client_logo_id, Some(logo_id));
    assert_eq!(image_ids(&engine), vec![logo_id]);

    let data: Vec<u8> = engine
        .store()
        .pool()
        .with_connection(|conn| {
            Ok(conn.query_row(
                "SELECT data FROM images WHERE image_id = ?1",
                [logo_id],
                |row| row.get(0),
            )?)
        })
        .unwrap();
    assert_eq!(data, b"second");
}

#[test]
fn test_untouched_fields_keep_their_images() {
    let engine = engine();
    let created = engine
        .create(&CaseStudyUpload {
            problem_description: Some(img(&png_uri(b"keep"))),
            outcomes: Some(img(&png_uri(b"drop"))),
            ..Default::default()
        })
        .unwrap();

    engine
        .update(
            created.id,
            &CaseStudyUpload {
                outcomes: Some("<p>no images</p>".into()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(image_ids(&engine), vec![1]);
    let stored = engine.store().transact_find(created.id);
    assert_eq!(stored.problem_description.as_deref(), Some(r#"<img src="1">"#));
}

#[test]
fn test_create_rejects_served_content() {
    let engine = engine();
    let result = engine.create(&CaseStudyUpload {
        outcomes: Some(img("http://x/api/images/7")),
        ..Default::default()
    });
    assert!(matches!(result, Err(SyncError::Decode(_))));
    assert!(image_ids(&engine).is_empty());
    assert_eq!(case_study_count(&engine), 0);
}

#[test]
fn test_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("vitrine.db");

    let created = {
        let engine =
            create_sync_engine(SqlitePool::new(SqliteConfig::new(&db_path)).expect("pool"));
        engine
            .create(&CaseStudyUpload {
                title: Some("persisted".into()),
                outcomes: Some(img(&png_uri(b"a"))),
                ..Default::default()
            })
            .unwrap()
    };

    let engine = create_sync_engine(SqlitePool::new(SqliteConfig::new(&db_path)).expect("pool"));
    let served = engine.serve(created.id, "http://x").unwrap().unwrap();
    assert_eq!(served.title, "persisted");
    assert_eq!(
        served.outcomes.as_deref(),
        Some(r#"<img src="http://x/api/images/1">"#)
    );
}

/// Test-only helper: load a case study in a fresh unit of work
trait TransactFind {
    fn transact_find(&self, id: i64) -> vitrine_core::CaseStudy;
}

impl TransactFind for SqliteStore {
    fn transact_find(&self, id: i64) -> vitrine_core::CaseStudy {
        use vitrine_core::Store;
        self.transact(|uow| uow.find_case_study(id))
            .expect("load case study")
            .expect("case study exists")
    }
}
