//! Transactional store implementation
//!
//! Implements the core storage abstractions over one SQLite database: both
//! the image table and the case-study table live in the same file, so a
//! single `rusqlite::Transaction` is the unit of work — dropping it without
//! an explicit commit rolls back everything.

use rusqlite::{params, OptionalExtension, Transaction};
use tracing::debug;

use vitrine_core::case_study::CaseStudy;
use vitrine_core::engine::SyncEngine;
use vitrine_core::error::{SyncError, SyncResult};
use vitrine_core::image::{ImageBlob, ImageType, NewImage};
use vitrine_core::store::{Store, UnitOfWork};

use crate::connection::SqlitePool;

/// SQLite implementation of the core [`Store`] abstraction
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a store backed by the given pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Convenience constructor: a synchronization engine over SQLite storage
pub fn create_sync_engine(pool: SqlitePool) -> SyncEngine<SqliteStore> {
    SyncEngine::new(SqliteStore::new(pool))
}

impl Store for SqliteStore {
    fn transact<T, F>(&self, f: F) -> SyncResult<T>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> SyncResult<T>,
    {
        let outcome = self.pool.with_connection_mut(|conn| {
            let tx = conn.transaction()?;
            let mut uow = SqliteUnitOfWork { tx: &tx };
            match f(&mut uow) {
                Ok(value) => {
                    tx.commit()?;
                    Ok(Ok(value))
                }
                Err(err) => {
                    // dropping the transaction rolls everything back
                    debug!(error = %err, "Rolling back unit of work");
                    Ok(Err(err))
                }
            }
        });
        match outcome {
            Ok(inner) => inner,
            Err(err) => Err(err.into()),
        }
    }
}

struct SqliteUnitOfWork<'a> {
    tx: &'a Transaction<'a>,
}

fn store_err(err: rusqlite::Error) -> SyncError {
    SyncError::Store(err.to_string())
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
    fn insert_image(&mut self, image: &NewImage) -> SyncResult<i64> {
        self.tx
            .execute(
                "INSERT INTO images (data, image_type) VALUES (?1, ?2)",
                params![image.data, image.image_type.as_str()],
            )
            .map_err(store_err)?;
        Ok(self.tx.last_insert_rowid())
    }

    fn update_image(&mut self, id: i64, image: &NewImage) -> SyncResult<()> {
        let rows = self
            .tx
            .execute(
                "UPDATE images SET data = ?2, image_type = ?3 WHERE image_id = ?1",
                params![id, image.data, image.image_type.as_str()],
            )
            .map_err(store_err)?;
        if rows == 0 {
            return Err(SyncError::Store(format!("image {} does not exist", id)));
        }
        Ok(())
    }

    fn delete_image(&mut self, id: i64) -> SyncResult<()> {
        self.tx
            .execute("DELETE FROM images WHERE image_id = ?1", params![id])
            .map_err(store_err)?;
        Ok(())
    }

    fn find_image(&mut self, id: i64) -> SyncResult<Option<ImageBlob>> {
        self.tx
            .query_row(
                "SELECT image_id, data, image_type FROM images WHERE image_id = ?1",
                params![id],
                row_to_image,
            )
            .optional()
            .map_err(store_err)
    }

    fn insert_case_study(&mut self, case_study: &CaseStudy) -> SyncResult<i64> {
        self.tx
            .execute(
                "INSERT INTO case_studies (
                    title, client_name, client_link, client_logo_id, industry,
                    summary, start_date, end_date, problem_description,
                    solution_description, outcomes, tools_used, project_learnings
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    case_study.title,
                    case_study.client_name,
                    case_study.client_link,
                    case_study.client_logo_id,
                    case_study.industry,
                    case_study.summary,
                    case_study.start_date,
                    case_study.end_date,
                    case_study.problem_description,
                    case_study.solution_description,
                    case_study.outcomes,
                    case_study.tools_used,
                    case_study.project_learnings,
                ],
            )
            .map_err(store_err)?;
        Ok(self.tx.last_insert_rowid())
    }

    fn update_case_study(&mut self, case_study: &CaseStudy) -> SyncResult<()> {
        let rows = self
            .tx
            .execute(
                "UPDATE case_studies SET
                    title = ?2, client_name = ?3, client_link = ?4,
                    client_logo_id = ?5, industry = ?6, summary = ?7,
                    start_date = ?8, end_date = ?9, problem_description = ?10,
                    solution_description = ?11, outcomes = ?12, tools_used = ?13,
                    project_learnings = ?14
                 WHERE case_study_id = ?1",
                params![
                    case_study.id,
                    case_study.title,
                    case_study.client_name,
                    case_study.client_link,
                    case_study.client_logo_id,
                    case_study.industry,
                    case_study.summary,
                    case_study.start_date,
                    case_study.end_date,
                    case_study.problem_description,
                    case_study.solution_description,
                    case_study.outcomes,
                    case_study.tools_used,
                    case_study.project_learnings,
                ],
            )
            .map_err(store_err)?;
        if rows == 0 {
            return Err(SyncError::Store(format!(
                "case study {} does not exist",
                case_study.id
            )));
        }
        Ok(())
    }

    fn delete_case_study(&mut self, id: i64) -> SyncResult<()> {
        self.tx
            .execute(
                "DELETE FROM case_studies WHERE case_study_id = ?1",
                params![id],
            )
            .map_err(store_err)?;
        Ok(())
    }

    fn find_case_study(&mut self, id: i64) -> SyncResult<Option<CaseStudy>> {
        self.tx
            .query_row(
                "SELECT case_study_id, title, client_name, client_link,
                        client_logo_id, industry, summary, start_date, end_date,
                        problem_description, solution_description, outcomes,
                        tools_used, project_learnings
                 FROM case_studies WHERE case_study_id = ?1",
                params![id],
                row_to_case_study,
            )
            .optional()
            .map_err(store_err)
    }
}

fn row_to_image(row: &rusqlite::Row<'_>) -> rusqlite::Result<ImageBlob> {
    let tag: String = row.get(2)?;
    let image_type = ImageType::parse(&tag).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown image type tag: {}", tag).into(),
        )
    })?;
    Ok(ImageBlob {
        id: row.get(0)?,
        data: row.get(1)?,
        image_type,
    })
}

fn row_to_case_study(row: &rusqlite::Row<'_>) -> rusqlite::Result<CaseStudy> {
    Ok(CaseStudy {
        id: row.get(0)?,
        title: row.get(1)?,
        client_name: row.get(2)?,
        client_link: row.get(3)?,
        client_logo_id: row.get(4)?,
        industry: row.get(5)?,
        summary: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        problem_description: row.get(9)?,
        solution_description: row.get(10)?,
        outcomes: row.get(11)?,
        tools_used: row.get(12)?,
        project_learnings: row.get(13)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::new(SqlitePool::memory().expect("memory pool"))
    }

    #[test]
    fn test_image_crud_inside_transaction() {
        let store = store();
        let id = store
            .transact(|uow| {
                let id = uow.insert_image(&NewImage::new(vec![1, 2, 3], ImageType::Jpeg))?;
                let found = uow.find_image(id)?.expect("inserted image");
                assert_eq!(found.data, vec![1, 2, 3]);
                assert_eq!(found.image_type, ImageType::Jpeg);
                Ok(id)
            })
            .unwrap();

        store
            .transact(|uow| {
                uow.update_image(id, &NewImage::new(vec![9], ImageType::Png))?;
                let found = uow.find_image(id)?.expect("updated image");
                assert_eq!(found.data, vec![9]);
                assert_eq!(found.image_type, ImageType::Png);
                uow.delete_image(id)?;
                assert!(uow.find_image(id)?.is_none());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_error_rolls_back_transaction() {
        let store = store();
        let result: SyncResult<()> = store.transact(|uow| {
            uow.insert_image(&NewImage::new(vec![1], ImageType::Png))?;
            Err(SyncError::Decode("forced failure".into()))
        });
        assert!(result.is_err());

        let count = store
            .transact(|uow| Ok(uow.find_image(1)?.is_some()))
            .unwrap();
        assert!(!count);
    }

    #[test]
    fn test_case_study_round_trip() {
        let store = store();
        let case_study = CaseStudy {
            title: "Acme rollout".into(),
            client_name: Some("Acme".into()),
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1),
            outcomes: Some(r#"<img src="1">"#.into()),
            ..Default::default()
        };

        let id = store
            .transact(|uow| uow.insert_case_study(&case_study))
            .unwrap();
        let found = store
            .transact(|uow| uow.find_case_study(id))
            .unwrap()
            .expect("stored case study");

        assert_eq!(found.title, "Acme rollout");
        assert_eq!(found.client_name.as_deref(), Some("Acme"));
        assert_eq!(found.start_date, chrono::NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(found.outcomes.as_deref(), Some(r#"<img src="1">"#));
    }

    #[test]
    fn test_update_missing_case_study_fails() {
        let store = store();
        let ghost = CaseStudy {
            id: 999,
            ..Default::default()
        };
        let result = store.transact(|uow| uow.update_case_study(&ghost));
        assert!(matches!(result, Err(SyncError::Store(_))));
    }
}
