//! File record repository for database operations.
//!
//! Implements file record persistence using SeaORM.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::entities::file_records;
use arca_core::file::{
    BackendKind, FileError, FileId, FileRecord, FileRecordRepository as FileRecordRepoTrait,
    NewFileRecord, OwnerId,
};

/// File record repository implementation.
#[derive(Debug, Clone)]
pub struct FileRecordRepository {
    db: DatabaseConnection,
}

impl FileRecordRepository {
    /// Create a new file record repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl FileRecordRepoTrait for FileRecordRepository {
    async fn create(&self, input: NewFileRecord) -> Result<FileRecord, FileError> {
        let active_model = file_records::ActiveModel {
            id: Set(input.id.to_string()),
            owner_id: Set(input.owner_id.as_uuid()),
            backend: Set(input.backend.as_str().to_string()),
            created_at: Set(Utc::now().into()),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| FileError::metadata_write(e.to_string()))?;

        to_domain(model)
    }

    async fn find_by_id(&self, id: &FileId) -> Result<Option<FileRecord>, FileError> {
        let model = file_records::Entity::find_by_id(id.as_str())
            .one(&self.db)
            .await
            .map_err(|e| FileError::metadata_read(e.to_string()))?;

        model.map(to_domain).transpose()
    }

    async fn delete(&self, id: &FileId) -> Result<bool, FileError> {
        let result = file_records::Entity::delete_by_id(id.as_str())
            .exec(&self.db)
            .await
            .map_err(|e| FileError::metadata_write(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

/// Convert database model to domain model.
///
/// Rows can outlive the build that wrote them, so both the identifier and
/// the backend value are revalidated on the way out.
fn to_domain(model: file_records::Model) -> Result<FileRecord, FileError> {
    let id: FileId = model
        .id
        .parse()
        .map_err(|_| FileError::metadata_read(format!("malformed stored id: {}", model.id)))?;
    let backend = BackendKind::parse(&model.backend)
        .ok_or_else(|| FileError::unknown_backend(&model.backend))?;

    Ok(FileRecord {
        id,
        owner_id: OwnerId::from_uuid(model.owner_id),
        backend,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
