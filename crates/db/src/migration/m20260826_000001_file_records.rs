//! File records migration.
//!
//! Creates the file_records table pointing each storage key at its owner
//! and backend.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(FILE_RECORDS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS file_records CASCADE;")
            .await?;
        Ok(())
    }
}

// No CHECK constraint on backend: rows written by a newer build with more
// backends must stay readable, and reads map unrecognized values to an
// error instead of failing at the schema.
const FILE_RECORDS_SQL: &str = r"
-- File records: durable pointer from a storage key to its owner and backend
CREATE TABLE file_records (
    id VARCHAR(128) PRIMARY KEY,
    owner_id UUID NOT NULL,
    backend VARCHAR(16) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Index for listing an owner's files, newest first
CREATE INDEX idx_file_records_owner ON file_records(owner_id, created_at DESC);
";
