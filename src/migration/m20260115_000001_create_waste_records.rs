//! Migration: Create waste_records table.
//!
//! A record may carry one attached file; the tier columns track whether the
//! bytes currently live in HDFS or in the local fallback cache.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE waste_records (
                    id SERIAL PRIMARY KEY,
                    latitude DOUBLE PRECISION NOT NULL,
                    longitude DOUBLE PRECISION NOT NULL,
                    description TEXT,
                    name VARCHAR(255),
                    custom_id VARCHAR(255),
                    quantity INTEGER NOT NULL DEFAULT 0,
                    status VARCHAR(50) NOT NULL DEFAULT 'new',

                    -- Attachment tier fields
                    hdfs_path TEXT,
                    local_path TEXT,
                    upload_status VARCHAR(20)
                        CHECK (upload_status IN ('pending', 'uploaded', 'failed')),

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                    -- The record never claims two authoritative copies
                    CONSTRAINT chk_waste_records_single_tier
                        CHECK (hdfs_path IS NULL OR local_path IS NULL)
                );

                -- Index for finding records awaiting reconciliation
                CREATE INDEX idx_waste_records_upload_status ON waste_records(upload_status)
                    WHERE upload_status = 'failed';
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS waste_records CASCADE;")
            .await?;

        Ok(())
    }
}
