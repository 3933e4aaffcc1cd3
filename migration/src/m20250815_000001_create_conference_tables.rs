use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create callback_kind enum
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE TYPE conference_bridge.callback_kind AS ENUM (
                    'recording_ready',
                    'meeting_events'
                )",
            )
            .await?;

        // Create notification_kind enum
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE TYPE conference_bridge.notification_kind AS ENUM (
                    'recording_ready',
                    'completion_update'
                )",
            )
            .await?;

        let create_activities_sql = r#"
            CREATE TABLE IF NOT EXISTS conference_bridge.activities (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                course_id BIGINT NOT NULL,
                meeting_id VARCHAR(255) NOT NULL,
                name TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_activities_sql)
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS activities_meeting_id_idx
                    ON conference_bridge.activities (meeting_id)",
            )
            .await?;

        let create_recordings_sql = r#"
            CREATE TABLE IF NOT EXISTS conference_bridge.recordings (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                recording_id VARCHAR(255) NOT NULL,
                activity_id UUID NOT NULL
                    REFERENCES conference_bridge.activities(id) ON DELETE CASCADE,
                course_id BIGINT NOT NULL,
                imported BOOLEAN NOT NULL DEFAULT FALSE,
                headless BOOLEAN NOT NULL DEFAULT FALSE,
                payload JSONB NOT NULL DEFAULT '{}',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_recordings_sql)
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS recordings_recording_id_idx
                    ON conference_bridge.recordings (recording_id)",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS recordings_course_listing_idx
                    ON conference_bridge.recordings (course_id, created_at, id)",
            )
            .await?;

        let create_callback_events_sql = r#"
            CREATE TABLE IF NOT EXISTS conference_bridge.callback_events (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                correlation_id VARCHAR(255) NOT NULL,
                kind conference_bridge.callback_kind NOT NULL,
                payload JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_callback_events_sql)
            .await?;

        // Deliberately non-unique: every delivery appends a row, and the
        // per-correlation count backs the first-delivery check.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS callback_events_correlation_idx
                    ON conference_bridge.callback_events (correlation_id, kind)",
            )
            .await?;

        let create_notification_jobs_sql = r#"
            CREATE TABLE IF NOT EXISTS conference_bridge.notification_jobs (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                activity_id UUID NOT NULL
                    REFERENCES conference_bridge.activities(id) ON DELETE CASCADE,
                user_id VARCHAR(255),
                kind conference_bridge.notification_kind NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_notification_jobs_sql)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS conference_bridge.notification_jobs")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS conference_bridge.callback_events")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS conference_bridge.recordings")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS conference_bridge.activities")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS conference_bridge.notification_kind")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS conference_bridge.callback_kind")
            .await?;

        Ok(())
    }
}
