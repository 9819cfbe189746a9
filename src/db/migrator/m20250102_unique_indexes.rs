use sea_orm_migration::prelude::*;

/// Natural-key uniqueness lives in expression indexes because the keys
/// compare case-insensitively, which a plain column constraint cannot say.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_formats_name_section ON formats(lower(name), section)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_targets_name_section ON targets(lower(name), section)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_origins_name_section ON origins(lower(name), section)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_name_section_kind ON categories(lower(name), section, kind)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_license_types_name_section ON license_types(lower(name), section)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_staff_roles_name_section ON staff_roles(lower(name), section)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_contacts_name_kind ON contacts(lower(display_name), kind)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_alternate_titles_title_name ON alternate_titles(title_id, lower(name))",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_external_links_title_url ON external_links(title_id, url)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_titles_name ON titles(name)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_titles_release_date ON titles(release_date)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        for index in [
            "idx_formats_name_section",
            "idx_targets_name_section",
            "idx_origins_name_section",
            "idx_categories_name_section_kind",
            "idx_license_types_name_section",
            "idx_staff_roles_name_section",
            "idx_contacts_name_kind",
            "idx_alternate_titles_title_name",
            "idx_external_links_title_url",
            "idx_titles_name",
            "idx_titles_release_date",
        ] {
            conn.execute_unprepared(&format!("DROP INDEX IF EXISTS {index}"))
                .await?;
        }

        Ok(())
    }
}
