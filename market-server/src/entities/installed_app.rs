use crate::entities::{format_ts, parse_ts, AnyConnection, InstalledAppRecord};

/// Statements over the `installed_apps` table.
pub struct InstalledApps;

impl InstalledApps {
    pub async fn find_by_app(
        conn: &mut AnyConnection,
        app_id: &str,
    ) -> Result<Option<InstalledAppRecord>, sqlx::Error> {
        let row: Option<(String, String, String, String, i64, String)> = sqlx::query_as(
            "SELECT id, tenant_id, app_id, app_owner_tenant_id, position, created_at \
             FROM installed_apps WHERE app_id = ?1 ORDER BY created_at ASC LIMIT 1",
        )
        .bind(app_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(
            |(id, tenant_id, app_id, app_owner_tenant_id, position, created_at)| InstalledAppRecord {
                id,
                tenant_id,
                app_id,
                app_owner_tenant_id,
                position,
                created_at: parse_ts(created_at, "installed_apps.created_at"),
            },
        ))
    }

    pub async fn insert(
        conn: &mut AnyConnection,
        installed: &InstalledAppRecord,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO installed_apps (id, tenant_id, app_id, app_owner_tenant_id, position, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&installed.id)
        .bind(&installed.tenant_id)
        .bind(&installed.app_id)
        .bind(&installed.app_owner_tenant_id)
        .bind(installed.position)
        .bind(format_ts(installed.created_at))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
