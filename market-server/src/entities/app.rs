use crate::entities::{format_ts, parse_mode, parse_ts, AnyConnection, AppRecord};

/// Statements over the `apps` table.
pub struct Apps;

impl Apps {
    pub async fn find(conn: &mut AnyConnection, id: &str) -> Result<Option<AppRecord>, sqlx::Error> {
        let row: Option<(String, String, String, String, String, i64, i64, Option<String>, String, String)> =
            sqlx::query_as(
                "SELECT id, tenant_id, name, mode, description, enable_site, enable_api, \
                 app_model_config_id, created_at, updated_at \
                 FROM apps WHERE id = ?1",
            )
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some((
            id,
            tenant_id,
            name,
            mode,
            description,
            enable_site,
            enable_api,
            app_model_config_id,
            created_at,
            updated_at,
        )) = row
        else {
            return Ok(None);
        };

        Ok(Some(AppRecord {
            id,
            tenant_id,
            name,
            mode: parse_mode(&mode)?,
            description,
            enable_site: enable_site != 0,
            enable_api: enable_api != 0,
            app_model_config_id,
            created_at: parse_ts(created_at, "apps.created_at"),
            updated_at: parse_ts(updated_at, "apps.updated_at"),
        }))
    }

    pub async fn insert(conn: &mut AnyConnection, app: &AppRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO apps (id, tenant_id, name, mode, description, enable_site, enable_api, \
             app_model_config_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&app.id)
        .bind(&app.tenant_id)
        .bind(&app.name)
        .bind(app.mode.as_ref())
        .bind(&app.description)
        .bind(i64::from(app.enable_site))
        .bind(i64::from(app.enable_api))
        .bind(&app.app_model_config_id)
        .bind(format_ts(app.created_at))
        .bind(format_ts(app.updated_at))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::testing;
    use crate::entities::AppMode;

    #[tokio::test]
    async fn insert_then_find() {
        let store = testing::store().await;
        let mut app = testing::app("a1", "tenant-1", AppMode::AdvancedChat);
        app.app_model_config_id = Some("cfg".into());
        testing::insert_app(&store, &app).await;

        let mut tx = store.begin().await.unwrap();
        let found = Apps::find(&mut tx, "a1").await.unwrap().expect("app exists");
        assert_eq!(found.tenant_id, "tenant-1");
        assert_eq!(found.mode, AppMode::AdvancedChat);
        assert!(found.enable_site);
        assert!(!found.enable_api);
        assert_eq!(found.app_model_config_id.as_deref(), Some("cfg"));
        assert!(Apps::find(&mut tx, "missing").await.unwrap().is_none());
    }
}
