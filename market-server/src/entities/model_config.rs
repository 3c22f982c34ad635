use sqlx::Row;

use crate::entities::{format_ts, parse_ts, AnyConnection, ModelConfigRecord, ModelSettings};

/// Statements over the `app_model_configs` table.
pub struct ModelConfigs;

impl ModelConfigs {
    /// The most recently created configuration of an app.
    pub async fn find_latest(
        conn: &mut AnyConnection,
        app_id: &str,
    ) -> Result<Option<ModelConfigRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT id, app_id, {}, created_at FROM app_model_configs \
             WHERE app_id = ?1 ORDER BY created_at DESC LIMIT 1",
            ModelSettings::COLUMNS.join(", ")
        );
        let row = sqlx::query(&sql).bind(app_id).fetch_optional(&mut *conn).await?;
        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(ModelConfigRecord {
            id: row.try_get("id")?,
            app_id: row.try_get("app_id")?,
            settings: ModelSettings::from_row(&row)?,
            created_at: parse_ts(row.try_get("created_at")?, "app_model_configs.created_at"),
        }))
    }

    pub async fn insert(conn: &mut AnyConnection, config: &ModelConfigRecord) -> Result<(), sqlx::Error> {
        // id, app_id, settings..., created_at
        let placeholders = (1..=ModelSettings::COLUMNS.len() + 3)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO app_model_configs (id, app_id, {}, created_at) VALUES ({placeholders})",
            ModelSettings::COLUMNS.join(", ")
        );

        let mut query = sqlx::query(&sql).bind(&config.id).bind(&config.app_id);
        for value in config.settings.values() {
            query = query.bind(value);
        }
        query
            .bind(format_ts(config.created_at))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
