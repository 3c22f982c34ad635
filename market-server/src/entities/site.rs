use sqlx::Row;

use crate::entities::{format_ts, parse_ts, AnyConnection, SiteRecord};

/// Statements over the `sites` table.
pub struct Sites;

impl Sites {
    /// The site of an app. Apps have at most one; if several exist the oldest
    /// is returned.
    pub async fn find_by_app(
        conn: &mut AnyConnection,
        app_id: &str,
    ) -> Result<Option<SiteRecord>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, app_id, title, icon, icon_background, description, default_language, \
             copyright, privacy_policy, custom_disclaimer, customize_domain, \
             customize_token_strategy, prompt_public, status, code, created_at \
             FROM sites WHERE app_id = ?1 ORDER BY created_at ASC LIMIT 1",
        )
        .bind(app_id)
        .fetch_optional(&mut *conn)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(SiteRecord {
            id: row.try_get("id")?,
            app_id: row.try_get("app_id")?,
            title: row.try_get("title")?,
            icon: row.try_get("icon")?,
            icon_background: row.try_get("icon_background")?,
            description: row.try_get("description")?,
            default_language: row.try_get("default_language")?,
            copyright: row.try_get("copyright")?,
            privacy_policy: row.try_get("privacy_policy")?,
            custom_disclaimer: row.try_get("custom_disclaimer")?,
            customize_domain: row.try_get("customize_domain")?,
            customize_token_strategy: row.try_get("customize_token_strategy")?,
            prompt_public: row.try_get::<i64, _>("prompt_public")? != 0,
            status: row.try_get("status")?,
            code: row.try_get("code")?,
            created_at: parse_ts(row.try_get("created_at")?, "sites.created_at"),
        }))
    }

    pub async fn code_exists(conn: &mut AnyConnection, code: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT id FROM sites WHERE code = ?1")
            .bind(code)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    pub async fn insert(conn: &mut AnyConnection, site: &SiteRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO sites (id, app_id, title, icon, icon_background, description, \
             default_language, copyright, privacy_policy, custom_disclaimer, customize_domain, \
             customize_token_strategy, prompt_public, status, code, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )
        .bind(&site.id)
        .bind(&site.app_id)
        .bind(&site.title)
        .bind(&site.icon)
        .bind(&site.icon_background)
        .bind(&site.description)
        .bind(&site.default_language)
        .bind(&site.copyright)
        .bind(&site.privacy_policy)
        .bind(&site.custom_disclaimer)
        .bind(&site.customize_domain)
        .bind(&site.customize_token_strategy)
        .bind(i64::from(site.prompt_public))
        .bind(&site.status)
        .bind(&site.code)
        .bind(format_ts(site.created_at))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
