use crate::entities::AnyConnection;

/// Statements over `organization_account_joins`.
pub struct Organizations;

impl Organizations {
    /// The organization the account belongs to. When an account has several
    /// memberships the oldest one wins.
    pub async fn organization_of(
        conn: &mut AnyConnection,
        account_id: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT organization_id FROM organization_account_joins \
             WHERE account_id = ?1 ORDER BY created_at ASC LIMIT 1",
        )
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    #[cfg(test)]
    pub async fn join(
        conn: &mut AnyConnection,
        organization_id: &str,
        account_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO organization_account_joins (organization_id, account_id, created_at) \
             VALUES (?1, ?2, ?3) ON CONFLICT (organization_id, account_id) DO NOTHING",
        )
        .bind(organization_id)
        .bind(account_id)
        .bind(crate::entities::format_ts(chrono::Utc::now()))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::testing;

    #[tokio::test]
    async fn resolves_membership() {
        let store = testing::store().await;
        let mut tx = store.begin().await.unwrap();
        assert!(Organizations::organization_of(&mut tx, "acc").await.unwrap().is_none());
        Organizations::join(&mut tx, "org-1", "acc").await.unwrap();
        Organizations::join(&mut tx, "org-1", "acc").await.unwrap();
        assert_eq!(
            Organizations::organization_of(&mut tx, "acc").await.unwrap().as_deref(),
            Some("org-1")
        );
    }
}
