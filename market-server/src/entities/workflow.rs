use crate::entities::{format_ts, parse_ts, AnyConnection, WorkflowRecord};

/// Statements over the `workflows` table.
pub struct Workflows;

impl Workflows {
    /// The draft workflow of an app, if it has one.
    pub async fn find_draft(
        conn: &mut AnyConnection,
        app_id: &str,
    ) -> Result<Option<WorkflowRecord>, sqlx::Error> {
        let row: Option<(String, String, String, String, String, String, String, Option<String>, String, String)> =
            sqlx::query_as(
                "SELECT id, tenant_id, app_id, type, version, graph, features, app_caller_nodes, \
                 created_by, created_at \
                 FROM workflows WHERE app_id = ?1 AND version = ?2 \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(app_id)
            .bind(WorkflowRecord::DRAFT_VERSION)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.map(
            |(id, tenant_id, app_id, kind, version, graph, features, app_caller_nodes, created_by, created_at)| {
                WorkflowRecord {
                    id,
                    tenant_id,
                    app_id,
                    kind,
                    version,
                    graph,
                    features,
                    app_caller_nodes,
                    created_by,
                    created_at: parse_ts(created_at, "workflows.created_at"),
                }
            },
        ))
    }

    pub async fn insert(conn: &mut AnyConnection, wf: &WorkflowRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO workflows (id, tenant_id, app_id, type, version, graph, features, \
             app_caller_nodes, created_by, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&wf.id)
        .bind(&wf.tenant_id)
        .bind(&wf.app_id)
        .bind(&wf.kind)
        .bind(&wf.version)
        .bind(&wf.graph)
        .bind(&wf.features)
        .bind(&wf.app_caller_nodes)
        .bind(&wf.created_by)
        .bind(format_ts(wf.created_at))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Number of workflows attached to `app_id`, any version.
    #[cfg(test)]
    pub async fn count_for_app(conn: &mut AnyConnection, app_id: &str) -> Result<i64, sqlx::Error> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM workflows WHERE app_id = ?1")
            .bind(app_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(n)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::testing;
    use chrono::{Duration, Utc};

    fn workflow(id: &str, app_id: &str, version: &str, age: Duration) -> WorkflowRecord {
        WorkflowRecord {
            id: id.into(),
            tenant_id: "tenant".into(),
            app_id: app_id.into(),
            kind: "chat".into(),
            version: version.into(),
            graph: r#"{"nodes":[],"edges":[]}"#.into(),
            features: "{}".into(),
            app_caller_nodes: None,
            created_by: "author".into(),
            created_at: Utc::now() - age,
        }
    }

    #[tokio::test]
    async fn find_draft_skips_published_versions() {
        let store = testing::store().await;
        let mut tx = store.begin().await.unwrap();
        Workflows::insert(&mut tx, &workflow("published", "app", "2024-05-01", Duration::zero()))
            .await
            .unwrap();
        assert!(Workflows::find_draft(&mut tx, "app").await.unwrap().is_none());

        Workflows::insert(&mut tx, &workflow("draft", "app", "draft", Duration::hours(1)))
            .await
            .unwrap();
        let draft = Workflows::find_draft(&mut tx, "app").await.unwrap().expect("draft");
        assert_eq!(draft.id, "draft");
        assert_eq!(draft.version, WorkflowRecord::DRAFT_VERSION);
        assert_eq!(Workflows::count_for_app(&mut tx, "app").await.unwrap(), 2);
    }
}
