//! PostgreSQL implementation of domain repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use std::sync::Arc;

use crate::domain::entities::{
    Domain, DomainRegistration, NewDomain, StatusSync, UnknownStatus, VerificationRecord,
};
use crate::domain::repositories::{DomainRepository, DomainTransaction};
use crate::error::{ALREADY_CONNECTED, AppError};
use crate::utils::db_error::{is_unique_violation_on_name, is_unique_violation_on_newsletter};

const DOMAIN_COLUMNS: &str = "id, newsletter_id, name, status, dkim_status, spf_status, \
     provider_domain_id, provider_records, public_key, region, dmarc_added, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct DomainRow {
    id: i64,
    newsletter_id: i64,
    name: String,
    status: String,
    dkim_status: String,
    spf_status: String,
    provider_domain_id: Option<String>,
    provider_records: Json<Vec<VerificationRecord>>,
    public_key: Option<String>,
    region: String,
    dmarc_added: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DomainRow> for Domain {
    type Error = AppError;

    fn try_from(row: DomainRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = move |e: UnknownStatus| {
            AppError::internal(
                "Invalid status stored for domain",
                json!({ "id": id, "reason": e.to_string() }),
            )
        };

        Ok(Domain {
            id: row.id,
            newsletter_id: row.newsletter_id,
            status: row.status.parse().map_err(invalid)?,
            dkim_status: row.dkim_status.parse().map_err(invalid)?,
            spf_status: row.spf_status.parse().map_err(invalid)?,
            name: row.name,
            provider_domain_id: row.provider_domain_id,
            provider_records: row.provider_records.0,
            public_key: row.public_key,
            region: row.region,
            dmarc_added: row.dmarc_added,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

async fn fetch_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<Option<Domain>, AppError> {
    let sql = format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE id = $1");
    let row = sqlx::query_as::<_, DomainRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    row.map(Domain::try_from).transpose()
}

async fn apply_sync_with<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    sync: StatusSync,
) -> Result<Domain, AppError> {
    // updated_at only moves when the snapshot actually differs.
    let sql = format!(
        r#"
        UPDATE domains SET
            status           = $2::TEXT,
            dkim_status      = $3::TEXT,
            spf_status       = $4::TEXT,
            provider_records = $5::JSONB,
            updated_at       = CASE
                WHEN (status, dkim_status, spf_status, provider_records)
                     IS DISTINCT FROM ($2::TEXT, $3::TEXT, $4::TEXT, $5::JSONB)
                THEN NOW()
                ELSE updated_at
            END
        WHERE id = $1
        RETURNING {DOMAIN_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, DomainRow>(&sql)
        .bind(id)
        .bind(sync.status.as_str())
        .bind(sync.dkim_status.as_str())
        .bind(sync.spf_status.as_str())
        .bind(Json(&sync.provider_records))
        .fetch_optional(executor)
        .await?;

    row.map(Domain::try_from)
        .transpose()?
        .ok_or_else(|| AppError::not_found("Domain not found", json!({ "id": id })))
}

/// PostgreSQL repository for sending domains.
pub struct PgDomainRepository {
    pool: Arc<PgPool>,
}

impl PgDomainRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DomainRepository for PgDomainRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Domain>, AppError> {
        fetch_by_id(self.pool.as_ref(), id).await
    }

    async fn find_by_newsletter(&self, newsletter_id: i64) -> Result<Option<Domain>, AppError> {
        let sql = format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains WHERE newsletter_id = $1 ORDER BY id LIMIT 1"
        );
        let row = sqlx::query_as::<_, DomainRow>(&sql)
            .bind(newsletter_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(Domain::try_from).transpose()
    }

    async fn claimed_by_other(&self, name: &str, newsletter_id: i64) -> Result<bool, AppError> {
        let claimed = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM domains
                WHERE name = $1
                  AND newsletter_id <> $2
                  AND (status = 'success' OR dkim_status = 'success' OR spf_status = 'success')
            )
            "#,
        )
        .bind(name)
        .bind(newsletter_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(claimed)
    }

    async fn list(&self, only_verified: bool) -> Result<Vec<Domain>, AppError> {
        let sql = format!(
            r#"
            SELECT {DOMAIN_COLUMNS}
            FROM domains
            WHERE NOT $1
               OR (status = 'success' AND dkim_status = 'success' AND spf_status = 'success')
            ORDER BY name
            "#
        );
        let rows = sqlx::query_as::<_, DomainRow>(&sql)
            .bind(only_verified)
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.into_iter().map(Domain::try_from).collect()
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM domains")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn apply_sync(&self, id: i64, sync: StatusSync) -> Result<Domain, AppError> {
        apply_sync_with(self.pool.as_ref(), id, sync).await
    }

    async fn set_dmarc_added(&self, id: i64, dmarc_added: bool) -> Result<Domain, AppError> {
        let sql = format!(
            r#"
            UPDATE domains SET dmarc_added = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {DOMAIN_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, DomainRow>(&sql)
            .bind(id)
            .bind(dmarc_added)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(Domain::try_from)
            .transpose()?
            .ok_or_else(|| AppError::not_found("Domain not found", json!({ "id": id })))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM domains WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Domain not found", json!({ "id": id })));
        }

        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn DomainTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgDomainTransaction { tx }))
    }
}

/// A PostgreSQL transaction scoped to domain writes.
///
/// Dropping it without calling `commit` rolls back, as `sqlx::Transaction` does.
pub struct PgDomainTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl DomainTransaction for PgDomainTransaction {
    async fn insert(&mut self, new_domain: NewDomain) -> Result<Domain, AppError> {
        let sql = format!(
            r#"
            INSERT INTO domains (newsletter_id, name)
            VALUES ($1, $2)
            RETURNING {DOMAIN_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, DomainRow>(&sql)
            .bind(new_domain.newsletter_id)
            .bind(&new_domain.name)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| {
                if is_unique_violation_on_name(&e) {
                    AppError::conflict(
                        "Domain name already registered",
                        json!({ "name": new_domain.name }),
                    )
                } else if is_unique_violation_on_newsletter(&e) {
                    AppError::invalid_domain(ALREADY_CONNECTED)
                } else {
                    AppError::from(e)
                }
            })?;

        Domain::try_from(row)
    }

    async fn record_registration(
        &mut self,
        id: i64,
        registration: DomainRegistration,
    ) -> Result<Domain, AppError> {
        // provider_domain_id is written once; a registered row is never overwritten.
        let sql = format!(
            r#"
            UPDATE domains SET
                provider_domain_id = $2,
                region             = COALESCE($3, region),
                provider_records   = $4,
                public_key         = $5,
                updated_at         = NOW()
            WHERE id = $1 AND provider_domain_id IS NULL
            RETURNING {DOMAIN_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, DomainRow>(&sql)
            .bind(id)
            .bind(&registration.provider_domain_id)
            .bind(registration.region.as_deref())
            .bind(Json(&registration.provider_records))
            .bind(registration.public_key.as_deref())
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(row) => Domain::try_from(row),
            None => match fetch_by_id(&mut *self.tx, id).await? {
                Some(existing) => Err(AppError::conflict(
                    "Domain is already registered with the provider",
                    json!({ "id": id, "provider_domain_id": existing.provider_domain_id }),
                )),
                None => Err(AppError::not_found("Domain not found", json!({ "id": id }))),
            },
        }
    }

    async fn apply_sync(&mut self, id: i64, sync: StatusSync) -> Result<Domain, AppError> {
        apply_sync_with(&mut *self.tx, id, sync).await
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
