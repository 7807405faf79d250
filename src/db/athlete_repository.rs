use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::{MySqlPool, PgPool};
use tracing::{debug, info, instrument};

use crate::db::{Athlete, DbError};
use crate::importers::AthleteRecord;

/// The two SQL dialects the importer can target. Chosen from the
/// connection-URL scheme; everything dialect-specific (identifier quoting,
/// placeholder style, conflict clause) lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    Postgres,
    MySql,
}

impl SqlDialect {
    pub fn from_url(database_url: &str) -> Result<Self, DbError> {
        if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            Ok(SqlDialect::Postgres)
        } else if database_url.starts_with("mysql://") {
            Ok(SqlDialect::MySql)
        } else {
            let scheme = database_url
                .split("://")
                .next()
                .unwrap_or(database_url)
                .to_string();
            Err(DbError::UnsupportedScheme(scheme))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SqlDialect::Postgres => "postgres",
            SqlDialect::MySql => "mysql",
        }
    }

    /// Insert-or-update keyed by name. Every column except name and
    /// createdAt is overwritten on conflict.
    pub(crate) fn upsert_sql(&self) -> &'static str {
        match self {
            SqlDialect::Postgres => {
                r#"
                INSERT INTO athletes (name, "bodyWeight", squat, bench, deadlift, total, ohp,
                                      "inclineBench", rdl, "revBandBench", "revBandSquat",
                                      "revBandDl", "slingshotBench", "createdAt", "updatedAt")
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW(), NOW())
                ON CONFLICT (name) DO UPDATE SET
                    "bodyWeight" = EXCLUDED."bodyWeight",
                    squat = EXCLUDED.squat,
                    bench = EXCLUDED.bench,
                    deadlift = EXCLUDED.deadlift,
                    total = EXCLUDED.total,
                    ohp = EXCLUDED.ohp,
                    "inclineBench" = EXCLUDED."inclineBench",
                    rdl = EXCLUDED.rdl,
                    "revBandBench" = EXCLUDED."revBandBench",
                    "revBandSquat" = EXCLUDED."revBandSquat",
                    "revBandDl" = EXCLUDED."revBandDl",
                    "slingshotBench" = EXCLUDED."slingshotBench",
                    "updatedAt" = NOW()
                "#
            }
            // createdAt/updatedAt come from the schema defaults
            SqlDialect::MySql => {
                r#"
                INSERT INTO athletes (name, bodyWeight, squat, bench, deadlift, total, ohp,
                                      inclineBench, rdl, revBandBench, revBandSquat,
                                      revBandDl, slingshotBench)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON DUPLICATE KEY UPDATE
                    bodyWeight = VALUES(bodyWeight),
                    squat = VALUES(squat),
                    bench = VALUES(bench),
                    deadlift = VALUES(deadlift),
                    total = VALUES(total),
                    ohp = VALUES(ohp),
                    inclineBench = VALUES(inclineBench),
                    rdl = VALUES(rdl),
                    revBandBench = VALUES(revBandBench),
                    revBandSquat = VALUES(revBandSquat),
                    revBandDl = VALUES(revBandDl),
                    slingshotBench = VALUES(slingshotBench)
                "#
            }
        }
    }

    fn find_by_name_sql(&self) -> &'static str {
        match self {
            SqlDialect::Postgres => {
                r#"
                SELECT id, name, "bodyWeight", squat, bench, deadlift, total, ohp,
                       "inclineBench", rdl, "revBandBench", "revBandSquat",
                       "revBandDl", "slingshotBench", "createdAt", "updatedAt"
                FROM athletes
                WHERE name = $1
                "#
            }
            SqlDialect::MySql => {
                r#"
                SELECT id, name, bodyWeight, squat, bench, deadlift, total, ohp,
                       inclineBench, rdl, revBandBench, revBandSquat,
                       revBandDl, slingshotBench, createdAt, updatedAt
                FROM athletes
                WHERE name = ?
                "#
            }
        }
    }
}

enum AthletePool {
    Postgres(PgPool),
    MySql(MySqlPool),
}

/// Upserts athlete records into the `athletes` table, one scoped
/// transaction per row.
pub struct AthleteRepository {
    pool: AthletePool,
    dialect: SqlDialect,
}

impl AthleteRepository {
    /// Connect using the dialect implied by the URL scheme. The pool is
    /// capped at one connection, the import is strictly sequential.
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        let dialect = SqlDialect::from_url(database_url)?;
        info!("Connecting to {} database", dialect.name());

        let pool = match dialect {
            SqlDialect::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect(database_url)
                    .await?;
                AthletePool::Postgres(pool)
            }
            SqlDialect::MySql => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(1)
                    .connect(database_url)
                    .await?;
                AthletePool::MySql(pool)
            }
        };

        Ok(Self { pool, dialect })
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Upsert one record keyed by name.
    ///
    /// Runs in its own transaction; on error the transaction is dropped and
    /// rolled back, leaving the connection clean for the next row.
    #[instrument(skip(self, record), fields(name = %record.name))]
    pub async fn upsert(&self, record: &AthleteRecord) -> Result<(), DbError> {
        debug!("Upserting athlete record");
        let sql = self.dialect.upsert_sql();

        match &self.pool {
            AthletePool::Postgres(pool) => {
                let mut tx = pool.begin().await?;
                sqlx::query(sql)
                    .bind(&record.name)
                    .bind(record.body_weight)
                    .bind(record.squat)
                    .bind(record.bench)
                    .bind(record.deadlift)
                    .bind(record.total)
                    .bind(record.ohp)
                    .bind(record.incline_bench)
                    .bind(record.rdl)
                    .bind(record.rev_band_bench)
                    .bind(record.rev_band_squat)
                    .bind(record.rev_band_dl)
                    .bind(record.slingshot_bench)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
            }
            AthletePool::MySql(pool) => {
                let mut tx = pool.begin().await?;
                sqlx::query(sql)
                    .bind(&record.name)
                    .bind(record.body_weight)
                    .bind(record.squat)
                    .bind(record.bench)
                    .bind(record.deadlift)
                    .bind(record.total)
                    .bind(record.ohp)
                    .bind(record.incline_bench)
                    .bind(record.rdl)
                    .bind(record.rev_band_bench)
                    .bind(record.rev_band_squat)
                    .bind(record.rev_band_dl)
                    .bind(record.slingshot_bench)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
            }
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<usize, DbError> {
        let count: i64 = match &self.pool {
            AthletePool::Postgres(pool) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM athletes")
                    .fetch_one(pool)
                    .await?
            }
            AthletePool::MySql(pool) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM athletes")
                    .fetch_one(pool)
                    .await?
            }
        };

        Ok(count as usize)
    }

    #[instrument(skip(self), fields(name = %name))]
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Athlete>, DbError> {
        debug!("Querying athlete by name");
        let sql = self.dialect.find_by_name_sql();

        let athlete = match &self.pool {
            AthletePool::Postgres(pool) => {
                sqlx::query_as::<_, Athlete>(sql)
                    .bind(name)
                    .fetch_optional(pool)
                    .await?
            }
            AthletePool::MySql(pool) => {
                sqlx::query_as::<_, Athlete>(sql)
                    .bind(name)
                    .fetch_optional(pool)
                    .await?
            }
        };

        Ok(athlete)
    }

    pub async fn close(&self) {
        match &self.pool {
            AthletePool::Postgres(pool) => pool.close().await,
            AthletePool::MySql(pool) => pool.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_url() {
        assert_eq!(
            SqlDialect::from_url("postgres://u:p@localhost/athletes").unwrap(),
            SqlDialect::Postgres
        );
        assert_eq!(
            SqlDialect::from_url("postgresql://u:p@localhost:5433/athletes").unwrap(),
            SqlDialect::Postgres
        );
        assert_eq!(
            SqlDialect::from_url("mysql://root@localhost/athletes").unwrap(),
            SqlDialect::MySql
        );
    }

    #[test]
    fn test_dialect_rejects_unknown_scheme() {
        let err = SqlDialect::from_url("sqlite://athletes.db").unwrap_err();
        match err {
            DbError::UnsupportedScheme(ref scheme) => assert_eq!(scheme, "sqlite"),
            other => panic!("Expected UnsupportedScheme, got {other:?}"),
        }
        assert!(!err.is_connection_loss());
    }

    #[test]
    fn test_postgres_upsert_statement_shape() {
        let sql = SqlDialect::Postgres.upsert_sql();

        assert!(sql.contains("ON CONFLICT (name) DO UPDATE SET"));
        assert!(sql.contains(r#""bodyWeight" = EXCLUDED."bodyWeight""#));
        assert!(sql.contains(r#""updatedAt" = NOW()"#));
        assert!(sql.contains("$13"));
        assert!(!sql.contains('?'));
        // name and createdAt are never overwritten on conflict
        assert!(!sql.contains("name = EXCLUDED.name"));
        assert!(!sql.contains(r#""createdAt" = EXCLUDED"#));
    }

    #[test]
    fn test_mysql_upsert_statement_shape() {
        let sql = SqlDialect::MySql.upsert_sql();

        assert!(sql.contains("ON DUPLICATE KEY UPDATE"));
        assert!(sql.contains("bodyWeight = VALUES(bodyWeight)"));
        assert_eq!(sql.matches('?').count(), 13);
        assert!(!sql.contains('$'));
        assert!(!sql.contains('"'));
        assert!(!sql.contains("name = VALUES(name)"));
    }
}
