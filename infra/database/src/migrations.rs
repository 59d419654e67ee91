use crate::error::{DatabaseError, DatabaseErrorExt};
use fxhash::FxHashMap;
use sha2::{Digest, Sha256};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::types::SurrealValue;

const BOOTSTRAP: &str = "DEFINE TABLE IF NOT EXISTS migration SCHEMALESS;
DEFINE INDEX IF NOT EXISTS migration_key ON TABLE migration FIELDS slice, version UNIQUE;";

/// One schema script owned by a feature slice.
///
/// `version` must sort in application order within a slice (e.g. `0001_init`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub slice: &'static str,
    pub version: &'static str,
    pub script: &'static str,
}

impl Migration {
    #[must_use]
    pub const fn new(slice: &'static str, version: &'static str, script: &'static str) -> Self {
        Self { slice, version, script }
    }

    /// Hex-encoded SHA-256 of the script.
    #[must_use]
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.script.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn key(&self) -> String {
        format!("{}:{}", self.slice, self.version)
    }

    fn to_applied(self) -> AppliedMigration {
        AppliedMigration {
            slice: self.slice.to_owned(),
            version: self.version.to_owned(),
            checksum: self.checksum(),
        }
    }
}

/// Outcome of a migration run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub applied: Vec<AppliedMigration>,
    pub skipped: Vec<AppliedMigration>,
}

#[derive(Debug, Clone, SurrealValue)]
pub struct AppliedMigration {
    pub slice: String,
    pub version: String,
    pub checksum: String,
}

#[derive(Debug)]
pub(crate) struct MigrationRunner<'a> {
    db: &'a Surreal<Any>,
}

impl<'a> MigrationRunner<'a> {
    #[must_use]
    pub(crate) const fn new(db: &'a Surreal<Any>) -> Self {
        Self { db }
    }

    pub(crate) async fn run(
        &self,
        migrations: &[Migration],
    ) -> Result<MigrationReport, DatabaseError> {
        ensure_unique(migrations)?;
        self.bootstrap().await?;

        let mut report = MigrationReport::default();
        let applied_migrations = self.applied_map().await?;

        for migration in migrations {
            if let Some(applied) = applied_migrations.get(&migration.key()) {
                ensure_checksum_match(migration, &applied.checksum)?;
                report.skipped.push(migration.to_applied());
                continue;
            }

            self.apply(migration).await?;
            report.applied.push(migration.to_applied());
        }

        Ok(report)
    }

    async fn bootstrap(&self) -> Result<(), DatabaseError> {
        self.db
            .query(BOOTSTRAP)
            .await
            .context("Preparing migration ledger")?
            .check()
            .map_err(surrealdb::Error::from)?;
        Ok(())
    }

    async fn apply(&self, migration: &Migration) -> Result<(), DatabaseError> {
        let query = format!(
            "BEGIN TRANSACTION;
            {}
            CREATE migration CONTENT {{
                slice: $slice,
                version: $version,
                checksum: $checksum,
                applied_at: time::now()
            }};
            COMMIT TRANSACTION;",
            migration.script,
        );

        self.db
            .query(&query)
            .bind(("slice", migration.slice.to_owned()))
            .bind(("version", migration.version.to_owned()))
            .bind(("checksum", migration.checksum()))
            .await
            .context(format!("SQL execution failed at {}", migration.key()))?
            .check()
            .map_err(|e| DatabaseError::Migration {
                message: e.to_string().into(),
                context: Some(migration.key().into()),
            })?;

        Ok(())
    }

    async fn applied_map(&self) -> Result<FxHashMap<String, AppliedMigration>, DatabaseError> {
        let entries = self
            .db
            .query("SELECT slice, version, checksum FROM migration")
            .await
            .context("Loading applied migrations")?
            .take::<Vec<AppliedMigration>>(0)
            .context("Parsing migrations map")?;

        Ok(entries
            .into_iter()
            .map(|entry| (format!("{}:{}", entry.slice, entry.version), entry))
            .collect())
    }
}

fn ensure_unique(migrations: &[Migration]) -> Result<(), DatabaseError> {
    let mut seen = FxHashMap::default();
    for migration in migrations {
        if seen.insert(migration.key(), ()).is_some() {
            return Err(DatabaseError::Migration {
                message: format!("Duplicate migration {}", migration.key()).into(),
                context: None,
            });
        }
    }
    Ok(())
}

fn ensure_checksum_match(migration: &Migration, existing: &str) -> Result<(), DatabaseError> {
    let expected = migration.checksum();
    if existing != expected {
        return Err(DatabaseError::Migration {
            message: format!(
                "Checksum mismatch for {} (recorded {existing}, current {expected})",
                migration.key()
            )
            .into(),
            context: Some("Migration already applied with different contents".into()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use surrealdb::engine::any::connect;

    const INIT: Migration =
        Migration::new("demo", "0001_init", "DEFINE TABLE IF NOT EXISTS demo SCHEMALESS;");
    const SEED: Migration = Migration::new("demo", "0002_seed", "CREATE demo CONTENT { n: 1 };");

    async fn memory_db() -> Surreal<Any> {
        let db = connect("mem://").await.expect("mem engine");
        db.use_ns("test").use_db("migrations").await.expect("session");
        db
    }

    #[test]
    fn checksum_is_stable_hex() {
        let checksum = INIT.checksum();
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, INIT.checksum());
        assert_ne!(checksum, SEED.checksum());
    }

    #[test]
    fn duplicate_migrations_are_rejected() {
        let err = ensure_unique(&[INIT, INIT]).unwrap_err();
        assert!(matches!(err, DatabaseError::Migration { .. }));
    }

    #[tokio::test]
    async fn applies_once_then_skips() {
        let db = memory_db().await;
        let runner = MigrationRunner::new(&db);

        let first = runner.run(&[INIT, SEED]).await.expect("first run");
        assert_eq!(first.applied.len(), 2);
        assert!(first.skipped.is_empty());

        let second = runner.run(&[INIT, SEED]).await.expect("second run");
        assert!(second.applied.is_empty());
        assert_eq!(second.skipped.len(), 2);

        let rows: Vec<AppliedMigration> = db
            .query("SELECT slice, version, checksum FROM migration")
            .await
            .unwrap()
            .take(0)
            .unwrap();
        assert_eq!(rows.len(), 2);

        let seeded: Option<i64> =
            db.query("RETURN count(SELECT * FROM demo)").await.unwrap().take(0).unwrap();
        assert_eq!(seeded, Some(1), "seed must not be replayed");
    }

    #[tokio::test]
    async fn changed_script_is_rejected() {
        let db = memory_db().await;
        let runner = MigrationRunner::new(&db);
        runner.run(&[INIT]).await.expect("first run");

        let edited = Migration::new("demo", "0001_init", "DEFINE TABLE IF NOT EXISTS other;");
        let err = runner.run(&[edited]).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Migration { .. }));
    }

    #[tokio::test]
    async fn failing_script_is_not_recorded() {
        let db = memory_db().await;
        let runner = MigrationRunner::new(&db);

        let broken = Migration::new("demo", "0001_broken", "THROW 'nope';");
        assert!(runner.run(&[broken]).await.is_err());

        let rows: Vec<AppliedMigration> = db
            .query("SELECT slice, version, checksum FROM migration")
            .await
            .unwrap()
            .take(0)
            .unwrap();
        assert!(rows.is_empty());
    }
}
