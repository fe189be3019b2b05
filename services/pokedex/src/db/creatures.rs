//! Postgres-backed creature store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pokedex_id::{CreatureId, SequenceNumber};
use serde_json::Value;
use sqlx::{postgres::PgPool, postgres::PgRow, Row};

use super::DbError;
use crate::creatures::{
    Creature, CreatureFilter, CreaturePatch, CreatureStore, NewCreature, UpdateOutcome,
};

/// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

const NO_CONSTRAINT: &str = "creatures_no_key";
const NAME_CONSTRAINT: &str = "creatures_name_key";
const PK_CONSTRAINT: &str = "creatures_pkey";

const INSERT_CREATURE: &str = r#"
    INSERT INTO creatures (creature_id, no, name)
    VALUES ($1, $2, $3)
    RETURNING creature_id, no, name, revision, created_at, updated_at
"#;

const SELECT_BY_NO: &str = r#"
    SELECT creature_id, no, name, revision, created_at, updated_at
    FROM creatures
    WHERE no = $1
"#;

const SELECT_BY_NAME: &str = r#"
    SELECT creature_id, no, name, revision, created_at, updated_at
    FROM creatures
    WHERE name = $1
"#;

const SELECT_BY_ID: &str = r#"
    SELECT creature_id, no, name, revision, created_at, updated_at
    FROM creatures
    WHERE creature_id = $1
"#;

/// Unspecified patch fields bind as NULL and keep their stored value.
const UPDATE_IF_REVISION: &str = r#"
    UPDATE creatures
    SET name = COALESCE($3, name),
        no = COALESCE($4, no),
        revision = revision + 1,
        updated_at = now()
    WHERE creature_id = $1 AND revision = $2
    RETURNING creature_id, no, name, revision, created_at, updated_at
"#;

/// Store for creature rows.
#[derive(Clone)]
pub struct PgCreatureStore {
    pool: PgPool,
}

impl PgCreatureStore {
    /// Create a new creature store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row from the creatures table.
struct CreatureRow {
    creature_id: String,
    no: Option<i32>,
    name: String,
    revision: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for CreatureRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            creature_id: row.try_get("creature_id")?,
            no: row.try_get("no")?,
            name: row.try_get("name")?,
            revision: row.try_get("revision")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<CreatureRow> for Creature {
    type Error = DbError;

    fn try_from(row: CreatureRow) -> Result<Self, Self::Error> {
        let id = row.creature_id.parse::<CreatureId>().map_err(|e| {
            DbError::InvalidRow(format!("creature_id '{}': {e}", row.creature_id))
        })?;
        let no = row
            .no
            .map(SequenceNumber::new)
            .transpose()
            .map_err(|e| DbError::InvalidRow(format!("creature {id} no: {e}")))?;
        Ok(Self {
            id,
            no,
            name: row.name,
            revision: row.revision,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode(row: Option<CreatureRow>) -> Result<Option<Creature>, DbError> {
    row.map(Creature::try_from).transpose()
}

/// Maps a write failure, turning unique violations into the offending
/// key/value using the values that were being written.
fn map_write_error(
    e: sqlx::Error,
    id: CreatureId,
    name: Option<&str>,
    no: Option<SequenceNumber>,
) -> DbError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return match db_err.constraint() {
                Some(NAME_CONSTRAINT) => {
                    DbError::unique("name", name.map_or(Value::Null, Value::from))
                }
                Some(NO_CONSTRAINT) => {
                    DbError::unique("no", no.map_or(Value::Null, |n| Value::from(n.value())))
                }
                Some(PK_CONSTRAINT) => DbError::unique("id", id.to_string()),
                other => DbError::unique(other.unwrap_or("unknown"), Value::Null),
            };
        }
    }
    DbError::Query(e)
}

#[async_trait]
impl CreatureStore for PgCreatureStore {
    async fn create(&self, new: NewCreature) -> Result<Creature, DbError> {
        let row = sqlx::query_as::<_, CreatureRow>(INSERT_CREATURE)
            .bind(new.id.to_string())
            .bind(new.no.map(|n| n.value()))
            .bind(&new.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, new.id, Some(&new.name), new.no))?;

        Creature::try_from(row)
    }

    async fn find_one(&self, filter: &CreatureFilter) -> Result<Option<Creature>, DbError> {
        let row = match filter {
            CreatureFilter::No(no) => {
                sqlx::query_as::<_, CreatureRow>(SELECT_BY_NO)
                    .bind(no.value())
                    .fetch_optional(&self.pool)
                    .await
            }
            CreatureFilter::Name(name) => {
                sqlx::query_as::<_, CreatureRow>(SELECT_BY_NAME)
                    .bind(name.as_str())
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(DbError::Query)?;
        decode(row)
    }

    async fn find_by_id(&self, id: CreatureId) -> Result<Option<Creature>, DbError> {
        let row = sqlx::query_as::<_, CreatureRow>(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;
        decode(row)
    }

    async fn update_one(
        &self,
        id: CreatureId,
        expected_revision: i32,
        patch: &CreaturePatch,
    ) -> Result<UpdateOutcome, DbError> {
        let row = sqlx::query_as::<_, CreatureRow>(UPDATE_IF_REVISION)
            .bind(id.to_string())
            .bind(expected_revision)
            .bind(patch.name.as_deref())
            .bind(patch.no.map(|n| n.value()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, id, patch.name.as_deref(), patch.no))?;

        if let Some(row) = row {
            return Ok(UpdateOutcome::Updated(Creature::try_from(row)?));
        }

        let current: Option<i32> =
            sqlx::query_scalar("SELECT revision FROM creatures WHERE creature_id = $1")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::Query)?;

        Ok(match current {
            Some(current) => UpdateOutcome::RevisionMismatch { current },
            None => UpdateOutcome::Missing,
        })
    }

    async fn delete_one(&self, id: CreatureId) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM creatures WHERE creature_id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(())
    }
}
