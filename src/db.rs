//! SQLite database with Diesel ORM
//!
//! Stores courts, judges, charges and individual bail decisions, and answers
//! the aggregate queries behind the charts. Tables are created on open.

use crate::chart::{self, BailDecisionData, Tally, ViewMode};
use crate::resolve::NameLookup;
use crate::schema::*;
use crate::selection::Filter;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sql_types::{BigInt, Integer, Nullable, Text};
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// Diesel Models
// ============================================================================

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = courts)]
pub struct Court {
    pub court_id: i32,
    pub name: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = judges)]
pub struct Judge {
    pub judge_id: i32,
    pub name: String,
}

/// Charge as listed by `/api/charges`
#[derive(Queryable, QueryableByName, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = charges)]
pub struct Charge {
    pub charge_id: i32,
    pub name: String,
    pub severity: Option<String>,
}

/// Insertable bail decision
#[derive(Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = bail_decisions)]
pub struct NewBailDecision {
    pub court_id: i32,
    pub judge_id: i32,
    pub charge_id: i32,
    pub decision_type: String,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub decided_at: Option<String>,
}

/// ID and name pair for the court and judge pickers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedEntity {
    pub id: i32,
    pub name: String,
}

/// Bulk load document for `courtlens db import`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportData {
    #[serde(default)]
    pub courts: Vec<Court>,
    #[serde(default)]
    pub judges: Vec<Judge>,
    #[serde(default)]
    pub charges: Vec<Charge>,
    #[serde(default)]
    pub bail_decisions: Vec<NewBailDecision>,
}

/// Row counts per table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DbSummary {
    pub courts: i64,
    pub judges: i64,
    pub charges: i64,
    pub bail_decisions: i64,
}

#[derive(QueryableByName)]
struct TallyRow {
    #[diesel(sql_type = Text)]
    decision_type: String,
    #[diesel(sql_type = BigInt)]
    count: i64,
    #[diesel(sql_type = Nullable<diesel::sql_types::Double>)]
    average_cost: Option<f64>,
}

// ============================================================================
// Database Connection
// ============================================================================

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Database connection wrapper with connection pool
pub struct Database {
    pool: DbPool,
}

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("Pool error: {0}")]
    Pool(#[from] diesel::r2d2::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

const TALLY_SQL: &str = r#"
    SELECT decision_type, COUNT(*) AS count, AVG(cost) AS average_cost
    FROM bail_decisions
    WHERE (? IS NULL OR court_id = ?)
      AND (? IS NULL OR judge_id = ?)
      AND (? IS NULL OR charge_id = ?)
    GROUP BY decision_type
"#;

const DISTINCT_CHARGES_SQL: &str = r#"
    SELECT MIN(charge_id) AS charge_id, name, MIN(severity) AS severity
    FROM charges
    GROUP BY name
    ORDER BY name
"#;

impl Database {
    /// Open (creating if needed) the database file at `path`
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(&path_str);
        let pool = Pool::builder()
            .max_size(5)
            .build(manager)
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.init_schema()?;
        info!(path = %path_str, "database opened");
        Ok(db)
    }

    /// Private in-memory database. A single pooled connection is kept alive
    /// for the lifetime of the pool, since each SQLite memory connection is
    /// its own database.
    pub fn open_in_memory() -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder()
            .max_size(1)
            .min_idle(Some(1))
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(|e| DbError::Connection(e.to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        let mut conn = self.get_conn()?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS courts (
                court_id INTEGER PRIMARY KEY NOT NULL,
                name TEXT NOT NULL
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS judges (
                judge_id INTEGER PRIMARY KEY NOT NULL,
                name TEXT NOT NULL
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS charges (
                charge_id INTEGER PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                severity TEXT
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS bail_decisions (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                court_id INTEGER NOT NULL,
                judge_id INTEGER NOT NULL,
                charge_id INTEGER NOT NULL,
                decision_type TEXT NOT NULL,
                cost REAL,
                decided_at TEXT
            )
        "#).execute(&mut conn)?;

        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_charges_name ON charges(name)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_decisions_court ON bail_decisions(court_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_decisions_judge ON bail_decisions(judge_id)").execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_decisions_charge ON bail_decisions(charge_id)").execute(&mut conn)?;

        debug!("schema ready");
        Ok(())
    }

    // ========================================================================
    // Import
    // ========================================================================

    /// Load a bulk document in one transaction. Entities with an existing ID
    /// are replaced; decisions are appended. Returns the decisions inserted.
    pub fn import(&self, data: &ImportData) -> Result<usize> {
        let mut conn = self.get_conn()?;

        let inserted = conn.transaction::<_, DbError, _>(|conn| {
            for court in &data.courts {
                diesel::replace_into(courts::table).values(court).execute(conn)?;
            }
            for judge in &data.judges {
                diesel::replace_into(judges::table).values(judge).execute(conn)?;
            }
            for charge in &data.charges {
                diesel::replace_into(charges::table).values(charge).execute(conn)?;
            }

            let mut inserted = 0;
            for decision in &data.bail_decisions {
                inserted += diesel::insert_into(bail_decisions::table)
                    .values(decision)
                    .execute(conn)?;
            }
            Ok(inserted)
        })?;

        info!(
            courts = data.courts.len(),
            judges = data.judges.len(),
            charges = data.charges.len(),
            decisions = inserted,
            "import complete"
        );
        Ok(inserted)
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Charges, one per distinct name, ordered by name
    pub fn charges(&self) -> Result<Vec<Charge>> {
        let mut conn = self.get_conn()?;
        let charges = diesel::sql_query(DISTINCT_CHARGES_SQL).load::<Charge>(&mut conn)?;
        Ok(charges)
    }

    pub fn charge(&self, charge_id: i32) -> Result<Option<Charge>> {
        let mut conn = self.get_conn()?;
        let charge = charges::table
            .find(charge_id)
            .select(Charge::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(charge)
    }

    pub fn courts(&self) -> Result<Vec<NamedEntity>> {
        let mut conn = self.get_conn()?;
        let rows = courts::table
            .select((courts::court_id, courts::name))
            .order(courts::name.asc())
            .load::<(i32, String)>(&mut conn)?;
        Ok(rows.into_iter().map(|(id, name)| NamedEntity { id, name }).collect())
    }

    pub fn judges(&self) -> Result<Vec<NamedEntity>> {
        let mut conn = self.get_conn()?;
        let rows = judges::table
            .select((judges::judge_id, judges::name))
            .order(judges::name.asc())
            .load::<(i32, String)>(&mut conn)?;
        Ok(rows.into_iter().map(|(id, name)| NamedEntity { id, name }).collect())
    }

    pub fn find_court_name(&self, court_id: i32) -> Result<Option<String>> {
        let mut conn = self.get_conn()?;
        let name = courts::table
            .find(court_id)
            .select(courts::name)
            .first::<String>(&mut conn)
            .optional()?;
        Ok(name)
    }

    pub fn find_judge_name(&self, judge_id: i32) -> Result<Option<String>> {
        let mut conn = self.get_conn()?;
        let name = judges::table
            .find(judge_id)
            .select(judges::name)
            .first::<String>(&mut conn)
            .optional()?;
        Ok(name)
    }

    pub fn find_charge_name(&self, charge_id: i32) -> Result<Option<String>> {
        Ok(self.charge(charge_id)?.map(|c| c.name))
    }

    // ========================================================================
    // Aggregates
    // ========================================================================

    /// Per-type decision counts and mean cost under `filter`
    pub fn tally(&self, filter: &Filter) -> Result<Vec<Tally>> {
        let mut conn = self.get_conn()?;

        let rows = diesel::sql_query(TALLY_SQL)
            .bind::<Nullable<Integer>, _>(filter.court)
            .bind::<Nullable<Integer>, _>(filter.court)
            .bind::<Nullable<Integer>, _>(filter.judge)
            .bind::<Nullable<Integer>, _>(filter.judge)
            .bind::<Nullable<Integer>, _>(filter.charge)
            .bind::<Nullable<Integer>, _>(filter.charge)
            .load::<TallyRow>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|r| Tally { kind: r.decision_type, count: r.count, average_cost: r.average_cost })
            .collect())
    }

    /// Chart rows for `filter`. The comparative view divides by the unfiltered
    /// figures.
    pub fn bail_decisions(&self, filter: &Filter, view: ViewMode) -> Result<Vec<BailDecisionData>> {
        let rows = chart::objective_rows(&self.tally(filter)?);

        match view {
            ViewMode::Objective => Ok(rows),
            ViewMode::Comparative => {
                let baseline = chart::objective_rows(&self.tally(&Filter::default())?);
                Ok(chart::comparative_rows(&rows, &baseline))
            }
        }
    }

    /// Get summary statistics
    pub fn summary(&self) -> Result<DbSummary> {
        let mut conn = self.get_conn()?;

        Ok(DbSummary {
            courts: courts::table.count().get_result(&mut conn)?,
            judges: judges::table.count().get_result(&mut conn)?,
            charges: charges::table.count().get_result(&mut conn)?,
            bail_decisions: bail_decisions::table.count().get_result(&mut conn)?,
        })
    }
}

impl NameLookup for Database {
    fn court_name(&self, id: i32) -> Option<String> {
        self.find_court_name(id).unwrap_or_else(|e| {
            warn!(court_id = id, error = %e, "court name lookup failed");
            None
        })
    }

    fn judge_name(&self, id: i32) -> Option<String> {
        self.find_judge_name(id).unwrap_or_else(|e| {
            warn!(judge_id = id, error = %e, "judge name lookup failed");
            None
        })
    }

    fn charge_name(&self, id: i32) -> Option<String> {
        self.find_charge_name(id).unwrap_or_else(|e| {
            warn!(charge_id = id, error = %e, "charge name lookup failed");
            None
        })
    }
}
