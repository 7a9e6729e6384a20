use crate::run::{start_timestamp, PhaseDurations, RunInit, RunOutcome, RunStatus};
use anyhow::{Context, Result};
use rivus_algo::results::{constants, timeseries};
use rivus_algo::{GraphAnalysis, Problem, Solution};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS run (
        run_id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_uuid TEXT NOT NULL UNIQUE,
        runner TEXT NOT NULL,
        start_ts TEXT NOT NULL,
        end_ts TEXT,
        status TEXT NOT NULL,
        outcome TEXT NOT NULL,
        pre_duration REAL,
        solve_duration REAL,
        post_duration REAL,
        plot_duration REAL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS demand (
        run_id INTEGER NOT NULL REFERENCES run(run_id),
        commodity TEXT NOT NULL,
        peak REAL NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cost (
        run_id INTEGER NOT NULL REFERENCES run(run_id),
        cost_type TEXT NOT NULL,
        value REAL NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS edge_capacity (
        run_id INTEGER NOT NULL REFERENCES run(run_id),
        vertex1 INTEGER NOT NULL,
        vertex2 INTEGER NOT NULL,
        commodity TEXT NOT NULL,
        capacity REAL NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS hub_capacity (
        run_id INTEGER NOT NULL REFERENCES run(run_id),
        vertex1 INTEGER NOT NULL,
        vertex2 INTEGER NOT NULL,
        process TEXT NOT NULL,
        capacity REAL NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS process_capacity (
        run_id INTEGER NOT NULL REFERENCES run(run_id),
        vertex INTEGER NOT NULL,
        process TEXT NOT NULL,
        capacity REAL NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS source (
        run_id INTEGER NOT NULL REFERENCES run(run_id),
        vertex INTEGER NOT NULL,
        commodity TEXT NOT NULL,
        time_step TEXT NOT NULL,
        value REAL NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS graph_analysis (
        run_id INTEGER NOT NULL REFERENCES run(run_id),
        commodity TEXT NOT NULL,
        is_connected INTEGER NOT NULL,
        connected_components INTEGER NOT NULL,
        is_minimal INTEGER
    )
    "#,
];

/// A row of the `run` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RunRecord {
    pub run_id: i64,
    pub run_uuid: String,
    pub runner: String,
    pub start_ts: String,
    pub end_ts: Option<String>,
    pub status: String,
    pub outcome: String,
    pub pre_duration: Option<f64>,
    pub solve_duration: Option<f64>,
    pub post_duration: Option<f64>,
    pub plot_duration: Option<f64>,
}

/// SQLite store of runs and their results.
#[derive(Debug, Clone)]
pub struct RunStore {
    pool: SqlitePool,
}

impl RunStore {
    /// Opens (and creates if missing) the database at `url`, e.g.
    /// `sqlite://runs.db` or `sqlite::memory:`.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url '{url}'"))?
            .create_if_missing(true)
            .foreign_keys(true);
        // every in-memory connection would be a separate database
        let max_connections = if url.contains(":memory:") { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("connecting to {url}"))?;
        info!(url, "connected to run database");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn init_schema(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.context("starting schema transaction")?;
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .context("creating run database schema")?;
        }
        tx.commit().await.context("committing schema")?;
        debug!(tables = SCHEMA.len(), "run database schema ready");
        Ok(())
    }

    /// Inserts a run and returns its id.
    pub async fn init_run(&self, init: &RunInit) -> Result<i64> {
        let start_ts = start_timestamp(init.start_ts.as_deref());
        let run_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO run (run_uuid, runner, start_ts, status, outcome)
            VALUES (?, ?, ?, ?, ?)
            RETURNING run_id
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&init.runner)
        .bind(&start_ts)
        .bind(init.status.as_str())
        .bind(init.outcome.as_str())
        .fetch_one(&self.pool)
        .await
        .context("inserting run")?;
        debug!(run_id, runner = %init.runner, start_ts, "initialised run");
        Ok(run_id)
    }

    pub async fn finish_run(
        &self,
        run_id: i64,
        status: RunStatus,
        outcome: RunOutcome,
        durations: &PhaseDurations,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE run
            SET status = ?, outcome = ?, end_ts = ?,
                pre_duration = ?, solve_duration = ?, post_duration = ?, plot_duration = ?
            WHERE run_id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(outcome.as_str())
        .bind(start_timestamp(None))
        .bind(durations.pre)
        .bind(durations.solve)
        .bind(durations.post)
        .bind(durations.plot)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("finishing run {run_id}"))?;
        if result.rows_affected() == 0 {
            anyhow::bail!("run {run_id} does not exist");
        }
        Ok(())
    }

    /// Stores demand, costs, capacities, sources and graph analysis of a
    /// solved run in one transaction.
    pub async fn store(
        &self,
        run_id: i64,
        problem: &Problem,
        solution: &Solution,
        analysis: &[GraphAnalysis],
    ) -> Result<()> {
        let constants = constants(solution);
        let series = timeseries(solution);
        let mut tx = self.pool.begin().await.context("starting store transaction")?;

        for (commodity, peak) in problem.total_peak() {
            sqlx::query("INSERT INTO demand (run_id, commodity, peak) VALUES (?, ?, ?)")
                .bind(run_id)
                .bind(commodity)
                .bind(peak)
                .execute(&mut *tx)
                .await
                .context("storing demand")?;
        }
        for (cost_type, value) in &constants.costs {
            sqlx::query("INSERT INTO cost (run_id, cost_type, value) VALUES (?, ?, ?)")
                .bind(run_id)
                .bind(cost_type.as_str())
                .bind(value)
                .execute(&mut *tx)
                .await
                .context("storing costs")?;
        }
        for ((v1, v2), caps) in &constants.edge_capacity.rows {
            for (commodity, cap) in constants.edge_capacity.columns.iter().zip(caps) {
                if *cap <= 0.0 {
                    continue;
                }
                sqlx::query(
                    "INSERT INTO edge_capacity (run_id, vertex1, vertex2, commodity, capacity) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(run_id)
                .bind(v1.value() as i64)
                .bind(v2.value() as i64)
                .bind(commodity)
                .bind(cap)
                .execute(&mut *tx)
                .await
                .context("storing edge capacities")?;
            }
        }
        for ((v1, v2), caps) in &constants.hub_capacity.rows {
            for (process, cap) in constants.hub_capacity.columns.iter().zip(caps) {
                if *cap <= 0.0 {
                    continue;
                }
                sqlx::query(
                    "INSERT INTO hub_capacity (run_id, vertex1, vertex2, process, capacity) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(run_id)
                .bind(v1.value() as i64)
                .bind(v2.value() as i64)
                .bind(process)
                .bind(cap)
                .execute(&mut *tx)
                .await
                .context("storing hub capacities")?;
            }
        }
        for (vertex, caps) in &constants.process_capacity.rows {
            for (process, cap) in constants.process_capacity.columns.iter().zip(caps) {
                if *cap <= 0.0 {
                    continue;
                }
                sqlx::query(
                    "INSERT INTO process_capacity (run_id, vertex, process, capacity) \
                     VALUES (?, ?, ?, ?)",
                )
                .bind(run_id)
                .bind(vertex.value() as i64)
                .bind(process)
                .bind(cap)
                .execute(&mut *tx)
                .await
                .context("storing process capacities")?;
            }
        }
        for row in &series.source {
            sqlx::query(
                "INSERT INTO source (run_id, vertex, commodity, time_step, value) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(run_id)
            .bind(row.vertex.value() as i64)
            .bind(&row.commodity)
            .bind(&row.time)
            .bind(row.value)
            .execute(&mut *tx)
            .await
            .context("storing sources")?;
        }
        for graph in analysis {
            sqlx::query(
                "INSERT INTO graph_analysis \
                 (run_id, commodity, is_connected, connected_components, is_minimal) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(run_id)
            .bind(&graph.commodity)
            .bind(graph.is_connected)
            .bind(graph.connected_components as i64)
            .bind(graph.is_minimal)
            .execute(&mut *tx)
            .await
            .context("storing graph analysis")?;
        }

        tx.commit().await.context("committing run results")?;
        info!(run_id, "stored run results");
        Ok(())
    }

    pub async fn fetch_run(&self, run_id: i64) -> Result<Option<RunRecord>> {
        sqlx::query_as::<_, RunRecord>("SELECT * FROM run WHERE run_id = ?")
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("fetching run {run_id}"))
    }

    /// Costs of a run keyed by cost type.
    pub async fn fetch_costs(&self, run_id: i64) -> Result<BTreeMap<String, f64>> {
        let rows: Vec<(String, f64)> =
            sqlx::query_as("SELECT cost_type, value FROM cost WHERE run_id = ?")
                .bind(run_id)
                .fetch_all(&self.pool)
                .await
                .with_context(|| format!("fetching costs of run {run_id}"))?;
        Ok(rows.into_iter().collect())
    }

    /// Number of rows stored for `run_id` in a result table.
    pub async fn count_rows(&self, table: ResultTable, run_id: i64) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE run_id = ?", table.as_str());
        sqlx::query_scalar(&sql)
            .bind(run_id)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("counting {} rows", table.as_str()))
    }
}

/// Result tables filled by [`RunStore::store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTable {
    Demand,
    Cost,
    EdgeCapacity,
    HubCapacity,
    ProcessCapacity,
    Source,
    GraphAnalysis,
}

impl ResultTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultTable::Demand => "demand",
            ResultTable::Cost => "cost",
            ResultTable::EdgeCapacity => "edge_capacity",
            ResultTable::HubCapacity => "hub_capacity",
            ResultTable::ProcessCapacity => "process_capacity",
            ResultTable::Source => "source",
            ResultTable::GraphAnalysis => "graph_analysis",
        }
    }
}
