use super::{DashboardStore, QueryExecutor, ReportStore};
use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{
    DashboardDefinition, DashboardUpdate, NamedQuery, NamedQueryUpdate, NewDashboard, NewNamedQuery, PlacedWidget,
    QueryParams, QueryResult, ReportFilter, WidgetPlacement,
};
use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[async_trait]
impl ReportStore for Database {
    async fn list_reports(&self, filter: &ReportFilter) -> AppResult<Vec<NamedQuery>> {
        Database::list_reports(self, filter)
    }

    async fn get_report(&self, id: &str) -> AppResult<Option<NamedQuery>> {
        Database::get_report(self, id)
    }

    async fn create_report(&self, report: NewNamedQuery) -> AppResult<NamedQuery> {
        Database::create_report(self, report)
    }

    async fn update_report(&self, id: &str, update: NamedQueryUpdate) -> AppResult<NamedQuery> {
        Database::update_report(self, id, update)
    }

    async fn delete_report(&self, id: &str) -> AppResult<bool> {
        Database::delete_report(self, id)
    }
}

#[async_trait]
impl DashboardStore for Database {
    async fn create_dashboard(&self, dashboard: NewDashboard) -> AppResult<DashboardDefinition> {
        Database::create_dashboard(self, dashboard)
    }

    async fn get_dashboard(&self, id: &str) -> AppResult<Option<DashboardDefinition>> {
        Database::get_dashboard(self, id)
    }

    async fn update_dashboard(&self, id: &str, update: DashboardUpdate) -> AppResult<DashboardDefinition> {
        Database::update_dashboard(self, id, update)
    }

    async fn delete_dashboard(&self, id: &str) -> AppResult<bool> {
        Database::delete_dashboard(self, id)
    }

    async fn add_widget(&self, dashboard_id: &str, placement: WidgetPlacement) -> AppResult<PlacedWidget> {
        Database::add_widget(self, dashboard_id, placement)
    }

    async fn update_widget(
        &self,
        dashboard_id: &str,
        widget_id: &str,
        placement: WidgetPlacement,
    ) -> AppResult<PlacedWidget> {
        Database::update_widget(self, dashboard_id, widget_id, placement)
    }

    async fn delete_widget(&self, dashboard_id: &str, widget_id: &str) -> AppResult<bool> {
        Database::delete_widget(self, dashboard_id, widget_id)
    }
}

/// Executes stored report text against a local SQLite copy of the PSA data.
pub struct SqliteQueryExecutor {
    reports: Arc<Database>,
    source: Mutex<Connection>,
    max_rows: usize,
}

impl SqliteQueryExecutor {
    pub fn open(reports: Arc<Database>, source_path: &Path, max_rows: usize) -> AppResult<Self> {
        if !source_path.exists() {
            return Err(AppError::NotFound(format!(
                "Source database not found: {}",
                source_path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            source_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI,
        )?;
        Ok(Self::from_connection(reports, conn, max_rows))
    }

    pub fn from_connection(reports: Arc<Database>, source: Connection, max_rows: usize) -> Self {
        Self {
            reports,
            source: Mutex::new(source),
            max_rows,
        }
    }

    pub fn run_sql(&self, sql: &str, params: &QueryParams) -> AppResult<QueryResult> {
        let conn = self
            .source
            .lock()
            .map_err(|_| AppError::Internal("source connection mutex poisoned".to_string()))?;
        let mut stmt = conn.prepare(sql).map_err(query_error)?;
        if !stmt.readonly() {
            return Err(AppError::Query(
                "Only read-only SELECT statements can be executed".to_string(),
            ));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(ToString::to_string).collect();
        for index in 1..=stmt.parameter_count() {
            let value = stmt
                .parameter_name(index)
                .map(|name| name.trim_start_matches([':', '@', '$']))
                .and_then(|name| params.get(name))
                .map(json_to_sql)
                .unwrap_or(SqlValue::Null);
            stmt.raw_bind_parameter(index, value).map_err(query_error)?;
        }

        let mut rows = stmt.raw_query();
        let mut sample = Vec::new();
        let mut row_count = 0usize;
        while let Some(row) = rows.next().map_err(query_error)? {
            row_count += 1;
            if sample.len() >= self.max_rows {
                continue;
            }
            let mut values = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                values.push(sql_to_json(row.get_ref(index).map_err(query_error)?));
            }
            sample.push(values);
        }

        Ok(QueryResult {
            columns,
            rows: sample,
            row_count,
        })
    }
}

#[async_trait]
impl QueryExecutor for SqliteQueryExecutor {
    async fn execute(&self, report_id: &str, params: &QueryParams) -> AppResult<QueryResult> {
        let report = self
            .reports
            .get_report(report_id)?
            .ok_or_else(|| AppError::NotFound(format!("Report not found: {}", report_id)))?;
        tracing::debug!(report_id = %report_id, "executing report against source database");
        self.run_sql(&report.sql, params)
    }

    async fn fetch(&self, report_id: &str) -> AppResult<Option<NamedQuery>> {
        self.reports.get_report(report_id)
    }
}

fn query_error(error: rusqlite::Error) -> AppError {
    AppError::Query(error.to_string())
}

fn json_to_sql(value: &serde_json::Value) -> SqlValue {
    match value {
        serde_json::Value::Null => SqlValue::Null,
        serde_json::Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        serde_json::Value::Number(number) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => number.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        serde_json::Value::String(text) => SqlValue::Text(text.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn sql_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(integer) => serde_json::Value::from(integer),
        ValueRef::Real(real) => serde_json::Value::from(real),
        ValueRef::Text(text) => serde_json::Value::String(String::from_utf8_lossy(text).to_string()),
        ValueRef::Blob(blob) => serde_json::Value::String(format!("<{} bytes>", blob.len())),
    }
}
