use crate::errors::{AppError, AppResult};
use crate::models::{
    ChartConfig, DashboardDefinition, DashboardUpdate, EngineSettings, NamedQuery, NamedQueryUpdate, NewDashboard,
    NewNamedQuery, PlacedWidget, ReportFilter, WidgetBinding, WidgetKind, WidgetPlacement,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("schema.sql");

const REPORT_COLUMNS: &str =
    "id, name, description, sql_text, category, shared, author, chart_config_json, created_at, updated_at";

const WIDGET_COLUMNS: &str =
    "id, position, kind, title, color, grid_x, grid_y, grid_w, grid_h, report_id, filter_id, area_id";

/// Local state store for named queries, dashboards and engine settings.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    // ─── Named Queries ──────────────────────────────────────────────────────

    pub fn list_reports(&self, filter: &ReportFilter) -> AppResult<Vec<NamedQuery>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let query = format!(
            "SELECT {REPORT_COLUMNS} FROM reports
             WHERE (?1 IS NULL OR category = ?1)
               AND (?2 IS NULL OR instr(lower(name), lower(?2)) > 0)
             ORDER BY rowid ASC"
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(
            params![filter.category, filter.name_contains],
            parse_report_row,
        )?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn get_report(&self, id: &str) -> AppResult<Option<NamedQuery>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.query_row(
            &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
            [id],
            parse_report_row,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn create_report(&self, report: NewNamedQuery) -> AppResult<NamedQuery> {
        let name = report.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Report name cannot be empty".to_string()));
        }
        if report.sql.trim().is_empty() {
            return Err(AppError::InvalidInput("Report query cannot be empty".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let chart_config_json = report
            .chart_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO reports (id, name, description, sql_text, category, shared, author,
             chart_config_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                id,
                name,
                report.description,
                report.sql,
                report.category,
                report.shared as i32,
                report.author,
                chart_config_json,
                now.to_rfc3339(),
            ],
        )?;

        Ok(NamedQuery {
            id,
            name,
            description: report.description,
            sql: report.sql,
            category: report.category,
            shared: report.shared,
            author: report.author,
            chart_config: report.chart_config,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_report(&self, id: &str, update: NamedQueryUpdate) -> AppResult<NamedQuery> {
        let mut current = self
            .get_report(id)?
            .ok_or_else(|| AppError::NotFound(format!("Report not found: {}", id)))?;

        if let Some(name) = update.name {
            current.name = name;
        }
        if let Some(description) = update.description {
            current.description = description;
        }
        if let Some(sql) = update.sql {
            current.sql = sql;
        }
        if let Some(category) = update.category {
            current.category = category;
        }
        if let Some(shared) = update.shared {
            current.shared = shared;
        }
        if update.chart_config.is_some() {
            current.chart_config = update.chart_config;
        }
        current.updated_at = Utc::now();

        let chart_config_json = current
            .chart_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let changed = conn.execute(
            "UPDATE reports SET name=?1, description=?2, sql_text=?3, category=?4, shared=?5,
             chart_config_json=?6, updated_at=?7 WHERE id=?8",
            params![
                current.name,
                current.description,
                current.sql,
                current.category,
                current.shared as i32,
                chart_config_json,
                current.updated_at.to_rfc3339(),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("Report not found: {}", id)));
        }

        Ok(current)
    }

    pub fn delete_report(&self, id: &str) -> AppResult<bool> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let changed = conn.execute("DELETE FROM reports WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    // ─── Dashboards ─────────────────────────────────────────────────────────

    pub fn create_dashboard(&self, dashboard: NewDashboard) -> AppResult<DashboardDefinition> {
        let name = dashboard.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Dashboard name cannot be empty".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO dashboards (id, name, description, shared, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id, name, dashboard.description, dashboard.shared as i32, now.to_rfc3339()],
        )?;

        let mut widgets = Vec::with_capacity(dashboard.widgets.len());
        for (index, placement) in dashboard.widgets.into_iter().enumerate() {
            let widget = PlacedWidget {
                id: Uuid::new_v4().to_string(),
                position: index as i32,
                placement,
            };
            insert_widget(&tx, &id, &widget)?;
            widgets.push(widget);
        }
        tx.commit()?;

        Ok(DashboardDefinition {
            id,
            name,
            description: dashboard.description,
            shared: dashboard.shared,
            widgets,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_dashboard(&self, id: &str) -> AppResult<Option<DashboardDefinition>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let header = conn
            .query_row(
                "SELECT id, name, description, shared, created_at, updated_at FROM dashboards WHERE id = ?1",
                [id],
                |row| {
                    Ok(DashboardDefinition {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        shared: row.get::<_, i32>(3)? != 0,
                        widgets: Vec::new(),
                        created_at: parse_time(&row.get::<_, String>(4)?)?,
                        updated_at: parse_time(&row.get::<_, String>(5)?)?,
                    })
                },
            )
            .optional()?;

        let Some(mut dashboard) = header else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {WIDGET_COLUMNS} FROM dashboard_widgets WHERE dashboard_id = ?1 ORDER BY position ASC, rowid ASC"
        ))?;
        let rows = stmt.query_map([id], parse_widget_row)?;
        for row in rows {
            dashboard.widgets.push(row?);
        }
        Ok(Some(dashboard))
    }

    pub fn update_dashboard(&self, id: &str, update: DashboardUpdate) -> AppResult<DashboardDefinition> {
        {
            let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
            let changed = conn.execute(
                "UPDATE dashboards SET
                   name = COALESCE(?1, name),
                   description = COALESCE(?2, description),
                   shared = COALESCE(?3, shared),
                   updated_at = ?4
                 WHERE id = ?5",
                params![
                    update.name,
                    update.description,
                    update.shared.map(|shared| shared as i32),
                    Utc::now().to_rfc3339(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(AppError::NotFound(format!("Dashboard not found: {}", id)));
            }
        }
        self.get_dashboard(id)?
            .ok_or_else(|| AppError::NotFound(format!("Dashboard not found: {}", id)))
    }

    pub fn delete_dashboard(&self, id: &str) -> AppResult<bool> {
        let mut conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM dashboard_widgets WHERE dashboard_id = ?1", [id])?;
        let changed = tx.execute("DELETE FROM dashboards WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(changed > 0)
    }

    pub fn add_widget(&self, dashboard_id: &str, placement: WidgetPlacement) -> AppResult<PlacedWidget> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let exists = conn.query_row(
            "SELECT COUNT(1) FROM dashboards WHERE id = ?1",
            [dashboard_id],
            |row| row.get::<_, i64>(0),
        )? > 0;
        if !exists {
            return Err(AppError::NotFound(format!("Dashboard not found: {}", dashboard_id)));
        }

        let position: i32 = conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM dashboard_widgets WHERE dashboard_id = ?1",
            [dashboard_id],
            |row| row.get(0),
        )?;
        let widget = PlacedWidget {
            id: Uuid::new_v4().to_string(),
            position,
            placement,
        };
        insert_widget(&conn, dashboard_id, &widget)?;
        touch_dashboard(&conn, dashboard_id)?;
        Ok(widget)
    }

    pub fn update_widget(
        &self,
        dashboard_id: &str,
        widget_id: &str,
        placement: WidgetPlacement,
    ) -> AppResult<PlacedWidget> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let (report_id, filter_id, area_id) = binding_columns(&placement.binding);
        let changed = conn.execute(
            "UPDATE dashboard_widgets SET kind=?1, title=?2, color=?3, grid_x=?4, grid_y=?5, grid_w=?6,
             grid_h=?7, report_id=?8, filter_id=?9, area_id=?10
             WHERE id=?11 AND dashboard_id=?12",
            params![
                placement.kind.as_str(),
                placement.title,
                placement.color,
                placement.x,
                placement.y,
                placement.w,
                placement.h,
                report_id,
                filter_id,
                area_id,
                widget_id,
                dashboard_id,
            ],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!(
                "Widget {} not found on dashboard {}",
                widget_id, dashboard_id
            )));
        }
        touch_dashboard(&conn, dashboard_id)?;

        conn.query_row(
            &format!("SELECT {WIDGET_COLUMNS} FROM dashboard_widgets WHERE id = ?1"),
            [widget_id],
            parse_widget_row,
        )
        .map_err(AppError::from)
    }

    pub fn delete_widget(&self, dashboard_id: &str, widget_id: &str) -> AppResult<bool> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let changed = conn.execute(
            "DELETE FROM dashboard_widgets WHERE id = ?1 AND dashboard_id = ?2",
            params![widget_id, dashboard_id],
        )?;
        if changed > 0 {
            touch_dashboard(&conn, dashboard_id)?;
        }
        Ok(changed > 0)
    }

    // ─── Settings ───────────────────────────────────────────────────────────

    pub fn get_settings(&self) -> AppResult<EngineSettings> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let raw = conn
            .query_row(
                "SELECT value_json FROM settings WHERE key = 'engine'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(serde_json::from_str::<EngineSettings>(&raw).unwrap_or_default()),
            None => Ok(EngineSettings::default()),
        }
    }

    pub fn update_settings(&self, update: serde_json::Value) -> AppResult<EngineSettings> {
        let current = self.get_settings()?;
        let mut merged = serde_json::to_value(current)?;
        merge_json(&mut merged, update);
        let settings: EngineSettings = serde_json::from_value(merged)?;

        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO settings (key, value_json, updated_at)
             VALUES ('engine', ?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
            params![serde_json::to_string(&settings)?, Utc::now().to_rfc3339()],
        )?;

        Ok(settings)
    }
}

fn insert_widget(conn: &Connection, dashboard_id: &str, widget: &PlacedWidget) -> AppResult<()> {
    let placement = &widget.placement;
    let (report_id, filter_id, area_id) = binding_columns(&placement.binding);
    conn.execute(
        "INSERT INTO dashboard_widgets (id, dashboard_id, position, kind, title, color,
         grid_x, grid_y, grid_w, grid_h, report_id, filter_id, area_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            widget.id,
            dashboard_id,
            widget.position,
            placement.kind.as_str(),
            placement.title,
            placement.color,
            placement.x,
            placement.y,
            placement.w,
            placement.h,
            report_id,
            filter_id,
            area_id,
        ],
    )?;
    Ok(())
}

fn touch_dashboard(conn: &Connection, dashboard_id: &str) -> AppResult<()> {
    conn.execute(
        "UPDATE dashboards SET updated_at = ?1 WHERE id = ?2",
        params![Utc::now().to_rfc3339(), dashboard_id],
    )?;
    Ok(())
}

fn binding_columns(binding: &WidgetBinding) -> (Option<&str>, Option<i64>, Option<i64>) {
    match binding {
        WidgetBinding::Report { report_id } => (Some(report_id.as_str()), None, None),
        WidgetBinding::Filter { filter_id, area_id } => (None, Some(*filter_id), *area_id),
    }
}

fn parse_report_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NamedQuery> {
    Ok(NamedQuery {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        sql: row.get(3)?,
        category: row.get(4)?,
        shared: row.get::<_, i32>(5)? != 0,
        author: row.get(6)?,
        chart_config: row
            .get::<_, Option<String>>(7)?
            .and_then(|raw| serde_json::from_str::<ChartConfig>(&raw).ok()),
        created_at: parse_time(&row.get::<_, String>(8)?)?,
        updated_at: parse_time(&row.get::<_, String>(9)?)?,
    })
}

fn parse_widget_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlacedWidget> {
    let report_id: Option<String> = row.get(9)?;
    let filter_id: Option<i64> = row.get(10)?;
    let area_id: Option<i64> = row.get(11)?;
    let binding = match (report_id, filter_id) {
        (Some(report_id), None) => WidgetBinding::Report { report_id },
        (None, Some(filter_id)) => WidgetBinding::Filter { filter_id, area_id },
        _ => return Err(invalid_data(9, "widget must reference exactly one report or filter")),
    };

    Ok(PlacedWidget {
        id: row.get(0)?,
        position: row.get(1)?,
        placement: WidgetPlacement {
            kind: parse_kind(&row.get::<_, String>(2)?)?,
            title: row.get(3)?,
            color: row.get(4)?,
            x: row.get(5)?,
            y: row.get(6)?,
            w: row.get(7)?,
            h: row.get(8)?,
            binding,
        },
    })
}

fn parse_kind(raw: &str) -> rusqlite::Result<WidgetKind> {
    WidgetKind::parse(raw).ok_or_else(|| invalid_data(2, &format!("Unknown widget kind '{}'", raw)))
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| invalid_data(0, &error.to_string()))
}

fn invalid_data(column: usize, message: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message.to_string())),
    )
}

fn merge_json(target: &mut serde_json::Value, update: serde_json::Value) {
    match (target, update) {
        (serde_json::Value::Object(target_map), serde_json::Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_json(target_map.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (target, update) => *target = update,
    }
}
