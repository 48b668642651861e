use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed dashboard grid width in columns.
pub const GRID_COLUMNS: i32 = 12;

/// Name prefix reserved for artifacts this engine synthesizes.
pub const RESERVED_NAME_PREFIX: &str = "[auto] ";

pub fn is_reserved_name(name: &str) -> bool {
    name.get(..RESERVED_NAME_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(RESERVED_NAME_PREFIX))
}

pub fn reserved_name(display_name: &str) -> String {
    if is_reserved_name(display_name) {
        display_name.to_string()
    } else {
        format!("{}{}", RESERVED_NAME_PREFIX, display_name)
    }
}

// ─── Widget Templates ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    ChartBar,
    ChartPie,
    CounterFromQuery,
    CounterFromFilter,
    List,
}

impl WidgetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChartBar => "chart-bar",
            Self::ChartPie => "chart-pie",
            Self::CounterFromQuery => "counter-from-query",
            Self::CounterFromFilter => "counter-from-filter",
            Self::List => "list",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "chart-bar" => Some(Self::ChartBar),
            "chart-pie" => Some(Self::ChartPie),
            "counter-from-query" => Some(Self::CounterFromQuery),
            "counter-from-filter" => Some(Self::CounterFromFilter),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    /// Whether tiles of this kind are backed by a named query.
    pub fn needs_report(self) -> bool {
        matches!(self, Self::ChartBar | Self::ChartPie | Self::CounterFromQuery)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetArchetype {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: WidgetKind,
    pub keywords: &'static [&'static str],
    pub fallback_sql: Option<&'static str>,
    pub reserved_report_name: Option<&'static str>,
    pub filter_id: Option<i64>,
    pub area_id: Option<i64>,
    pub color: &'static str,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPreset {
    pub name: &'static str,
    pub description: &'static str,
    pub widgets: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTemplates {
    pub widgets: Vec<&'static WidgetArchetype>,
    pub layouts: Vec<&'static LayoutPreset>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub chart_type: Option<&'static str>,
    pub sql: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedTemplateSummary {
    pub key: String,
    pub name: String,
    pub description: String,
    pub category: String,
}

// ─── Named Queries ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub chart_type: Option<String>,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub aggregate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedQuery {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sql: String,
    pub category: String,
    pub shared: bool,
    pub author: String,
    pub chart_config: Option<ChartConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NamedQuery {
    pub fn is_reserved(&self) -> bool {
        is_reserved_name(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNamedQuery {
    pub name: String,
    pub description: String,
    pub sql: String,
    pub category: String,
    pub shared: bool,
    pub author: String,
    pub chart_config: Option<ChartConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedQueryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sql: Option<String>,
    pub category: Option<String>,
    pub shared: Option<bool>,
    pub chart_config: Option<ChartConfig>,
}

impl NamedQueryUpdate {
    pub fn sql(sql: impl Into<String>) -> Self {
        Self {
            sql: Some(sql.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    pub category: Option<String>,
    pub name_contains: Option<String>,
}

pub type QueryParams = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

// ─── Dashboards ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum WidgetBinding {
    #[serde(rename_all = "camelCase")]
    Report { report_id: String },
    #[serde(rename_all = "camelCase")]
    Filter { filter_id: i64, area_id: Option<i64> },
}

impl WidgetBinding {
    pub fn report_id(&self) -> Option<&str> {
        match self {
            Self::Report { report_id } => Some(report_id),
            Self::Filter { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPlacement {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub kind: WidgetKind,
    pub color: String,
    pub title: String,
    pub binding: WidgetBinding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedWidget {
    pub id: String,
    pub position: i32,
    #[serde(flatten)]
    pub placement: WidgetPlacement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDashboard {
    pub name: String,
    pub description: String,
    pub shared: bool,
    pub widgets: Vec<WidgetPlacement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub shared: bool,
    pub widgets: Vec<PlacedWidget>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub shared: Option<bool>,
}

// ─── Synthesis Results ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportOrigin {
    Found,
    Created,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedReport {
    pub report_id: String,
    pub name: String,
    pub origin: ReportOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltWidget {
    pub placement: WidgetPlacement,
    pub report: Option<ResolvedReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetError {
    pub archetype_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStatus {
    Complete,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDashboardResult {
    pub status: BuildStatus,
    pub dashboard: Option<DashboardDefinition>,
    pub found: Vec<ResolvedReport>,
    pub created: Vec<ResolvedReport>,
    pub errors: Vec<WidgetError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayoutSelection {
    Preset(String),
    Explicit(Vec<String>),
}

// ─── Validation Results ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub matched: bool,
    pub signature: Option<String>,
    pub description: Option<String>,
    pub repaired_sql: Option<String>,
}

impl Classification {
    pub fn unmatched() -> Self {
        Self {
            matched: false,
            signature: None,
            description: None,
            repaired_sql: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub report_id: String,
    pub valid: bool,
    pub executed: bool,
    pub row_count: Option<usize>,
    pub error: Option<String>,
    pub signature: Option<String>,
    pub fix_description: Option<String>,
    pub repaired_sql: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFix {
    pub signature: String,
    pub description: String,
    pub sql: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixOutcome {
    pub report_id: String,
    pub valid: bool,
    pub executions: u32,
    pub fixes: Vec<AppliedFix>,
    pub restored_original: bool,
    pub last: ValidationResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetValidation {
    pub widget_id: String,
    pub title: String,
    pub report_id: String,
    pub valid: bool,
    pub fixed: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardValidationReport {
    pub dashboard_id: String,
    pub checked: usize,
    pub validated: usize,
    pub failed: usize,
    pub fixed: usize,
    pub skipped: usize,
    pub widgets: Vec<WidgetValidation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidatedReportPath {
    Original,
    Fallback,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateValidatedReportOutcome {
    pub path: ValidatedReportPath,
    pub report_id: Option<String>,
    pub repaired: bool,
    pub row_count: Option<usize>,
    pub errors: Vec<String>,
}

// ─── Settings ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    pub max_fix_attempts: u32,
    pub match_threshold: i32,
    pub report_category: String,
    pub report_author: String,
    pub share_generated_reports: bool,
    pub share_dashboards: bool,
    pub suggestion_limit: usize,
    pub max_result_rows: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_fix_attempts: 3,
            match_threshold: 5,
            report_category: "Dashboards".to_string(),
            report_author: "dashboard-synth".to_string(),
            share_generated_reports: true,
            share_dashboards: true,
            suggestion_limit: 8,
            max_result_rows: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanResponse {
    pub success: bool,
}
