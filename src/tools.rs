use crate::engine::DashboardEngine;
use crate::errors::{AppError, AppResult};
use crate::models::{ChartConfig, DashboardUpdate, LayoutSelection};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Tool names accepted by [`dispatch`].
pub const TOOL_NAMES: &[&str] = &[
    "get_available_templates",
    "find_matching_report",
    "get_or_create_report",
    "build_widget",
    "build_dashboard",
    "add_widget_to_dashboard",
    "update_widget_layout",
    "remove_widget",
    "get_dashboard",
    "update_dashboard",
    "delete_dashboard",
    "suggest_widgets",
    "validate_report",
    "validate_and_fix_report",
    "validate_dashboard",
    "create_validated_report",
    "get_validated_sql",
    "list_validated_templates",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindMatchingReportPayload {
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchetypePayload {
    archetype_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildWidgetPayload {
    archetype_id: String,
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    title: Option<String>,
    color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildDashboardPayload {
    name: String,
    layout: LayoutSelection,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddWidgetPayload {
    dashboard_id: String,
    archetype_id: String,
    title: Option<String>,
    color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WidgetLayoutPayload {
    dashboard_id: String,
    widget_id: String,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WidgetRefPayload {
    dashboard_id: String,
    widget_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardRefPayload {
    dashboard_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDashboardPayload {
    dashboard_id: String,
    #[serde(flatten)]
    update: DashboardUpdate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestPayload {
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRefPayload {
    report_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateAndFixPayload {
    report_id: String,
    max_attempts: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateDashboardPayload {
    dashboard_id: String,
    auto_fix: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateValidatedReportPayload {
    name: String,
    sql: String,
    fallback_key: Option<String>,
    chart_config: Option<ChartConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateKeyPayload {
    key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionResponse {
    widget_ids: Vec<&'static str>,
}

/// Routes one tool call to the matching engine operation.
pub async fn dispatch(engine: &DashboardEngine, tool: &str, arguments: Value) -> AppResult<Value> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    tracing::debug!(tool = %tool, "dispatching tool call");

    match tool {
        "get_available_templates" => to_value(engine.get_available_templates()),
        "find_matching_report" => {
            let payload: FindMatchingReportPayload = parse(tool, arguments)?;
            to_value(engine.find_matching_report(&payload.keywords).await?)
        }
        "get_or_create_report" => {
            let payload: ArchetypePayload = parse(tool, arguments)?;
            let archetype = engine
                .widget_catalog()
                .get(&payload.archetype_id)
                .ok_or_else(|| AppError::NotFound(format!("Widget template not found: {}", payload.archetype_id)))?;
            to_value(engine.get_or_create_report(archetype).await?)
        }
        "build_widget" => {
            let payload: BuildWidgetPayload = parse(tool, arguments)?;
            to_value(
                engine
                    .build_widget(
                        &payload.archetype_id,
                        payload.x,
                        payload.y,
                        payload.title.as_deref(),
                        payload.color.as_deref(),
                    )
                    .await?,
            )
        }
        "build_dashboard" => {
            let payload: BuildDashboardPayload = parse(tool, arguments)?;
            to_value(
                engine
                    .build_dashboard(&payload.name, &payload.layout, payload.description.as_deref())
                    .await?,
            )
        }
        "add_widget_to_dashboard" => {
            let payload: AddWidgetPayload = parse(tool, arguments)?;
            to_value(
                engine
                    .add_widget_to_dashboard(
                        &payload.dashboard_id,
                        &payload.archetype_id,
                        payload.title.as_deref(),
                        payload.color.as_deref(),
                    )
                    .await?,
            )
        }
        "update_widget_layout" => {
            let payload: WidgetLayoutPayload = parse(tool, arguments)?;
            to_value(
                engine
                    .update_widget_layout(
                        &payload.dashboard_id,
                        &payload.widget_id,
                        payload.x,
                        payload.y,
                        payload.w,
                        payload.h,
                    )
                    .await?,
            )
        }
        "remove_widget" => {
            let payload: WidgetRefPayload = parse(tool, arguments)?;
            let success = engine.remove_widget(&payload.dashboard_id, &payload.widget_id).await?;
            Ok(json!({ "success": success }))
        }
        "get_dashboard" => {
            let payload: DashboardRefPayload = parse(tool, arguments)?;
            to_value(engine.get_dashboard(&payload.dashboard_id).await?)
        }
        "update_dashboard" => {
            let payload: UpdateDashboardPayload = parse(tool, arguments)?;
            to_value(engine.update_dashboard(&payload.dashboard_id, payload.update).await?)
        }
        "delete_dashboard" => {
            let payload: DashboardRefPayload = parse(tool, arguments)?;
            let success = engine.delete_dashboard(&payload.dashboard_id).await?;
            Ok(json!({ "success": success }))
        }
        "suggest_widgets" => {
            let payload: SuggestPayload = parse(tool, arguments)?;
            to_value(SuggestionResponse {
                widget_ids: engine.suggest_widgets_for_description(&payload.description),
            })
        }
        "validate_report" => {
            let payload: ReportRefPayload = parse(tool, arguments)?;
            to_value(engine.validate_report(&payload.report_id).await?)
        }
        "validate_and_fix_report" => {
            let payload: ValidateAndFixPayload = parse(tool, arguments)?;
            to_value(
                engine
                    .validate_and_fix_report(&payload.report_id, payload.max_attempts)
                    .await?,
            )
        }
        "validate_dashboard" => {
            let payload: ValidateDashboardPayload = parse(tool, arguments)?;
            to_value(engine.validate_dashboard(&payload.dashboard_id, payload.auto_fix).await?)
        }
        "create_validated_report" => {
            let payload: CreateValidatedReportPayload = parse(tool, arguments)?;
            to_value(
                engine
                    .create_validated_report(
                        &payload.name,
                        &payload.sql,
                        payload.fallback_key.as_deref(),
                        payload.chart_config,
                    )
                    .await?,
            )
        }
        "get_validated_sql" => {
            let payload: TemplateKeyPayload = parse(tool, arguments)?;
            to_value(engine.get_validated_sql(&payload.key)?)
        }
        "list_validated_templates" => to_value(engine.list_validated_templates()),
        other => Err(AppError::InvalidInput(format!("Unknown tool: {}", other))),
    }
}

fn parse<T: DeserializeOwned>(tool: &str, arguments: Value) -> AppResult<T> {
    serde_json::from_value(arguments)
        .map_err(|error| AppError::InvalidInput(format!("Invalid arguments for {}: {}", tool, error)))
}

fn to_value<T: Serialize>(value: T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(AppError::from)
}
