pub mod sqlite;

use crate::errors::AppResult;
use crate::models::{
    DashboardDefinition, DashboardUpdate, NamedQuery, NamedQueryUpdate, NewDashboard, NewNamedQuery, PlacedWidget,
    QueryParams, QueryResult, ReportFilter, WidgetPlacement,
};
use async_trait::async_trait;

/// Runs stored named queries against the reporting backend.
///
/// A failed execution is reported as an error whose message is the backend's
/// own text; the validation engine classifies that text verbatim.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, report_id: &str, params: &QueryParams) -> AppResult<QueryResult>;
    async fn fetch(&self, report_id: &str) -> AppResult<Option<NamedQuery>>;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn list_reports(&self, filter: &ReportFilter) -> AppResult<Vec<NamedQuery>>;
    async fn get_report(&self, id: &str) -> AppResult<Option<NamedQuery>>;
    async fn create_report(&self, report: NewNamedQuery) -> AppResult<NamedQuery>;
    async fn update_report(&self, id: &str, update: NamedQueryUpdate) -> AppResult<NamedQuery>;
    async fn delete_report(&self, id: &str) -> AppResult<bool>;
}

#[async_trait]
pub trait DashboardStore: Send + Sync {
    async fn create_dashboard(&self, dashboard: NewDashboard) -> AppResult<DashboardDefinition>;
    async fn get_dashboard(&self, id: &str) -> AppResult<Option<DashboardDefinition>>;
    async fn update_dashboard(&self, id: &str, update: DashboardUpdate) -> AppResult<DashboardDefinition>;
    async fn delete_dashboard(&self, id: &str) -> AppResult<bool>;
    async fn add_widget(&self, dashboard_id: &str, placement: WidgetPlacement) -> AppResult<PlacedWidget>;
    async fn update_widget(
        &self,
        dashboard_id: &str,
        widget_id: &str,
        placement: WidgetPlacement,
    ) -> AppResult<PlacedWidget>;
    async fn delete_widget(&self, dashboard_id: &str, widget_id: &str) -> AppResult<bool>;
}
