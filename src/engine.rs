use crate::adapters::{DashboardStore, QueryExecutor, ReportStore};
use crate::cache::ReportCache;
use crate::catalog::{self, sql_templates, LayoutCatalog, WidgetTemplateCatalog};
use crate::errors::{AppError, AppResult};
use crate::matcher::ReportMatcher;
use crate::models::{
    AvailableTemplates, DashboardDefinition, DashboardUpdate, EngineSettings, NamedQuery, ValidatedTemplate,
    ValidatedTemplateSummary,
};
use crate::suggest;
use std::sync::Arc;

/// Owns the collaborators, the report cache and the settings every
/// synthesis and validation operation runs against.
pub struct DashboardEngine {
    pub(crate) reports: Arc<dyn ReportStore>,
    pub(crate) dashboards: Arc<dyn DashboardStore>,
    pub(crate) executor: Arc<dyn QueryExecutor>,
    pub(crate) cache: ReportCache,
    pub(crate) settings: EngineSettings,
    pub(crate) widgets: WidgetTemplateCatalog,
    pub(crate) layouts: LayoutCatalog,
}

impl DashboardEngine {
    pub fn new(
        reports: Arc<dyn ReportStore>,
        dashboards: Arc<dyn DashboardStore>,
        executor: Arc<dyn QueryExecutor>,
        settings: EngineSettings,
    ) -> Self {
        Self::with_catalogs(
            reports,
            dashboards,
            executor,
            settings,
            WidgetTemplateCatalog::builtin(),
            LayoutCatalog::builtin(),
        )
    }

    pub fn with_catalogs(
        reports: Arc<dyn ReportStore>,
        dashboards: Arc<dyn DashboardStore>,
        executor: Arc<dyn QueryExecutor>,
        settings: EngineSettings,
        widgets: WidgetTemplateCatalog,
        layouts: LayoutCatalog,
    ) -> Self {
        Self {
            reports,
            dashboards,
            executor,
            cache: ReportCache::new(),
            settings,
            widgets,
            layouts,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn widget_catalog(&self) -> &WidgetTemplateCatalog {
        &self.widgets
    }

    pub fn get_available_templates(&self) -> AvailableTemplates {
        catalog::available_templates(&self.widgets, &self.layouts)
    }

    pub async fn find_matching_report<S: AsRef<str> + Sync>(&self, keywords: &[S]) -> AppResult<Option<NamedQuery>> {
        let reports = self.cache.all(self.reports.as_ref()).await?;
        let matcher = ReportMatcher::new(self.settings.match_threshold);
        let hit = matcher.best_match(&reports, keywords).cloned();
        if let Some(report) = &hit {
            tracing::debug!(report_id = %report.id, name = %report.name, "matched existing report");
        }
        Ok(hit)
    }

    pub fn suggest_widgets_for_description(&self, description: &str) -> Vec<&'static str> {
        suggest::suggest_widgets(description, usize::MAX)
            .into_iter()
            .filter(|id| self.widgets.get(id).is_some())
            .take(self.settings.suggestion_limit)
            .collect()
    }

    pub fn get_validated_sql(&self, key: &str) -> AppResult<&'static ValidatedTemplate> {
        sql_templates::validated_template(key)
            .ok_or_else(|| AppError::NotFound(format!("Validated template not found: {}", key)))
    }

    pub fn list_validated_templates(&self) -> Vec<ValidatedTemplateSummary> {
        sql_templates::validated_templates()
            .iter()
            .map(|template| ValidatedTemplateSummary {
                key: template.key.to_string(),
                name: template.name.to_string(),
                description: template.description.to_string(),
                category: template.category.to_string(),
            })
            .collect()
    }

    // ─── Dashboard maintenance ──────────────────────────────────────────────

    pub async fn get_dashboard(&self, dashboard_id: &str) -> AppResult<DashboardDefinition> {
        self.dashboards
            .get_dashboard(dashboard_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Dashboard not found: {}", dashboard_id)))
    }

    pub async fn update_dashboard(&self, dashboard_id: &str, update: DashboardUpdate) -> AppResult<DashboardDefinition> {
        if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(AppError::InvalidInput("Dashboard name cannot be empty".to_string()));
        }
        self.dashboards.update_dashboard(dashboard_id, update).await
    }

    pub async fn delete_dashboard(&self, dashboard_id: &str) -> AppResult<bool> {
        let deleted = self.dashboards.delete_dashboard(dashboard_id).await?;
        tracing::info!(dashboard_id = %dashboard_id, deleted, "dashboard delete requested");
        Ok(deleted)
    }

    pub async fn remove_widget(&self, dashboard_id: &str, widget_id: &str) -> AppResult<bool> {
        self.dashboards.delete_widget(dashboard_id, widget_id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::{LayoutCatalog, WidgetTemplateCatalog};
    use crate::engine::DashboardEngine;
    use crate::errors::AppError;
    use crate::models::{DashboardUpdate, EngineSettings, NewNamedQuery, WidgetArchetype};
    use crate::test_support::harness;

    #[tokio::test]
    async fn lists_templates_and_validated_library() {
        let harness = harness();
        let engine = harness.engine();

        let templates = engine.get_available_templates();
        assert!(templates.widgets.iter().any(|widget| widget.id == "tickets_by_priority"));
        assert!(templates.layouts.iter().any(|layout| layout.name == "service-desk-overview"));

        let library = engine.list_validated_templates();
        assert!(library.iter().any(|template| template.key == "sla_compliance"));
        assert!(engine.get_validated_sql("OPEN_TICKET_COUNT").is_ok());
        assert!(matches!(engine.get_validated_sql("nope"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn suggestions_fill_the_limit_from_the_loaded_catalog() {
        let harness = harness();
        let kept: Vec<WidgetArchetype> = WidgetTemplateCatalog::builtin()
            .all()
            .iter()
            .filter(|archetype| archetype.id != "agent_workload")
            .cloned()
            .collect();
        let settings = EngineSettings {
            suggestion_limit: 2,
            ..Default::default()
        };
        let engine = DashboardEngine::with_catalogs(
            harness.db.clone(),
            harness.db.clone(),
            harness.executor.clone(),
            settings,
            WidgetTemplateCatalog::from_static(Box::leak(kept.into_boxed_slice())),
            LayoutCatalog::builtin(),
        );

        assert_eq!(
            engine.suggest_widgets_for_description("Agent workload and SLA performance"),
            vec!["closed_by_agent", "sla_compliance"]
        );
    }

    #[tokio::test]
    async fn find_matching_report_reads_through_the_cache() {
        let harness = harness();
        let engine = harness.engine();
        assert!(engine.find_matching_report(&["priority"]).await.expect("match").is_none());

        harness
            .db
            .create_report(NewNamedQuery {
                name: "Tickets By Priority Report".to_string(),
                description: String::new(),
                sql: "SELECT 1".to_string(),
                category: "Manual".to_string(),
                shared: true,
                author: "alice".to_string(),
                chart_config: None,
            })
            .expect("create");

        // Stale until the engine itself mutates or invalidates.
        assert!(engine.find_matching_report(&["priority"]).await.expect("match").is_none());
        engine.cache.invalidate();
        let hit = engine.find_matching_report(&["priority"]).await.expect("match");
        assert_eq!(hit.map(|report| report.name).as_deref(), Some("Tickets By Priority Report"));
    }

    #[tokio::test]
    async fn blank_dashboard_rename_is_rejected() {
        let harness = harness();
        let engine = harness.engine();
        let update = DashboardUpdate {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            engine.update_dashboard("any", update).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(engine.get_dashboard("missing").await, Err(AppError::NotFound(_))));
    }
}
