use crate::engine::DashboardEngine;
use crate::errors::{AppError, AppResult};
use crate::models::{
    reserved_name, ChartConfig, NewNamedQuery, ReportFilter, ReportOrigin, ResolvedReport, WidgetArchetype,
    WidgetKind,
};

impl DashboardEngine {
    /// Resolves the named query backing a report-driven widget, reusing a
    /// matching user report when the archetype allows it.
    pub async fn get_or_create_report(&self, archetype: &WidgetArchetype) -> AppResult<ResolvedReport> {
        if let Some(reserved) = archetype.reserved_report_name {
            self.purge_reserved(reserved).await;
            return self.create_report_for_widget(archetype).await;
        }

        if !archetype.keywords.is_empty() {
            if let Some(existing) = self.find_matching_report(archetype.keywords).await? {
                tracing::info!(
                    archetype = archetype.id,
                    report_id = %existing.id,
                    "reusing existing report for widget"
                );
                return Ok(ResolvedReport {
                    report_id: existing.id,
                    name: existing.name,
                    origin: ReportOrigin::Found,
                });
            }
        }

        self.create_report_for_widget(archetype).await
    }

    pub async fn create_report_for_widget(&self, archetype: &WidgetArchetype) -> AppResult<ResolvedReport> {
        let sql = archetype.fallback_sql.ok_or_else(|| {
            AppError::Synthesis(format!("Widget template {} has no fallback query", archetype.id))
        })?;

        let created = self
            .reports
            .create_report(NewNamedQuery {
                name: synthesized_name(archetype),
                description: archetype.description.to_string(),
                sql: sql.to_string(),
                category: self.settings.report_category.clone(),
                shared: self.settings.share_generated_reports,
                author: self.settings.report_author.clone(),
                chart_config: chart_config_for(archetype.kind),
            })
            .await
            .map_err(|error| {
                AppError::Synthesis(format!("Could not create report for {}: {}", archetype.id, error.message()))
            })?;
        self.cache.invalidate();

        tracing::info!(archetype = archetype.id, report_id = %created.id, "synthesized report for widget");
        Ok(ResolvedReport {
            report_id: created.id,
            name: created.name,
            origin: ReportOrigin::Created,
        })
    }

    /// Deletes earlier copies of a reserved report so regeneration picks up
    /// the current fallback text. Failures are logged and ignored.
    async fn purge_reserved(&self, name: &str) {
        let filter = ReportFilter {
            category: None,
            name_contains: Some(name.to_string()),
        };
        let existing = match self.reports.list_reports(&filter).await {
            Ok(reports) => reports,
            Err(error) => {
                tracing::warn!(name = %name, error = %error, "failed to list reserved reports");
                return;
            }
        };

        let mut removed = false;
        for report in existing.iter().filter(|report| report.name.eq_ignore_ascii_case(name)) {
            match self.reports.delete_report(&report.id).await {
                Ok(deleted) => {
                    removed |= deleted;
                    tracing::info!(report_id = %report.id, name = %name, "deleted reserved report before rebuild");
                }
                Err(error) => {
                    tracing::warn!(report_id = %report.id, error = %error, "failed to delete reserved report");
                }
            }
        }
        if removed {
            self.cache.invalidate();
        }
    }
}

pub(crate) fn synthesized_name(archetype: &WidgetArchetype) -> String {
    archetype
        .reserved_report_name
        .map(reserved_name)
        .unwrap_or_else(|| reserved_name(archetype.name))
}

fn chart_config_for(kind: WidgetKind) -> Option<ChartConfig> {
    let chart_type = match kind {
        WidgetKind::ChartBar => "bar",
        WidgetKind::ChartPie => "pie",
        _ => return None,
    };
    Some(ChartConfig {
        chart_type: Some(chart_type.to_string()),
        ..Default::default()
    })
}
