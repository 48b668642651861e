use crate::catalog::sql_templates;
use crate::classifier;
use crate::engine::DashboardEngine;
use crate::errors::{AppError, AppResult};
use crate::models::{
    AppliedFix, ChartConfig, CreateValidatedReportOutcome, DashboardValidationReport, FixOutcome, NamedQuery,
    NamedQueryUpdate, NewNamedQuery, QueryParams, ValidatedReportPath, ValidationResult, WidgetValidation,
};

/// One repair round: the first execution plus a re-run of its repair.
const CREATE_REPAIR_ATTEMPTS: u32 = 2;

impl ValidationResult {
    /// The failure as an error value, tagged by whether a signature matched.
    pub fn failure(&self) -> Option<AppError> {
        if self.valid {
            return None;
        }
        let message = self.error.clone().unwrap_or_else(|| "query failed".to_string());
        Some(match &self.signature {
            Some(signature) => AppError::ClassifiedQuery(format!("{} ({})", message, signature)),
            None => AppError::UnclassifiedQuery(message),
        })
    }
}

impl DashboardEngine {
    pub async fn validate_report(&self, report_id: &str) -> AppResult<ValidationResult> {
        let report = self.fetch_report(report_id).await?;
        Ok(self.execute_and_classify(&report).await)
    }

    /// Executes, classifies and repairs until the report runs, no repair is
    /// proposed, or `max_attempts` executions have happened. A repaired text
    /// only survives the call once an execution has confirmed it.
    pub async fn validate_and_fix_report(&self, report_id: &str, max_attempts: Option<u32>) -> AppResult<FixOutcome> {
        let max_attempts = max_attempts.unwrap_or(self.settings.max_fix_attempts);
        if max_attempts == 0 {
            return Err(AppError::InvalidInput("maxAttempts must be at least 1".to_string()));
        }
        let original = self.fetch_report(report_id).await?;

        let mut current = original.clone();
        let mut fixes = Vec::new();
        let mut executions = 0u32;
        let last = loop {
            let result = self.execute_and_classify(&current).await;
            executions += 1;
            if result.valid || executions >= max_attempts {
                break result;
            }
            let Some(repaired) = result.repaired_sql.clone() else {
                break result;
            };

            match self.reports.update_report(report_id, NamedQueryUpdate::sql(repaired.clone())).await {
                Ok(updated) => {
                    self.cache.invalidate();
                    tracing::info!(
                        report_id = %report_id,
                        signature = result.signature.as_deref().unwrap_or_default(),
                        attempt = executions,
                        "applied query repair candidate"
                    );
                    fixes.push(AppliedFix {
                        signature: result.signature.clone().unwrap_or_default(),
                        description: result.fix_description.clone().unwrap_or_default(),
                        sql: repaired,
                    });
                    current = updated;
                }
                Err(error) => {
                    tracing::warn!(report_id = %report_id, error = %error, "failed to persist repair candidate");
                    if !fixes.is_empty() {
                        self.restore_original(&original).await?;
                    }
                    return Err(error);
                }
            }
        };

        let restored_original = !last.valid && !fixes.is_empty();
        if restored_original {
            self.restore_original(&original).await?;
        }
        if let Some(failure) = last.failure() {
            tracing::warn!(report_id = %report_id, executions, error = %failure, "report is still failing");
        }

        Ok(FixOutcome {
            report_id: report_id.to_string(),
            valid: last.valid,
            executions,
            fixes,
            restored_original,
            last,
        })
    }

    /// Validates every report-backed widget in stored order. Filter-backed
    /// widgets are counted as skipped; a failing widget never aborts the run.
    pub async fn validate_dashboard(
        &self,
        dashboard_id: &str,
        auto_fix: Option<bool>,
    ) -> AppResult<DashboardValidationReport> {
        let dashboard = self.get_dashboard(dashboard_id).await?;
        let auto_fix = auto_fix.unwrap_or(true);

        let mut report = DashboardValidationReport {
            dashboard_id: dashboard.id.clone(),
            checked: 0,
            validated: 0,
            failed: 0,
            fixed: 0,
            skipped: 0,
            widgets: Vec::new(),
        };

        for widget in &dashboard.widgets {
            let Some(report_id) = widget.placement.binding.report_id() else {
                report.skipped += 1;
                continue;
            };
            report.checked += 1;

            let (valid, fixed, error) = if auto_fix {
                match self.validate_and_fix_report(report_id, None).await {
                    Ok(outcome) => (outcome.valid, outcome.valid && !outcome.fixes.is_empty(), outcome.last.error),
                    Err(error) => (false, false, Some(error.to_string())),
                }
            } else {
                match self.validate_report(report_id).await {
                    Ok(result) => (result.valid, false, result.error),
                    Err(error) => (false, false, Some(error.to_string())),
                }
            };

            if valid {
                report.validated += 1;
            } else {
                report.failed += 1;
            }
            if fixed {
                report.fixed += 1;
            }
            report.widgets.push(WidgetValidation {
                widget_id: widget.id.clone(),
                title: widget.placement.title.clone(),
                report_id: report_id.to_string(),
                valid,
                fixed,
                error,
            });
        }

        tracing::info!(
            dashboard_id = %dashboard_id,
            checked = report.checked,
            failed = report.failed,
            fixed = report.fixed,
            "dashboard validated"
        );
        Ok(report)
    }

    /// Saves a new report and proves it runs, falling back to a known-good
    /// library query when the supplied text cannot be repaired. The fallback
    /// gets the same single repair round as the supplied text.
    pub async fn create_validated_report(
        &self,
        name: &str,
        sql: &str,
        fallback_key: Option<&str>,
        chart_config: Option<ChartConfig>,
    ) -> AppResult<CreateValidatedReportOutcome> {
        let created = self
            .reports
            .create_report(NewNamedQuery {
                name: name.to_string(),
                description: String::new(),
                sql: sql.to_string(),
                category: self.settings.report_category.clone(),
                shared: self.settings.share_generated_reports,
                author: self.settings.report_author.clone(),
                chart_config: chart_config.clone(),
            })
            .await?;
        self.cache.invalidate();

        let outcome = self
            .validate_and_fix_report(&created.id, Some(CREATE_REPAIR_ATTEMPTS))
            .await?;
        if outcome.valid {
            return Ok(CreateValidatedReportOutcome {
                path: ValidatedReportPath::Original,
                report_id: Some(created.id),
                repaired: !outcome.fixes.is_empty(),
                row_count: outcome.last.row_count,
                errors: Vec::new(),
            });
        }

        let mut errors: Vec<String> = outcome.last.failure().map(|error| error.to_string()).into_iter().collect();
        self.discard_report(&created.id).await;

        let Some(key) = fallback_key else {
            return Ok(failed_outcome(errors));
        };
        let Some(template) = sql_templates::validated_template(key) else {
            errors.push(AppError::NotFound(format!("Validated template not found: {}", key)).to_string());
            return Ok(failed_outcome(errors));
        };

        let fallback = self
            .reports
            .create_report(NewNamedQuery {
                name: name.to_string(),
                description: template.description.to_string(),
                sql: template.sql.to_string(),
                category: self.settings.report_category.clone(),
                shared: self.settings.share_generated_reports,
                author: self.settings.report_author.clone(),
                chart_config: chart_config.or_else(|| {
                    template.chart_type.map(|chart_type| ChartConfig {
                        chart_type: Some(chart_type.to_string()),
                        ..Default::default()
                    })
                }),
            })
            .await?;
        self.cache.invalidate();

        let checked = self
            .validate_and_fix_report(&fallback.id, Some(CREATE_REPAIR_ATTEMPTS))
            .await?;
        if checked.valid {
            tracing::info!(report_id = %fallback.id, template = template.key, "stored validated fallback report");
            return Ok(CreateValidatedReportOutcome {
                path: ValidatedReportPath::Fallback,
                report_id: Some(fallback.id),
                repaired: !checked.fixes.is_empty(),
                row_count: checked.last.row_count,
                errors,
            });
        }

        errors.extend(checked.last.failure().map(|error| error.to_string()));
        self.discard_report(&fallback.id).await;
        Ok(failed_outcome(errors))
    }

    async fn fetch_report(&self, report_id: &str) -> AppResult<NamedQuery> {
        self.executor
            .fetch(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report not found: {}", report_id)))
    }

    async fn execute_and_classify(&self, report: &NamedQuery) -> ValidationResult {
        match self.executor.execute(&report.id, &QueryParams::new()).await {
            Ok(result) => ValidationResult {
                report_id: report.id.clone(),
                valid: true,
                executed: true,
                row_count: Some(result.row_count),
                error: None,
                signature: None,
                fix_description: None,
                repaired_sql: None,
            },
            Err(error) => {
                let message = error.message().to_string();
                let classification = classifier::analyze(&report.sql, &message);
                tracing::debug!(
                    report_id = %report.id,
                    error = %message,
                    matched = classification.matched,
                    "report execution failed"
                );
                ValidationResult {
                    report_id: report.id.clone(),
                    valid: false,
                    executed: true,
                    row_count: None,
                    error: Some(message),
                    signature: classification.signature,
                    fix_description: classification.description,
                    repaired_sql: classification.repaired_sql,
                }
            }
        }
    }

    async fn restore_original(&self, original: &NamedQuery) -> AppResult<()> {
        self.reports
            .update_report(&original.id, NamedQueryUpdate::sql(original.sql.clone()))
            .await?;
        self.cache.invalidate();
        tracing::warn!(report_id = %original.id, "repairs did not converge; restored original query text");
        Ok(())
    }

    async fn discard_report(&self, report_id: &str) {
        if let Err(error) = self.reports.delete_report(report_id).await {
            tracing::warn!(report_id = %report_id, error = %error, "failed to delete broken report");
        }
        self.cache.invalidate();
    }
}

fn failed_outcome(errors: Vec<String>) -> CreateValidatedReportOutcome {
    CreateValidatedReportOutcome {
        path: ValidatedReportPath::Failed,
        report_id: None,
        repaired: false,
        row_count: None,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::AppError;
    use crate::models::{LayoutSelection, NewNamedQuery, ValidatedReportPath};
    use crate::test_support::harness;

    fn report(name: &str, sql: &str) -> NewNamedQuery {
        NewNamedQuery {
            name: name.to_string(),
            description: String::new(),
            sql: sql.to_string(),
            category: "Tests".to_string(),
            shared: true,
            author: "tests".to_string(),
            chart_config: None,
        }
    }

    #[tokio::test]
    async fn valid_reports_carry_row_counts() {
        let harness = harness();
        let engine = harness.engine();
        let created = harness
            .db
            .create_report(report("Status", crate::catalog::sql_templates::TICKETS_BY_STATUS_SQL))
            .expect("create");

        let result = engine.validate_report(&created.id).await.expect("validate");
        assert!(result.valid);
        assert!(result.executed);
        assert_eq!(result.row_count, Some(3));
        assert!(result.failure().is_none());
    }

    #[tokio::test]
    async fn unknown_table_is_classified_and_fixed() {
        let harness = harness();
        let engine = harness.engine();
        let broken = "SELECT COUNT(*) AS Total FROM Tickets WHERE Status <> 9 AND FDeleted = 0";
        let created = harness.db.create_report(report("Open", broken)).expect("create");

        let result = engine.validate_report(&created.id).await.expect("validate");
        assert!(!result.valid);
        assert_eq!(result.signature.as_deref(), Some("unknown_table"));
        let repaired = result.repaired_sql.clone().expect("repair");
        assert!(repaired.contains("FROM Faults"));
        assert!(matches!(result.failure(), Some(AppError::ClassifiedQuery(_))));

        let outcome = engine.validate_and_fix_report(&created.id, None).await.expect("fix");
        assert!(outcome.valid);
        assert_eq!(outcome.executions, 2);
        assert_eq!(outcome.fixes.len(), 1);
        assert_eq!(outcome.last.row_count, Some(1));
        let stored = harness.db.get_report(&created.id).expect("get").expect("stored");
        assert_eq!(stored.sql, repaired);
    }

    #[tokio::test]
    async fn unfixable_errors_stop_after_one_execution() {
        let harness = harness();
        let engine = harness.engine();
        let broken = "SELECT COUNT(*) FROM Widgets";
        let created = harness.db.create_report(report("Widgets", broken)).expect("create");

        let outcome = engine.validate_and_fix_report(&created.id, Some(3)).await.expect("fix");
        assert!(!outcome.valid);
        assert_eq!(outcome.executions, 1);
        assert!(!outcome.restored_original);
        assert!(matches!(outcome.last.failure(), Some(AppError::UnclassifiedQuery(_))));
        assert_eq!(harness.db.get_report(&created.id).expect("get").expect("stored").sql, broken);
    }

    #[tokio::test]
    async fn unconverged_repairs_restore_the_original_text() {
        let harness = harness();
        let engine = harness.engine();
        // Table repair succeeds, then the column error has no mapping.
        let broken = "SELECT Mystery FROM Tickets";
        let created = harness.db.create_report(report("Mystery", broken)).expect("create");

        let outcome = engine.validate_and_fix_report(&created.id, Some(3)).await.expect("fix");
        assert!(!outcome.valid);
        assert_eq!(outcome.executions, 2);
        assert!(outcome.restored_original);
        assert_eq!(harness.db.get_report(&created.id).expect("get").expect("stored").sql, broken);
    }

    #[tokio::test]
    async fn zero_attempts_is_rejected_before_executing() {
        let harness = harness();
        let engine = harness.engine();
        let broken = "SELECT COUNT(*) FROM Tickets";
        let created = harness.db.create_report(report("Zero", broken)).expect("create");

        let error = engine
            .validate_and_fix_report(&created.id, Some(0))
            .await
            .expect_err("zero attempts");
        assert!(matches!(error, AppError::InvalidInput(_)));
        assert_eq!(harness.db.get_report(&created.id).expect("get").expect("stored").sql, broken);
    }

    #[tokio::test]
    async fn missing_reports_are_not_found() {
        let harness = harness();
        let engine = harness.engine();
        assert!(matches!(engine.validate_report("missing").await, Err(AppError::NotFound(_))));
        assert!(matches!(
            engine.validate_and_fix_report("missing", None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn dashboards_are_validated_widget_by_widget() {
        let harness = harness();
        let engine = harness.engine();
        let dashboard = engine
            .build_dashboard("SLA", &LayoutSelection::Preset("sla-monitor".to_string()), None)
            .await
            .expect("build")
            .dashboard
            .expect("dashboard");

        let broken_id = dashboard.widgets[0]
            .placement
            .binding
            .report_id()
            .expect("report widget")
            .to_string();
        harness
            .db
            .update_report(
                &broken_id,
                crate::models::NamedQueryUpdate::sql("SELECT SLAState, COUNT(*) FROM tickets GROUP BY SLAState"),
            )
            .expect("break report");

        let report = engine.validate_dashboard(&dashboard.id, None).await.expect("validate");
        assert_eq!(report.checked, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.validated, 3);
        assert_eq!(report.fixed, 1);
        assert_eq!(report.failed, 0);
        assert!(report.widgets[0].fixed);
    }

    #[tokio::test]
    async fn dashboards_can_be_checked_without_repairs() {
        let harness = harness();
        let engine = harness.engine();
        let dashboard = engine
            .build_dashboard("SLA", &LayoutSelection::Preset("sla-monitor".to_string()), None)
            .await
            .expect("build")
            .dashboard
            .expect("dashboard");

        let broken_id = dashboard.widgets[0]
            .placement
            .binding
            .report_id()
            .expect("report widget")
            .to_string();
        let broken = "SELECT SLAState, COUNT(*) FROM tickets GROUP BY SLAState";
        harness
            .db
            .update_report(&broken_id, crate::models::NamedQueryUpdate::sql(broken))
            .expect("break report");

        let report = engine.validate_dashboard(&dashboard.id, Some(false)).await.expect("validate");
        assert_eq!(report.checked, 3);
        assert_eq!(report.validated, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.fixed, 0);
        assert!(!report.widgets[0].valid);
        assert!(!report.widgets[0].fixed);
        assert!(report.widgets[0].error.is_some());
        assert_eq!(harness.db.get_report(&broken_id).expect("get").expect("stored").sql, broken);
    }

    #[tokio::test]
    async fn validated_reports_fall_back_to_the_library() {
        let harness = harness();
        let engine = harness.engine();

        let original = engine
            .create_validated_report("Open tickets", "SELECT COUNT(*) AS Total FROM tickets", None, None)
            .await
            .expect("create");
        assert_eq!(original.path, ValidatedReportPath::Original);
        assert!(original.repaired);

        let fallback = engine
            .create_validated_report("Mystery", "SELECT Mystery FROM Nowhere", Some("open_ticket_count"), None)
            .await
            .expect("create");
        assert_eq!(fallback.path, ValidatedReportPath::Fallback);
        assert_eq!(fallback.errors.len(), 1);
        let stored = harness
            .db
            .get_report(fallback.report_id.as_deref().expect("id"))
            .expect("get")
            .expect("stored");
        assert_eq!(stored.sql, crate::catalog::sql_templates::OPEN_TICKET_COUNT_SQL);

        let failed = engine
            .create_validated_report("Nothing", "SELECT Mystery FROM Nowhere", Some("nope"), None)
            .await
            .expect("create");
        assert_eq!(failed.path, ValidatedReportPath::Failed);
        assert_eq!(failed.errors.len(), 2);

        let names: Vec<String> = harness
            .db
            .list_reports(&Default::default())
            .expect("list")
            .into_iter()
            .map(|report| report.name)
            .collect();
        assert_eq!(names, vec!["Open tickets".to_string(), "Mystery".to_string()]);
    }
}
