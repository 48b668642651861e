use async_trait::async_trait;
use chrono::Utc;
use dashboard_synth_lib::classifier;
use dashboard_synth_lib::models::{
    BuildStatus, DashboardDefinition, DashboardUpdate, LayoutSelection, NamedQuery, NamedQueryUpdate, NewDashboard,
    NewNamedQuery, PlacedWidget, QueryParams, QueryResult, ReportFilter, ReportOrigin, WidgetArchetype,
    WidgetBinding, WidgetKind, WidgetPlacement,
};
use dashboard_synth_lib::{AppError, AppResult, DashboardEngine, DashboardStore, QueryExecutor, ReportStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MemoryStore {
    reports: Mutex<Vec<NamedQuery>>,
    dashboards: Mutex<Vec<DashboardDefinition>>,
    listings: Mutex<Vec<ReportFilter>>,
    next_id: AtomicUsize,
    fail_report_create: AtomicBool,
    fail_dashboard_create: AtomicBool,
}

impl MemoryStore {
    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn seed(&self, name: &str, sql: &str) -> NamedQuery {
        let now = Utc::now();
        let report = NamedQuery {
            id: self.next_id("report"),
            name: name.to_string(),
            description: String::new(),
            sql: sql.to_string(),
            category: "Manual".to_string(),
            shared: false,
            author: "alice".to_string(),
            chart_config: None,
            created_at: now,
            updated_at: now,
        };
        self.reports.lock().unwrap().push(report.clone());
        report
    }

    fn reports_named(&self, name: &str) -> usize {
        self.reports.lock().unwrap().iter().filter(|report| report.name == name).count()
    }

    fn full_listings(&self) -> usize {
        self.listings
            .lock()
            .unwrap()
            .iter()
            .filter(|filter| filter.name_contains.is_none() && filter.category.is_none())
            .count()
    }

    fn stored_sql(&self, id: &str) -> String {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|report| report.id == id)
            .map(|report| report.sql.clone())
            .unwrap()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn list_reports(&self, filter: &ReportFilter) -> AppResult<Vec<NamedQuery>> {
        self.listings.lock().unwrap().push(filter.clone());
        let needle = filter.name_contains.as_ref().map(|name| name.to_lowercase());
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|report| {
                needle
                    .as_ref()
                    .map_or(true, |needle| report.name.to_lowercase().contains(needle))
            })
            .cloned()
            .collect())
    }

    async fn get_report(&self, id: &str) -> AppResult<Option<NamedQuery>> {
        Ok(self.reports.lock().unwrap().iter().find(|report| report.id == id).cloned())
    }

    async fn create_report(&self, report: NewNamedQuery) -> AppResult<NamedQuery> {
        if self.fail_report_create.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("report store unavailable".to_string()));
        }
        let now = Utc::now();
        let created = NamedQuery {
            id: self.next_id("report"),
            name: report.name,
            description: report.description,
            sql: report.sql,
            category: report.category,
            shared: report.shared,
            author: report.author,
            chart_config: report.chart_config,
            created_at: now,
            updated_at: now,
        };
        self.reports.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_report(&self, id: &str, update: NamedQueryUpdate) -> AppResult<NamedQuery> {
        let mut reports = self.reports.lock().unwrap();
        let report = reports
            .iter_mut()
            .find(|report| report.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        if let Some(sql) = update.sql {
            report.sql = sql;
        }
        if let Some(name) = update.name {
            report.name = name;
        }
        report.updated_at = Utc::now();
        Ok(report.clone())
    }

    async fn delete_report(&self, id: &str) -> AppResult<bool> {
        let mut reports = self.reports.lock().unwrap();
        let before = reports.len();
        reports.retain(|report| report.id != id);
        Ok(reports.len() != before)
    }
}

#[async_trait]
impl DashboardStore for MemoryStore {
    async fn create_dashboard(&self, dashboard: NewDashboard) -> AppResult<DashboardDefinition> {
        if self.fail_dashboard_create.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("dashboard store unavailable".to_string()));
        }
        let now = Utc::now();
        let created = DashboardDefinition {
            id: self.next_id("dashboard"),
            name: dashboard.name,
            description: dashboard.description,
            shared: dashboard.shared,
            widgets: dashboard
                .widgets
                .into_iter()
                .enumerate()
                .map(|(position, placement)| PlacedWidget {
                    id: self.next_id("widget"),
                    position: position as i32,
                    placement,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        self.dashboards.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn get_dashboard(&self, id: &str) -> AppResult<Option<DashboardDefinition>> {
        Ok(self.dashboards.lock().unwrap().iter().find(|dashboard| dashboard.id == id).cloned())
    }

    async fn update_dashboard(&self, id: &str, update: DashboardUpdate) -> AppResult<DashboardDefinition> {
        let mut dashboards = self.dashboards.lock().unwrap();
        let dashboard = dashboards
            .iter_mut()
            .find(|dashboard| dashboard.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        if let Some(name) = update.name {
            dashboard.name = name;
        }
        Ok(dashboard.clone())
    }

    async fn delete_dashboard(&self, id: &str) -> AppResult<bool> {
        let mut dashboards = self.dashboards.lock().unwrap();
        let before = dashboards.len();
        dashboards.retain(|dashboard| dashboard.id != id);
        Ok(dashboards.len() != before)
    }

    async fn add_widget(&self, dashboard_id: &str, placement: WidgetPlacement) -> AppResult<PlacedWidget> {
        let id = self.next_id("widget");
        let mut dashboards = self.dashboards.lock().unwrap();
        let dashboard = dashboards
            .iter_mut()
            .find(|dashboard| dashboard.id == dashboard_id)
            .ok_or_else(|| AppError::NotFound(dashboard_id.to_string()))?;
        let widget = PlacedWidget {
            id,
            position: dashboard.widgets.len() as i32,
            placement,
        };
        dashboard.widgets.push(widget.clone());
        Ok(widget)
    }

    async fn update_widget(
        &self,
        dashboard_id: &str,
        widget_id: &str,
        placement: WidgetPlacement,
    ) -> AppResult<PlacedWidget> {
        let mut dashboards = self.dashboards.lock().unwrap();
        let widget = dashboards
            .iter_mut()
            .filter(|dashboard| dashboard.id == dashboard_id)
            .flat_map(|dashboard| dashboard.widgets.iter_mut())
            .find(|widget| widget.id == widget_id)
            .ok_or_else(|| AppError::NotFound(widget_id.to_string()))?;
        widget.placement = placement;
        Ok(widget.clone())
    }

    async fn delete_widget(&self, dashboard_id: &str, widget_id: &str) -> AppResult<bool> {
        let mut dashboards = self.dashboards.lock().unwrap();
        let Some(dashboard) = dashboards.iter_mut().find(|dashboard| dashboard.id == dashboard_id) else {
            return Ok(false);
        };
        let before = dashboard.widgets.len();
        dashboard.widgets.retain(|widget| widget.id != widget_id);
        Ok(dashboard.widgets.len() != before)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    /// Fails like a server missing friendly table names.
    Schema,
    /// Every execution reports a new missing GROUP BY column.
    NeverConverges,
}

struct CountingExecutor {
    store: Arc<MemoryStore>,
    behaviour: Behaviour,
    executions: AtomicUsize,
}

impl CountingExecutor {
    fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for CountingExecutor {
    async fn execute(&self, report_id: &str, _params: &QueryParams) -> AppResult<QueryResult> {
        let run = self.executions.fetch_add(1, Ordering::SeqCst);
        let report = self
            .store
            .get_report(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(report_id.to_string()))?;

        if self.behaviour == Behaviour::NeverConverges {
            return Err(AppError::Query(format!(
                "Column 'Faults.c{}' is invalid in the select list because it is not contained in either an aggregate function or the GROUP BY clause.",
                run
            )));
        }
        if report.sql.contains("FROM Tickets") {
            return Err(AppError::Query("Invalid object name 'Tickets'.".to_string()));
        }
        if report.sql.contains("Restricted") {
            return Err(AppError::Query("The SELECT permission was denied on the object 'Restricted'.".to_string()));
        }
        Ok(QueryResult {
            columns: vec!["Total".to_string()],
            rows: vec![vec![serde_json::json!(3)]],
            row_count: 1,
        })
    }

    async fn fetch(&self, report_id: &str) -> AppResult<Option<NamedQuery>> {
        self.store.get_report(report_id).await
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    executor: Arc<CountingExecutor>,
    engine: DashboardEngine,
}

fn fixture(behaviour: Behaviour) -> Fixture {
    let store = Arc::new(MemoryStore::default());
    let executor = Arc::new(CountingExecutor {
        store: store.clone(),
        behaviour,
        executions: AtomicUsize::new(0),
    });
    let engine = DashboardEngine::new(store.clone(), store.clone(), executor.clone(), Default::default());
    Fixture {
        store,
        executor,
        engine,
    }
}

fn query_counter(keywords: &'static [&'static str]) -> WidgetArchetype {
    WidgetArchetype {
        id: "custom_counter",
        name: "Custom Counter",
        description: "Counter used by tests",
        kind: WidgetKind::CounterFromQuery,
        keywords,
        fallback_sql: Some("SELECT COUNT(*) AS Total FROM Faults"),
        reserved_report_name: None,
        filter_id: None,
        area_id: None,
        color: "#111111",
        width: 3,
        height: 2,
    }
}

#[tokio::test]
async fn empty_keywords_never_consult_the_matcher() {
    let fixture = fixture(Behaviour::Schema);
    let resolved = fixture
        .engine
        .get_or_create_report(&query_counter(&[]))
        .await
        .expect("resolve");
    assert_eq!(resolved.origin, ReportOrigin::Created);
    assert_eq!(fixture.store.full_listings(), 0);

    fixture
        .engine
        .get_or_create_report(&query_counter(&["counter"]))
        .await
        .expect("resolve");
    assert_eq!(fixture.store.full_listings(), 1);
}

#[tokio::test]
async fn reserved_archetypes_stay_unique_across_rebuilds() {
    let fixture = fixture(Behaviour::Schema);
    let layout = LayoutSelection::Explicit(vec!["sla_compliance".to_string(), "agent_workload".to_string()]);

    for _ in 0..2 {
        let result = fixture
            .engine
            .build_dashboard("SLA", &layout, None)
            .await
            .expect("build");
        assert_eq!(result.status, BuildStatus::Complete);
    }
    assert_eq!(fixture.store.reports_named("[auto] SLA Compliance"), 1);
    assert_eq!(fixture.store.reports_named("[auto] Agent Workload"), 1);
}

#[tokio::test]
async fn four_four_four_six_wraps_the_last_widget() {
    let fixture = fixture(Behaviour::Schema);
    let layout = LayoutSelection::Explicit(
        ["tickets_by_priority", "tickets_by_team", "tickets_by_type", "agent_workload"]
            .iter()
            .map(|id| id.to_string())
            .collect(),
    );

    let dashboard = fixture
        .engine
        .build_dashboard("Packing", &layout, None)
        .await
        .expect("build")
        .dashboard
        .expect("dashboard");
    let slots: Vec<(i32, i32, i32)> = dashboard
        .widgets
        .iter()
        .map(|widget| (widget.placement.x, widget.placement.y, widget.placement.w))
        .collect();
    assert_eq!(slots, vec![(0, 0, 4), (4, 0, 4), (8, 0, 4), (0, 4, 6)]);
}

#[tokio::test]
async fn filter_counters_need_no_reports() {
    let fixture = fixture(Behaviour::Schema);
    let result = fixture
        .engine
        .build_dashboard(
            "Mine",
            &LayoutSelection::Explicit(vec!["my_open_tickets".to_string()]),
            None,
        )
        .await
        .expect("build");

    let dashboard = result.dashboard.expect("dashboard");
    assert_eq!(dashboard.widgets.len(), 1);
    assert_eq!(
        dashboard.widgets[0].placement.binding,
        WidgetBinding::Filter {
            filter_id: 1,
            area_id: Some(1)
        }
    );
    assert!(result.created.is_empty());
    assert!(fixture.store.reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn priority_pie_creates_or_reuses() {
    let fixture = fixture(Behaviour::Schema);
    let archetype = fixture
        .engine
        .widget_catalog()
        .get("tickets_by_priority")
        .expect("archetype");

    let created = fixture.engine.get_or_create_report(archetype).await.expect("create");
    assert_eq!(created.origin, ReportOrigin::Created);

    let existing = fixture.store.seed("Tickets By Priority Report", "SELECT 1 FROM Faults");
    let reused = fixture.engine.get_or_create_report(archetype).await.expect("reuse");
    assert_eq!(reused.origin, ReportOrigin::Found);
    assert_eq!(reused.report_id, existing.id);
}

#[tokio::test]
async fn missing_table_is_repaired_then_valid() {
    let fixture = fixture(Behaviour::Schema);
    let report = fixture
        .store
        .seed("Open", "SELECT COUNT(*) AS Total FROM Tickets WHERE Status <> 9");

    let first = fixture.engine.validate_report(&report.id).await.expect("validate");
    assert!(!first.valid);
    assert_eq!(first.error.as_deref(), Some("Invalid object name 'Tickets'."));
    let repaired = first.repaired_sql.expect("repair");
    assert_eq!(repaired, "SELECT COUNT(*) AS Total FROM Faults WHERE Status <> 9");

    fixture
        .store
        .update_report(&report.id, NamedQueryUpdate::sql(repaired))
        .await
        .expect("apply");
    let second = fixture.engine.validate_report(&report.id).await.expect("revalidate");
    assert!(second.valid);
    assert_eq!(second.row_count, Some(1));
}

#[tokio::test]
async fn unclassifiable_failure_executes_once() {
    let fixture = fixture(Behaviour::Schema);
    let report = fixture.store.seed("Restricted", "SELECT * FROM Restricted");

    let outcome = fixture
        .engine
        .validate_and_fix_report(&report.id, Some(3))
        .await
        .expect("fix");
    assert!(!outcome.valid);
    assert_eq!(fixture.executor.executions(), 1);
    assert_eq!(outcome.executions, 1);
}

#[tokio::test]
async fn repair_loop_is_bounded_and_restores_the_original() {
    let fixture = fixture(Behaviour::NeverConverges);
    let original = "SELECT Sectio_, COUNT(*) FROM Faults GROUP BY Sectio_";
    let report = fixture.store.seed("Teams", original);

    let outcome = fixture
        .engine
        .validate_and_fix_report(&report.id, Some(3))
        .await
        .expect("fix");
    assert!(!outcome.valid);
    assert_eq!(fixture.executor.executions(), 3);
    assert_eq!(outcome.fixes.len(), 2);
    assert!(outcome.restored_original);
    assert_eq!(fixture.store.stored_sql(&report.id), original);
}

#[tokio::test]
async fn agent_and_sla_requests_rank_relevant_widgets() {
    let fixture = fixture(Behaviour::Schema);
    let ranked = fixture
        .engine
        .suggest_widgets_for_description("agent workload and SLA performance");

    let position = |id: &str| ranked.iter().position(|candidate| *candidate == id);
    let unrelated = position("tickets_by_client").unwrap_or(usize::MAX);
    for relevant in ["agent_workload", "sla_compliance", "sla_breaches"] {
        assert!(position(relevant).expect("suggested") < unrelated);
    }
    assert!(ranked.len() <= 8);
}

#[tokio::test]
async fn widget_failures_are_itemised_and_save_failures_are_fatal() {
    let fixture = fixture(Behaviour::Schema);
    let layout = LayoutSelection::Explicit(vec!["tickets_by_priority".to_string(), "recent_tickets".to_string()]);

    fixture.store.fail_report_create.store(true, Ordering::SeqCst);
    let partial = fixture
        .engine
        .build_dashboard("Partial", &layout, None)
        .await
        .expect("build");
    assert_eq!(partial.status, BuildStatus::Partial);
    assert_eq!(partial.errors.len(), 1);
    assert!(partial.errors[0].error.starts_with("SYNTHESIS_FAILED"));

    fixture.store.fail_dashboard_create.store(true, Ordering::SeqCst);
    let error = fixture
        .engine
        .build_dashboard("Broken", &layout, None)
        .await
        .expect_err("save fails");
    assert!(matches!(error, AppError::Persistence(_)));
}

#[test]
fn classifier_is_pure() {
    let sql = "SELECT priority, COUNT(*) FROM Faults GROUP BY priority";
    let message = "Invalid column name 'priority'.";
    let first = classifier::analyze(sql, message);
    assert_eq!(first, classifier::analyze(sql, message));
    assert_eq!(
        first.repaired_sql.as_deref(),
        Some("SELECT Seriousness, COUNT(*) FROM Faults GROUP BY Seriousness")
    );
}
