use crate::engine::DashboardEngine;
use std::collections::HashMap;
use crate::errors::{AppError, AppResult};
use crate::models::{
    BuildDashboardResult, BuildStatus, BuiltWidget, LayoutSelection, NewDashboard, PlacedWidget, ReportOrigin,
    ResolvedReport, WidgetArchetype, WidgetBinding, WidgetError, WidgetPlacement, GRID_COLUMNS,
};

/// Left-to-right, top-to-bottom packing cursor over the dashboard grid.
#[derive(Debug, Default, Clone, Copy)]
struct GridCursor {
    x: i32,
    y: i32,
    row_height: i32,
}

impl GridCursor {
    fn slot_for(&self, width: i32) -> (i32, i32) {
        if self.x > 0 && self.x + width > GRID_COLUMNS {
            (0, self.y + self.row_height)
        } else {
            (self.x, self.y)
        }
    }

    fn commit(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if y != self.y {
            self.row_height = 0;
        }
        self.x = x + width;
        self.y = y;
        self.row_height = self.row_height.max(height);
    }
}

fn clamp_width(width: i32) -> i32 {
    width.clamp(1, GRID_COLUMNS)
}

impl DashboardEngine {
    pub async fn build_widget(
        &self,
        archetype_id: &str,
        x: i32,
        y: i32,
        title: Option<&str>,
        color: Option<&str>,
    ) -> AppResult<BuiltWidget> {
        let archetype = self
            .widgets
            .get(archetype_id)
            .ok_or_else(|| AppError::NotFound(format!("Widget template not found: {}", archetype_id)))?;
        self.build_archetype(archetype, None, x, y, title, color).await
    }

    /// Builds one widget. `known` is a report already resolved for this
    /// archetype and is bound instead of resolving again.
    pub(crate) async fn build_archetype(
        &self,
        archetype: &WidgetArchetype,
        known: Option<ResolvedReport>,
        x: i32,
        y: i32,
        title: Option<&str>,
        color: Option<&str>,
    ) -> AppResult<BuiltWidget> {
        let (binding, report) = if archetype.kind.needs_report() {
            let resolved = match known {
                Some(resolved) => resolved,
                None => self.get_or_create_report(archetype).await?,
            };
            (
                WidgetBinding::Report {
                    report_id: resolved.report_id.clone(),
                },
                Some(resolved),
            )
        } else {
            let filter_id = archetype.filter_id.ok_or_else(|| {
                AppError::Synthesis(format!("Widget template {} has no filter reference", archetype.id))
            })?;
            (
                WidgetBinding::Filter {
                    filter_id,
                    area_id: archetype.area_id,
                },
                None,
            )
        };

        let w = clamp_width(archetype.width);
        Ok(BuiltWidget {
            placement: WidgetPlacement {
                x: x.clamp(0, GRID_COLUMNS - w),
                y: y.max(0),
                w,
                h: archetype.height.max(1),
                kind: archetype.kind,
                color: color.unwrap_or(archetype.color).to_string(),
                title: title.unwrap_or(archetype.name).to_string(),
                binding,
            },
            report,
        })
    }

    /// Packs the selected archetypes onto the grid and persists the result.
    ///
    /// A widget that cannot be built is recorded on the result and skipped;
    /// only an empty dashboard or a failed save abandons the build.
    pub async fn build_dashboard(
        &self,
        name: &str,
        layout: &LayoutSelection,
        description: Option<&str>,
    ) -> AppResult<BuildDashboardResult> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Dashboard name cannot be empty".to_string()));
        }

        let (archetype_ids, default_description): (Vec<String>, String) = match layout {
            LayoutSelection::Preset(preset_name) => {
                let preset = self
                    .layouts
                    .get(preset_name)
                    .ok_or_else(|| AppError::NotFound(format!("Layout not found: {}", preset_name)))?;
                (
                    preset.widgets.iter().map(|id| id.to_string()).collect(),
                    preset.description.to_string(),
                )
            }
            LayoutSelection::Explicit(ids) => (ids.clone(), String::new()),
        };

        let mut cursor = GridCursor::default();
        let mut placements = Vec::with_capacity(archetype_ids.len());
        let mut found = Vec::new();
        let mut created = Vec::new();
        let mut errors = Vec::new();
        // Repeated archetypes share one report so a later resolve cannot
        // replace a report an earlier widget is bound to.
        let mut resolved: HashMap<&'static str, ResolvedReport> = HashMap::new();

        for archetype_id in &archetype_ids {
            let Some(archetype) = self.widgets.get(archetype_id) else {
                errors.push(WidgetError {
                    archetype_id: archetype_id.clone(),
                    error: AppError::NotFound(format!("Widget template not found: {}", archetype_id)).to_string(),
                });
                continue;
            };

            let (x, y) = cursor.slot_for(clamp_width(archetype.width));
            let known = resolved.get(archetype.id).cloned();
            let reused = known.is_some();
            match self.build_archetype(archetype, known, x, y, None, None).await {
                Ok(built) => {
                    let placement = built.placement;
                    cursor.commit(placement.x, placement.y, placement.w, placement.h);
                    if let Some(report) = built.report.filter(|_| !reused) {
                        resolved.insert(archetype.id, report.clone());
                        match report.origin {
                            ReportOrigin::Found => found.push(report),
                            ReportOrigin::Created => created.push(report),
                        }
                    }
                    placements.push(placement);
                }
                Err(error) => {
                    tracing::warn!(archetype = archetype.id, error = %error, "skipping widget that failed to build");
                    errors.push(WidgetError {
                        archetype_id: archetype_id.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        if placements.is_empty() {
            tracing::warn!(dashboard = %name, failures = errors.len(), "no widgets could be built");
            return Ok(BuildDashboardResult {
                status: BuildStatus::Failed,
                dashboard: None,
                found,
                created,
                errors,
            });
        }

        let dashboard = self
            .dashboards
            .create_dashboard(NewDashboard {
                name: name.to_string(),
                description: description.map(ToString::to_string).unwrap_or(default_description),
                shared: self.settings.share_dashboards,
                widgets: placements,
            })
            .await?;

        let status = if errors.is_empty() {
            BuildStatus::Complete
        } else {
            BuildStatus::Partial
        };
        tracing::info!(
            dashboard_id = %dashboard.id,
            widgets = dashboard.widgets.len(),
            found = found.len(),
            created = created.len(),
            failed = errors.len(),
            "dashboard built"
        );
        Ok(BuildDashboardResult {
            status,
            dashboard: Some(dashboard),
            found,
            created,
            errors,
        })
    }

    /// Appends one archetype below everything already on the dashboard.
    pub async fn add_widget_to_dashboard(
        &self,
        dashboard_id: &str,
        archetype_id: &str,
        title: Option<&str>,
        color: Option<&str>,
    ) -> AppResult<PlacedWidget> {
        let dashboard = self.get_dashboard(dashboard_id).await?;
        let bottom = dashboard
            .widgets
            .iter()
            .map(|widget| widget.placement.y + widget.placement.h)
            .max()
            .unwrap_or(0);

        let built = self.build_widget(archetype_id, 0, bottom, title, color).await?;
        let placed = self.dashboards.add_widget(dashboard_id, built.placement).await?;
        tracing::info!(dashboard_id = %dashboard_id, widget_id = %placed.id, archetype = %archetype_id, "widget added");
        Ok(placed)
    }

    /// Moves or resizes a widget, clamped so it stays inside the grid.
    pub async fn update_widget_layout(
        &self,
        dashboard_id: &str,
        widget_id: &str,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    ) -> AppResult<PlacedWidget> {
        let dashboard = self.get_dashboard(dashboard_id).await?;
        let widget = dashboard
            .widgets
            .into_iter()
            .find(|widget| widget.id == widget_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Widget {} not found on dashboard {}", widget_id, dashboard_id))
            })?;

        let mut placement = widget.placement;
        placement.w = clamp_width(w);
        placement.h = h.max(1);
        placement.x = x.clamp(0, GRID_COLUMNS - placement.w);
        placement.y = y.max(0);
        self.dashboards.update_widget(dashboard_id, widget_id, placement).await
    }
}
