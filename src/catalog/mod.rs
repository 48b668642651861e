mod layouts;
pub mod sql_templates;
mod widgets;

use crate::models::{AvailableTemplates, LayoutPreset, WidgetArchetype};

/// Immutable registry of widget archetypes.
#[derive(Debug, Clone, Copy)]
pub struct WidgetTemplateCatalog {
    archetypes: &'static [WidgetArchetype],
}

impl Default for WidgetTemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WidgetTemplateCatalog {
    pub fn builtin() -> Self {
        Self::from_static(widgets::BUILTIN_ARCHETYPES)
    }

    pub fn from_static(archetypes: &'static [WidgetArchetype]) -> Self {
        Self { archetypes }
    }

    pub fn get(&self, id: &str) -> Option<&'static WidgetArchetype> {
        let archetypes: &'static [WidgetArchetype] = self.archetypes;
        archetypes.iter().find(|archetype| archetype.id == id)
    }

    pub fn all(&self) -> &'static [WidgetArchetype] {
        self.archetypes
    }
}

/// Immutable registry of named layout presets.
#[derive(Debug, Clone, Copy)]
pub struct LayoutCatalog {
    presets: &'static [LayoutPreset],
}

impl Default for LayoutCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LayoutCatalog {
    pub fn builtin() -> Self {
        Self::from_static(layouts::BUILTIN_LAYOUTS)
    }

    pub fn from_static(presets: &'static [LayoutPreset]) -> Self {
        Self { presets }
    }

    pub fn get(&self, name: &str) -> Option<&'static LayoutPreset> {
        let presets: &'static [LayoutPreset] = self.presets;
        let name = name.trim();
        presets.iter().find(|preset| preset.name.eq_ignore_ascii_case(name))
    }

    pub fn all(&self) -> &'static [LayoutPreset] {
        self.presets
    }
}

pub fn available_templates(widgets: &WidgetTemplateCatalog, layouts: &LayoutCatalog) -> AvailableTemplates {
    AvailableTemplates {
        widgets: widgets.all().iter().collect(),
        layouts: layouts.all().iter().collect(),
    }
}
