//! API state management for the REST server.

use std::sync::Arc;

use crate::config::Config;
use crate::forms::FormRegistry;
use crate::records::{JsonFileRecordStore, RecordStore};
use crate::templates::TemplateRenderer;
use crate::wizard::{
    BehaviorRegistry, StepCache, StepRequestHandler, WizardContext, WizardResult, WizardSettings,
};

/// Shared state for the REST API
#[derive(Clone)]
pub struct ApiState {
    pub handler: StepRequestHandler,
    pub config: Arc<Config>,
}

impl ApiState {
    /// Create new API state from config.
    ///
    /// Extra forms and templates are loaded from `paths.forms`; completed
    /// wizards of manager type `record` are written under `paths.records`.
    pub fn new(config: Config) -> WizardResult<Self> {
        let mut forms = FormRegistry::with_builtins();
        if let Err(e) = forms.load_dir(&config.forms_path()) {
            tracing::warn!("Failed to load forms: {}", e);
        }

        let mut renderer = TemplateRenderer::new()?;
        if let Err(e) = renderer.load_dir(&config.forms_path()) {
            tracing::warn!("Failed to load templates: {}", e);
        }

        let records: Option<Arc<dyn RecordStore>> =
            match JsonFileRecordStore::new(config.records_path()) {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    tracing::warn!("Record store unavailable, 'record' wizards disabled: {}", e);
                    None
                }
            };

        let ctx = WizardContext::new(
            StepCache::in_memory(),
            forms,
            BehaviorRegistry::with_defaults(records),
            renderer,
            WizardSettings::from(&config.wizard),
        );
        Ok(Self::from_context(ctx, config))
    }

    /// State over an already assembled wizard context
    pub fn from_context(ctx: WizardContext, config: Config) -> Self {
        Self {
            handler: StepRequestHandler::new(ctx),
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_api_state_new() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.forms = temp_dir.path().join("forms").to_string_lossy().to_string();
        config.paths.records = temp_dir.path().join("records").to_string_lossy().to_string();
        config.wizard.default_return_url = "/home".to_string();

        let state = ApiState::new(config).unwrap();
        let ctx = state.handler.context();
        assert!(ctx.forms.contains("demo_contact"));
        assert!(ctx.behaviors.contains("record"));
        assert_eq!(ctx.settings.default_return_url, "/home");
        assert!(temp_dir.path().join("records").exists());
    }

    #[test]
    fn test_api_state_loads_custom_forms() {
        let temp_dir = TempDir::new().unwrap();
        let forms_dir = temp_dir.path().join("forms");
        std::fs::create_dir_all(&forms_dir).unwrap();
        std::fs::write(
            forms_dir.join("feedback.json"),
            r#"{"id": "feedback", "fields": [{"name": "rating", "label": "Rating", "type": "number"}]}"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.paths.forms = forms_dir.to_string_lossy().to_string();
        config.paths.records = temp_dir.path().join("records").to_string_lossy().to_string();

        let state = ApiState::new(config).unwrap();
        assert!(state.handler.context().forms.contains("feedback"));
    }
}
