//! Wizard core: step state machine, step cache and request handling.

pub mod behavior;
pub mod cache;
pub mod error;
pub mod format;
pub mod handler;
pub mod instance;
pub mod manager;
pub mod step;

use std::sync::Arc;

use crate::config::WizardConfig;
use crate::forms::FormRegistry;
use crate::templates::TemplateRenderer;

pub use behavior::{BehaviorRegistry, WizardBehavior};
pub use cache::{CacheStore, MemoryCacheStore, StepCache};
pub use error::{WizardError, WizardResult};
pub use format::LabelFormat;
pub use handler::StepRequestHandler;
pub use instance::{StepDefinition, WizardInstance};
pub use manager::{StepOutput, WizardManager};
pub use step::{Direction, StepState};

/// Rendering and navigation defaults shared by all wizard instances
#[derive(Debug, Clone)]
pub struct WizardSettings {
    /// Template used when an instance does not name one
    pub default_template: String,
    /// Redirect target when an instance has no return url
    pub default_return_url: String,
    pub label_format: LabelFormat,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            default_template: crate::templates::WIZARD_TEMPLATE.to_string(),
            default_return_url: "/".to_string(),
            label_format: LabelFormat::default(),
        }
    }
}

impl From<&WizardConfig> for WizardSettings {
    fn from(config: &WizardConfig) -> Self {
        Self {
            default_template: config.default_template.clone(),
            default_return_url: config.default_return_url.clone(),
            label_format: LabelFormat {
                option_delimiter: config.option_delimiter.clone(),
                date_format: config.date_format.clone(),
            },
        }
    }
}

/// Collaborators a wizard manager needs for every request
#[derive(Clone)]
pub struct WizardContext {
    pub cache: StepCache,
    pub forms: Arc<FormRegistry>,
    pub behaviors: Arc<BehaviorRegistry>,
    pub renderer: Arc<TemplateRenderer>,
    pub settings: Arc<WizardSettings>,
}

impl WizardContext {
    pub fn new(
        cache: StepCache,
        forms: FormRegistry,
        behaviors: BehaviorRegistry,
        renderer: TemplateRenderer,
        settings: WizardSettings,
    ) -> Self {
        Self {
            cache,
            forms: Arc::new(forms),
            behaviors: Arc::new(behaviors),
            renderer: Arc::new(renderer),
            settings: Arc::new(settings),
        }
    }
}
