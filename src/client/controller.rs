//! Client-side wizard controller.
//!
//! One controller drives one wizard region. It tracks the current and
//! previous step, submits the active step form before navigating, rolls the
//! step pointer back when validation fails and swaps the rendered step into
//! the view.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::client::error::ClientError;
use crate::client::transport::{SubmitOutcome, WizardTransport};
use crate::client::view::WizardView;
use crate::forms::ValidationErrors;
use crate::rest::dto::LoadStepResponse;
use crate::templates::TemplateRenderer;
use crate::wizard::{Direction, StepState};

/// Identity of the wizard region on the page
#[derive(Debug, Clone, PartialEq)]
pub struct WizardRegion {
    pub uniqueid: String,
    pub recordid: i64,
    /// Wire step number the region starts on
    pub current_step: i64,
    pub has_review: bool,
}

impl WizardRegion {
    pub fn new(uniqueid: impl Into<String>, recordid: i64, has_review: bool) -> Self {
        Self {
            uniqueid: uniqueid.into(),
            recordid,
            current_step: 1,
            has_review,
        }
    }
}

/// A field whose change invalidates the options of another field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentField {
    pub trigger: String,
    /// Multi-select cleared and recomputed when `trigger` changes
    pub target: String,
}

/// A step form bound into the current markup
#[derive(Debug, Clone, PartialEq)]
pub struct FormHandle {
    pub form_class: String,
    // Markup generation the form was bound to
    generation: u64,
}

/// What became of a navigation request
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    /// Another request was still outstanding
    Ignored,
    /// The direction has no target from the current step
    Rejected,
    /// The step form rejected its values; the pointer moved back
    RolledBack(ValidationErrors),
    Loaded(StepState),
    Redirected(String),
    Failed(ClientError),
}

pub struct WizardController<V: WizardView> {
    uniqueid: String,
    recordid: i64,
    has_review: bool,
    transport: Arc<dyn WizardTransport>,
    renderer: Arc<TemplateRenderer>,
    view: V,
    current: StepState,
    previous: Option<StepState>,
    forms: HashMap<u32, FormHandle>,
    generation: u64,
    change_listener: bool,
    busy: bool,
    dependent: Option<DependentField>,
}

impl<V: WizardView> WizardController<V> {
    pub fn new(
        region: WizardRegion,
        transport: Arc<dyn WizardTransport>,
        renderer: Arc<TemplateRenderer>,
        view: V,
    ) -> Self {
        Self {
            current: StepState::from_wire(region.current_step, region.has_review),
            uniqueid: region.uniqueid,
            recordid: region.recordid,
            has_review: region.has_review,
            transport,
            renderer,
            view,
            previous: None,
            forms: HashMap::new(),
            generation: 0,
            change_listener: false,
            busy: false,
            dependent: None,
        }
    }

    /// Recompute `target`'s options whenever `trigger` changes
    pub fn with_dependent_field(mut self, trigger: &str, target: &str) -> Self {
        self.dependent = Some(DependentField {
            trigger: trigger.to_string(),
            target: target.to_string(),
        });
        self
    }

    pub fn current_step(&self) -> StepState {
        self.current
    }

    pub fn previous_step(&self) -> Option<StepState> {
        self.previous
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn form(&self, step: u32) -> Option<&FormHandle> {
        self.forms.get(&step)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    fn wire(&self, state: StepState) -> i64 {
        state.to_wire(self.has_review)
    }

    /// Whether `step` has a form bound into the current markup
    fn has_active_form(&self, step: u32) -> bool {
        self.forms
            .get(&step)
            .is_some_and(|handle| handle.generation == self.generation)
    }

    /// Render the region's current step
    pub async fn start(&mut self) -> NavigationOutcome {
        if self.busy {
            return NavigationOutcome::Ignored;
        }
        self.begin();
        let outcome = self.load_current().await;
        self.end();
        outcome
    }

    /// Handle a click on a navigation control declaring `control`
    /// (`next`, `previous` or `submit`)
    pub async fn navigate(&mut self, control: &str) -> NavigationOutcome {
        if self.busy {
            tracing::debug!(uniqueid = %self.uniqueid, "Navigation ignored while a request is outstanding");
            return NavigationOutcome::Ignored;
        }

        let direction = Direction::parse(control);
        let old = self.current;
        let target = old.navigate(&direction, self.previous, self.has_review);
        if target == StepState::Invalid {
            tracing::warn!(
                uniqueid = %self.uniqueid,
                from = %old,
                direction = direction.as_str(),
                "Navigation has no target"
            );
            self.view.notify_error(&format!(
                "Cannot navigate '{}' from {}",
                direction.as_str(),
                old
            ));
            return NavigationOutcome::Rejected;
        }

        self.current = target;
        self.previous = Some(old);

        self.begin();
        let outcome = self.dispatch(old).await;
        self.end();
        outcome
    }

    /// Handle a change event on `field` in the current step form
    pub async fn field_changed(&mut self, field: &str) -> NavigationOutcome {
        let Some(dependent) = self.dependent.clone().filter(|d| d.trigger == field) else {
            return NavigationOutcome::Ignored;
        };
        let Some(step) = self.current.active_number() else {
            return NavigationOutcome::Ignored;
        };
        if self.busy || !self.has_active_form(step) {
            return NavigationOutcome::Ignored;
        }

        self.view.clear_field(step, &dependent.target);
        let values = self.view.form_values(step);

        self.begin();
        let result = self
            .transport
            .refresh_step(&self.uniqueid, self.recordid, self.wire(self.current), values)
            .await;
        let outcome = match result {
            Ok(response) => self.show(response),
            Err(e) => self.report(e),
        };
        self.end();
        outcome
    }

    fn begin(&mut self) {
        self.busy = true;
        self.view.set_controls_enabled(false);
    }

    fn end(&mut self) {
        self.busy = false;
        self.view.set_controls_enabled(true);
    }

    /// Submit the form of the step being left, then load the new step
    async fn dispatch(&mut self, old: StepState) -> NavigationOutcome {
        if let Some(step) = old.active_number().filter(|n| self.has_active_form(*n)) {
            let values = self.view.form_values(step);
            let result = self
                .transport
                .submit_step(&self.uniqueid, self.recordid, self.wire(old), values)
                .await;

            match result {
                Ok(SubmitOutcome::Saved) => {}
                Ok(SubmitOutcome::Invalid(_)) if self.is_back_navigation() => {
                    tracing::debug!(
                        uniqueid = %self.uniqueid,
                        step,
                        "Going back despite validation errors"
                    );
                }
                Ok(SubmitOutcome::Invalid(errors)) => {
                    self.roll_back();
                    self.view.show_validation_errors(&errors);
                    return NavigationOutcome::RolledBack(errors);
                }
                Err(e) => {
                    self.roll_back();
                    return self.report(e);
                }
            }
        }

        self.load_current().await
    }

    /// Moving back one page: previous == current + 1 on the wire
    fn is_back_navigation(&self) -> bool {
        self.previous.map(|p| self.wire(p)) == Some(self.wire(self.current) + 1)
    }

    fn roll_back(&mut self) {
        if let Some(previous) = self.previous {
            self.current = previous;
        }
    }

    fn report(&mut self, err: ClientError) -> NavigationOutcome {
        tracing::warn!(uniqueid = %self.uniqueid, error = %err, "Step request failed");
        self.view.notify_error(&err.to_string());
        NavigationOutcome::Failed(err)
    }

    async fn load_current(&mut self) -> NavigationOutcome {
        let result = self
            .transport
            .load_step(&self.uniqueid, self.recordid, self.wire(self.current))
            .await;
        let outcome = match result {
            Ok(response) => self.show(response),
            Err(e) => self.report(e),
        };
        if matches!(outcome, NavigationOutcome::Failed(_)) {
            self.roll_back();
        }
        outcome
    }

    fn render(&self, response: &LoadStepResponse) -> Result<String, ClientError> {
        let data: Value = serde_json::from_str(&response.data)?;
        self.renderer
            .render(&response.template, &data)
            .map_err(|e| ClientError::Render(e.to_string()))
    }

    /// Apply a step response: redirect, or swap in the markup and bind the form
    fn show(&mut self, response: LoadStepResponse) -> NavigationOutcome {
        if !response.returnurl.is_empty() {
            tracing::info!(uniqueid = %self.uniqueid, url = %response.returnurl, "Wizard complete");
            self.forms.clear();
            self.view.redirect(&response.returnurl);
            return NavigationOutcome::Redirected(response.returnurl);
        }

        let html = match self.render(&response) {
            Ok(html) => html,
            Err(e) => return self.report(e),
        };

        self.generation += 1;
        self.view.swap_markup(&html);
        self.view.run_embedded_behavior();

        self.current = StepState::from_wire(response.step, self.has_review);
        if let StepState::Active(step) = self.current {
            self.init_step_form(step, &response.formclass);
        }
        NavigationOutcome::Loaded(self.current)
    }

    /// Bind the form of `step` unless it is already bound to the current
    /// markup. Returns whether a binding was made.
    pub fn init_step_form(&mut self, step: u32, form_class: &str) -> bool {
        if self.has_active_form(step) {
            return false;
        }

        self.view.bind_form(step, form_class);
        self.view.enhance_autocomplete(step);
        self.forms.insert(
            step,
            FormHandle {
                form_class: form_class.to_string(),
                generation: self.generation,
            },
        );

        if !self.change_listener {
            self.view.attach_change_listener();
            self.change_listener = true;
        }
        true
    }
}
