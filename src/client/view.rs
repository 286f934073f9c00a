//! The page side of the controller: where markup goes and values come from.

use std::collections::HashMap;

use crate::forms::{FormData, ValidationErrors};

/// Page operations the controller drives
pub trait WizardView: Send {
    /// Replace the wizard region's markup
    fn swap_markup(&mut self, html: &str);

    /// Leave the page for `url`
    fn redirect(&mut self, url: &str);

    /// Generic error notification
    fn notify_error(&mut self, message: &str);

    /// Enable or disable the navigation controls
    fn set_controls_enabled(&mut self, enabled: bool);

    /// Run behavior embedded in freshly swapped markup
    fn run_embedded_behavior(&mut self) {}

    /// Bind a dynamic form to the form container of `step`
    fn bind_form(&mut self, step: u32, form_class: &str);

    /// Enhance the autocomplete fields of `step`'s form
    fn enhance_autocomplete(&mut self, step: u32);

    /// Attach the page-wide change listener
    fn attach_change_listener(&mut self);

    /// Show per-field validation messages on the active form
    fn show_validation_errors(&mut self, errors: &ValidationErrors);

    /// Clear the value of a field in `step`'s form
    fn clear_field(&mut self, step: u32, field: &str);

    /// Values currently entered in `step`'s form
    fn form_values(&self, step: u32) -> FormData;
}

/// What a [`HeadlessView`] was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Markup(String),
    Redirect(String),
    Error(String),
    ControlsEnabled(bool),
    BoundForm { step: u32, form_class: String },
    Enhanced(u32),
    ChangeListener,
    ValidationErrors(ValidationErrors),
    Cleared { step: u32, field: String },
}

/// A view without a page: records every operation and serves form values
/// from memory. Used for scripted runs and tests.
#[derive(Debug, Default)]
pub struct HeadlessView {
    events: Vec<ViewEvent>,
    values: HashMap<u32, FormData>,
}

impl HeadlessView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set what the user "typed" into a step's form
    pub fn set_values(&mut self, step: u32, values: FormData) {
        self.values.insert(step, values);
    }

    pub fn events(&self) -> &[ViewEvent] {
        &self.events
    }

    /// Last markup swapped in
    pub fn markup(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|e| match e {
            ViewEvent::Markup(html) => Some(html.as_str()),
            _ => None,
        })
    }

    pub fn redirected_to(&self) -> Option<&str> {
        self.events.iter().find_map(|e| match e {
            ViewEvent::Redirect(url) => Some(url.as_str()),
            _ => None,
        })
    }

    pub fn count(&self, matcher: impl Fn(&ViewEvent) -> bool) -> usize {
        self.events.iter().filter(|e| matcher(e)).count()
    }
}

impl WizardView for HeadlessView {
    fn swap_markup(&mut self, html: &str) {
        self.events.push(ViewEvent::Markup(html.to_string()));
    }

    fn redirect(&mut self, url: &str) {
        self.events.push(ViewEvent::Redirect(url.to_string()));
    }

    fn notify_error(&mut self, message: &str) {
        self.events.push(ViewEvent::Error(message.to_string()));
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        self.events.push(ViewEvent::ControlsEnabled(enabled));
    }

    fn bind_form(&mut self, step: u32, form_class: &str) {
        self.events.push(ViewEvent::BoundForm {
            step,
            form_class: form_class.to_string(),
        });
    }

    fn enhance_autocomplete(&mut self, step: u32) {
        self.events.push(ViewEvent::Enhanced(step));
    }

    fn attach_change_listener(&mut self) {
        self.events.push(ViewEvent::ChangeListener);
    }

    fn show_validation_errors(&mut self, errors: &ValidationErrors) {
        self.events.push(ViewEvent::ValidationErrors(errors.clone()));
    }

    fn clear_field(&mut self, step: u32, field: &str) {
        if let Some(values) = self.values.get_mut(&step) {
            values.remove(field);
        }
        self.events.push(ViewEvent::Cleared {
            step,
            field: field.to_string(),
        });
    }

    fn form_values(&self, step: u32) -> FormData {
        self.values.get(&step).cloned().unwrap_or_default()
    }
}
