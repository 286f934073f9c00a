//! Wizard manager: renders steps, captures step data and drives the
//! persist/purge lifecycle of one wizard instance.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::forms::{FieldDefinition, FormData};
use crate::wizard::behavior::WizardBehavior;
use crate::wizard::format::build_labels;
use crate::wizard::instance::WizardInstance;
use crate::wizard::step::StepState;
use crate::wizard::{WizardContext, WizardError, WizardResult};

/// Rendered result of a step request
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    /// Wire step number
    pub step: i64,
    /// Form class of an active step, empty otherwise
    pub form_class: String,
    /// Template context; for active steps it carries the rendered form
    pub data: Value,
    pub template: String,
    /// Non-empty only once the wizard reached its terminal state
    pub return_url: String,
}

impl StepOutput {
    pub fn is_terminal(&self) -> bool {
        !self.return_url.is_empty()
    }
}

#[derive(Serialize)]
struct StepListItem {
    number: u32,
    label: String,
    iscurrent: bool,
    iscompleted: bool,
}

#[derive(Serialize)]
struct ReviewField {
    label: String,
    value: String,
}

/// Manages one wizard instance for the duration of a request
pub struct WizardManager {
    instance: WizardInstance,
    // Key the cache entry lives under; persisting may change instance.recordid
    cache_recordid: i64,
    ctx: WizardContext,
    behavior: Arc<dyn WizardBehavior>,
    finished: bool,
}

impl WizardManager {
    /// Construct a manager for a new or already running instance.
    ///
    /// Without a cache entry the supplied configuration is stored. With an
    /// existing entry its steps, and therefore earlier submissions, are
    /// adopted, and the manager type is taken from the cached entry.
    pub fn create(ctx: WizardContext, mut instance: WizardInstance) -> WizardResult<Self> {
        instance.validate()?;
        for step in instance.steps.values() {
            ctx.forms.get(&step.form_class)?;
        }

        let recordid = instance.recordid;
        if let Some(cached) = ctx.cache.get(&instance.uniqueid, recordid)? {
            tracing::debug!(uniqueid = %instance.uniqueid, recordid, "Adopting cached wizard steps");
            instance.steps = cached.steps;
            instance.manager_type = cached.manager_type;
        } else {
            tracing::debug!(uniqueid = %instance.uniqueid, recordid, "Creating wizard instance");
        }

        let behavior = ctx.behaviors.create(&instance.manager_type)?;
        ctx.cache.set(&instance.uniqueid, recordid, &instance)?;

        Ok(Self {
            instance,
            cache_recordid: recordid,
            ctx,
            behavior,
            finished: false,
        })
    }

    /// Rehydrate a manager from its cache entry
    pub fn open(ctx: WizardContext, uniqueid: &str, recordid: i64) -> WizardResult<Self> {
        let instance = ctx
            .cache
            .get(uniqueid, recordid)?
            .ok_or_else(|| WizardError::invalid_instance(uniqueid, recordid))?;
        let behavior = ctx.behaviors.create(&instance.manager_type)?;

        Ok(Self {
            instance,
            cache_recordid: recordid,
            ctx,
            behavior,
            finished: false,
        })
    }

    pub fn instance(&self) -> &WizardInstance {
        &self.instance
    }

    pub fn uniqueid(&self) -> &str {
        &self.instance.uniqueid
    }

    pub fn recordid(&self) -> i64 {
        self.instance.recordid
    }

    pub fn has_review(&self) -> bool {
        self.instance.has_review
    }

    pub fn behavior_type(&self) -> &str {
        self.behavior.type_name()
    }

    fn template_id(&self) -> String {
        if self.instance.template_id.is_empty() {
            self.ctx.settings.default_template.clone()
        } else {
            self.instance.template_id.clone()
        }
    }

    fn return_url(&self) -> String {
        [&self.instance.return_url, &self.ctx.settings.default_return_url]
            .into_iter()
            .find(|url| !url.is_empty())
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }

    fn ensure_open(&self) -> WizardResult<()> {
        if self.finished {
            return Err(WizardError::invalid_instance(
                &self.instance.uniqueid,
                self.cache_recordid,
            ));
        }
        Ok(())
    }

    fn step_list(&self, current: Option<u32>) -> Vec<StepListItem> {
        self.instance
            .steps
            .iter()
            .map(|(number, step)| StepListItem {
                number: *number,
                label: step.label.clone(),
                iscurrent: Some(*number) == current,
                iscompleted: step.is_completed(),
            })
            .collect()
    }

    /// Render the step addressed by a wire step number
    pub fn get_step(&mut self, step: i64) -> WizardResult<StepOutput> {
        self.ensure_open()?;
        match StepState::from_wire(step, self.instance.has_review) {
            StepState::Active(n) => self.render_active(n, FormData::new()),
            StepState::Review => self.render_review(),
            StepState::Terminal => self.finish(),
            StepState::Invalid => Err(WizardError::InvalidStep(step)),
        }
    }

    /// Re-render an active step with `overrides` layered over its data.
    /// Nothing is saved; used to recompute dependent options.
    pub fn refresh_step(&mut self, step: u32, overrides: FormData) -> WizardResult<StepOutput> {
        self.ensure_open()?;
        self.render_active(step, overrides)
    }

    fn render_active(&self, number: u32, overrides: FormData) -> WizardResult<StepOutput> {
        let definition = self
            .instance
            .step(number)
            .ok_or(WizardError::InvalidStep(i64::from(number)))?;
        let total = self.instance.total_steps();

        let mut form_data = definition.form_data.clone();
        if let Some(submitted) = &definition.submitted {
            form_data.extend(submitted.clone());
        }
        form_data.extend(overrides);
        form_data.insert("uniqueid".into(), json!(self.instance.uniqueid));
        form_data.insert("recordid".into(), json!(self.instance.recordid));
        form_data.insert("step".into(), json!(number));
        form_data.insert("totalsteps".into(), json!(total));

        let form = self.ctx.forms.get(&definition.form_class)?;
        let bound = form.set_data(&form_data);
        let formhtml = form.render(&bound, &self.ctx.renderer)?;

        tracing::debug!(
            uniqueid = %self.instance.uniqueid,
            recordid = self.instance.recordid,
            step = number,
            "Rendered step"
        );

        let data = json!({
            "uniqueid": self.instance.uniqueid,
            "recordid": self.instance.recordid,
            "step": number,
            "totalsteps": total,
            "formclass": definition.form_class,
            "hasreview": self.instance.has_review,
            "canmovesteps": self.instance.can_move_steps,
            "steps": self.step_list(Some(number)),
            "disableprevious": number == 1 || !self.instance.can_move_steps,
            "disablenext": number == total,
            "formhtml": formhtml,
            "formdata": bound,
            "confirmation": false,
            "fields": [],
            "returnurl": "",
        });

        Ok(StepOutput {
            step: i64::from(number),
            form_class: definition.form_class.clone(),
            data,
            template: self.template_id(),
            return_url: String::new(),
        })
    }

    fn render_review(&self) -> WizardResult<StepOutput> {
        let fields: Vec<ReviewField> = self
            .instance
            .steps
            .values()
            .flat_map(|step| step.labels.iter())
            .map(|(label, value)| ReviewField {
                label: label.clone(),
                value: value.clone(),
            })
            .collect();

        let wire = StepState::Review.to_wire(true);
        let data = json!({
            "uniqueid": self.instance.uniqueid,
            "recordid": self.instance.recordid,
            "step": wire,
            "totalsteps": self.instance.total_steps(),
            "formclass": "",
            "hasreview": true,
            "canmovesteps": self.instance.can_move_steps,
            "steps": self.step_list(None),
            "disableprevious": false,
            "disablenext": true,
            "formhtml": "",
            "confirmation": true,
            "fields": fields,
            "returnurl": "",
        });

        Ok(StepOutput {
            step: wire,
            form_class: String::new(),
            data,
            template: self.template_id(),
            return_url: String::new(),
        })
    }

    /// Validate submitted values with the step's form and store them
    pub fn submit_step(&mut self, step: u32, values: FormData) -> WizardResult<()> {
        self.ensure_open()?;
        let definition = self
            .instance
            .step(step)
            .ok_or(WizardError::InvalidStep(i64::from(step)))?;
        let form = self.ctx.forms.get(&definition.form_class)?;

        form.validate(&values)
            .map_err(WizardError::ValidationFailed)?;
        let schema = form.fields(&values);
        self.save_step_data(step, values, &schema)
    }

    /// Store submitted values and their review labels for a step.
    /// Does not advance the wizard or persist durably.
    pub fn save_step_data(
        &mut self,
        step: u32,
        values: FormData,
        schema: &[FieldDefinition],
    ) -> WizardResult<()> {
        self.ensure_open()?;
        let labels = build_labels(schema, &values, &self.ctx.settings.label_format);

        let mut data = FormData::new();
        data.insert("submitted".into(), Value::Object(values.clone()));
        data.insert("labels".into(), serde_json::to_value(&labels)?);

        let definition = self
            .instance
            .steps
            .get_mut(&step)
            .ok_or(WizardError::InvalidStep(i64::from(step)))?;

        self.ctx
            .cache
            .set_step_data(&self.instance.uniqueid, self.cache_recordid, step, data)?;
        definition.submitted = Some(values);
        definition.labels = labels;

        tracing::debug!(
            uniqueid = %self.instance.uniqueid,
            recordid = self.cache_recordid,
            step,
            "Saved step data"
        );
        Ok(())
    }

    /// Extension point: write the accumulated data durably
    pub fn persist(&mut self) -> WizardResult<()> {
        self.behavior.persist(&mut self.instance)
    }

    /// Enter the terminal state: persist, then purge, then hand back the
    /// return url. The cache entry is left intact when persisting fails.
    fn finish(&mut self) -> WizardResult<StepOutput> {
        if let Err(e) = self.persist() {
            tracing::error!(
                uniqueid = %self.instance.uniqueid,
                recordid = self.cache_recordid,
                error = %e,
                "Failed to persist wizard"
            );
            return Err(e);
        }

        self.ctx
            .cache
            .purge(&self.instance.uniqueid, self.cache_recordid);
        self.finished = true;

        let return_url = self.return_url();
        tracing::info!(
            uniqueid = %self.instance.uniqueid,
            recordid = self.instance.recordid,
            manager = self.behavior.type_name(),
            "Wizard completed"
        );

        Ok(StepOutput {
            step: StepState::Terminal.to_wire(self.instance.has_review),
            form_class: String::new(),
            data: json!({
                "uniqueid": self.instance.uniqueid,
                "recordid": self.instance.recordid,
                "returnurl": return_url,
            }),
            template: self.template_id(),
            return_url,
        })
    }

    /// Drop the instance's cache entry without persisting
    pub fn abandon(self) {
        self.ctx
            .cache
            .purge(&self.instance.uniqueid, self.cache_recordid);
        tracing::info!(uniqueid = %self.instance.uniqueid, recordid = self.cache_recordid, "Wizard abandoned");
    }
}
