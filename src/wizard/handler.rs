//! Server-side request boundary.
//!
//! Every request resolves its wizard instance from the step cache and
//! delegates to a freshly rehydrated [`WizardManager`]. The handler itself
//! holds no per-instance state.

use crate::forms::FormData;
use crate::wizard::instance::WizardInstance;
use crate::wizard::manager::{StepOutput, WizardManager};
use crate::wizard::step::StepState;
use crate::wizard::{WizardContext, WizardError, WizardResult};

#[derive(Clone)]
pub struct StepRequestHandler {
    ctx: WizardContext,
}

impl StepRequestHandler {
    pub fn new(ctx: WizardContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &WizardContext {
        &self.ctx
    }

    /// Construct (or adopt) an instance and render its first step
    pub fn create(&self, instance: WizardInstance) -> WizardResult<StepOutput> {
        let first = instance.first_step();
        let mut manager = WizardManager::create(self.ctx.clone(), instance)?;
        manager.get_step(i64::from(first))
    }

    /// Render the step addressed by `step` for an existing instance
    pub fn load_step(&self, uniqueid: &str, recordid: i64, step: i64) -> WizardResult<StepOutput> {
        let mut manager = WizardManager::open(self.ctx.clone(), uniqueid, recordid)?;
        manager.get_step(step).inspect_err(|e| {
            tracing::warn!(uniqueid, recordid, step, error = %e, "Failed to load step");
        })
    }

    /// Validate and store the values submitted for an active step
    pub fn submit_step(
        &self,
        uniqueid: &str,
        recordid: i64,
        step: i64,
        values: FormData,
    ) -> WizardResult<()> {
        let mut manager = WizardManager::open(self.ctx.clone(), uniqueid, recordid)?;
        let number = StepState::from_wire(step, manager.has_review())
            .active_number()
            .ok_or(WizardError::InvalidStep(step))?;
        manager.submit_step(number, values)
    }

    /// Re-render an active step with `overrides` applied, saving nothing
    pub fn refresh_step(
        &self,
        uniqueid: &str,
        recordid: i64,
        step: i64,
        overrides: FormData,
    ) -> WizardResult<StepOutput> {
        let mut manager = WizardManager::open(self.ctx.clone(), uniqueid, recordid)?;
        let number = StepState::from_wire(step, manager.has_review())
            .active_number()
            .ok_or(WizardError::InvalidStep(step))?;
        manager.refresh_step(number, overrides)
    }

    /// Drop an instance without persisting it
    pub fn abandon(&self, uniqueid: &str, recordid: i64) -> WizardResult<()> {
        WizardManager::open(self.ctx.clone(), uniqueid, recordid)?.abandon();
        Ok(())
    }
}
