//! User-supplied synthesis logic.
//!
//! A module program implements [`ModuleHooks`] and overrides whichever events
//! it cares about; everything defaults to a no-op. All hooks run
//! synchronously inside the current cycle, after this cycle's inputs were
//! conditioned and before its outputs are committed.

use super::StepCtx;

/// Event callbacks invoked by the step engine.
pub trait ModuleHooks {
    /// Runs once, before the first cycle.
    fn on_start(&mut self, _ctx: &mut StepCtx) {}

    /// Clock 1 rose this cycle.
    fn on_clock_rise(&mut self, _ctx: &mut StepCtx) {}

    /// Clock 1 fell this cycle.
    fn on_clock_fall(&mut self, _ctx: &mut StepCtx) {}

    /// Clock 2 rose this cycle.
    fn on_clock_rise_2(&mut self, _ctx: &mut StepCtx) {}

    /// Clock 2 fell this cycle.
    fn on_clock_fall_2(&mut self, _ctx: &mut StepCtx) {}

    /// Runs every cycle.
    fn on_step(&mut self, _ctx: &mut StepCtx) {}
}

/// Allow boxed hook sets to be used directly (for dynamic dispatch).
impl ModuleHooks for Box<dyn ModuleHooks> {
    fn on_start(&mut self, ctx: &mut StepCtx) {
        (**self).on_start(ctx)
    }

    fn on_clock_rise(&mut self, ctx: &mut StepCtx) {
        (**self).on_clock_rise(ctx)
    }

    fn on_clock_fall(&mut self, ctx: &mut StepCtx) {
        (**self).on_clock_fall(ctx)
    }

    fn on_clock_rise_2(&mut self, ctx: &mut StepCtx) {
        (**self).on_clock_rise_2(ctx)
    }

    fn on_clock_fall_2(&mut self, ctx: &mut StepCtx) {
        (**self).on_clock_fall_2(ctx)
    }

    fn on_step(&mut self, ctx: &mut StepCtx) {
        (**self).on_step(ctx)
    }
}
