//! Phase pipeline.
//!
//! A pipeline is an ordered list of named phases bound to one request for
//! one reconcile invocation. Phases execute strictly sequentially and the
//! pipeline short-circuits on the first phase that asks for a requeue or
//! fails. There is no per-phase checkpointing: retry granularity is the
//! whole pipeline on the next delivery, so every phase must be safe to
//! re-execute (check-before-act, idempotent upserts).

use futures::FutureExt;
use futures::future::BoxFuture;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::ControllerError;

/// What a phase asks the pipeline to do next
#[derive(Debug, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Proceed to the next phase
    Continue,

    /// Stop now and schedule a future retry; not an error
    RequeueAfter(Duration),
}

/// Result of running one phase
pub type PhaseResult = Result<PhaseOutcome, ControllerError>;

type PhaseFn<R> = Box<dyn for<'a> Fn(&'a mut R) -> BoxFuture<'a, PhaseResult> + Send + Sync>;

/// A named unit of convergence work.
///
/// Phases are data: a name plus a function value, constructed freshly for
/// each pipeline run. They hold no state of their own; everything lives on
/// the request they are handed.
pub struct Phase<R> {
    name: &'static str,
    run: PhaseFn<R>,
}

impl<R> Phase<R> {
    /// Create a phase from a name and a function over the request.
    pub fn new<F>(name: &'static str, run: F) -> Self
    where
        F: for<'a> Fn(&'a mut R) -> BoxFuture<'a, PhaseResult> + Send + Sync + 'static,
    {
        Self {
            name,
            run: Box::new(run),
        }
    }

    /// Phase name, used for logging and error attribution
    #[cfg(test)]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Terminal state of one pipeline run
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Every phase ran and continued
    Done,

    /// A phase scheduled a retry; remaining phases did not run
    RequeueScheduled(Duration),

    /// A phase failed; remaining phases did not run
    Failed(ControllerError),
}

/// An ordered, short-circuiting sequence of phases
pub struct Pipeline<R> {
    phases: Vec<Phase<R>>,
}

impl<R> Pipeline<R> {
    /// Bind an ordered list of phases into a pipeline.
    pub fn new(phases: Vec<Phase<R>>) -> Self {
        Self { phases }
    }

    /// Phase names in execution order
    #[cfg(test)]
    pub fn phase_names(&self) -> Vec<&'static str> {
        self.phases.iter().map(Phase::name).collect()
    }

    /// Execute the phases strictly in declared order against one request.
    ///
    /// A phase that panics is converted into a classified failure; an
    /// unhandled abort never escapes the pipeline.
    pub async fn execute(&self, request: &mut R) -> PipelineOutcome {
        for phase in &self.phases {
            debug!("Executing phase {}", phase.name);

            let result = match AssertUnwindSafe((phase.run)(request)).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => Err(ControllerError::PhaseAborted {
                    phase: phase.name,
                    detail: panic_detail(panic.as_ref()),
                }),
            };

            match result {
                Ok(PhaseOutcome::Continue) => {}
                Ok(PhaseOutcome::RequeueAfter(delay)) => {
                    debug!("Phase {} requested requeue after {:?}", phase.name, delay);
                    return PipelineOutcome::RequeueScheduled(delay);
                }
                Err(e) => {
                    let attributed = e.with_phase(phase.name);
                    error!("Phase {} failed: {}", phase.name, attributed);
                    return PipelineOutcome::Failed(attributed);
                }
            }
        }

        PipelineOutcome::Done
    }
}

fn panic_detail(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;

    /// Minimal request type recording which phases ran
    #[derive(Default)]
    struct Probe {
        visited: Vec<&'static str>,
    }

    fn step_one(req: &mut Probe) -> BoxFuture<'_, PhaseResult> {
        async move {
            req.visited.push("one");
            Ok(PhaseOutcome::Continue)
        }
        .boxed()
    }

    fn step_two(req: &mut Probe) -> BoxFuture<'_, PhaseResult> {
        async move {
            req.visited.push("two");
            Ok(PhaseOutcome::Continue)
        }
        .boxed()
    }

    fn step_requeue(req: &mut Probe) -> BoxFuture<'_, PhaseResult> {
        async move {
            req.visited.push("requeue");
            Ok(PhaseOutcome::RequeueAfter(Duration::from_secs(30)))
        }
        .boxed()
    }

    fn step_fail(req: &mut Probe) -> BoxFuture<'_, PhaseResult> {
        async move {
            req.visited.push("fail");
            Err(ControllerError::MissingName)
        }
        .boxed()
    }

    fn step_panic(_req: &mut Probe) -> BoxFuture<'_, PhaseResult> {
        async move { panic!("boom") }.boxed()
    }

    #[tokio::test]
    async fn test_phases_run_in_declared_order() {
        let mut probe = Probe::default();
        let pipeline = Pipeline::new(vec![
            Phase::new("One", step_one),
            Phase::new("Two", step_two),
        ]);

        let outcome = pipeline.execute(&mut probe).await;

        assert!(matches!(outcome, PipelineOutcome::Done));
        assert_eq!(probe.visited, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_requeue_stops_remaining_phases() {
        let mut probe = Probe::default();
        let pipeline = Pipeline::new(vec![
            Phase::new("One", step_one),
            Phase::new("Requeue", step_requeue),
            Phase::new("Two", step_two),
        ]);

        let outcome = pipeline.execute(&mut probe).await;

        assert!(matches!(
            outcome,
            PipelineOutcome::RequeueScheduled(d) if d == Duration::from_secs(30)
        ));
        assert_eq!(probe.visited, vec!["one", "requeue"]);
    }

    #[tokio::test]
    async fn test_failure_short_circuits_and_keeps_failing_phase_error() {
        let mut probe = Probe::default();
        let pipeline = Pipeline::new(vec![
            Phase::new("One", step_one),
            Phase::new("Fail", step_fail),
            Phase::new("Two", step_two),
        ]);

        let outcome = pipeline.execute(&mut probe).await;

        // Phases after the failure never execute
        assert_eq!(probe.visited, vec!["one", "fail"]);

        // The returned error is phase Fail's error, attributed to it
        let PipelineOutcome::Failed(err) = outcome else {
            panic!("expected failure outcome");
        };
        assert!(err.to_string().contains("Fail"));
        assert!(!err.to_string().contains("Two"));
        assert!(matches!(
            err,
            ControllerError::Phase { phase: "Fail", .. }
        ));
    }

    #[tokio::test]
    async fn test_panic_becomes_classified_failure() {
        let mut probe = Probe::default();
        let pipeline = Pipeline::new(vec![
            Phase::new("Panics", step_panic),
            Phase::new("Two", step_two),
        ]);

        let outcome = pipeline.execute(&mut probe).await;

        let PipelineOutcome::Failed(err) = outcome else {
            panic!("expected failure outcome");
        };
        assert!(matches!(
            err,
            ControllerError::PhaseAborted { phase: "Panics", .. }
        ));
        assert_eq!(err.classify(), ErrorClass::Internal);
        assert!(err.to_string().contains("boom"));
        assert!(probe.visited.is_empty());
    }

    #[tokio::test]
    async fn test_empty_pipeline_is_done() {
        let mut probe = Probe::default();
        let pipeline: Pipeline<Probe> = Pipeline::new(Vec::new());

        assert!(matches!(
            pipeline.execute(&mut probe).await,
            PipelineOutcome::Done
        ));
    }

    #[test]
    fn test_phase_names_reflect_declaration_order() {
        let pipeline = Pipeline::new(vec![
            Phase::new("One", step_one),
            Phase::new("Two", step_two),
        ]);

        assert_eq!(pipeline.phase_names(), vec!["One", "Two"]);
    }
}
