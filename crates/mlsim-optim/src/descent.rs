use mlsim_core::{Float, MlError, MlResult};
use serde::{Deserialize, Serialize};

use crate::objective::Objective;

/// When a descent run stops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub enum StopCondition<T: Float> {
    /// Take exactly this many steps.
    MaxSteps(usize),
    /// Stop before stepping once `|f'(w)| < epsilon`, or after `max_steps`.
    GradientBelow { epsilon: T, max_steps: usize },
}

impl<T: Float> StopCondition<T> {
    pub fn max_steps(&self) -> usize {
        match *self {
            StopCondition::MaxSteps(n) => n,
            StopCondition::GradientBelow { max_steps, .. } => max_steps,
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    StepLimit,
    Converged,
    /// `w` or `f(w)` overflowed to a non-finite value.
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct DescentParams<T: Float> {
    pub learning_rate: T,
    pub stop: StopCondition<T>,
}

impl<T: Float> Default for DescentParams<T> {
    fn default() -> Self {
        DescentParams {
            learning_rate: T::from_f64(0.1),
            stop: StopCondition::MaxSteps(50),
        }
    }
}

impl<T: Float> DescentParams<T> {
    pub fn new(learning_rate: T, stop: StopCondition<T>) -> Self {
        DescentParams {
            learning_rate,
            stop,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: T) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_stop(mut self, stop: StopCondition<T>) -> Self {
        self.stop = stop;
        self
    }

    pub fn validate(&self) -> MlResult<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= T::ZERO {
            return Err(MlError::invalid(
                "learning_rate",
                format!("must be finite and > 0, got {}", self.learning_rate),
            ));
        }
        if let StopCondition::GradientBelow { epsilon, .. } = self.stop {
            if !epsilon.is_finite() || epsilon <= T::ZERO {
                return Err(MlError::invalid(
                    "epsilon",
                    format!("must be finite and > 0, got {}", epsilon),
                ));
            }
        }
        Ok(())
    }
}

/// Position of the iterate between steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct DescentState<T: Float> {
    pub step: usize,
    pub w: T,
}

/// One update: the gradient used and where it landed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct TraceEntry<T: Float> {
    pub step: usize,
    pub gradient: T,
    pub w: T,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct DescentTrace<T: Float> {
    pub start: T,
    pub start_value: T,
    pub entries: Vec<TraceEntry<T>>,
    pub reason: StopReason,
}

impl<T: Float> DescentTrace<T> {
    pub fn steps(&self) -> usize {
        self.entries.len()
    }

    pub fn final_w(&self) -> T {
        self.entries.last().map_or(self.start, |e| e.w)
    }

    pub fn final_value(&self) -> T {
        self.entries.last().map_or(self.start_value, |e| e.value)
    }

    /// The objective ended higher than it started, or overflowed.
    pub fn diverged(&self) -> bool {
        let last = self.final_value();
        self.reason == StopReason::NonFinite || !last.is_finite() || last > self.start_value
    }
}

/// Steepest descent on a scalar objective: `w ← w − α·f'(w)`.
///
/// No clamping is applied to the iterate; a large learning rate makes `w`
/// grow without bound and the trace records it.
#[derive(Debug, Clone)]
pub struct GradientDescent<T: Float, O> {
    objective: O,
    params: DescentParams<T>,
}

impl<T: Float, O: Objective<T>> GradientDescent<T, O> {
    pub fn new(objective: O, params: DescentParams<T>) -> MlResult<Self> {
        params.validate()?;
        Ok(GradientDescent { objective, params })
    }

    pub fn params(&self) -> &DescentParams<T> {
        &self.params
    }

    pub fn objective(&self) -> &O {
        &self.objective
    }

    pub fn start(&self, w0: T) -> DescentState<T> {
        DescentState { step: 0, w: w0 }
    }

    /// One transition. The caller decides whether to continue.
    pub fn step(&self, state: DescentState<T>) -> (DescentState<T>, TraceEntry<T>) {
        let gradient = self.objective.gradient(state.w);
        let w = state.w - self.params.learning_rate * gradient;
        let value = self.objective.value(w);
        let next = DescentState {
            step: state.step + 1,
            w,
        };
        log::trace!("descent step {}: g={} w={} f={}", next.step, gradient, w, value);
        (
            next,
            TraceEntry {
                step: next.step,
                gradient,
                w,
                value,
            },
        )
    }

    /// Iterate from `w0` until the configured stop condition holds.
    pub fn run(&self, w0: T) -> DescentTrace<T> {
        let max_steps = self.params.stop.max_steps();
        let mut state = self.start(w0);
        let mut entries = Vec::with_capacity(max_steps);
        let mut reason = StopReason::StepLimit;

        while state.step < max_steps {
            if let StopCondition::GradientBelow { epsilon, .. } = self.params.stop {
                if self.objective.gradient(state.w).abs() < epsilon {
                    reason = StopReason::Converged;
                    break;
                }
            }
            let (next, entry) = self.step(state);
            entries.push(entry);
            state = next;
            if !entry.w.is_finite() || !entry.value.is_finite() {
                reason = StopReason::NonFinite;
                break;
            }
        }
        if reason == StopReason::StepLimit {
            if let StopCondition::GradientBelow { epsilon, .. } = self.params.stop {
                if self.objective.gradient(state.w).abs() < epsilon {
                    reason = StopReason::Converged;
                }
            }
        }

        log::debug!(
            "gradient descent: {} steps, w={}, stop={:?}",
            entries.len(),
            state.w,
            reason
        );
        DescentTrace {
            start: w0,
            start_value: self.objective.value(w0),
            entries,
            reason,
        }
    }
}
