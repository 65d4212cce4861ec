use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMarker {
    Complete,
    Active,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current_step: usize,
    pub total_steps: usize,
}

impl Progress {
    pub fn new(current_step: usize, total_steps: usize) -> Self {
        Self {
            current_step,
            total_steps,
        }
    }

    /// Completion in `[0, 1]`: 0 on the first step, 1 on the last.
    pub fn fraction(&self) -> f64 {
        if self.total_steps <= 1 {
            return 1.0;
        }
        let done = self.current_step.clamp(1, self.total_steps) - 1;
        done as f64 / (self.total_steps - 1) as f64
    }

    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    pub fn markers(&self) -> Vec<StepMarker> {
        (1..=self.total_steps)
            .map(|step| match step.cmp(&self.current_step) {
                std::cmp::Ordering::Less => StepMarker::Complete,
                std::cmp::Ordering::Equal => StepMarker::Active,
                std::cmp::Ordering::Greater => StepMarker::Pending,
            })
            .collect()
    }
}
