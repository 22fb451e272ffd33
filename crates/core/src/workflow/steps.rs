//! Ordered approval steps for a scholarship.

use std::collections::HashSet;

use scholarflow_shared::WorkflowConfig;
use scholarflow_shared::config::DEFAULT_WORKFLOW_STEPS;
use serde::{Deserialize, Serialize};

use crate::workflow::error::WorkflowError;

/// Ordered, non-empty list of uniquely named review steps.
///
/// Position in this list is the only authority for which step follows
/// which.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ApprovalWorkflow {
    steps: Vec<String>,
}

impl ApprovalWorkflow {
    /// Builds a workflow from step names.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, a name is blank, or a name
    /// appears twice.
    pub fn new<I, S>(steps: I) -> Result<Self, WorkflowError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let steps: Vec<String> = steps.into_iter().map(Into::into).collect();
        if steps.is_empty() {
            return Err(WorkflowError::EmptyWorkflow);
        }

        let mut seen = HashSet::with_capacity(steps.len());
        for step in &steps {
            if step.trim().is_empty() {
                return Err(WorkflowError::BlankStep);
            }
            if !seen.insert(step.as_str()) {
                return Err(WorkflowError::DuplicateStep(step.clone()));
            }
        }

        Ok(Self { steps })
    }

    /// Builds the configured default workflow.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured steps do not form a valid workflow.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        Self::new(config.default_steps.iter().cloned())
    }

    /// Returns the steps in review order.
    #[must_use]
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Returns the step an application enters on submission.
    #[must_use]
    pub fn first(&self) -> &str {
        &self.steps[0]
    }

    /// Returns the final step.
    #[must_use]
    pub fn last(&self) -> &str {
        &self.steps[self.steps.len() - 1]
    }

    /// Returns the position of a step.
    #[must_use]
    pub fn position(&self, step: &str) -> Option<usize> {
        self.steps.iter().position(|s| s == step)
    }

    /// Returns true if the workflow contains the step.
    #[must_use]
    pub fn contains(&self, step: &str) -> bool {
        self.position(step).is_some()
    }

    /// Returns the step after `step`, or `None` if `step` is the last one.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStep` if `step` is not part of the workflow.
    pub fn next_after(&self, step: &str) -> Result<Option<&str>, WorkflowError> {
        let index = self
            .position(step)
            .ok_or_else(|| WorkflowError::UnknownStep(step.to_string()))?;
        Ok(self.steps.get(index + 1).map(String::as_str))
    }
}

impl Default for ApprovalWorkflow {
    fn default() -> Self {
        Self {
            steps: DEFAULT_WORKFLOW_STEPS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for ApprovalWorkflow {
    type Error = WorkflowError;

    fn try_from(steps: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<ApprovalWorkflow> for Vec<String> {
    fn from(workflow: ApprovalWorkflow) -> Self {
        workflow.steps
    }
}
