//! Per-step provisioning report, summary table and JSON output

use crate::error::ProvisionError;
use anyhow::{Context, Result};
use cloudseed_common::{ProvisionState, TransitionError};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Exit code when at least one step failed
pub const EXIT_STEP_FAILED: i32 = 2;

/// The provisioning steps a report can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    EnsurePrincipal,
    BindInlinePolicy,
    BindManagedPolicy,
    EnsureBucket,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::EnsurePrincipal => "ensure-principal",
            Step::BindInlinePolicy => "bind-inline-policy",
            Step::BindManagedPolicy => "bind-managed-policy",
            Step::EnsureBucket => "ensure-bucket",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State and detail of one step
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: Step,
    /// Resource the step acts on (user name, policy name/ARN, bucket)
    pub target: String,
    #[serde(flatten)]
    pub state: ProvisionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StepReport {
    pub fn new(step: Step, target: impl Into<String>) -> Self {
        Self {
            step,
            target: target.into(),
            state: ProvisionState::NotRequested,
            detail: None,
        }
    }

    /// Mark the step as in flight
    pub fn begin(&mut self) -> Result<(), TransitionError> {
        self.state = self.state.request()?;
        Ok(())
    }

    /// Settle an in-flight step with a successful terminal state
    pub fn succeed(&mut self, terminal: ProvisionState) -> Result<(), TransitionError> {
        self.state = self.state.settle(terminal)?;
        Ok(())
    }

    /// Settle an in-flight step as failed, keeping the error text and any hint
    pub fn fail(&mut self, err: &ProvisionError) -> Result<(), TransitionError> {
        self.state = self.state.settle(ProvisionState::Failed(err.kind()))?;
        self.detail = Some(match err.suggestion() {
            Some(hint) => format!("{err}. {hint}"),
            None => err.to_string(),
        });
        Ok(())
    }

    /// Record why a step was never requested
    pub fn skip(&mut self, reason: impl Into<String>) {
        self.detail = Some(reason.into());
    }
}

/// Ordered step reports for one invocation
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProvisionReport {
    steps: Vec<StepReport>,
}

impl ProvisionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: StepReport) {
        self.steps.push(step);
    }

    /// Append all steps of `other`
    pub fn merge(&mut self, other: ProvisionReport) {
        self.steps.extend(other.steps);
    }

    pub fn steps(&self) -> &[StepReport] {
        &self.steps
    }

    /// Look up a step by kind
    pub fn step(&self, step: Step) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step == step)
    }

    /// True when no step failed
    pub fn is_success(&self) -> bool {
        !self.steps.iter().any(|s| s.state.is_failed())
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            EXIT_STEP_FAILED
        }
    }

    /// Build the summary table
    pub fn render_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Step"),
                Cell::new("Target"),
                Cell::new("State"),
                Cell::new("Detail"),
            ]);

        for step in &self.steps {
            table.add_row(vec![
                Cell::new(step.step),
                Cell::new(&step.target),
                Cell::new(step.state),
                Cell::new(step.detail.as_deref().unwrap_or("-")),
            ]);
        }

        table
    }

    /// Print the summary table to stdout
    pub fn print_summary(&self) {
        if self.steps.is_empty() {
            return;
        }

        println!("\n=== Provisioning Summary ===\n");
        println!("{}", self.render_table());
    }

    /// JSON form written by `--output`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "written_at": chrono::Utc::now().to_rfc3339(),
            "success": self.is_success(),
            "steps": self.steps,
        })
    }

    /// Write the JSON form to `path`
    pub async fn write_json(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(&self.to_json())?;
        tokio::fs::write(path, body)
            .await
            .with_context(|| format!("failed to write report to {}", path.display()))?;

        info!(path = %path.display(), "Report written");
        Ok(())
    }
}
