//! The `validate`, `plan` and `run` commands.
//!
//! Each command returns what it would print along with the process exit
//! code, so the binary's `main` stays a thin shell.

use crate::error::CliError;
use flowline_core::WorkflowId;
use flowline_workflow::{
    Capabilities, Engine, ExecutionStatus, ExecutorConfig, GraphDefinition, HandlerRegistry,
    PreparedWorkflow, WorkflowMetadata,
};
use rootcause::prelude::Report;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exit code for a run that finished with failed nodes.
pub const EXIT_RUN_FAILED: u8 = 1;
/// Exit code for a workflow the engine refused to run.
pub const EXIT_REJECTED: u8 = 2;

/// What a command printed and how the process should exit.
///
/// `stdout` carries only command results, so a run report can be piped
/// straight into another tool. Rejections go to `stderr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: u8,
}

impl CommandOutput {
    fn success(stdout: String) -> Self {
        Self {
            stdout,
            stderr: String::new(),
            exit_code: 0,
        }
    }
}

/// A workflow file: either a stored definition or a bare `{nodes, edges}`.
#[derive(Debug, Deserialize)]
struct WorkflowFile {
    #[serde(default)]
    id: Option<WorkflowId>,
    #[serde(default)]
    metadata: Option<WorkflowMetadata>,
    #[serde(flatten)]
    graph: GraphDefinition,
}

impl WorkflowFile {
    fn load(path: &Path) -> Result<Self, Report<CliError>> {
        let contents = fs::read_to_string(path).map_err(|e| CliError::ReadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let file: Self = serde_json::from_str(&contents).map_err(|e| CliError::InvalidWorkflow {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(
            path = %path.display(),
            nodes = file.graph.nodes.len(),
            edges = file.graph.edges.len(),
            "loaded workflow file"
        );
        Ok(file)
    }

    fn name(&self) -> Option<&str> {
        self.metadata.as_ref().map(|metadata| metadata.name.as_str())
    }
}

/// Where the run input comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InputSource {
    /// No input: the workflow sees `null`.
    #[default]
    None,
    /// Inline JSON text.
    Inline(String),
    /// A JSON file.
    File(PathBuf),
}

impl InputSource {
    fn read(&self) -> Result<JsonValue, Report<CliError>> {
        let text = match self {
            Self::None => return Ok(JsonValue::Null),
            Self::Inline(text) => text.clone(),
            Self::File(path) => fs::read_to_string(path).map_err(|e| CliError::ReadFailed {
                path: path.clone(),
                message: e.to_string(),
            })?,
        };
        Ok(serde_json::from_str(&text).map_err(|e| CliError::InvalidInput {
            message: e.to_string(),
        })?)
    }
}

fn rejection(message: impl Into<String>) -> CommandOutput {
    let error = CliError::Rejected {
        message: message.into(),
    };
    CommandOutput {
        stdout: String::new(),
        stderr: error.to_string(),
        exit_code: EXIT_REJECTED,
    }
}

/// Checks that a workflow file is well-formed and acyclic.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn validate(path: &Path) -> Result<CommandOutput, Report<CliError>> {
    let file = WorkflowFile::load(path)?;
    let label = file.name().unwrap_or("workflow").to_string();

    Ok(match PreparedWorkflow::prepare(file.graph) {
        Ok(prepared) => CommandOutput::success(format!(
            "{label} is valid: {} nodes, {} edges, {} levels",
            prepared.graph.node_count(),
            prepared.graph.edge_count(),
            prepared.plan.levels.len(),
        )),
        Err(report) => rejection(report.to_string()),
    })
}

/// Prints the execution levels of a workflow.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn plan(path: &Path) -> Result<CommandOutput, Report<CliError>> {
    let file = WorkflowFile::load(path)?;

    Ok(match PreparedWorkflow::prepare(file.graph) {
        Ok(prepared) => {
            let lines: Vec<String> = prepared
                .plan
                .levels
                .iter()
                .enumerate()
                .map(|(index, level)| {
                    let ids: Vec<&str> = level.iter().map(|id| id.as_str()).collect();
                    format!("level {index}: {}", ids.join(", "))
                })
                .collect();
            CommandOutput::success(lines.join("\n"))
        }
        Err(report) => rejection(report.to_string()),
    })
}

/// Executes a workflow with the simulated providers and prints the report.
///
/// # Errors
///
/// Returns an error if the workflow file or the input cannot be read.
pub async fn run(
    path: &Path,
    input: &InputSource,
    config: ExecutorConfig,
) -> Result<CommandOutput, Report<CliError>> {
    let file = WorkflowFile::load(path)?;
    let input = input.read()?;
    let workflow_id = file.id.unwrap_or_default();

    let engine = Engine::new(HandlerRegistry::builtin(Capabilities::simulated()), config);
    let report = match engine.execute(workflow_id, file.graph, input).await {
        Ok(report) => report,
        Err(report) => return Ok(rejection(report.to_string())),
    };

    let stdout = serde_json::to_string_pretty(&report).map_err(|e| CliError::InvalidWorkflow {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let exit_code = match report.status {
        ExecutionStatus::Completed => 0,
        ExecutionStatus::Failed => EXIT_RUN_FAILED,
    };

    Ok(CommandOutput {
        stdout,
        stderr: String::new(),
        exit_code,
    })
}
