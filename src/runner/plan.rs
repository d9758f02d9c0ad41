//! Step plans and the orchestrator
//!
//! Pipelines are trees of series and parallel groups whose leaves are
//! built-in tasks. Parallel groups run on the rayon pool.

use crate::config::{Config, StepConfig};
use crate::error::{ConfigError, ConfigResult, TaskResult};
use crate::runner::{run_task, Context, TaskName};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// A resolved, executable plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Task(TaskName),
    Series(Vec<Step>),
    Parallel(Vec<Step>),
}

impl Step {
    /// Leaf tasks in execution order
    pub fn tasks(&self) -> Vec<TaskName> {
        match self {
            Step::Task(name) => vec![*name],
            Step::Series(steps) | Step::Parallel(steps) => {
                steps.iter().flat_map(Step::tasks).collect()
            }
        }
    }
}

fn name(s: &str) -> StepConfig {
    StepConfig::Name(s.to_string())
}

/// dev, build and bundle
pub fn builtin_pipelines() -> BTreeMap<String, Vec<StepConfig>> {
    let assets = || StepConfig::Parallel {
        parallel: ["html", "styles", "scripts", "images", "copy"]
            .into_iter()
            .map(name)
            .collect(),
    };

    let mut pipelines = BTreeMap::new();
    pipelines.insert("dev".to_string(), vec![name("clean"), assets(), name("watch")]);
    pipelines.insert("build".to_string(), vec![name("clean"), assets()]);
    pipelines.insert("bundle".to_string(), vec![name("build"), name("compress")]);
    pipelines
}

/// Built-in pipelines overlaid with the configured ones
pub fn pipeline_definitions(config: &Config) -> BTreeMap<String, Vec<StepConfig>> {
    let mut pipelines = builtin_pipelines();
    pipelines.extend(config.pipelines.clone());
    pipelines
}

/// Resolve a task or pipeline name into a plan
pub fn resolve(target: &str, config: &Config) -> ConfigResult<Step> {
    let pipelines = pipeline_definitions(config);
    let mut stack = Vec::new();
    resolve_name(target, &pipelines, &mut stack)
}

/// Resolve a list of step configs as a series
pub fn resolve_steps(steps: &[StepConfig], config: &Config) -> ConfigResult<Step> {
    let pipelines = pipeline_definitions(config);
    let mut stack = Vec::new();
    let resolved = steps
        .iter()
        .map(|s| resolve_step(s, &pipelines, &mut stack))
        .collect::<ConfigResult<Vec<_>>>()?;
    Ok(Step::Series(resolved))
}

fn resolve_name(
    target: &str,
    pipelines: &BTreeMap<String, Vec<StepConfig>>,
    stack: &mut Vec<String>,
) -> ConfigResult<Step> {
    let Some(steps) = pipelines.get(target) else {
        return target.parse::<TaskName>().map(Step::Task);
    };

    if stack.iter().any(|s| s == target) {
        stack.push(target.to_string());
        return Err(ConfigError::CircularPipeline(stack.join(" -> ")));
    }

    stack.push(target.to_string());
    let resolved = steps
        .iter()
        .map(|s| resolve_step(s, pipelines, stack))
        .collect::<ConfigResult<Vec<_>>>()?;
    stack.pop();

    Ok(Step::Series(resolved))
}

fn resolve_step(
    step: &StepConfig,
    pipelines: &BTreeMap<String, Vec<StepConfig>>,
    stack: &mut Vec<String>,
) -> ConfigResult<Step> {
    match step {
        StepConfig::Name(target) => resolve_name(target, pipelines, stack),
        StepConfig::Parallel { parallel } => Ok(Step::Parallel(
            parallel
                .iter()
                .map(|s| resolve_step(s, pipelines, stack))
                .collect::<ConfigResult<Vec<_>>>()?,
        )),
        StepConfig::Series { series } => Ok(Step::Series(
            series
                .iter()
                .map(|s| resolve_step(s, pipelines, stack))
                .collect::<ConfigResult<Vec<_>>>()?,
        )),
    }
}

/// Execute a plan
///
/// Series stop at the first failure. Parallel groups let every branch
/// finish and return the first failure.
pub fn execute(step: &Step, ctx: &Context) -> TaskResult<()> {
    match step {
        Step::Task(name) => run_task(*name, ctx),
        Step::Series(steps) => {
            for step in steps {
                execute(step, ctx)?;
            }
            Ok(())
        }
        Step::Parallel(steps) => {
            let results: Vec<TaskResult<()>> =
                steps.par_iter().map(|step| execute(step, ctx)).collect();
            results.into_iter().collect()
        }
    }
}
