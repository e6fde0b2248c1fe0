// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{RawConfigFile, StageMap};
use crate::errors::{PipelineError, Result};
use crate::types::{TaskKind, TriggerWhileRunningBehaviour};

/// Run value-level validation against a loaded configuration.
///
/// This checks:
/// - `triggered_while_running_behaviour` is valid ("queue" or "cancel")
/// - `queue_length >= 1`
/// - image qualities are within 0–100
/// - `[task.<name>]` only names build tasks, and `after` only lists build
///   tasks
///
/// The merged stage graph is checked separately by [`validate_stages`].
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_collaborators(cfg)?;
    validate_task_sections(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    cfg.config
        .triggered_while_running_behaviour
        .parse::<TriggerWhileRunningBehaviour>()
        .map_err(|e| PipelineError::ConfigError(format!("[config]: {e}")))?;

    if cfg.config.queue_length == 0 {
        return Err(PipelineError::ConfigError(
            "[config].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_collaborators(cfg: &RawConfigFile) -> Result<()> {
    for (key, value) in [
        ("webp_quality", cfg.images.webp_quality),
        ("jpeg_quality", cfg.images.jpeg_quality),
    ] {
        if value > 100 {
            return Err(PipelineError::ConfigError(format!(
                "[images].{key} must be between 0 and 100 (got {value})"
            )));
        }
    }

    if cfg.js.bundle_name.trim().is_empty() {
        return Err(PipelineError::ConfigError(
            "[js].bundle_name must not be empty".to_string(),
        ));
    }

    if cfg.css.browsers.is_empty() {
        return Err(PipelineError::ConfigError(
            "[css].browsers must list at least one browserslist query".to_string(),
        ));
    }

    Ok(())
}

fn validate_task_sections(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        ensure_build_task(name).map_err(|_| {
            PipelineError::ConfigError(format!(
                "[task.{name}] does not name a build task (expected one of {})",
                build_task_names()
            ))
        })?;

        for dep in task.after.iter().flatten() {
            ensure_build_task(dep).map_err(|_| {
                PipelineError::ConfigError(format!(
                    "task '{name}' has unknown dependency '{dep}' in `after`"
                ))
            })?;
        }
    }
    Ok(())
}

/// Validate the merged stage graph.
///
/// - no task depends on itself or on an unknown task
/// - the graph is acyclic
/// - `clean` has no dependencies, and every other task runs after it
///   (directly or transitively), so nothing writes into the output root
///   while it is being deleted
pub fn validate_stages(stages: &StageMap) -> Result<()> {
    for (name, deps) in stages.iter() {
        for dep in deps {
            if dep == name {
                return Err(PipelineError::ConfigError(format!(
                    "task '{name}' cannot depend on itself in `after`"
                )));
            }
            if !stages.contains_key(dep) {
                return Err(PipelineError::ConfigError(format!(
                    "task '{name}' has unknown dependency '{dep}' in `after`"
                )));
            }
        }
    }

    validate_acyclic(stages)?;
    validate_clean_first(stages)?;
    Ok(())
}

fn validate_acyclic(stages: &StageMap) -> Result<()> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in stages.keys() {
        graph.add_node(name.as_str());
    }

    for (name, deps) in stages.iter() {
        for dep in deps {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(PipelineError::StageCycle(format!(
            "cycle detected in stage graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}

fn validate_clean_first(stages: &StageMap) -> Result<()> {
    let clean = TaskKind::Clean.as_str();

    if stages.get(clean).is_some_and(|deps| !deps.is_empty()) {
        return Err(PipelineError::ConfigError(
            "task 'clean' must not depend on other tasks".to_string(),
        ));
    }

    for name in stages.keys().filter(|n| n.as_str() != clean) {
        if !has_ancestor(stages, name, clean) {
            return Err(PipelineError::ConfigError(format!(
                "task '{name}' must run after 'clean' (directly or through its dependencies)"
            )));
        }
    }

    Ok(())
}

fn has_ancestor(stages: &StageMap, task: &str, ancestor: &str) -> bool {
    let mut stack: Vec<&str> = stages
        .get(task)
        .map(|deps| deps.iter().map(String::as_str).collect())
        .unwrap_or_default();
    let mut seen: HashSet<&str> = HashSet::new();

    while let Some(name) = stack.pop() {
        if name == ancestor {
            return true;
        }
        if !seen.insert(name) {
            continue;
        }
        if let Some(deps) = stages.get(name) {
            stack.extend(deps.iter().map(String::as_str));
        }
    }

    false
}

fn ensure_build_task(name: &str) -> std::result::Result<TaskKind, String> {
    let kind = name.parse::<TaskKind>()?;
    if kind.is_build_task() {
        Ok(kind)
    } else {
        Err(format!("'{name}' is not a build task"))
    }
}

fn build_task_names() -> String {
    TaskKind::BUILD
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
