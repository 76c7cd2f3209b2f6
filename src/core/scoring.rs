// src/core/scoring.rs
use std::collections::HashSet;
use tracing::debug;

use crate::config::SelectionConfig;
use crate::error::{ArchflowError, Result};
use super::call_graph::CallGraph;
use super::classifier::Classification;
use super::model::{FunctionRecord, FunctionTraits, Layer, RankedFunction};

const ENTRY_POINT_WEIGHT: u32 = 10;
const EXPORTED_WEIGHT: u32 = 5;
const INCOMING_CALL_WEIGHT: u32 = 2;
const DECISION_POINT_WEIGHT: u32 = 3;
const ASYNC_WEIGHT: u32 = 3;
const BUSINESS_LOGIC_WEIGHT: u32 = 4;
const EVENT_HANDLER_WEIGHT: u32 = 3;
const LIFECYCLE_WEIGHT: u32 = 15;

const LIFECYCLE_NAMES: &[&str] = &["main", "init", "activate", "start", "run"];

/// Weighted importance heuristic
#[derive(Debug, Default)]
pub struct ImportanceScorer;

impl ImportanceScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, function: &FunctionRecord, traits: &FunctionTraits, incoming_calls: usize) -> u32 {
        let mut score = 0u32;
        if traits.is_entry_point {
            score += ENTRY_POINT_WEIGHT;
        }
        if function.is_exported {
            score += EXPORTED_WEIGHT;
        }
        score = score.saturating_add(INCOMING_CALL_WEIGHT.saturating_mul(incoming_calls as u32));
        score = score.saturating_add(
            DECISION_POINT_WEIGHT.saturating_mul(function.decision_points.len() as u32),
        );
        if function.is_async {
            score += ASYNC_WEIGHT;
        }
        if traits.is_business_logic {
            score += BUSINESS_LOGIC_WEIGHT;
        }
        if traits.is_event_handler {
            score += EVENT_HANDLER_WEIGHT;
        }
        if is_lifecycle_name(&function.name) {
            score += LIFECYCLE_WEIGHT;
        }
        score
    }

    /// Score every function and sort descending; ties keep scan order
    pub fn rank(&self, graph: &CallGraph, classification: &Classification) -> Vec<RankedFunction> {
        let mut ranked: Vec<RankedFunction> = graph
            .functions()
            .iter()
            .zip(&classification.functions)
            .enumerate()
            .map(|(scan_order, (function, classified))| {
                let incoming_calls = graph.incoming_calls(&function.id).len();
                let importance = self.score(function, &classified.traits, incoming_calls);
                RankedFunction {
                    id: function.id.clone(),
                    name: function.name.clone(),
                    display_name: function.display_name(),
                    file: function.file.clone(),
                    line: function.line,
                    kind: function.kind,
                    is_exported: function.is_exported,
                    is_async: function.is_async,
                    traits: classified.traits,
                    layers: classified.layers.clone(),
                    primary_layer: classified.layers.first().copied().unwrap_or(Layer::Utilities),
                    incoming_calls,
                    decision_points: function.decision_points.len(),
                    importance,
                    scan_order,
                }
            })
            .collect();

        // sort_by is stable, so equal scores stay in scan order
        ranked.sort_by(|a, b| b.importance.cmp(&a.importance));
        ranked
    }
}

pub fn is_lifecycle_name(name: &str) -> bool {
    LIFECYCLE_NAMES.iter().any(|l| name.eq_ignore_ascii_case(l))
}

/// Bounded, layer-covering subset of the ranking
#[derive(Debug, Clone)]
pub struct Selector {
    cap: usize,
    top_k: usize,
}

impl Selector {
    pub fn new(config: &SelectionConfig) -> Self {
        Self {
            cap: config.selection_cap,
            top_k: config.top_k,
        }
    }

    /// Top-k by score, then the best member of each unrepresented layer, then
    /// further ranked functions until `min(cap, total)`. Output keeps rank order.
    pub fn select(&self, ranked: &[RankedFunction]) -> Result<Vec<RankedFunction>> {
        let top = ranked.len().min(self.top_k.min(self.cap));
        let mut picked: Vec<usize> = (0..top).collect();

        // Coverage is judged against the top-k alone, not earlier backfill picks
        for layer in Layer::ALL {
            if picked.len() >= self.cap {
                break;
            }
            if ranked[..top].iter().any(|f| f.layers.contains(&layer)) {
                continue;
            }
            // ranked is sorted, so the first member is the best one
            if let Some(best) = ranked.iter().position(|f| f.layers.contains(&layer)) {
                if !picked.contains(&best) {
                    debug!("Backfilling layer {} with {}", layer, ranked[best].display_name);
                    picked.push(best);
                }
            }
        }

        for i in 0..ranked.len() {
            if picked.len() >= self.cap {
                break;
            }
            if !picked.contains(&i) {
                picked.push(i);
            }
        }

        picked.sort_unstable();
        let selected: Vec<RankedFunction> = picked.into_iter().map(|i| ranked[i].clone()).collect();

        if selected.len() > self.cap {
            return Err(ArchflowError::Invariant(format!(
                "selected {} functions, cap is {}",
                selected.len(),
                self.cap
            )));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = selected.iter().find(|f| !seen.insert(&f.id)) {
            return Err(ArchflowError::Invariant(format!(
                "function {} selected twice",
                duplicate.id
            )));
        }

        Ok(selected)
    }
}
