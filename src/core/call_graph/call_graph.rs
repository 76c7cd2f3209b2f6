// src/core/call_graph/call_graph.rs
use std::collections::HashMap;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use crate::core::model::{FunctionId, FunctionRecord};

/// Who calls a function, and from where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingCall {
    pub caller: FunctionId,
    pub caller_name: String,
    pub file: PathBuf,
    pub line: usize,
}

/// Phase 2: extracted functions plus name-resolved call edges.
///
/// Resolution is global and unscoped. A call to `process` links to every
/// function named `process` anywhere in the tree; calls naming no known
/// function produce no edge. A function never receives an edge from itself.
#[derive(Debug, Clone)]
pub struct CallGraph {
    functions: Vec<FunctionRecord>,
    index: HashMap<FunctionId, usize>,
    /// Parallel to `functions`
    incoming: Vec<Vec<IncomingCall>>,
    /// Parallel to `functions`: distinct resolved callees in first-call order
    adjacency: Vec<Vec<usize>>,
    unresolved_calls: usize,
}

impl CallGraph {
    /// Resolve every outgoing call. Takes the complete extraction output, so no
    /// resolution can start before every file has been scanned.
    pub fn build(functions: Vec<FunctionRecord>) -> Self {
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, function) in functions.iter().enumerate() {
            by_name.entry(function.name.as_str()).or_default().push(i);
        }

        let mut incoming: Vec<Vec<IncomingCall>> = vec![Vec::new(); functions.len()];
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); functions.len()];
        let mut unresolved_calls = 0;

        for (caller_index, caller) in functions.iter().enumerate() {
            for call in &caller.outgoing_calls {
                let Some(targets) = by_name.get(call.callee.as_str()) else {
                    unresolved_calls += 1;
                    continue;
                };
                for &target in targets {
                    if target == caller_index {
                        continue;
                    }
                    incoming[target].push(IncomingCall {
                        caller: caller.id.clone(),
                        caller_name: caller.display_name(),
                        file: caller.file.clone(),
                        line: call.line,
                    });
                    if !adjacency[caller_index].contains(&target) {
                        adjacency[caller_index].push(target);
                    }
                }
            }
        }

        let index = functions
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.clone(), i))
            .collect();

        Self {
            functions,
            index,
            incoming,
            adjacency,
            unresolved_calls,
        }
    }

    /// All functions in scan order
    pub fn functions(&self) -> &[FunctionRecord] {
        &self.functions
    }

    pub fn get(&self, id: &FunctionId) -> Option<&FunctionRecord> {
        self.index.get(id).map(|&i| &self.functions[i])
    }

    /// Callers of `id`, one entry per resolved call site
    pub fn incoming_calls(&self, id: &FunctionId) -> &[IncomingCall] {
        self.index
            .get(id)
            .map(|&i| self.incoming[i].as_slice())
            .unwrap_or_default()
    }

    /// Distinct functions `id` calls
    pub fn callees(&self, id: &FunctionId) -> Vec<&FunctionRecord> {
        self.index
            .get(id)
            .map(|&i| self.adjacency[i].iter().map(|&j| &self.functions[j]).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Get statistics about the call graph
    pub fn statistics(&self) -> CallGraphStats {
        let in_degrees = self.incoming.iter().map(Vec::len);
        let out_degrees = self.adjacency.iter().map(Vec::len);

        CallGraphStats {
            total_functions: self.functions.len(),
            total_edges: self.incoming.iter().map(Vec::len).sum(),
            unresolved_calls: self.unresolved_calls,
            root_candidates: self
                .incoming
                .iter()
                .zip(&self.adjacency)
                .filter(|(callers, callees)| callers.is_empty() && !callees.is_empty())
                .count(),
            max_in_degree: in_degrees.max().unwrap_or(0),
            max_out_degree: out_degrees.max().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphStats {
    pub total_functions: usize,
    /// Resolved call-site edges, counting every over-linked target
    pub total_edges: usize,
    /// Call sites naming no known function (library or external calls)
    pub unresolved_calls: usize,
    /// Functions nobody calls that call something themselves
    pub root_candidates: usize,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
}
