// src/core/call_graph/mod.rs
//! Global call resolution and the pipeline that turns it into a diagram
//!
//! Calls are resolved by bare name against every function in the tree, after
//! all files are extracted. Ambiguous names link to every candidate.

mod call_graph;
mod flow_engine;

pub use call_graph::{CallGraph, CallGraphStats, IncomingCall};
pub use flow_engine::{fingerprint, AnalysisStatistics, FlowAnalysisResult, FlowEngine};

#[cfg(test)]
pub(crate) use self::call_graph::tests::record;
