// src/core/mod.rs
mod engine;
mod scanner;
mod classifier;
mod scoring;
mod diagram;
mod notify;

pub mod model;
pub mod llm;

// Call resolution and pipeline orchestration
pub mod call_graph;

// Dialect extractors
pub mod languages;

pub use scanner::SourceScanner;
pub use classifier::{ArchitecturalClassifier, Classification, ClassifiedFunction, LayerMap};
pub use scoring::{ImportanceScorer, Selector};
pub use diagram::{
    DiagramEdge, DiagramGraph, DiagramNode, DiagramSynthesizer, NodeStyle, Subgraph,
};
pub use notify::{ChannelSink, LogSink, Notification, NotificationSink};

pub use call_graph::{
    AnalysisStatistics, CallGraph, CallGraphStats, FlowAnalysisResult, FlowEngine, IncomingCall,
};
pub use languages::{DialectExtractor, ExtractorRegistry};

// Export the main engine
pub use engine::Engine;
