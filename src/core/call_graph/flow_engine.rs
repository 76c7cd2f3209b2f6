// src/core/call_graph/flow_engine.rs
use std::path::Path;
use std::time::Instant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use super::{CallGraph, CallGraphStats};
use crate::core::classifier::ArchitecturalClassifier;
use crate::core::diagram::{DiagramGraph, DiagramSynthesizer};
use crate::core::languages::ExtractorRegistry;
use crate::core::model::{FunctionRecord, Layer, RankedFunction};
use crate::core::scanner::SourceScanner;
use crate::core::scoring::{ImportanceScorer, Selector};

/// Runs scan → extract → resolve → classify → score → select → synthesize
pub struct FlowEngine {
    scanner: SourceScanner,
    extractors: ExtractorRegistry,
    classifier: ArchitecturalClassifier,
    scorer: ImportanceScorer,
    selector: Selector,
    synthesizer: DiagramSynthesizer,
    direction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowAnalysisResult {
    pub stats: AnalysisStatistics,
    pub call_graph: CallGraphStats,
    /// Selected functions in rank order
    pub selected: Vec<RankedFunction>,
    pub layer_counts: Vec<(Layer, usize)>,
    pub diagram: DiagramGraph,
    pub mermaid: String,
    /// SHA-256 of `mermaid`, hex encoded
    pub fingerprint: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStatistics {
    pub files_scanned: usize,
    pub classes: usize,
    pub functions: usize,
    pub imports: usize,
    pub decision_points: usize,
    pub call_edges: usize,
    pub elapsed_ms: u128,
}

impl FlowEngine {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            scanner: SourceScanner::new(&config.scan),
            extractors: ExtractorRegistry::new()?,
            classifier: ArchitecturalClassifier::new(),
            scorer: ImportanceScorer::new(),
            selector: Selector::new(&config.selection),
            synthesizer: DiagramSynthesizer::new(),
            direction: config.output.direction.clone(),
        })
    }

    /// Analyze the tree under `root`. Identical trees give identical diagram text.
    pub fn analyze<P: AsRef<Path>>(&self, root: P) -> Result<FlowAnalysisResult> {
        let start_time = Instant::now();
        let root = root.as_ref();
        info!("🔍 Analyzing {}", root.display());

        // Step 1: Scan
        let files = self.scanner.scan(root);
        info!("Found {} source files", files.len());

        // Step 2: Extract; every file finishes before any call is resolved
        let mut stats = AnalysisStatistics {
            files_scanned: files.len(),
            ..AnalysisStatistics::default()
        };
        let mut functions: Vec<FunctionRecord> = Vec::new();
        for file in &files {
            let Some(extraction) = self.extractors.extract_file(file) else {
                continue;
            };
            stats.classes += extraction.classes.len();
            stats.imports += extraction.imports.len();
            stats.decision_points += extraction.decision_point_count();
            functions.extend(extraction.functions);
        }
        stats.functions = functions.len();

        // Step 3: Resolve calls
        let graph = CallGraph::build(functions);
        let graph_stats = graph.statistics();
        stats.call_edges = graph_stats.total_edges;
        info!(
            "Built call graph: {} functions, {} edges, {} unresolved calls",
            graph_stats.total_functions, graph_stats.total_edges, graph_stats.unresolved_calls
        );

        // Step 4: Classify and rank
        let classification = self.classifier.classify(&graph);
        let ranked = self.scorer.rank(&graph, &classification);
        for function in ranked.iter().take(5) {
            debug!("Top function: {} (score {})", function.display_name, function.importance);
        }

        // Step 5: Select
        let selected = self.selector.select(&ranked)?;
        info!("Selected {} of {} functions", selected.len(), ranked.len());

        // Step 6: Synthesize
        let diagram = self.synthesizer.synthesize(&selected, &classification.layers);
        let mermaid = diagram.to_mermaid(&self.direction);
        let fingerprint = fingerprint(&mermaid);

        stats.elapsed_ms = start_time.elapsed().as_millis();
        info!(
            "✅ Diagram ready: {} nodes, {} edges ({} ms)",
            diagram.nodes().len(),
            diagram.edges().len(),
            stats.elapsed_ms
        );

        Ok(FlowAnalysisResult {
            stats,
            call_graph: graph_stats,
            selected,
            layer_counts: classification.layers.counts(),
            diagram,
            mermaid,
            fingerprint,
            generated_at: Utc::now(),
        })
    }
}

impl FlowAnalysisResult {
    /// Plain-text summary handed to the generative augmenter and printed by `analyze`
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str(&format!(
            "Scanned {} files: {} classes, {} functions, {} imports, {} decision points, {} call edges.\n",
            self.stats.files_scanned,
            self.stats.classes,
            self.stats.functions,
            self.stats.imports,
            self.stats.decision_points,
            self.stats.call_edges
        ));

        let populated: Vec<String> = self
            .layer_counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(layer, count)| format!("{} ({})", layer.label(), count))
            .collect();
        if !populated.is_empty() {
            summary.push_str(&format!("Layers: {}.\n", populated.join(", ")));
        }

        if !self.selected.is_empty() {
            summary.push_str("Key functions:\n");
            for function in &self.selected {
                summary.push_str(&format!(
                    "- {} [{}] score {}, {} callers, {} decision points\n",
                    function.display_name,
                    function.primary_layer.label(),
                    function.importance,
                    function.incoming_calls,
                    function.decision_points
                ));
            }
        }
        summary
    }
}

pub fn fingerprint(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const EXTENSION_TS: &str = r#"import * as vscode from 'vscode';

export async function activate(context) {
    setup(context);
    run();
}

function setup(context) {
    context.ready = true;
}

function run() {
    if (ready) {
        process();
    }
}

export function process() {
    return 1;
}
"#;

    fn analyze(dir: &TempDir) -> FlowAnalysisResult {
        FlowEngine::new(&Config::default())
            .unwrap()
            .analyze(dir.path())
            .unwrap()
    }

    #[test]
    fn test_statistics_and_selection() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/extension.ts"), EXTENSION_TS).unwrap();

        let result = analyze(&dir);
        assert_eq!(result.stats.files_scanned, 1);
        assert_eq!(result.stats.functions, 4);
        assert_eq!(result.stats.imports, 1);
        assert_eq!(result.stats.decision_points, 1);
        assert_eq!(result.stats.call_edges, 3);

        let names: Vec<&str> = result.selected.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["activate", "run", "process", "setup"]);
        assert!(result.mermaid.starts_with("flowchart TD\n"));
        assert_eq!(result.fingerprint, fingerprint(&result.mermaid));
    }

    #[test]
    fn test_repeat_runs_are_identical() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("extension.ts"), EXTENSION_TS).unwrap();
        fs::write(dir.path().join("worker.py"), "def handle_job(job):\n    if job:\n        save(job)\n").unwrap();

        let first = analyze(&dir);
        let second = analyze(&dir);
        assert_eq!(first.mermaid, second.mermaid);
        assert_eq!(first.fingerprint, second.fingerprint);
    }

    #[test]
    fn test_summary_mentions_key_functions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("extension.ts"), EXTENSION_TS).unwrap();

        let summary = analyze(&dir).summary();
        assert!(summary.starts_with("Scanned 1 files"));
        assert!(summary.contains("- activate [Entry Points] score 33"));
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        assert_eq!(
            fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
