// src/core/classifier.rs
use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use super::call_graph::CallGraph;
use super::model::{FunctionId, FunctionRecord, FunctionTraits, Layer};

const ENTRY_VOCABULARY: &[&str] = &[
    "main", "start", "init", "activate", "run", "register", "bootstrap",
];
const EVENT_VOCABULARY: &[&str] = &["handle", "click", "submit", "change", "load", "listener"];
const BUSINESS_VOCABULARY: &[&str] = &[
    "process", "calculate", "compute", "validate", "transform", "analyze", "generate", "evaluate",
];

const CONTROLLER_VOCABULARY: &[&str] = &["controller", "router", "route", "endpoint", "command"];
const SERVICE_VOCABULARY: &[&str] = &[
    "service", "manager", "provider", "client", "fetch", "request", "api",
];
const MODEL_VOCABULARY: &[&str] = &["model", "entity", "schema", "repository", "store", "dto", "record"];
const UTILITY_VOCABULARY: &[&str] = &["util", "helper", "format", "parse", "convert", "common"];

/// Annotations marking a program or command entry point
const ENTRY_ANNOTATIONS: &[&str] = &["main", "command", "scheduled", "springbootapplication"];
/// Annotation fragments marking a request handler
const ROUTE_ANNOTATIONS: &[&str] = &["mapping", "route", "endpoint", "controller"];
/// HTTP verb decorators (`@Get`, `@router.post`)
const HTTP_VERBS: &[&str] = &["get", "post", "put", "patch", "delete"];

/// Layer membership for one analysis run, in canonical layer order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMap {
    members: BTreeMap<Layer, Vec<FunctionId>>,
    primary: BTreeMap<FunctionId, Layer>,
}

impl LayerMap {
    /// Record `id` under every layer in `layers`; the first one is its primary layer
    pub fn insert(&mut self, id: &FunctionId, layers: &[Layer]) {
        for layer in layers {
            self.members.entry(*layer).or_default().push(id.clone());
        }
        if let Some(first) = layers.first() {
            self.primary.entry(id.clone()).or_insert(*first);
        }
    }

    /// Members of `layer` in scan order
    pub fn members(&self, layer: Layer) -> &[FunctionId] {
        self.members.get(&layer).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn primary(&self, id: &FunctionId) -> Option<Layer> {
        self.primary.get(id).copied()
    }

    /// Layers with at least one member, in canonical order
    pub fn populated(&self) -> impl Iterator<Item = Layer> + '_ {
        Layer::ALL
            .into_iter()
            .filter(|layer| !self.members(*layer).is_empty())
    }

    /// Member count per layer, zero counts included
    pub fn counts(&self) -> Vec<(Layer, usize)> {
        Layer::ALL
            .iter()
            .map(|layer| (*layer, self.members(*layer).len()))
            .collect()
    }
}

/// Classification of a single function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedFunction {
    pub id: FunctionId,
    pub traits: FunctionTraits,
    /// Every matching layer in canonical order, never empty
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Parallel to `CallGraph::functions`
    pub functions: Vec<ClassifiedFunction>,
    pub layers: LayerMap,
}

/// Assigns naming-convention traits and architectural layers
#[derive(Debug, Default)]
pub struct ArchitecturalClassifier;

impl ArchitecturalClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, graph: &CallGraph) -> Classification {
        let mut classification = Classification::default();

        for function in graph.functions() {
            let traits = self.traits(&function.name);
            let layers = self.layers(function, &traits);
            classification.layers.insert(&function.id, &layers);
            classification.functions.push(ClassifiedFunction {
                id: function.id.clone(),
                traits,
                layers,
            });
        }

        classification
    }

    pub fn traits(&self, name: &str) -> FunctionTraits {
        let lower = name.to_lowercase();
        FunctionTraits {
            is_entry_point: contains_any(&lower, ENTRY_VOCABULARY),
            is_event_handler: is_on_prefixed(name) || contains_any(&lower, EVENT_VOCABULARY),
            is_business_logic: contains_any(&lower, BUSINESS_VOCABULARY),
        }
    }

    /// Every layer whose predicate the function satisfies; Utilities when none does
    pub fn layers(&self, function: &FunctionRecord, traits: &FunctionTraits) -> Vec<Layer> {
        let annotations: Vec<String> = function
            .annotations
            .iter()
            .map(|a| a.to_lowercase())
            .collect();

        // Name, owning class and file stem all count as naming evidence
        let mut haystacks = vec![function.name.to_lowercase()];
        if let Some(class) = &function.owning_class {
            haystacks.push(class.to_lowercase());
        }
        if let Some(stem) = function.file.file_stem() {
            haystacks.push(stem.to_string_lossy().to_lowercase());
        }
        let named = |vocabulary: &[&str]| haystacks.iter().any(|h| contains_any(h, vocabulary));

        let mut layers = Vec::new();
        for layer in Layer::ALL {
            let matches = match layer {
                Layer::EntryPoints => {
                    traits.is_entry_point
                        || annotations.iter().any(|a| is_entry_annotation(a))
                }
                Layer::Controllers => {
                    named(CONTROLLER_VOCABULARY)
                        || annotations.iter().any(|a| is_route_annotation(a))
                }
                Layer::Services => named(SERVICE_VOCABULARY),
                Layer::Models => named(MODEL_VOCABULARY),
                Layer::Utilities => named(UTILITY_VOCABULARY),
                Layer::EventHandlers => traits.is_event_handler,
                Layer::BusinessLogic => traits.is_business_logic,
            };
            if matches {
                layers.push(layer);
            }
        }

        if layers.is_empty() {
            layers.push(Layer::Utilities);
        }
        layers
    }
}

fn contains_any(haystack: &str, vocabulary: &[&str]) -> bool {
    vocabulary.iter().any(|word| haystack.contains(word))
}

/// `onClick`, `on_submit`
fn is_on_prefixed(name: &str) -> bool {
    name.strip_prefix("on")
        .and_then(|rest| rest.chars().next())
        .map_or(false, |c| c.is_ascii_uppercase() || c == '_')
}

fn is_entry_annotation(annotation: &str) -> bool {
    let last = annotation.rsplit('.').next().unwrap_or(annotation);
    ENTRY_ANNOTATIONS.contains(&last)
}

fn is_route_annotation(annotation: &str) -> bool {
    let last = annotation.rsplit('.').next().unwrap_or(annotation);
    contains_any(annotation, ROUTE_ANNOTATIONS) || HTTP_VERBS.contains(&last)
}
