// src/core/diagram.rs
//! Deterministic flowchart synthesis from the selected functions.
//!
//! The graph is built once per call and rendered as Mermaid flowchart text.
//! Node ids (`A`, `B`, ..., `Z`, `AA`, ...) follow emission order, so two runs
//! over the same selection produce identical text; ids are not stable across
//! different selections.

use serde::{Deserialize, Serialize};

use super::classifier::LayerMap;
use super::model::{FunctionId, Layer, RankedFunction};

const INIT_VOCABULARY: &[&str] = &["init", "setup", "create", "load", "config", "register"];
const DECISION_VOCABULARY: &[&str] = &["validate", "check", "verify", "handle"];

/// Importance a function needs before its decision points make it a branch
const DECISION_IMPORTANCE_THRESHOLD: u32 = 8;

const DEFAULT_ENTRY_LABEL: &str = "Start";
const RESULT_LABEL: &str = "Result";
const ALTERNATIVE_LABEL: &str = "Handle alternative";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStyle {
    Entry,
    Process,
    Decision,
    Service,
    Result,
}

impl NodeStyle {
    pub const ALL: [NodeStyle; 5] = [
        NodeStyle::Entry,
        NodeStyle::Process,
        NodeStyle::Decision,
        NodeStyle::Service,
        NodeStyle::Result,
    ];

    pub fn class_name(&self) -> &'static str {
        match self {
            NodeStyle::Entry => "entry",
            NodeStyle::Process => "process",
            NodeStyle::Decision => "decision",
            NodeStyle::Service => "service",
            NodeStyle::Result => "result",
        }
    }

    fn class_def(&self) -> &'static str {
        match self {
            NodeStyle::Entry => "fill:#e1f5fe,stroke:#01579b,stroke-width:2px",
            NodeStyle::Process => "fill:#f3e5f5,stroke:#4a148c,stroke-width:1px",
            NodeStyle::Decision => "fill:#fff3e0,stroke:#e65100,stroke-width:2px",
            NodeStyle::Service => "fill:#e8f5e9,stroke:#1b5e20,stroke-width:1px",
            NodeStyle::Result => "fill:#fce4ec,stroke:#880e4f,stroke-width:2px",
        }
    }

    /// Mermaid shape delimiters
    fn delimiters(&self) -> (&'static str, &'static str) {
        match self {
            NodeStyle::Entry | NodeStyle::Result => ("([", "])"),
            NodeStyle::Decision => ("{", "}"),
            NodeStyle::Service => ("[[", "]]"),
            NodeStyle::Process => ("[", "]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    pub style: NodeStyle,
    /// Function the node stands for; `None` for synthetic nodes
    pub function: Option<FunctionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgraph {
    pub layer: Layer,
    pub node_ids: Vec<String>,
}

/// Immutable result of one synthesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramGraph {
    nodes: Vec<DiagramNode>,
    edges: Vec<DiagramEdge>,
    subgraphs: Vec<Subgraph>,
}

impl DiagramGraph {
    pub fn nodes(&self) -> &[DiagramNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[DiagramEdge] {
        &self.edges
    }

    pub fn subgraphs(&self) -> &[Subgraph] {
        &self.subgraphs
    }

    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_by_label(&self, label: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.label == label)
    }

    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a DiagramEdge> + 'a {
        self.edges.iter().filter(move |e| e.from == id)
    }

    pub fn nodes_with_style(&self, style: NodeStyle) -> impl Iterator<Item = &DiagramNode> + '_ {
        self.nodes.iter().filter(move |n| n.style == style)
    }

    /// Edges as `(from label, to label, edge label)`, independent of node ids
    pub fn labeled_edges(&self) -> Vec<(String, String, Option<String>)> {
        let label_of = |id: &str| self.node(id).map(|n| n.label.clone()).unwrap_or_default();
        self.edges
            .iter()
            .map(|e| (label_of(&e.from), label_of(&e.to), e.label.clone()))
            .collect()
    }

    /// Render as Mermaid flowchart text
    pub fn to_mermaid(&self, direction: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("flowchart {}\n", direction));

        for node in &self.nodes {
            let (open, close) = node.style.delimiters();
            out.push_str(&format!(
                "    {}{}\"{}\"{}\n",
                node.id,
                open,
                escape_label(&node.label),
                close
            ));
        }

        for edge in &self.edges {
            match &edge.label {
                Some(label) => out.push_str(&format!(
                    "    {} -->|{}| {}\n",
                    edge.from,
                    escape_label(label),
                    edge.to
                )),
                None => out.push_str(&format!("    {} --> {}\n", edge.from, edge.to)),
            }
        }

        for subgraph in &self.subgraphs {
            out.push_str(&format!(
                "    subgraph {}[\"{}\"]\n",
                layer_slug(subgraph.layer),
                subgraph.layer.label()
            ));
            for id in &subgraph.node_ids {
                out.push_str(&format!("        {}\n", id));
            }
            out.push_str("    end\n");
        }

        for style in NodeStyle::ALL {
            out.push_str(&format!("    classDef {} {}\n", style.class_name(), style.class_def()));
        }
        for style in NodeStyle::ALL {
            let ids: Vec<&str> = self
                .nodes_with_style(style)
                .map(|n| n.id.as_str())
                .collect();
            if !ids.is_empty() {
                out.push_str(&format!("    class {} {}\n", ids.join(","), style.class_name()));
            }
        }

        out
    }
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`
pub fn node_id(mut index: usize) -> String {
    let mut id = Vec::new();
    loop {
        id.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    id.reverse();
    String::from_utf8_lossy(&id).into_owned()
}

fn escape_label(label: &str) -> String {
    label.replace('"', "#quot;")
}

fn layer_slug(layer: Layer) -> String {
    layer.label().to_lowercase().replace(' ', "_")
}

fn name_matches(name: &str, vocabulary: &[&str]) -> bool {
    let lower = name.to_lowercase();
    vocabulary.iter().any(|word| lower.contains(word))
}

/// Whether a function is drawn as a branch in the main chain
pub fn has_decision_logic(function: &RankedFunction) -> bool {
    (function.importance > DECISION_IMPORTANCE_THRESHOLD && function.decision_points > 0)
        || name_matches(&function.name, DECISION_VOCABULARY)
}

#[derive(Default)]
struct GraphBuilder {
    nodes: Vec<DiagramNode>,
    edges: Vec<DiagramEdge>,
}

impl GraphBuilder {
    fn add_node(&mut self, label: &str, style: NodeStyle, function: Option<&FunctionId>) -> String {
        let id = node_id(self.nodes.len());
        self.nodes.push(DiagramNode {
            id: id.clone(),
            label: label.to_string(),
            style,
            function: function.cloned(),
        });
        id
    }

    fn add_edge(&mut self, from: &str, to: &str, label: Option<&str>) {
        self.edges.push(DiagramEdge {
            from: from.to_string(),
            to: to.to_string(),
            label: label.map(str::to_string),
        });
    }
}

/// Builds the layered flow diagram
#[derive(Debug, Default)]
pub struct DiagramSynthesizer;

impl DiagramSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn synthesize(&self, selected: &[RankedFunction], layers: &LayerMap) -> DiagramGraph {
        let mut builder = GraphBuilder::default();

        // Highest-importance entry point; ties go to the earlier function
        let entry = selected
            .iter()
            .filter(|f| f.traits.is_entry_point)
            .fold(None::<&RankedFunction>, |best, f| match best {
                Some(b) if b.importance >= f.importance => Some(b),
                _ => Some(f),
            })
            .or_else(|| selected.first());

        let entry_id = match entry {
            Some(function) => builder.add_node(&function.display_name, NodeStyle::Entry, Some(&function.id)),
            None => builder.add_node(DEFAULT_ENTRY_LABEL, NodeStyle::Entry, None),
        };
        let entry_key = entry.map(|f| &f.id);

        let mut function_nodes: Vec<(String, &RankedFunction)> = Vec::new();
        if let Some(function) = entry {
            function_nodes.push((entry_id.clone(), function));
        }

        let (init_chain, mut main_chain): (Vec<&RankedFunction>, Vec<&RankedFunction>) = selected
            .iter()
            .filter(|f| Some(&f.id) != entry_key)
            .partition(|f| name_matches(&f.name, INIT_VOCABULARY));

        let mut previous = entry_id;
        let mut pending_label: Option<&str> = None;

        for function in init_chain {
            let id = builder.add_node(&function.display_name, style_for(function, layers), Some(&function.id));
            builder.add_edge(&previous, &id, None);
            function_nodes.push((id.clone(), function));
            previous = id;
        }

        main_chain.sort_by(|a, b| b.importance.cmp(&a.importance));
        for function in main_chain {
            let decision = has_decision_logic(function);
            let style = if decision {
                NodeStyle::Decision
            } else {
                style_for(function, layers)
            };

            let id = builder.add_node(&function.display_name, style, Some(&function.id));
            builder.add_edge(&previous, &id, pending_label.take());
            function_nodes.push((id.clone(), function));

            if decision {
                let alternative = builder.add_node(ALTERNATIVE_LABEL, NodeStyle::Process, None);
                builder.add_edge(&id, &alternative, Some("No"));
                pending_label = Some("Yes");
            }
            previous = id;
        }

        let result = builder.add_node(RESULT_LABEL, NodeStyle::Result, None);
        builder.add_edge(&previous, &result, pending_label.take());

        let subgraphs = Layer::ALL
            .into_iter()
            .filter_map(|layer| {
                let node_ids: Vec<String> = function_nodes
                    .iter()
                    .filter(|(_, f)| primary_layer(f, layers) == layer)
                    .map(|(id, _)| id.clone())
                    .collect();
                (node_ids.len() >= 2).then_some(Subgraph { layer, node_ids })
            })
            .collect();

        DiagramGraph {
            nodes: builder.nodes,
            edges: builder.edges,
            subgraphs,
        }
    }
}

fn primary_layer(function: &RankedFunction, layers: &LayerMap) -> Layer {
    layers.primary(&function.id).unwrap_or(function.primary_layer)
}

fn style_for(function: &RankedFunction, layers: &LayerMap) -> NodeStyle {
    match primary_layer(function, layers) {
        Layer::Services | Layer::Models => NodeStyle::Service,
        _ => NodeStyle::Process,
    }
}
