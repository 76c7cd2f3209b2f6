// src/core/model.rs
//! Records produced by extraction and consumed by every later stage.

use std::fmt;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

/// Family of source-text conventions that selects a pattern set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dialect {
    /// Curly-brace block delimiters (JS/TS, Java, C-family, Go, Rust, ...)
    Brace,
    /// Indentation-delimited blocks (Python)
    Indentation,
    /// Anything else on the allow-list
    Generic,
}

impl Dialect {
    /// Infer the dialect from a file extension. `None` means the file is not analyzed.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "java" | "kt" | "kts" | "scala"
            | "cs" | "c" | "h" | "cpp" | "cc" | "hpp" | "go" | "rs" | "swift" | "php"
            | "dart" => Some(Dialect::Brace),
            "py" | "pyw" => Some(Dialect::Indentation),
            "rb" | "lua" | "pl" | "sh" => Some(Dialect::Generic),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// A file selected for extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub dialect: Dialect,
}

/// Composite key `file::name`, unique within one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(String);

impl FunctionId {
    pub fn new(file: &Path, qualified_name: &str) -> Self {
        Self(format!("{}::{}", file.display(), qualified_name))
    }

    /// Disambiguate a key that already exists in the same file
    pub fn with_line(&self, line: usize) -> Self {
        Self(format!("{}@{}", self.0, line))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    Function,
    Method,
    Arrow,
    AsyncFunction,
    Constructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionKind {
    Conditional,
    Switch,
    Loop,
    Ternary,
    Logical,
}

/// A detected control-flow construct inside a function body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPoint {
    pub kind: DecisionKind,
    pub file: PathBuf,
    pub line: usize,
    pub snippet: String,
    pub owning_function: Option<FunctionId>,
    /// 1 plus the logical/comparison operators on the line
    pub weight: u32,
}

/// A call-site token recorded by name only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingCall {
    pub callee: String,
    pub line: usize,
}

/// Phase 1 record: fixed once the file scan that produced it finishes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub id: FunctionId,
    pub name: String,
    pub file: PathBuf,
    pub line: usize,
    pub end_line: usize,
    pub owning_class: Option<String>,
    pub kind: FunctionKind,
    pub is_exported: bool,
    pub is_async: bool,
    /// Decorators/annotations seen directly above the declaration
    pub annotations: Vec<String>,
    pub outgoing_calls: Vec<OutgoingCall>,
    pub decision_points: Vec<DecisionPoint>,
    pub cyclomatic_weight: u32,
}

impl FunctionRecord {
    /// `Class.method` for methods, the bare name otherwise
    pub fn display_name(&self) -> String {
        match &self.owning_class {
            Some(class) => format!("{}.{}", class, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    pub file: PathBuf,
    pub line: usize,
    pub method_names: Vec<String>,
    pub is_exported: bool,
}

/// Raw import/require reference, never resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRef {
    pub file: PathBuf,
    pub line: usize,
    pub target: String,
}

/// Everything one file scan produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileExtraction {
    pub file: PathBuf,
    pub classes: Vec<ClassRecord>,
    pub functions: Vec<FunctionRecord>,
    pub imports: Vec<ImportRef>,
}

impl FileExtraction {
    pub fn decision_point_count(&self) -> usize {
        self.functions.iter().map(|f| f.decision_points.len()).sum()
    }
}

/// Inferred architectural role, in canonical evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    EntryPoints,
    Controllers,
    Services,
    Models,
    Utilities,
    EventHandlers,
    BusinessLogic,
}

impl Layer {
    pub const ALL: [Layer; 7] = [
        Layer::EntryPoints,
        Layer::Controllers,
        Layer::Services,
        Layer::Models,
        Layer::Utilities,
        Layer::EventHandlers,
        Layer::BusinessLogic,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Layer::EntryPoints => "Entry Points",
            Layer::Controllers => "Controllers",
            Layer::Services => "Services",
            Layer::Models => "Models",
            Layer::Utilities => "Utilities",
            Layer::EventHandlers => "Event Handlers",
            Layer::BusinessLogic => "Business Logic",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Naming-convention flags set by the classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionTraits {
    pub is_entry_point: bool,
    pub is_event_handler: bool,
    pub is_business_logic: bool,
}

/// Phase 3 view of a function: resolved, classified and scored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedFunction {
    pub id: FunctionId,
    pub name: String,
    pub display_name: String,
    pub file: PathBuf,
    pub line: usize,
    pub kind: FunctionKind,
    pub is_exported: bool,
    pub is_async: bool,
    pub traits: FunctionTraits,
    pub layers: Vec<Layer>,
    pub primary_layer: Layer,
    pub incoming_calls: usize,
    pub decision_points: usize,
    pub importance: u32,
    pub scan_order: usize,
}
