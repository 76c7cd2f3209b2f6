// src/core/languages/scan_state.rs
//! Per-file scan state shared by the dialect extractors.
//!
//! Everything here lives for exactly one file scan. Nothing is global and
//! nothing is shared between files or threads.

use std::collections::HashSet;
use regex::Regex;

use crate::error::Result;
use crate::core::model::{
    ClassRecord, DecisionKind, DecisionPoint, FileExtraction, FunctionId, FunctionKind,
    FunctionRecord, ImportRef, OutgoingCall, SourceFile,
};

/// Control keywords, literals and common globals that are never declarations or calls
pub(crate) const RESERVED_WORDS: &[&str] = &[
    // control flow and declarations
    "if", "else", "elif", "elsif", "elseif", "unless", "until", "then", "end", "begin",
    "for", "foreach", "while", "do", "loop", "switch", "case", "default", "match", "when",
    "break", "continue", "return", "goto", "yield", "await", "async", "throw", "throws",
    "defer", "synchronized", "echo",
    "try", "catch", "finally", "except", "raise", "rescue", "ensure", "with", "as", "in",
    "is", "not", "and", "or", "lambda", "pass", "function", "fn", "func", "fun", "def",
    "sub", "proc", "class", "struct", "interface", "enum", "impl", "trait", "module",
    "new", "delete", "typeof", "instanceof", "void", "sizeof", "import", "export", "from",
    "require", "use", "package", "namespace", "using", "extends", "implements", "where",
    "local", "var", "let", "const", "static", "public", "private", "protected",
    // literals and receivers
    "super", "this", "self", "Self", "true", "false", "True", "False", "null", "None",
    "nil", "undefined", "NaN",
    // common globals and builtins
    "print", "println", "printf", "puts", "console", "len", "range", "str", "int",
    "float", "bool", "list", "dict", "tuple", "isinstance", "Math", "JSON", "Object",
    "Array", "String", "Number", "Boolean", "Promise", "Error", "Date", "parseInt",
    "parseFloat", "setTimeout", "setInterval", "clearTimeout", "clearInterval", "alert",
    "assert", "Some", "Ok", "Err", "vec", "format", "panic",
];

pub(crate) fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

/// How a dialect writes comments
#[derive(Debug, Clone, Copy)]
pub(crate) struct CommentStyle {
    pub line: &'static str,
    pub block: Option<(&'static str, &'static str)>,
    /// Python-style triple-quoted strings spanning lines
    pub docstrings: bool,
    /// `'` only opens a string when it is closed on the same line (Rust lifetimes)
    pub guarded_single_quote: bool,
    /// Backtick strings may span lines (JS template literals, Go raw strings)
    pub multiline_backtick: bool,
}

pub(crate) const BRACE_COMMENTS: CommentStyle = CommentStyle {
    line: "//",
    block: Some(("/*", "*/")),
    docstrings: false,
    guarded_single_quote: true,
    multiline_backtick: true,
};

pub(crate) const PYTHON_COMMENTS: CommentStyle = CommentStyle {
    line: "#",
    block: None,
    docstrings: true,
    guarded_single_quote: false,
    multiline_backtick: false,
};

pub(crate) const HASH_COMMENTS: CommentStyle = CommentStyle {
    line: "#",
    block: None,
    docstrings: false,
    guarded_single_quote: false,
    multiline_backtick: false,
};

pub(crate) const LUA_COMMENTS: CommentStyle = CommentStyle {
    line: "--",
    block: Some(("--[[", "]]")),
    docstrings: false,
    guarded_single_quote: false,
    multiline_backtick: false,
};

/// Regexes every dialect uses for calls and decision points
pub(crate) struct LinePatterns {
    call: Regex,
    annotation: Regex,
    conditional: Regex,
    switch: Regex,
    loop_: Regex,
    logical: Regex,
    word_logical: Regex,
    operator: Regex,
}

impl LinePatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            call: Regex::new(r"\b([A-Za-z_][\w]*)\s*\(")?,
            annotation: Regex::new(r"^@([A-Za-z_][\w.]*)(?:\(.*\))?\s*$")?,
            conditional: Regex::new(r"\b(?:if|elif|elsif|elseif|unless)\b")?,
            switch: Regex::new(r"(?:^|[^.\w])(?:switch|case|match)\b")?,
            loop_: Regex::new(r"(?:^|[^.\w])(?:for|foreach|while|until|loop)\b|\.forEach\s*\(")?,
            logical: Regex::new(r"&&|\|\|")?,
            word_logical: Regex::new(r"\b(?:and|or)\b")?,
            operator: Regex::new(r"&&|\|\||===|!==|==|!=|<=|>=|<|>")?,
        })
    }

    /// Call-site names on a line, skipping reserved words
    pub fn calls<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.call
            .captures_iter(text)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str())
            .filter(|name| !is_reserved(name))
            .collect()
    }

    /// Annotation or decorator name when the whole line is one (`@app.route("/")`)
    pub fn annotation(&self, trimmed: &str) -> Option<String> {
        self.annotation
            .captures(trimmed)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// First control-flow construct on a line, in priority order
    pub fn decision_kind(&self, text: &str, word_operators: bool) -> Option<DecisionKind> {
        if self.conditional.is_match(text) {
            Some(DecisionKind::Conditional)
        } else if self.switch.is_match(text) {
            Some(DecisionKind::Switch)
        } else if self.loop_.is_match(text) {
            Some(DecisionKind::Loop)
        } else if has_ternary(text) {
            Some(DecisionKind::Ternary)
        } else if self.logical.is_match(text)
            || (word_operators && self.word_logical.is_match(text))
        {
            Some(DecisionKind::Logical)
        } else {
            None
        }
    }

    /// 1 plus the logical/comparison operators on the line
    pub fn decision_weight(&self, text: &str, word_operators: bool) -> u32 {
        let normalized = text.replace("=>", "  ").replace("->", "  ");
        let mut count = self.operator.find_iter(&normalized).count();
        if word_operators {
            count += self.word_logical.find_iter(&normalized).count();
        }
        1 + count as u32
    }
}

/// `cond ? a : b`, ignoring `?.`, `??` and optional markers like `name?: T`
fn has_ternary(text: &str) -> bool {
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'?' {
            continue;
        }
        let prev = if i > 0 { bytes[i - 1] } else { b' ' };
        let next = bytes.get(i + 1).copied().unwrap_or(b' ');
        if prev == b'?' || next == b'?' || next == b'.' {
            continue;
        }
        let rest = text[i + 1..].trim_start();
        if !rest.starts_with(':') && rest.contains(':') {
            return true;
        }
    }
    false
}

/// Leading whitespace width, tabs counted as four columns
pub(crate) fn indentation(raw: &str) -> usize {
    raw.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Open function or class context; `level` is brace depth or indentation
#[derive(Debug, Clone)]
pub(crate) struct OpenContext {
    pub index: usize,
    pub level: usize,
    pub body_started: bool,
    pub lines_without_body: usize,
}

/// What a dialect recognized on a declaration line
#[derive(Debug, Clone)]
pub(crate) struct Declaration {
    pub name: String,
    pub kind: FunctionKind,
    pub is_exported: bool,
    pub is_async: bool,
}

/// Mutable state of one file scan
pub(crate) struct ScanState<'a> {
    file: &'a SourceFile,
    classes: Vec<ClassRecord>,
    functions: Vec<FunctionRecord>,
    imports: Vec<ImportRef>,
    pub function_stack: Vec<OpenContext>,
    pub class_stack: Vec<OpenContext>,
    used_ids: HashSet<FunctionId>,
    pending_annotations: Vec<String>,
    exported_names: HashSet<String>,
    block_end: Option<&'static str>,
    in_template: bool,
}

impl<'a> ScanState<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        Self {
            file,
            classes: Vec::new(),
            functions: Vec::new(),
            imports: Vec::new(),
            function_stack: Vec::new(),
            class_stack: Vec::new(),
            used_ids: HashSet::new(),
            pending_annotations: Vec::new(),
            exported_names: HashSet::new(),
            block_end: None,
            in_template: false,
        }
    }

    /// Blank out string contents and comments so patterns only see code.
    ///
    /// Block comments, docstrings and multi-line backtick strings carry over
    /// to following lines.
    pub fn clean_line(&mut self, raw: &str, style: &CommentStyle) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut quote: Option<char> = self.in_template.then_some('`');
        let mut i = 0;

        'chars: while i < raw.len() {
            let rest = &raw[i..];
            let Some(ch) = rest.chars().next() else {
                break;
            };

            if let Some(end) = self.block_end {
                if rest.starts_with(end) {
                    self.block_end = None;
                    out.push_str(&" ".repeat(end.len()));
                    i += end.len();
                } else {
                    out.push(' ');
                    i += ch.len_utf8();
                }
                continue;
            }

            if let Some(q) = quote {
                if ch == '\\' {
                    out.push(' ');
                    i += 1;
                    if let Some(escaped) = raw[i..].chars().next() {
                        out.push(' ');
                        i += escaped.len_utf8();
                    }
                    continue;
                }
                if ch == q {
                    quote = None;
                    out.push(q);
                } else {
                    out.push(' ');
                }
                i += ch.len_utf8();
                continue;
            }

            if style.docstrings {
                for delim in ["\"\"\"", "'''"] {
                    if rest.starts_with(delim) {
                        self.block_end = Some(delim);
                        out.push_str("   ");
                        i += delim.len();
                        continue 'chars;
                    }
                }
            }

            if let Some((open, close)) = style.block {
                if rest.starts_with(open) {
                    self.block_end = Some(close);
                    out.push_str(&" ".repeat(open.len()));
                    i += open.len();
                    continue;
                }
            }

            if rest.starts_with(style.line) {
                break;
            }

            let opens_string = match ch {
                '"' | '`' => true,
                '\'' => !style.guarded_single_quote || rest[1..].contains('\''),
                _ => false,
            };
            if opens_string {
                quote = Some(ch);
            }
            out.push(ch);
            i += ch.len_utf8();
        }

        self.in_template = style.multiline_backtick && quote == Some('`');
        out
    }

    pub fn push_annotation(&mut self, annotation: String) {
        self.pending_annotations.push(annotation);
    }

    pub fn clear_annotations(&mut self) {
        self.pending_annotations.clear();
    }

    pub fn add_import(&mut self, line: usize, target: &str) {
        self.imports.push(ImportRef {
            file: self.file.path.clone(),
            line,
            target: target.to_string(),
        });
    }

    pub fn note_exported_name(&mut self, name: &str) {
        self.exported_names.insert(name.to_string());
    }

    pub fn open_class(&mut self, name: &str, line: usize, level: usize, is_exported: bool) {
        self.clear_annotations();
        self.classes.push(ClassRecord {
            name: name.to_string(),
            file: self.file.path.clone(),
            line,
            method_names: Vec::new(),
            is_exported,
        });
        self.class_stack.push(OpenContext {
            index: self.classes.len() - 1,
            level,
            body_started: false,
            lines_without_body: 0,
        });
    }

    /// Class a new declaration belongs to: the innermost open class, unless a
    /// function was opened inside that class (then the declaration is a closure)
    fn owning_class_index(&self) -> Option<usize> {
        let class = self.class_stack.last()?;
        match self.function_stack.last() {
            Some(function) if function.level >= class.level => None,
            _ => Some(class.index),
        }
    }

    pub fn current_class_name(&self) -> Option<&str> {
        self.owning_class_index()
            .map(|index| self.classes[index].name.as_str())
    }

    pub fn open_function(&mut self, decl: Declaration, line: usize, level: usize) {
        let class_index = self.owning_class_index();
        let owning_class = class_index.map(|index| self.classes[index].name.clone());

        let kind = match (decl.kind, &owning_class) {
            (FunctionKind::Function, Some(_)) | (FunctionKind::AsyncFunction, Some(_)) => {
                FunctionKind::Method
            }
            (FunctionKind::Function, None) if decl.is_async => FunctionKind::AsyncFunction,
            (kind, _) => kind,
        };

        let qualified = match &owning_class {
            Some(class) => format!("{}.{}", class, decl.name),
            None => decl.name.clone(),
        };
        let mut id = FunctionId::new(&self.file.path, &qualified);
        if self.used_ids.contains(&id) {
            id = id.with_line(line);
        }
        self.used_ids.insert(id.clone());

        if let Some(index) = class_index {
            self.classes[index].method_names.push(decl.name.clone());
        }

        self.functions.push(FunctionRecord {
            id,
            name: decl.name,
            file: self.file.path.clone(),
            line,
            end_line: line,
            owning_class,
            kind,
            is_exported: decl.is_exported,
            is_async: decl.is_async,
            annotations: std::mem::take(&mut self.pending_annotations),
            outgoing_calls: Vec::new(),
            decision_points: Vec::new(),
            cyclomatic_weight: 1,
        });
        self.function_stack.push(OpenContext {
            index: self.functions.len() - 1,
            level,
            body_started: false,
            lines_without_body: 0,
        });
    }

    pub fn in_function(&self) -> bool {
        !self.function_stack.is_empty()
    }

    /// Whether the innermost open context is a function rather than a class
    pub fn in_function_body(&self) -> bool {
        match (self.function_stack.last(), self.class_stack.last()) {
            (Some(function), Some(class)) => function.level >= class.level,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Attribute calls and a decision point on `text` to the innermost open function
    pub fn record_body(
        &mut self,
        patterns: &LinePatterns,
        text: &str,
        raw: &str,
        line: usize,
        word_operators: bool,
    ) {
        let Some(open) = self.function_stack.last() else {
            return;
        };
        let index = open.index;
        let function = &mut self.functions[index];

        for callee in patterns.calls(text) {
            function.outgoing_calls.push(OutgoingCall {
                callee: callee.to_string(),
                line,
            });
        }

        if let Some(kind) = patterns.decision_kind(text, word_operators) {
            function.decision_points.push(DecisionPoint {
                kind,
                file: self.file.path.clone(),
                line,
                snippet: snippet(raw),
                owning_function: Some(function.id.clone()),
                weight: patterns.decision_weight(text, word_operators),
            });
        }
    }

    pub fn close_innermost_function(&mut self, end_line: usize) {
        if let Some(open) = self.function_stack.pop() {
            let function = &mut self.functions[open.index];
            function.end_line = end_line.max(function.line);
        }
    }

    pub fn close_innermost_class(&mut self) {
        self.class_stack.pop();
    }

    /// Close every context still open and hand back the file's records
    pub fn finish(mut self, last_line: usize) -> FileExtraction {
        while self.in_function() {
            self.close_innermost_function(last_line);
        }
        self.class_stack.clear();

        for function in &mut self.functions {
            if function.owning_class.is_none() && self.exported_names.contains(&function.name) {
                function.is_exported = true;
            }
            function.cyclomatic_weight =
                1 + function.decision_points.iter().map(|d| d.weight).sum::<u32>();
        }

        FileExtraction {
            file: self.file.path.clone(),
            classes: self.classes,
            functions: self.functions,
            imports: self.imports,
        }
    }
}

fn snippet(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() > 80 {
        let cut: String = trimmed.chars().take(77).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use crate::core::model::Dialect;

    fn source() -> SourceFile {
        SourceFile {
            path: PathBuf::from("src/app.js"),
            dialect: Dialect::Brace,
        }
    }

    #[test]
    fn test_clean_line_blanks_strings_and_comments() {
        let file = source();
        let mut state = ScanState::new(&file);
        let cleaned = state.clean_line(r#"call("if (x) {") // if y"#, &BRACE_COMMENTS);
        assert!(cleaned.starts_with("call(\""));
        assert!(!cleaned.contains("if"));
        assert!(!cleaned.contains('{'));
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let file = source();
        let mut state = ScanState::new(&file);
        let first = state.clean_line("a(); /* start", &BRACE_COMMENTS);
        let second = state.clean_line("  if (x) { }", &BRACE_COMMENTS);
        let third = state.clean_line("end */ b();", &BRACE_COMMENTS);
        assert!(first.contains("a()"));
        assert!(second.trim().is_empty());
        assert!(third.contains("b()"));
        assert!(!third.contains("end"));
    }

    #[test]
    fn test_rust_lifetime_does_not_swallow_brace() {
        let file = source();
        let mut state = ScanState::new(&file);
        let cleaned = state.clean_line("fn get(&self) -> &'a str {", &BRACE_COMMENTS);
        assert!(cleaned.ends_with('{'));
    }

    #[test]
    fn test_template_literal_spans_lines() {
        let file = source();
        let mut state = ScanState::new(&file);
        let first = state.clean_line("const html = `<div>", &BRACE_COMMENTS);
        let second = state.clean_line("  function inner() { go(); }", &BRACE_COMMENTS);
        let third = state.clean_line("</div>`; done();", &BRACE_COMMENTS);
        assert!(first.starts_with("const html = `"));
        assert!(second.trim().is_empty());
        assert!(third.ends_with("`; done();"));
        assert!(state.clean_line("next();", &BRACE_COMMENTS).contains("next()"));
    }

    #[test]
    fn test_backtick_does_not_carry_in_shell() {
        let file = source();
        let mut state = ScanState::new(&file);
        state.clean_line("out=`date", &HASH_COMMENTS);
        assert_eq!(state.clean_line("deploy()", &HASH_COMMENTS), "deploy()");
    }

    #[test]
    fn test_innermost_context_kind() {
        let file = source();
        let mut state = ScanState::new(&file);
        assert!(!state.in_function_body());
        state.open_class("Store", 1, 0, false);
        assert!(!state.in_function_body());
        state.open_function(
            Declaration {
                name: "save".to_string(),
                kind: FunctionKind::Function,
                is_exported: false,
                is_async: false,
            },
            2,
            1,
        );
        assert!(state.in_function_body());
        state.close_innermost_function(5);
        assert!(!state.in_function_body());
    }

    #[test]
    fn test_python_docstring_spans_lines() {
        let file = source();
        let mut state = ScanState::new(&file);
        assert!(state.clean_line("    \"\"\"Docs if", &PYTHON_COMMENTS).trim().is_empty());
        assert!(state.clean_line("    while stuff()", &PYTHON_COMMENTS).trim().is_empty());
        assert!(state.clean_line("    \"\"\"", &PYTHON_COMMENTS).trim().is_empty());
        assert_eq!(state.clean_line("    go()", &PYTHON_COMMENTS), "    go()");
    }

    #[test]
    fn test_decision_priority_and_weight() {
        let patterns = LinePatterns::new().unwrap();
        assert_eq!(
            patterns.decision_kind("if (a && b) { for (;;) {} }", false),
            Some(DecisionKind::Conditional)
        );
        assert_eq!(
            patterns.decision_kind("switch (mode) {", false),
            Some(DecisionKind::Switch)
        );
        assert_eq!(
            patterns.decision_kind("items.forEach(x => go(x));", false),
            Some(DecisionKind::Loop)
        );
        assert_eq!(
            patterns.decision_kind("const v = ready ? 1 : 2;", false),
            Some(DecisionKind::Ternary)
        );
        assert_eq!(
            patterns.decision_kind("return a || b;", false),
            Some(DecisionKind::Logical)
        );
        assert_eq!(patterns.decision_kind("const x = a?.b ?? c;", false), None);
        assert_eq!(patterns.decision_kind("name?: string;", false), None);
        assert_eq!(patterns.decision_kind("text.match(re)", false), None);
        assert_eq!(
            patterns.decision_kind("ok = a and b", true),
            Some(DecisionKind::Logical)
        );

        assert_eq!(patterns.decision_weight("if (x) {", false), 1);
        assert_eq!(patterns.decision_weight("if (a > 1 && b !== c) {", false), 4);
        assert_eq!(patterns.decision_weight("list.map(x => x)", false), 1);
        assert_eq!(patterns.decision_weight("if a and b or c:", true), 3);
    }

    #[test]
    fn test_calls_skip_reserved_words() {
        let patterns = LinePatterns::new().unwrap();
        let calls = patterns.calls("if (check(x)) { return this.save(parseInt(y)); }");
        assert_eq!(calls, vec!["check", "save"]);
    }

    #[test]
    fn test_duplicate_names_get_unique_ids() {
        let file = source();
        let mut state = ScanState::new(&file);
        for line in [1, 5] {
            state.open_function(
                Declaration {
                    name: "run".to_string(),
                    kind: FunctionKind::Function,
                    is_exported: false,
                    is_async: false,
                },
                line,
                0,
            );
            state.close_innermost_function(line + 1);
        }
        let extraction = state.finish(10);
        assert_eq!(extraction.functions.len(), 2);
        assert_ne!(extraction.functions[0].id, extraction.functions[1].id);
        assert_eq!(extraction.functions[1].id.as_str(), "src/app.js::run@5");
    }
}
