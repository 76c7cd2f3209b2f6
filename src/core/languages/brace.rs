// src/core/languages/brace.rs
use regex::Regex;

use crate::error::Result;
use crate::core::model::{Dialect, FileExtraction, FunctionKind, SourceFile};
use super::scan_state::{
    is_reserved, Declaration, LinePatterns, ScanState, BRACE_COMMENTS,
};
use super::DialectExtractor;

/// Lines a declaration may span before its opening brace shows up
const MAX_SIGNATURE_LINES: usize = 3;

/// Statement keywords that can stand where a typed declaration expects its
/// return type (`return compute(`, `defer cleanup()`, `go worker(ch)`)
const STATEMENT_KEYWORDS: &[&str] = &[
    "return", "new", "throw", "else", "await", "yield", "case", "goto", "delete", "typeof",
    "instanceof", "echo", "print", "defer", "go", "do", "in", "of", "try", "export", "import",
    "package", "using", "namespace", "sizeof", "not", "and", "or",
];

/// Block statements shaped like a method shorthand (`synchronized (lock) {`)
const BLOCK_KEYWORDS: &[&str] = &[
    "synchronized", "lock", "fixed", "checked", "unchecked", "using", "foreach", "catch",
];

/// A recognized declaration line
struct DeclarationMatch {
    decl: Declaration,
    /// Where the body text starts on the declaration line
    body_start: usize,
    /// Arrow whose whole body is an expression on this line
    expression_body: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternKind {
    Exported,
    Named,
    Arrow,
    RustFn,
    Func,
    Typed,
    MethodShorthand,
}

/// Curly-brace family: JS/TS, Java, Kotlin, C#, C/C++, Go, Rust, Swift, PHP, Dart
pub struct BraceExtractor {
    patterns: LinePatterns,
    class_decl: Regex,
    rust_impl: Regex,
    /// Ordered: the first pattern that matches a line wins
    function_decls: Vec<(Regex, PatternKind)>,
    imports: Vec<Regex>,
    cjs_export: Regex,
    cjs_single_export: Regex,
    object_export: Regex,
    visibility: Regex,
    async_marker: Regex,
}

impl BraceExtractor {
    pub fn new() -> Result<Self> {
        let function_decls = vec![
            (
                Regex::new(r"^export\s+(?:default\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)")?,
                PatternKind::Exported,
            ),
            (
                Regex::new(r"^(?:(?:public|private|protected|static|final|abstract)\s+)*(?:async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)\s*\(")?,
                PatternKind::Named,
            ),
            (
                Regex::new(r"^(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:(?P<function>function)\b|\([^)]*\)\s*(?::[^=]+)?=>|[A-Za-z_$][\w$]*\s*=>)")?,
                PatternKind::Arrow,
            ),
            (
                Regex::new(r"^(?:(?:public|private|protected|static|readonly)\s+)*(?P<name>[A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:(?P<function>function)\b|\([^)]*\)\s*(?::[^=]+)?=>|[A-Za-z_$][\w$]*\s*=>)")?,
                PatternKind::Arrow,
            ),
            (
                Regex::new(r"^(?P<name>[A-Za-z_$][\w$]*)\s*:\s*(?:async\s+)?(?:(?P<function>function)\b|\([^)]*\)\s*=>)")?,
                PatternKind::Arrow,
            ),
            (
                Regex::new(r"^(?:pub(?:\([^)]*\))?\s+)?(?:default\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+\S+\s+)?fn\s+(?P<name>[A-Za-z_]\w*)")?,
                PatternKind::RustFn,
            ),
            (
                Regex::new(r"^(?:(?:public|private|internal|open|override|suspend|static|inline|operator)\s+)*(?:func|fun)\s+(?:\([^)]*\)\s*)?(?:<[^>]*>\s*)?(?:[A-Za-z_]\w*\.)?(?P<name>[A-Za-z_]\w*)")?,
                PatternKind::Func,
            ),
            (
                Regex::new(r"^(?:(?:public|private|protected|internal|static|final|virtual|override|abstract|synchronized|async|extern|inline|unsafe|sealed|const|native|default)\s+)*(?P<type>[A-Za-z_][\w<>\[\],.?:*&]*)\s+[*&]?(?P<name>[A-Za-z_]\w*)\s*\(")?,
                PatternKind::Typed,
            ),
            (
                Regex::new(r"^(?:(?:public|private|protected|static|async|override|readonly|abstract|get|set)\s+)*\*?(?P<name>[A-Za-z_$][\w$]*)\s*\([^()]*\)\s*(?::\s*[^{]+)?\{")?,
                PatternKind::MethodShorthand,
            ),
        ];

        let imports = vec![
            Regex::new(r#"^import\s+(?:[\w*{}\s,]+\s+from\s+)?['"](?P<target>[^'"]+)['"]"#)?,
            Regex::new(r#"require\s*\(\s*['"](?P<target>[^'"]+)['"]\s*\)"#)?,
            Regex::new(r"^import\s+(?:static\s+)?(?P<target>[\w.]+(?:\.\*)?)\s*;?\s*$")?,
            Regex::new(r"^(?:pub\s+)?use\s+(?P<target>[\w:]+)")?,
            Regex::new(r#"^#include\s*[<"](?P<target>[^>"]+)[>"]"#)?,
            Regex::new(r#"^import\s+(?:\w+\s+)?"(?P<target>[^"]+)""#)?,
            Regex::new(r"^using\s+(?:static\s+)?(?P<target>[\w.]+)\s*;")?,
        ];

        Ok(Self {
            patterns: LinePatterns::new()?,
            class_decl: Regex::new(r"^(?:export\s+)?(?:default\s+)?(?:(?:public|private|protected|internal|abstract|final|sealed|static|partial|open|data|pub(?:\([^)]*\))?)\s+)*(?:class|interface|struct|trait|object)\s+(?P<name>[A-Za-z_$][\w$]*)")?,
            rust_impl: Regex::new(r"^impl(?:<[^>]*>)?\s+(?:[\w:<>, ]+?\s+for\s+)?(?P<name>[A-Za-z_]\w*)")?,
            function_decls,
            imports,
            cjs_export: Regex::new(r"\b(?:module\.)?exports\.(?P<name>[A-Za-z_$][\w$]*)\s*=")?,
            cjs_single_export: Regex::new(r"\bmodule\.exports\s*=\s*(?P<name>[A-Za-z_$][\w$]*)\s*;?\s*$")?,
            object_export: Regex::new(r"(?:\bmodule\.exports\s*=\s*|^export\s*)\{(?P<names>[^}]*)\}")?,
            visibility: Regex::new(r"\b(?:export|pub|public)\b")?,
            async_marker: Regex::new(r"\b(?:async|suspend)\b")?,
        })
    }

    fn match_import(&self, raw_trimmed: &str) -> Option<String> {
        self.imports.iter().find_map(|re| {
            re.captures(raw_trimmed)
                .and_then(|cap| cap.name("target"))
                .map(|m| m.as_str().to_string())
        })
    }

    fn match_class(&self, trimmed: &str) -> Option<(String, bool)> {
        if let Some(cap) = self.class_decl.captures(trimmed) {
            let name = cap.name("name")?;
            let is_exported = self.visibility.is_match(&trimmed[..name.start()]);
            return Some((name.as_str().to_string(), is_exported));
        }
        self.rust_impl
            .captures(trimmed)
            .and_then(|cap| cap.name("name"))
            .map(|name| (name.as_str().to_string(), false))
    }

    /// First declaration pattern matching the line, and where its body text starts
    fn match_function(
        &self,
        trimmed: &str,
        class_name: Option<&str>,
        in_function_body: bool,
        is_go: bool,
    ) -> Option<DeclarationMatch> {
        for (regex, pattern) in &self.function_decls {
            let Some(cap) = regex.captures(trimmed) else {
                continue;
            };
            let Some(name) = cap.name("name") else {
                continue;
            };
            let name_str = name.as_str();

            match pattern {
                PatternKind::Typed => {
                    let type_token = cap.name("type").map(|t| t.as_str()).unwrap_or_default();
                    if is_reserved(name_str)
                        || STATEMENT_KEYWORDS.contains(&type_token)
                        || trimmed.ends_with(';')
                    {
                        continue;
                    }
                }
                PatternKind::MethodShorthand => {
                    // Inside a function body this shape is a call with a trailing block
                    if in_function_body || is_reserved(name_str) || BLOCK_KEYWORDS.contains(&name_str) {
                        continue;
                    }
                }
                PatternKind::Arrow => {
                    if is_reserved(name_str) {
                        continue;
                    }
                }
                _ => {}
            }

            let prefix = &trimmed[..name.start()];
            let is_constructor = name_str == "constructor"
                || class_name == Some(name_str)
                || (*pattern == PatternKind::RustFn && name_str == "new" && class_name.is_some());

            let kind = if is_constructor {
                FunctionKind::Constructor
            } else if *pattern == PatternKind::Arrow && cap.name("function").is_none() {
                FunctionKind::Arrow
            } else {
                FunctionKind::Function
            };

            let is_exported = self.visibility.is_match(prefix)
                || (is_go
                    && *pattern == PatternKind::Func
                    && name_str.starts_with(|c: char| c.is_ascii_uppercase()));

            let whole = cap.get(0).map_or(trimmed.len(), |m| m.end());
            let body = trimmed[whole..].trim();
            let expression_body = kind == FunctionKind::Arrow && !body.is_empty() && !body.contains('{');

            return Some(DeclarationMatch {
                decl: Declaration {
                    name: name_str.to_string(),
                    kind,
                    is_exported,
                    is_async: self.async_marker.is_match(&trimmed[..whole]),
                },
                body_start: whole,
                expression_body,
            });
        }
        None
    }

    fn collect_exports(&self, trimmed: &str, state: &mut ScanState<'_>) {
        for cap in self.cjs_export.captures_iter(trimmed) {
            if let Some(name) = cap.name("name") {
                state.note_exported_name(name.as_str());
            }
        }
        if let Some(name) = self.cjs_single_export.captures(trimmed).and_then(|c| c.name("name")) {
            state.note_exported_name(name.as_str());
        }
        if let Some(names) = self.object_export.captures(trimmed).and_then(|c| c.name("names")) {
            for entry in names.as_str().split(',') {
                // `a as b` exports a; `key: value` exports value
                let entry = entry.split(" as ").next().unwrap_or_default();
                let local = entry.rsplit(':').next().unwrap_or_default().trim();
                if !local.is_empty() && local.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
                    state.note_exported_name(local);
                }
            }
        }
    }

    /// Close every function and class whose block ended on this line
    fn close_contexts(&self, state: &mut ScanState<'_>, peak: usize, depth: usize, trimmed: &str, line: usize) {
        loop {
            let Some(open) = state.function_stack.last_mut() else {
                break;
            };
            if peak > open.level {
                open.body_started = true;
            }
            if open.body_started {
                if depth <= open.level {
                    state.close_innermost_function(line);
                    continue;
                }
                break;
            }
            open.lines_without_body += 1;
            if trimmed.ends_with(';') || open.lines_without_body > MAX_SIGNATURE_LINES {
                state.close_innermost_function(line);
                continue;
            }
            break;
        }

        loop {
            let Some(open) = state.class_stack.last_mut() else {
                break;
            };
            if peak > open.level {
                open.body_started = true;
            }
            if open.body_started {
                if depth <= open.level {
                    state.close_innermost_class();
                    continue;
                }
                break;
            }
            open.lines_without_body += 1;
            if trimmed.ends_with(';') || open.lines_without_body > MAX_SIGNATURE_LINES {
                state.close_innermost_class();
                continue;
            }
            break;
        }
    }
}

/// Highest depth reached on the line and the depth after it
fn brace_walk(cleaned: &str, depth: usize) -> (usize, usize) {
    let mut current = depth;
    let mut peak = depth;
    for ch in cleaned.chars() {
        match ch {
            '{' => {
                current += 1;
                peak = peak.max(current);
            }
            '}' => current = current.saturating_sub(1),
            _ => {}
        }
    }
    (peak, current)
}

impl DialectExtractor for BraceExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Brace
    }

    fn extract(&self, file: &SourceFile, content: &str) -> FileExtraction {
        let is_go = file
            .path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("go"));
        let mut state = ScanState::new(file);
        let mut depth = 0usize;
        let mut last_line = 0;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            last_line = line_no;

            if let Some(target) = self.match_import(raw.trim()) {
                state.add_import(line_no, &target);
            }

            let cleaned = state.clean_line(raw, &BRACE_COMMENTS);
            let trimmed = cleaned.trim();
            if trimmed.is_empty() {
                continue;
            }

            self.collect_exports(trimmed, &mut state);

            let depth_before = depth;
            let (peak, after) = brace_walk(trimmed, depth);

            if let Some(annotation) = self.patterns.annotation(trimmed) {
                state.push_annotation(annotation);
            } else if let Some((name, is_exported)) = self.match_class(trimmed) {
                state.open_class(&name, line_no, depth_before, is_exported);
            } else if let Some(found) = self.match_function(
                trimmed,
                state.current_class_name(),
                state.in_function_body(),
                is_go,
            ) {
                state.open_function(found.decl, line_no, depth_before);
                state.record_body(&self.patterns, &trimmed[found.body_start..], raw, line_no, false);
                if found.expression_body {
                    state.close_innermost_function(line_no);
                }
            } else {
                state.clear_annotations();
                state.record_body(&self.patterns, trimmed, raw, line_no, false);
            }

            depth = after;
            self.close_contexts(&mut state, peak, depth, trimmed, line_no);
        }

        state.finish(last_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use crate::core::model::DecisionKind;

    fn extract(path: &str, content: &str) -> FileExtraction {
        let extractor = BraceExtractor::new().unwrap();
        let file = SourceFile {
            path: PathBuf::from(path),
            dialect: Dialect::Brace,
        };
        extractor.extract(&file, content)
    }

    fn names(extraction: &FileExtraction) -> Vec<&str> {
        extraction.functions.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_javascript_declarations() {
        let source = r#"
import { readFile } from 'fs';
const path = require('path');

export async function activate(context) {
    setup(context);
    run();
}

function setup(ctx) {
    register(ctx);
}

const double = (x) => x * 2;

export const fetchUser = async (id) => {
    return client.get(id);
};
"#;
        let extraction = extract("src/extension.js", source);
        assert_eq!(names(&extraction), vec!["activate", "setup", "double", "fetchUser"]);

        let activate = &extraction.functions[0];
        assert!(activate.is_exported);
        assert!(activate.is_async);
        assert_eq!(activate.kind, FunctionKind::AsyncFunction);
        let callees: Vec<_> = activate.outgoing_calls.iter().map(|c| c.callee.as_str()).collect();
        assert_eq!(callees, vec!["setup", "run"]);
        assert_eq!(activate.line, 5);
        assert_eq!(activate.end_line, 8);

        let double = &extraction.functions[2];
        assert_eq!(double.kind, FunctionKind::Arrow);
        assert_eq!(double.line, double.end_line);

        let fetch_user = &extraction.functions[3];
        assert!(fetch_user.is_exported);
        assert!(fetch_user.is_async);
        assert_eq!(fetch_user.outgoing_calls[0].callee, "get");

        let targets: Vec<_> = extraction.imports.iter().map(|i| i.target.as_str()).collect();
        assert_eq!(targets, vec!["fs", "path"]);
    }

    #[test]
    fn test_class_methods_and_constructor() {
        let source = r#"
export class UserService {
    constructor(repo) {
        this.repo = repo;
    }

    async loadUser(id) {
        if (!id) {
            throw new Error('missing');
        }
        return this.repo.find(id);
    }
}

function helper() {}
"#;
        let extraction = extract("src/user.ts", source);
        assert_eq!(extraction.classes.len(), 1);
        let class = &extraction.classes[0];
        assert_eq!(class.name, "UserService");
        assert!(class.is_exported);
        assert_eq!(class.method_names, vec!["constructor", "loadUser"]);

        let ctor = &extraction.functions[0];
        assert_eq!(ctor.kind, FunctionKind::Constructor);
        assert_eq!(ctor.owning_class.as_deref(), Some("UserService"));

        let load = &extraction.functions[1];
        assert_eq!(load.kind, FunctionKind::Method);
        assert!(load.is_async);
        assert_eq!(load.decision_points.len(), 1);
        assert_eq!(load.decision_points[0].kind, DecisionKind::Conditional);
        assert_eq!(load.id.as_str(), "src/user.ts::UserService.loadUser");

        let helper = &extraction.functions[2];
        assert_eq!(helper.owning_class, None);
        assert_eq!(helper.kind, FunctionKind::Function);
    }

    #[test]
    fn test_decision_points_and_weight() {
        let source = r#"
function route(req) {
    if (req.user && req.user.admin) {
        return admin(req);
    }
    for (const item of req.items) {
        handle(item);
    }
    switch (req.method) {
        case 'GET':
            return get(req);
    }
    return req.ok ? done() : fail();
}
"#;
        let extraction = extract("src/router.js", source);
        let route = &extraction.functions[0];
        let kinds: Vec<_> = route.decision_points.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DecisionKind::Conditional,
                DecisionKind::Loop,
                DecisionKind::Switch,
                DecisionKind::Switch,
                DecisionKind::Ternary,
            ]
        );
        assert_eq!(route.decision_points[0].weight, 2);
        assert_eq!(route.cyclomatic_weight, 1 + 2 + 1 + 1 + 1 + 1);
        assert!(route
            .decision_points
            .iter()
            .all(|d| d.owning_function.as_ref() == Some(&route.id)));
    }

    #[test]
    fn test_control_keywords_are_not_declarations() {
        let source = r#"
function main() {
    if (ready) {
        start();
    } else if (retry) {
        while (busy) {
            wait();
        }
    }
    catchUp();
}
"#;
        let extraction = extract("main.js", source);
        assert_eq!(names(&extraction), vec!["main"]);
        let callees: Vec<_> = extraction.functions[0]
            .outgoing_calls
            .iter()
            .map(|c| c.callee.as_str())
            .collect();
        assert_eq!(callees, vec!["start", "wait", "catchUp"]);
    }

    #[test]
    fn test_commonjs_exports_mark_functions() {
        let source = r#"
function parse(input) {
    return input;
}
function render() {}
module.exports = { parse };
"#;
        let extraction = extract("lib/parser.js", source);
        assert!(extraction.functions[0].is_exported);
        assert!(!extraction.functions[1].is_exported);
    }

    #[test]
    fn test_java_annotations_and_typed_methods() {
        let source = r#"
import java.util.List;

public class OrderController {
    @GetMapping("/orders")
    public List<Order> listOrders() {
        return service.findAll();
    }

    private void audit(String msg);
}
"#;
        let extraction = extract("src/OrderController.java", source);
        assert_eq!(names(&extraction), vec!["listOrders"]);
        let list = &extraction.functions[0];
        assert_eq!(list.annotations, vec!["GetMapping"]);
        assert!(list.is_exported);
        assert_eq!(list.kind, FunctionKind::Method);
        assert_eq!(extraction.imports[0].target, "java.util.List");
    }

    #[test]
    fn test_rust_and_go_declarations() {
        let rust = r#"
use std::fmt;

pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Engine
    }

    async fn run(&self) -> Result<(), Error> {
        self.tick().await
    }
}
"#;
        let extraction = extract("src/engine.rs", rust);
        assert_eq!(names(&extraction), vec!["new", "run"]);
        assert_eq!(extraction.functions[0].kind, FunctionKind::Constructor);
        assert!(extraction.functions[0].is_exported);
        assert_eq!(extraction.functions[1].kind, FunctionKind::Method);
        assert!(extraction.functions[1].is_async);
        assert_eq!(extraction.functions[1].owning_class.as_deref(), Some("Engine"));

        let go = r#"
package main

import "fmt"

func main() {
    Serve()
}

func (s *Server) Serve() error {
    return nil
}
"#;
        let extraction = extract("cmd/main.go", go);
        assert_eq!(names(&extraction), vec!["main", "Serve"]);
        assert!(!extraction.functions[0].is_exported);
        assert!(extraction.functions[1].is_exported);
        assert_eq!(extraction.imports[0].target, "fmt");
    }

    fn callees(function: &crate::core::model::FunctionRecord) -> Vec<&str> {
        function.outgoing_calls.iter().map(|c| c.callee.as_str()).collect()
    }

    #[test]
    fn test_primitive_return_types() {
        let java = r#"
public class App {
    public static void main(String[] args) {
        run();
    }

    public String describe() {
        return name;
    }

    public int count() {
        return items.size();
    }
}
"#;
        let extraction = extract("src/App.java", java);
        assert_eq!(names(&extraction), vec!["main", "describe", "count"]);
        let main = &extraction.functions[0];
        assert_eq!(main.kind, FunctionKind::Method);
        assert_eq!(main.owning_class.as_deref(), Some("App"));
        assert!(main.is_exported);
        assert_eq!(callees(main), vec!["run"]);

        let c = r#"
#include <stdio.h>

int main(int argc, char **argv) {
    helper();
    return 0;
}

void helper(void) {
    printf("hi");
}

static float ratio(int a) {
    return a / 2.0f;
}
"#;
        let extraction = extract("main.c", c);
        assert_eq!(names(&extraction), vec!["main", "helper", "ratio"]);
        assert_eq!(callees(&extraction.functions[0]), vec!["helper"]);
        assert_eq!(extraction.imports[0].target, "stdio.h");

        let csharp = r#"
public class Svc
{
    public void Start()
    {
        if (Validate(input))
        {
            Run();
        }
    }

    public bool Validate(string input)
    {
        return input != null;
    }
}
"#;
        let extraction = extract("Svc.cs", csharp);
        assert_eq!(names(&extraction), vec!["Start", "Validate"]);
        let start = &extraction.functions[0];
        assert_eq!(callees(start), vec!["Validate", "Run"]);
        assert_eq!(start.decision_points.len(), 1);
        assert_eq!(extraction.functions[1].owning_class.as_deref(), Some("Svc"));
    }

    #[test]
    fn test_block_statements_stay_inside_their_function() {
        let go = "func main() {\n\tdefer cleanup()\n\tgo worker(ch)\n\trun()\n}\n";
        let extraction = extract("main.go", go);
        assert_eq!(names(&extraction), vec!["main"]);
        assert_eq!(callees(&extraction.functions[0]), vec!["cleanup", "worker", "run"]);

        let java = r#"
class Store {
    void save() {
        synchronized (lock) {
            flush();
            if (dirty) {
                write();
            }
        }
    }
}
"#;
        let extraction = extract("Store.java", java);
        assert_eq!(names(&extraction), vec!["save"]);
        let save = &extraction.functions[0];
        assert_eq!(callees(save), vec!["flush", "write"]);
        assert_eq!(save.decision_points.len(), 1);
        assert_eq!(save.end_line, 10);

        let csharp = r#"
class Worker {
    void Tick() {
        lock (gate) {
            Step();
        }
    }
}
"#;
        let extraction = extract("Worker.cs", csharp);
        assert_eq!(names(&extraction), vec!["Tick"]);
        assert!(callees(&extraction.functions[0]).contains(&"Step"));

        let kotlin = r#"
class Repo {
    fun load() {
        launch(Dispatchers.IO) {
            fetch()
        }
        repeat(3) {
            retry()
        }
    }
}
"#;
        let extraction = extract("Repo.kt", kotlin);
        assert_eq!(names(&extraction), vec!["load"]);
        assert_eq!(callees(&extraction.functions[0]), vec!["launch", "fetch", "repeat", "retry"]);
    }

    #[test]
    fn test_expression_arrow_closes_on_its_line() {
        let source = r#"
class D {
    handler = (e) => this.go(e)
    save() {
        persist()
    }
}
"#;
        let extraction = extract("src/d.ts", source);
        assert_eq!(names(&extraction), vec!["handler", "save"]);

        let handler = &extraction.functions[0];
        assert_eq!(handler.kind, FunctionKind::Arrow);
        assert_eq!(handler.end_line, handler.line);
        assert_eq!(callees(handler), vec!["go"]);

        let save = &extraction.functions[1];
        assert_eq!(save.owning_class.as_deref(), Some("D"));
        assert_eq!(save.kind, FunctionKind::Method);
        assert_eq!(callees(save), vec!["persist"]);
    }

    #[test]
    fn test_template_literal_spanning_lines_is_not_code() {
        let source = r#"
function render() {
    return `
        <script>
            function handleMessage(event) {
                post(event);
            }
        </script>
    `;
}

function after() {}
"#;
        let extraction = extract("src/panel.js", source);
        assert_eq!(names(&extraction), vec!["render", "after"]);
        let render = &extraction.functions[0];
        assert!(render.outgoing_calls.is_empty());
        assert_eq!(render.end_line, 10);
        assert_eq!(extraction.functions[1].owning_class, None);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let source = "function a() { b(); }\nfunction b() { if (x) { a(); } }\n";
        let first = extract("x.js", source);
        let second = extract("x.js", source);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
