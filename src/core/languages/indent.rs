// src/core/languages/indent.rs
use regex::Regex;

use crate::error::Result;
use crate::core::model::{Dialect, FileExtraction, FunctionKind, SourceFile};
use super::scan_state::{indentation, Declaration, LinePatterns, ScanState, PYTHON_COMMENTS};
use super::DialectExtractor;

/// Indentation-delimited blocks (Python)
pub struct IndentExtractor {
    patterns: LinePatterns,
    class_decl: Regex,
    function_decl: Regex,
    lambda_decl: Regex,
    import: Regex,
    from_import: Regex,
    all_names: Regex,
    quoted: Regex,
}

impl IndentExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: LinePatterns::new()?,
            class_decl: Regex::new(r"^class\s+(?P<name>[A-Za-z_]\w*)")?,
            function_decl: Regex::new(r"^(?P<async>async\s+)?def\s+(?P<name>[A-Za-z_]\w*)\s*\(")?,
            lambda_decl: Regex::new(r"^(?P<name>[A-Za-z_]\w*)\s*(?::[^=]+)?=\s*lambda\b")?,
            import: Regex::new(r"^import\s+(?P<target>[\w.]+)")?,
            from_import: Regex::new(r"^from\s+(?P<target>[\w.]+)\s+import\b")?,
            all_names: Regex::new(r"^__all__\s*(?::[^=]+)?=\s*[\[(](?P<names>.*)")?,
            quoted: Regex::new(r#"['"](?P<name>[A-Za-z_]\w*)['"]"#)?,
        })
    }

    fn match_import(&self, trimmed: &str) -> Option<String> {
        self.from_import
            .captures(trimmed)
            .or_else(|| self.import.captures(trimmed))
            .and_then(|cap| cap.name("target"))
            .map(|m| m.as_str().to_string())
    }

    /// Names listed in a single-line `__all__`
    fn collect_all(&self, raw_trimmed: &str, state: &mut ScanState<'_>) {
        let Some(names) = self.all_names.captures(raw_trimmed).and_then(|c| c.name("names")) else {
            return;
        };
        for cap in self.quoted.captures_iter(names.as_str()) {
            if let Some(name) = cap.name("name") {
                state.note_exported_name(name.as_str());
            }
        }
    }

    fn match_function(&self, trimmed: &str, in_class: bool, nested: bool) -> Option<(Declaration, usize)> {
        if let Some(cap) = self.function_decl.captures(trimmed) {
            let name = cap.name("name")?.as_str();
            let kind = if in_class && name == "__init__" {
                FunctionKind::Constructor
            } else {
                FunctionKind::Function
            };
            let end = cap.get(0).map_or(trimmed.len(), |m| m.end());
            return Some((
                Declaration {
                    name: name.to_string(),
                    kind,
                    is_exported: !nested && !name.starts_with('_'),
                    is_async: cap.name("async").is_some(),
                },
                end,
            ));
        }

        let cap = self.lambda_decl.captures(trimmed)?;
        let name = cap.name("name")?.as_str();
        let end = cap.get(0).map_or(trimmed.len(), |m| m.end());
        Some((
            Declaration {
                name: name.to_string(),
                kind: FunctionKind::Arrow,
                is_exported: !nested && !name.starts_with('_'),
                is_async: false,
            },
            end,
        ))
    }
}

/// Close every context whose indentation the current line does not exceed
fn close_dedented(state: &mut ScanState<'_>, indent: usize, last_code_line: usize) {
    loop {
        let function_level = state.function_stack.last().map(|c| c.level);
        let class_level = state.class_stack.last().map(|c| c.level);

        match (function_level, class_level) {
            (Some(f), Some(c)) if f >= c => {
                if f < indent {
                    break;
                }
                state.close_innermost_function(last_code_line);
            }
            (_, Some(c)) => {
                if c < indent {
                    break;
                }
                state.close_innermost_class();
            }
            (Some(f), None) => {
                if f < indent {
                    break;
                }
                state.close_innermost_function(last_code_line);
            }
            (None, None) => break,
        }
    }
}

impl DialectExtractor for IndentExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Indentation
    }

    fn extract(&self, file: &SourceFile, content: &str) -> FileExtraction {
        let mut state = ScanState::new(file);
        let mut last_code_line = 0;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;

            let cleaned = state.clean_line(raw, &PYTHON_COMMENTS);
            let trimmed = cleaned.trim();
            if trimmed.is_empty() {
                continue;
            }

            let indent = indentation(raw);
            close_dedented(&mut state, indent, last_code_line);
            last_code_line = line_no;

            if let Some(target) = self.match_import(trimmed) {
                state.add_import(line_no, &target);
                continue;
            }
            if indent == 0 {
                self.collect_all(raw.trim(), &mut state);
            }

            if let Some(annotation) = self.patterns.annotation(trimmed) {
                state.push_annotation(annotation);
            } else if let Some(cap) = self.class_decl.captures(trimmed) {
                let name = cap.name("name").map_or("", |m| m.as_str());
                let is_exported = !state.in_function() && !name.starts_with('_');
                state.open_class(name, line_no, indent, is_exported);
            } else if let Some((decl, body_start)) = self.match_function(
                trimmed,
                state.current_class_name().is_some(),
                state.in_function(),
            ) {
                state.open_function(decl, line_no, indent);
                state.record_body(&self.patterns, &trimmed[body_start..], raw, line_no, true);
            } else {
                state.clear_annotations();
                state.record_body(&self.patterns, trimmed, raw, line_no, true);
            }
        }

        state.finish(last_code_line)
    }
}
