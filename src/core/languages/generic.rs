// src/core/languages/generic.rs
use regex::Regex;

use crate::error::Result;
use crate::core::model::{Dialect, FileExtraction, FunctionKind, SourceFile};
use super::scan_state::{
    indentation, is_reserved, Declaration, LinePatterns, ScanState, HASH_COMMENTS, LUA_COMMENTS,
};
use super::DialectExtractor;

/// Keywords that continue a block at the declaration's own indentation
const CONTINUATIONS: &[&str] = &["rescue", "ensure", "else", "elsif", "elseif", "when"];

/// Keyword-and-`end` or brace languages without a dedicated pattern set:
/// Ruby, Lua, Perl, shell
pub struct GenericExtractor {
    patterns: LinePatterns,
    keyword_decl: Regex,
    assigned_decl: Regex,
    shell_decl: Regex,
    class_decl: Regex,
    package_decl: Regex,
    block_end: Regex,
    one_line_end: Regex,
    imports: Vec<Regex>,
}

impl GenericExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: LinePatterns::new()?,
            keyword_decl: Regex::new(r"^(?P<local>local\s+)?(?:def|function|func|fn|sub|proc)\s+(?:self\.)?(?P<path>[A-Za-z_][\w.:]*[?!]?)")?,
            assigned_decl: Regex::new(r"^(?P<local>local\s+)?(?P<path>[A-Za-z_][\w.:]*)\s*=\s*function\b")?,
            shell_decl: Regex::new(r"^(?P<path>[A-Za-z_][\w-]*)\s*\(\)\s*\{?")?,
            class_decl: Regex::new(r"^(?:class|module)\s+(?P<path>[A-Z]\w*(?:::\w+)*)")?,
            package_decl: Regex::new(r"^package\s+(?P<path>[\w:]+)\s*;")?,
            block_end: Regex::new(r"^(?:end\b|\})")?,
            one_line_end: Regex::new(r"(?:\bend|\})\s*;?\s*$")?,
            imports: vec![
                Regex::new(r#"^require(?:_relative)?\s*\(?\s*['"](?P<target>[^'"]+)['"]"#)?,
                Regex::new(r#"^(?:local\s+\w+\s*=\s*)?require\s*\(?\s*['"](?P<target>[^'"]+)['"]"#)?,
                Regex::new(r"^use\s+(?P<target>[\w:]+)")?,
                Regex::new(r"^(?:source|\.)\s+(?P<target>\S+)")?,
            ],
        })
    }

    fn match_import(&self, raw_trimmed: &str) -> Option<String> {
        self.imports.iter().find_map(|re| {
            re.captures(raw_trimmed)
                .and_then(|cap| cap.name("target"))
                .map(|m| m.as_str().to_string())
        })
    }

    fn match_function(&self, trimmed: &str, class_name: Option<&str>) -> Option<(Declaration, usize)> {
        // Anything after a declaration keyword is a name, even `new`
        let (cap, keyword) = match self.keyword_decl.captures(trimmed) {
            Some(cap) => (cap, true),
            None => (
                self.assigned_decl
                    .captures(trimmed)
                    .or_else(|| self.shell_decl.captures(trimmed))?,
                false,
            ),
        };

        let name = last_segment(cap.name("path")?.as_str());
        if !keyword && is_reserved(name) {
            return None;
        }
        let is_local = cap.name("local").is_some();
        let kind = if name == "initialize" || (name == "new" && class_name.is_some()) {
            FunctionKind::Constructor
        } else {
            FunctionKind::Function
        };
        let end = cap.get(0).map_or(trimmed.len(), |m| m.end());

        Some((
            Declaration {
                name: name.to_string(),
                kind,
                is_exported: !is_local && !name.starts_with('_'),
                is_async: false,
            },
            end,
        ))
    }
}

/// `Mod::Klass` -> `Klass`, `M.helper` -> `helper`, `obj:method` -> `method`
fn last_segment(path: &str) -> &str {
    path.rsplit(|c| c == '.' || c == ':').next().unwrap_or(path)
}

/// Innermost open context: its level and whether it is a function
fn innermost(state: &ScanState<'_>) -> Option<(usize, bool)> {
    let function = state.function_stack.last().map(|c| c.level);
    let class = state.class_stack.last().map(|c| c.level);
    match (function, class) {
        (Some(f), Some(c)) if f >= c => Some((f, true)),
        (_, Some(c)) => Some((c, false)),
        (Some(f), None) => Some((f, true)),
        (None, None) => None,
    }
}

impl DialectExtractor for GenericExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Generic
    }

    fn extract(&self, file: &SourceFile, content: &str) -> FileExtraction {
        let is_lua = file
            .path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("lua"));
        let style = if is_lua { LUA_COMMENTS } else { HASH_COMMENTS };

        let mut state = ScanState::new(file);
        // Perl packages run to the next package statement and sit at the bottom of the class stack
        let mut package_open = false;
        let mut last_code_line = 0;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;

            let cleaned = state.clean_line(raw, &style);
            let trimmed = cleaned.trim();
            if trimmed.is_empty() {
                continue;
            }
            let indent = indentation(raw);
            let first_word = trimmed
                .split(|c: char| !c.is_alphanumeric() && c != '_')
                .next()
                .unwrap_or_default();

            let mut consumed = false;
            while let Some((level, is_function)) = innermost(&state) {
                if !is_function && package_open && state.class_stack.len() == 1 {
                    break;
                }
                if level < indent {
                    break;
                }
                if level == indent && self.block_end.is_match(trimmed) {
                    if is_function {
                        state.close_innermost_function(line_no);
                    } else {
                        state.close_innermost_class();
                    }
                    consumed = true;
                    break;
                }
                if level == indent && CONTINUATIONS.contains(&first_word) {
                    break;
                }
                if is_function {
                    state.close_innermost_function(last_code_line);
                } else {
                    state.close_innermost_class();
                }
            }
            last_code_line = line_no;
            if consumed {
                continue;
            }

            if let Some(target) = self.match_import(raw.trim()) {
                state.add_import(line_no, &target);
                continue;
            }

            if let Some(cap) = self.package_decl.captures(trimmed) {
                while state.in_function() {
                    state.close_innermost_function(line_no.saturating_sub(1));
                }
                while !state.class_stack.is_empty() {
                    state.close_innermost_class();
                }
                let name = cap.name("path").map_or("", |m| last_segment(m.as_str()));
                state.open_class(name, line_no, 0, true);
                package_open = true;
            } else if let Some(cap) = self.class_decl.captures(trimmed) {
                let name = cap.name("path").map_or("", |m| last_segment(m.as_str()));
                state.open_class(name, line_no, indent, true);
            } else if let Some((decl, body_start)) =
                self.match_function(trimmed, state.current_class_name())
            {
                state.open_function(decl, line_no, indent);
                let rest = &trimmed[body_start..];
                state.record_body(&self.patterns, rest, raw, line_no, true);
                if self.one_line_end.is_match(rest) && rest.matches('{').count() <= rest.matches('}').count() {
                    state.close_innermost_function(line_no);
                }
            } else {
                state.record_body(&self.patterns, trimmed, raw, line_no, true);
            }
        }

        state.finish(last_code_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use crate::core::model::DecisionKind;

    fn extract(path: &str, content: &str) -> FileExtraction {
        let extractor = GenericExtractor::new().unwrap();
        let file = SourceFile {
            path: PathBuf::from(path),
            dialect: Dialect::Generic,
        };
        extractor.extract(&file, content)
    }

    fn names(extraction: &FileExtraction) -> Vec<&str> {
        extraction.functions.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_ruby_class_and_methods() {
        let source = r#"
require 'json'

class Billing::Invoice
  def initialize(total)
    @total = total
  end

  def self.build(data)
    new(parse(data))
  end

  def valid?
    if @total > 0
      true
    else
      false
    end
  rescue StandardError
    false
  end
end

def main
  Billing::Invoice.build(load_data())
end
"#;
        let extraction = extract("lib/invoice.rb", source);
        assert_eq!(names(&extraction), vec!["initialize", "build", "valid?", "main"]);
        assert_eq!(extraction.imports[0].target, "json");

        let init = &extraction.functions[0];
        assert_eq!(init.kind, FunctionKind::Constructor);
        assert_eq!(init.owning_class.as_deref(), Some("Invoice"));
        assert_eq!(init.end_line, 7);

        let valid = &extraction.functions[2];
        assert_eq!(valid.kind, FunctionKind::Method);
        assert_eq!(valid.end_line, 21);
        assert_eq!(valid.decision_points.len(), 1);
        assert_eq!(valid.decision_points[0].kind, DecisionKind::Conditional);

        let main = &extraction.functions[3];
        assert!(main.owning_class.is_none());
        let callees: Vec<&str> = main.outgoing_calls.iter().map(|c| c.callee.as_str()).collect();
        assert_eq!(callees, vec!["build", "load_data"]);
    }

    #[test]
    fn test_lua_module_functions() {
        let source = r#"
local json = require("json")
local M = {}

local function helper(x)
  return x * 2
end

function M.start(cfg)
  -- if commented()
  while running do
    step(helper(cfg))
  end
end

M.stop = function()
  shutdown()
end

return M
"#;
        let extraction = extract("src/app.lua", source);
        assert_eq!(names(&extraction), vec!["helper", "start", "stop"]);
        assert_eq!(extraction.imports[0].target, "json");
        assert!(!extraction.functions[0].is_exported);
        assert!(extraction.functions[1].is_exported);

        let start = &extraction.functions[1];
        assert_eq!(start.decision_points.len(), 1);
        assert_eq!(start.decision_points[0].kind, DecisionKind::Loop);
        let callees: Vec<&str> = start.outgoing_calls.iter().map(|c| c.callee.as_str()).collect();
        assert_eq!(callees, vec!["step", "helper"]);
        assert_eq!(start.end_line, 14);
    }

    #[test]
    fn test_perl_packages_and_shell_functions() {
        let perl = r#"
package Shop::Cart;
use strict;

sub new {
    my ($class) = @_;
    return bless {}, $class;
}

sub total { return sum(@_) }

package main;

sub run {
    Shop::Cart->new();
}
"#;
        let extraction = extract("cart.pl", perl);
        assert_eq!(names(&extraction), vec!["new", "total", "run"]);
        assert_eq!(extraction.functions[0].kind, FunctionKind::Constructor);
        assert_eq!(extraction.functions[0].owning_class.as_deref(), Some("Cart"));
        assert_eq!(extraction.functions[1].end_line, 10);
        assert_eq!(extraction.functions[2].owning_class.as_deref(), Some("main"));

        let shell = "#!/bin/sh\nsource ./env.sh\n\ndeploy() {\n  build_all\n  upload \"$1\"\n}\n";
        let extraction = extract("deploy.sh", shell);
        assert_eq!(names(&extraction), vec!["deploy"]);
        assert_eq!(extraction.imports[0].target, "./env.sh");
        assert_eq!(extraction.functions[0].end_line, 7);
    }
}
