//! Host module structure: top-level Python functions
//!
//! The host source is parsed with tree-sitter's Python grammar. Every
//! `function_definition` directly under the module (bare or decorated, sync
//! or async) becomes a span running from its `def` keyword to the end of its
//! last statement, so trailing comments and blank lines are not part of it.

use crate::error::{ParityError, Result};
use crate::scope::{normalize_newlines, ScopeMap, SourceSpan};
use std::collections::HashMap;
use tree_sitter::{Node, Parser};

/// Top-level functions of one host module
#[derive(Debug, Clone, Default)]
pub struct HostModule {
    scopes: ScopeMap,
    /// Line the interpreter reports for each name's live code object
    /// (first decorator, or `def`, of the last definition)
    code_lines: HashMap<String, usize>,
}

impl HostModule {
    /// Recover top-level function spans from Python source text
    ///
    /// A name defined twice keeps its first span for display, but the later
    /// definition rebinds the name, so its code object line is the one
    /// recorded.
    pub fn parse(source: &str) -> Result<Self> {
        let text = normalize_newlines(source);

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| ParityError::HostParse(e.to_string()))?;
        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| ParityError::HostParse("parser produced no tree".to_string()))?;

        let root = tree.root_node();
        if root.has_error() {
            tracing::warn!("Host source has syntax errors; spans may be incomplete");
        }

        let mut module = HostModule::default();
        let mut cursor = root.walk();
        for item in root.children(&mut cursor) {
            let Some((code_node, def)) = function_item(item) else {
                continue;
            };
            let Some(name) = def
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(text.as_bytes()).ok())
            else {
                continue;
            };

            let end = code_end(def);
            module
                .scopes
                .insert(SourceSpan::new(name, &text, def.start_byte(), end));
            module
                .code_lines
                .insert(name.to_string(), code_node.start_position().row + 1);
        }

        tracing::debug!("Found {} top-level host functions", module.scopes.len());
        Ok(module)
    }

    /// Source spans of the top-level functions
    pub fn scopes(&self) -> &ScopeMap {
        &self.scopes
    }

    /// Whether `name` is a top-level function of this module
    pub fn has_function(&self, name: &str) -> bool {
        self.scopes.contains(name)
    }

    /// First line of the code object the name is bound to (1-based)
    pub fn code_first_line(&self, name: &str) -> Option<usize> {
        self.code_lines.get(name).copied()
    }
}

/// The node whose first line the interpreter reports, and the `def` itself
fn function_item(item: Node<'_>) -> Option<(Node<'_>, Node<'_>)> {
    match item.kind() {
        "function_definition" => Some((item, item)),
        "decorated_definition" => item
            .child_by_field_name("definition")
            .filter(|def| def.kind() == "function_definition")
            .map(|def| (item, def)),
        _ => None,
    }
}

/// End byte of the last code token under `node`, ignoring comments
fn code_end(node: Node<'_>) -> usize {
    let mut cursor = node.walk();
    let last = node
        .children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .last();
    match last {
        Some(child) => code_end(child),
        None => node.end_byte(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = "\
import gc

TOP_LEVEL_SENTINEL = 314


def gs_assert(cond, msg, *args):
    if not cond:
        raise AssertionError(msg.format(*args))


class GSList:
    def __init__(self, items=None):
        self.data = list(items or [])

    def size(self):
        return len(self.data)


def test_load_const():
    a = 1
    # inner comment

    b = 2
    return a + b
# trailing comment


@decorated
@twice
async def run_bench(
    rounds,
    label=\"x\",
):
    for _ in range(rounds):
        pass

def main(): return 0
";

    #[test]
    fn test_top_level_functions_only() {
        let module = HostModule::parse(DEMO).unwrap();
        let names: Vec<&str> = module.scopes().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["gs_assert", "test_load_const", "run_bench", "main"]);
        assert!(!module.has_function("size"));
        assert!(!module.has_function("GSList"));
    }

    #[test]
    fn test_span_excludes_trailing_comments() {
        let module = HostModule::parse(DEMO).unwrap();
        assert_eq!(
            module.scopes().text("test_load_const"),
            Some("def test_load_const():\n    a = 1\n    # inner comment\n\n    b = 2\n    return a + b")
        );
    }

    #[test]
    fn test_multiline_signature_and_decorators() {
        let module = HostModule::parse(DEMO).unwrap();
        let span = module.scopes().get("run_bench").unwrap();
        assert!(span.text().starts_with("async def run_bench("));
        assert!(span.text().ends_with("        pass"));
        assert_eq!(span.first_line, 30);
        assert_eq!(module.code_first_line("run_bench"), Some(28));
    }

    #[test]
    fn test_one_line_function() {
        let module = HostModule::parse(DEMO).unwrap();
        assert_eq!(module.scopes().text("main"), Some("def main(): return 0"));
        assert_eq!(
            module.code_first_line("main"),
            Some(module.scopes().get("main").unwrap().first_line)
        );
    }

    #[test]
    fn test_column_zero_string_stays_in_body() {
        let source = "def doc():\n    s = \"\"\"\nhello\ndef fake(x):\n\"\"\"\n    return s\n\n\ndef after():\n    pass\n";
        let module = HostModule::parse(source).unwrap();

        assert_eq!(
            module.scopes().text("doc"),
            Some("def doc():\n    s = \"\"\"\nhello\ndef fake(x):\n\"\"\"\n    return s")
        );
        assert!(!module.has_function("fake"));
        assert_eq!(module.code_first_line("after"), Some(9));
    }

    #[test]
    fn test_bracket_continuation_at_column_zero() {
        let source = "def table():\n    return [\n1,\n2,\n]\n";
        let module = HostModule::parse(source).unwrap();
        assert_eq!(
            module.scopes().text("table"),
            Some("def table():\n    return [\n1,\n2,\n]")
        );
    }

    #[test]
    fn test_duplicate_keeps_first_span_but_binds_last_definition() {
        let module = HostModule::parse("def f():\n    return 1\n\ndef f():\n    return 2\n").unwrap();
        assert_eq!(module.scopes().len(), 1);
        assert_eq!(module.scopes().text("f"), Some("def f():\n    return 1"));
        assert_eq!(module.code_first_line("f"), Some(4));
    }

    #[test]
    fn test_nested_and_conditional_defs_are_not_top_level() {
        let source = "if True:\n    def hidden():\n        pass\n\ndef outer():\n    def inner():\n        pass\n    return inner\n";
        let module = HostModule::parse(source).unwrap();
        let names: Vec<&str> = module.scopes().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["outer"]);
    }
}
