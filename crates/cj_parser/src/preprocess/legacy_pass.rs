//! Legacy declaration pass.
//!
//! swc has no grammar for `module name from "m"` or for a bare
//! `export default;`. This pass finds both outside strings, comments and
//! template text, turns each into a ready tree node, and blanks its text so
//! swc parses the remainder with every byte offset unchanged.

use cj_ast::{ExportDecl, ExportKind, ModuleDecl, ModuleSyntax, Node, Source, Span};
use tracing::debug;

use super::util::{
    char_offset_to_byte, is_quote, is_word_start, previous_significant, scan_word, skip_non_code,
    skip_whitespace, word_at, HandleResult, TemplateState,
};

/// Source with legacy declarations blanked out, plus their tree nodes.
#[derive(Debug, Default)]
pub struct LegacyDeclarations {
    pub text: String,
    pub nodes: Vec<Node>,
}

#[derive(Debug)]
enum Found {
    Module {
        name: String,
        source_start: usize,
        source_end: usize,
    },
    BareDefault,
}

#[derive(Debug)]
struct Match {
    found: Found,
    /// Character range of the whole declaration.
    start: usize,
    end: usize,
}

pub fn extract_legacy(source: &str, syntax: &ModuleSyntax) -> LegacyDeclarations {
    if !syntax.module_from && !syntax.bare_default_export {
        return LegacyDeclarations {
            text: source.to_string(),
            nodes: Vec::new(),
        };
    }

    let chars: Vec<char> = source.chars().collect();
    let matches = find_legacy(&chars, syntax);

    let nodes: Vec<Node> = matches.iter().map(|m| to_node(&chars, m)).collect();
    let spans: Vec<Span> = nodes.iter().map(Node::span).collect();
    debug!(count = nodes.len(), "found legacy module declarations");

    LegacyDeclarations {
        text: blank(source, &spans),
        nodes,
    }
}

fn find_legacy(chars: &[char], syntax: &ModuleSyntax) -> Vec<Match> {
    let mut matches = Vec::new();
    let mut template_state = TemplateState::new();
    let mut i = 0;

    while i < chars.len() {
        match template_state.handle_char(chars, i) {
            HandleResult::Skip(n) => {
                i += n;
                continue;
            }
            HandleResult::Process => {}
        }

        if let Some(skip) = skip_non_code(chars, i) {
            i = skip;
            continue;
        }

        if !is_word_start(chars, i) {
            i += 1;
            continue;
        }

        // `a.module` or `x.export` are property accesses
        if previous_significant(chars, i) == Some('.') {
            i = scan_word(chars, i);
            continue;
        }

        let found = match word_at(chars, i).as_str() {
            "module" if syntax.module_from => match_module_from(chars, i),
            "export" if syntax.bare_default_export => match_bare_default(chars, i),
            _ => None,
        };
        match found {
            Some(m) => {
                i = m.end;
                matches.push(m);
            }
            None => i = scan_word(chars, i),
        }
    }

    matches
}

/// `module <name> from "<source>"` with an optional trailing `;`.
fn match_module_from(chars: &[char], start: usize) -> Option<Match> {
    let keyword_end = scan_word(chars, start);

    let name_start = skip_whitespace(chars, keyword_end);
    if name_start == keyword_end || !is_word_start(chars, name_start) {
        return None;
    }
    let name_end = scan_word(chars, name_start);

    let from_start = skip_whitespace(chars, name_end);
    if from_start == name_end || word_at(chars, from_start) != "from" {
        return None;
    }
    let from_end = scan_word(chars, from_start);

    let source_start = skip_whitespace(chars, from_end);
    let quote = *chars.get(source_start)?;
    if !is_quote(quote) {
        return None;
    }
    let source_end = skip_non_code(chars, source_start)?;
    if source_end - source_start < 2 || chars[source_end - 1] != quote {
        return None;
    }

    Some(Match {
        found: Found::Module {
            name: chars[name_start..name_end].iter().collect(),
            source_start,
            source_end,
        },
        start,
        end: statement_end(chars, source_end),
    })
}

/// `export default;`
fn match_bare_default(chars: &[char], start: usize) -> Option<Match> {
    let keyword_end = scan_word(chars, start);
    let default_start = skip_whitespace(chars, keyword_end);
    if default_start == keyword_end || word_at(chars, default_start) != "default" {
        return None;
    }
    let semi = skip_whitespace(chars, scan_word(chars, default_start));
    if chars.get(semi) != Some(&';') {
        return None;
    }
    Some(Match {
        found: Found::BareDefault,
        start,
        end: semi + 1,
    })
}

/// Extend past a `;` on the same line, if there is one.
fn statement_end(chars: &[char], end: usize) -> usize {
    let mut i = end;
    while i < chars.len() && (chars[i] == ' ' || chars[i] == '\t') {
        i += 1;
    }
    if chars.get(i) == Some(&';') {
        i + 1
    } else {
        end
    }
}

fn to_node(chars: &[char], m: &Match) -> Node {
    let byte = |idx| char_offset_to_byte(chars, idx);
    let span = Span::new(byte(m.start), byte(m.end));
    match &m.found {
        Found::Module {
            name,
            source_start,
            source_end,
        } => Node::Module(ModuleDecl {
            span,
            name: name.clone(),
            source: Source {
                span: Span::new(byte(*source_start), byte(*source_end)),
                raw: chars[*source_start..*source_end].iter().collect(),
            },
        }),
        Found::BareDefault => Node::Export(ExportDecl {
            span,
            kind: ExportKind::DefaultBare {
                target: "default".to_string(),
            },
        }),
    }
}

/// Replace every character inside `spans` with spaces of the same byte
/// length, keeping line breaks.
fn blank(source: &str, spans: &[Span]) -> String {
    if spans.is_empty() {
        return source.to_string();
    }
    let mut out = String::with_capacity(source.len());
    for (offset, c) in source.char_indices() {
        let inside = spans.iter().any(|s| s.start <= offset && offset < s.end);
        if inside && c != '\n' && c != '\r' {
            out.extend(std::iter::repeat(' ').take(c.len_utf8()));
        } else {
            out.push(c);
        }
    }
    out
}
