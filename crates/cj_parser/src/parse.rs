use anyhow::{anyhow, bail, Context, Result};
use cj_ast::{ModuleSyntax, Node};
use swc_common::{errors::Handler, sync::Lrc, FileName, SourceMap};
use swc_ecma_ast::EsVersion;
use swc_ecma_parser::{EsSyntax, Syntax, TsSyntax};
use tracing::debug;

use crate::lower::{attach, Lowerer};
use crate::preprocess;

/// Result of parsing a source file.
pub struct ParseResult {
    /// Root `Program` node; spans index into `source`.
    pub program: Node,
    /// The swc module the tree was lowered from.
    pub module: swc_ecma_ast::Module,
    /// The original, unmodified source.
    pub source: String,
    /// The text swc actually parsed, with legacy declarations blanked.
    pub preprocessed_source: String,
}

/// Parse an ECMAScript or TypeScript module into a cjsify tree.
///
/// 1. Preprocess: blank out the legacy forms enabled in `syntax`.
/// 2. Parse: feed the blanked text to the standard swc parser.
/// 3. Lower: build the tree and attach the preprocessed declarations.
pub fn parse_module(source: &str, filename: &str, syntax: &ModuleSyntax) -> Result<ParseResult> {
    let legacy = preprocess::preprocess(source, syntax);

    let source_map: Lrc<SourceMap> = Default::default();
    let source_file = source_map.new_source_file(
        Lrc::new(FileName::Custom(filename.to_string())),
        legacy.text.clone(),
    );

    let handler =
        Handler::with_emitter_writer(Box::new(std::io::stderr()), Some(source_map.clone()));

    let mut recovered = vec![];
    let module = swc_ecma_parser::parse_file_as_module(
        &source_file,
        syntax_for(filename),
        EsVersion::latest(),
        None,
        &mut recovered,
    )
    .map_err(|e| {
        e.into_diagnostic(&handler).emit();
        anyhow!("failed to parse {filename}")
    })?;

    if !recovered.is_empty() {
        let count = recovered.len();
        for e in recovered {
            e.into_diagnostic(&handler).emit();
        }
        bail!("failed to parse {filename}: {count} syntax error(s)");
    }

    let lowerer = Lowerer::new(source, source_file.start_pos);
    let mut program = lowerer
        .lower_program(&module)
        .with_context(|| format!("cannot rewrite {filename}"))?;
    debug!(
        filename,
        items = program.children.len(),
        legacy = legacy.nodes.len(),
        "lowered module"
    );
    for node in legacy.nodes {
        attach(&mut program, node);
    }

    Ok(ParseResult {
        program: Node::Syntax(program),
        module,
        source: source.to_string(),
        preprocessed_source: legacy.text,
    })
}

/// TypeScript for `.ts`-family files, ECMAScript (with JSX for `.jsx`)
/// otherwise.
fn syntax_for(filename: &str) -> Syntax {
    let is_ts = [".ts", ".tsx", ".mts", ".cts"]
        .iter()
        .any(|ext| filename.ends_with(ext));
    if is_ts {
        Syntax::Typescript(TsSyntax {
            tsx: filename.ends_with(".tsx"),
            decorators: true,
            ..Default::default()
        })
    } else {
        Syntax::Es(EsSyntax {
            jsx: filename.ends_with(".jsx"),
            decorators: true,
            decorators_before_export: true,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use cj_ast::{ExportKind, ImportKind, Span, Specifier, SyntaxKind};

    use super::*;

    fn parse(source: &str) -> Vec<Node> {
        let parsed = parse_module(source, "test.js", &ModuleSyntax::default()).unwrap();
        match parsed.program {
            Node::Syntax(program) => {
                assert_eq!(program.kind, SyntaxKind::Program);
                program.children
            }
            other => panic!("expected program, got {other:?}"),
        }
    }

    fn text(source: &str, span: Span) -> &str {
        &source[span.start..span.end]
    }

    #[test]
    fn import_kinds_are_classified() {
        let source = "import 'a';\nimport b from 'b';\nimport { c, d as e } from \"c\";\nimport f, { g } from 'f';";
        let items = parse(source);
        let kinds: Vec<ImportKind> = items
            .iter()
            .map(|item| match item {
                Node::Import(decl) => decl.kind,
                other => panic!("expected import, got {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ImportKind::Bare,
                ImportKind::Default,
                ImportKind::Named,
                ImportKind::Unrecognized
            ]
        );

        let Node::Import(named) = &items[2] else {
            unreachable!()
        };
        assert_eq!(
            named.specifiers,
            vec![Specifier::new("c"), Specifier::aliased("d", "e")]
        );
        assert_eq!(named.source.raw, "\"c\"");
        assert_eq!(text(source, named.span), "import { c, d as e } from \"c\";");
    }

    #[test]
    fn namespace_import_lowers_to_a_module_declaration() {
        let items = parse("import * as ns from 'ns';");
        match &items[0] {
            Node::Module(decl) => {
                assert_eq!(decl.name, "ns");
                assert_eq!(decl.source.raw, "'ns'");
            }
            other => panic!("expected module declaration, got {other:?}"),
        }
    }

    #[test]
    fn export_shapes_are_lowered() {
        let source = "export default 42;\nexport var x = 1;\nexport function f() {}\n\
                      export * from 'm';\nexport { a as b } from 'm';\nexport { x as y };";
        let items = parse(source);
        let shapes: Vec<&str> = items
            .iter()
            .map(|item| match item {
                Node::Export(decl) => match &decl.kind {
                    ExportKind::DefaultAssignment { .. } => "default",
                    ExportKind::Variable(_) => "variable",
                    ExportKind::Function { .. } => "function",
                    ExportKind::ReexportAll { .. } => "all",
                    ExportKind::ReexportNamed { .. } => "reexport",
                    ExportKind::Named { .. } => "named",
                    other => panic!("unexpected shape {other:?}"),
                },
                other => panic!("expected export, got {other:?}"),
            })
            .collect();
        assert_eq!(
            shapes,
            vec!["default", "variable", "function", "all", "reexport", "named"]
        );

        let Node::Export(default) = &items[0] else {
            unreachable!()
        };
        let ExportKind::DefaultAssignment { target, init } = &default.kind else {
            unreachable!()
        };
        assert_eq!(target, "default");
        assert_eq!(text(source, init.span()), "42");

        let Node::Export(function) = &items[2] else {
            unreachable!()
        };
        let ExportKind::Function { declaration, .. } = &function.kind else {
            unreachable!()
        };
        assert_eq!(text(source, declaration.span()), "function f() {}");
    }

    #[test]
    fn legacy_module_declaration_is_attached_inside_its_function() {
        let source = "function load() {\n  module fs from 'fs';\n  return fs;\n}\n";
        let parsed = parse_module(source, "legacy.js", &ModuleSyntax::default()).unwrap();
        assert_eq!(parsed.preprocessed_source.len(), source.len());

        let Node::Syntax(program) = &parsed.program else {
            unreachable!()
        };
        let statement = &program.children[0];
        let function = statement.children()[0];
        assert_eq!(function.type_name(), "Function");
        let nested = function.children();
        assert_eq!(nested.len(), 2);
        assert_eq!(text(source, nested[0].span()), "module fs from 'fs';");
        assert!(matches!(nested[0], Node::Module(_)));
    }

    #[test]
    fn unsupported_export_shape_is_an_error() {
        let err = parse_module("export * as ns from 'm';", "x.js", &ModuleSyntax::default())
            .err()
            .expect("namespace re-export should be rejected");
        assert!(format!("{err:#}").contains("export * as name"));
    }

    #[test]
    fn named_default_declarations_keep_their_binding() {
        let items = parse("export default function main() {}");
        let Node::Export(export) = &items[0] else {
            panic!("expected export, got {:?}", items[0]);
        };
        let ExportKind::Function { name, default, .. } = &export.kind else {
            panic!("expected function export, got {:?}", export.kind);
        };
        assert_eq!(name, "main");
        assert!(default);

        let items = parse("export default class {}");
        let Node::Export(export) = &items[0] else {
            panic!("expected export, got {:?}", items[0]);
        };
        assert!(matches!(export.kind, ExportKind::DefaultAssignment { .. }));
    }

    #[test]
    fn decorators_after_export_belong_to_the_class() {
        let source = "export @sealed class E {}";
        let items = parse(source);
        let Node::Export(export) = &items[0] else {
            panic!("expected export, got {:?}", items[0]);
        };
        let ExportKind::Class { declaration, .. } = &export.kind else {
            panic!("expected class export, got {:?}", export.kind);
        };
        assert_eq!(text(source, declaration.span()), "@sealed class E {}");
    }

    #[test]
    fn decorators_before_export_stay_outside_the_declaration() {
        let source = "@sealed\nexport class D {}";
        let items = parse(source);
        let Node::Export(export) = &items[0] else {
            panic!("expected export, got {:?}", items[0]);
        };
        assert_eq!(text(source, export.span), "export class D {}");
        let ExportKind::Class { declaration, .. } = &export.kind else {
            panic!("expected class export, got {:?}", export.kind);
        };
        assert_eq!(text(source, declaration.span()), "class D {}");
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(parse_module("import {", "broken.js", &ModuleSyntax::default()).is_err());
    }
}
