use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::{GetSpan, SourceType};
use oxc_syntax::scope::ScopeFlags;
use std::{fs, path::Path};

use crate::constants::{BROWSER_ESSENTIALS, DIRNAME_GLOBAL, FILENAME_GLOBAL, is_watched_global};
use crate::error::{Error, Result};
use crate::scope::{REQUIRE, ScopeBindings, ScopeId, ScopeKind};
use crate::types::{
    BrowserEssential, DependencyReport, ImportKind, ImportRecord, WorkerKind, WorkerRecord,
};

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub source_type: SourceType,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { source_type: SourceType::tsx() }
    }
}

/// Scans source text for the modules, workers and runtime globals it depends on.
///
/// Fails only on `import(<non-literal>)` or on source the parser cannot recover from.
pub fn scan(source: &str, options: &ScanOptions) -> Result<DependencyReport> {
    scan_source(source, options.source_type, Path::new("<input>"))
}

pub fn scan_file(path: &Path) -> Result<DependencyReport> {
    trace!("Scanning file: {}", path.display());
    let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    scan_source(&source, source_type_for(path), path)
}

fn scan_source(source: &str, source_type: SourceType, path: &Path) -> Result<DependencyReport> {
    let allocator = Allocator::default();
    let ParserReturn { program, errors, panicked, .. } =
        OxcParser::new(&allocator, source, source_type).parse();

    if panicked {
        let message =
            errors.first().map_or_else(|| "unrecoverable syntax".to_string(), |e| e.to_string());
        return Err(Error::Parse { path: path.to_path_buf(), message });
    }
    if !errors.is_empty() {
        debug!("{} recoverable syntax errors in {}", errors.len(), path.display());
    }

    let bindings = ScopeBindings::collect(&program);
    let mut collector = DependencyCollector {
        source,
        bindings: &bindings,
        chain: vec![(ScopeKind::Program, program.span)],
        report: DependencyReport::default(),
        error: None,
    };
    walk::walk_program(&mut collector, &program);

    if let Some(error) = collector.error {
        return Err(error);
    }
    let report = collector.report;
    debug!(
        "Found {} imports and {} workers in {}",
        report.imports.len(),
        report.workers.len(),
        path.display()
    );
    Ok(report)
}

/// Second pass: records dependencies and tests watched names against the bindings.
struct DependencyCollector<'s> {
    source: &'s str,
    bindings: &'s ScopeBindings,
    chain: Vec<ScopeId>,
    report: DependencyReport,
    error: Option<Error>,
}

impl DependencyCollector<'_> {
    fn is_free(&self, name: &str) -> bool {
        !self.chain.iter().any(|scope| self.bindings.declares(scope, name))
    }

    /// Mirrors the scopes the binding pass opened so lookups see the same chain.
    fn within(&mut self, scope: ScopeId, visit: impl FnOnce(&mut Self)) {
        self.chain.push(scope);
        visit(self);
        self.chain.pop();
    }

    fn push_import(&mut self, kind: ImportKind, statement: &str) {
        trace!("Found {:?} import: '{}'", kind, statement);
        self.report.imports.push(ImportRecord { kind, statement: statement.to_string() });
    }

    fn record_global(&mut self, name: &str) {
        if name == FILENAME_GLOBAL {
            self.report.flags.references_file_name = true;
            return;
        }
        if name == DIRNAME_GLOBAL {
            self.report.flags.references_dir_name = true;
            return;
        }
        let Some((variable, module_name, exposed_as)) =
            BROWSER_ESSENTIALS.iter().find(|(variable, _, _)| *variable == name)
        else {
            return;
        };
        let essentials = self.report.flags.browser_essentials.get_or_insert_with(Vec::new);
        if essentials.iter().any(|e| e.variable == *variable) {
            return;
        }
        trace!("Free use of runtime global '{}'", variable);
        essentials.push(BrowserEssential {
            module_name: module_name.to_string(),
            variable: variable.to_string(),
            exposed_as: exposed_as.map(str::to_string),
        });
    }
}

/// String literals and template literals without substitutions.
fn literal_value<'b>(expr: &'b Expression) -> Option<&'b str> {
    match expr {
        Expression::StringLiteral(sl) => Some(sl.value.as_str()),
        Expression::TemplateLiteral(tl) if tl.expressions.is_empty() && tl.quasis.len() == 1 => {
            tl.quasis[0].value.cooked.as_ref().map(|cooked| cooked.as_str())
        }
        _ => None,
    }
}

fn first_literal_argument<'b>(arguments: &'b [Argument]) -> Option<&'b str> {
    arguments.first().and_then(Argument::as_expression).and_then(literal_value)
}

impl<'a> Visit<'a> for DependencyCollector<'_> {
    fn visit_function(&mut self, func: &Function<'a>, flags: ScopeFlags) {
        self.within((ScopeKind::Function, func.span), |this| walk::walk_function(this, func, flags));
    }

    fn visit_arrow_function_expression(&mut self, arrow: &ArrowFunctionExpression<'a>) {
        self.within((ScopeKind::Arrow, arrow.span), |this| {
            walk::walk_arrow_function_expression(this, arrow)
        });
    }

    fn visit_class(&mut self, class: &Class<'a>) {
        self.within((ScopeKind::Class, class.span), |this| walk::walk_class(this, class));
    }

    fn visit_block_statement(&mut self, block: &BlockStatement<'a>) {
        self.within((ScopeKind::Block, block.span), |this| walk::walk_block_statement(this, block));
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause<'a>) {
        self.within((ScopeKind::Block, clause.span), |this| walk::walk_catch_clause(this, clause));
    }

    fn visit_for_statement(&mut self, stmt: &ForStatement<'a>) {
        self.within((ScopeKind::Block, stmt.span), |this| walk::walk_for_statement(this, stmt));
    }

    fn visit_for_in_statement(&mut self, stmt: &ForInStatement<'a>) {
        self.within((ScopeKind::Block, stmt.span), |this| walk::walk_for_in_statement(this, stmt));
    }

    fn visit_for_of_statement(&mut self, stmt: &ForOfStatement<'a>) {
        self.within((ScopeKind::Block, stmt.span), |this| walk::walk_for_of_statement(this, stmt));
    }

    fn visit_switch_statement(&mut self, stmt: &SwitchStatement<'a>) {
        self.within((ScopeKind::Block, stmt.span), |this| walk::walk_switch_statement(this, stmt));
    }

    fn visit_module_declaration(&mut self, decl: &ModuleDeclaration<'a>) {
        self.report.flags.es6_syntax = true;
        walk::walk_module_declaration(self, decl);
    }

    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        if decl.import_kind.is_type() {
            trace!("Skipping type-only import of '{}'", decl.source.value);
        } else {
            self.push_import(ImportKind::Es6, decl.source.value.as_str());
        }
        walk::walk_import_declaration(self, decl);
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &decl.source
            && !decl.export_kind.is_type()
        {
            self.push_import(ImportKind::Es6, source.value.as_str());
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        if !decl.export_kind.is_type() {
            self.push_import(ImportKind::Es6, decl.source.value.as_str());
        }
        walk::walk_export_all_declaration(self, decl);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        self.report.flags.es6_syntax = true;
        self.report.flags.dynamic_imports = true;
        match literal_value(&expr.source) {
            Some(statement) => self.push_import(ImportKind::Dynamic, statement),
            None => {
                if self.error.is_none() {
                    let span = expr.source.span();
                    let expression = self
                        .source
                        .get(span.start as usize..span.end as usize)
                        .unwrap_or_default()
                        .to_string();
                    self.error =
                        Some(Error::NonLiteralDynamicImport { expression, offset: expr.span.start });
                }
            }
        }
        walk::walk_import_expression(self, expr);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &call.callee
            && callee.name.as_str() == REQUIRE
            && self.is_free(REQUIRE)
            && let Some(statement) = first_literal_argument(&call.arguments)
        {
            self.push_import(ImportKind::Require, statement);
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_new_expression(&mut self, expr: &NewExpression<'a>) {
        if let Expression::Identifier(callee) = &expr.callee {
            let kind = match callee.name.as_str() {
                "Worker" => Some(WorkerKind::Worker),
                "SharedWorker" => Some(WorkerKind::SharedWorker),
                _ => None,
            };
            if let Some(kind) = kind
                && let Some(path) = first_literal_argument(&expr.arguments)
            {
                trace!("Found {:?}: '{}'", kind, path);
                self.report.workers.push(WorkerRecord { path: path.to_string(), kind });
            }
        }
        walk::walk_new_expression(self, expr);
    }

    fn visit_jsx_element(&mut self, element: &JSXElement<'a>) {
        self.report.flags.contains_jsx = true;
        walk::walk_jsx_element(self, element);
    }

    fn visit_jsx_fragment(&mut self, fragment: &JSXFragment<'a>) {
        self.report.flags.contains_jsx = true;
        walk::walk_jsx_fragment(self, fragment);
    }

    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        let name = ident.name.as_str();
        if is_watched_global(name) && self.is_free(name) {
            self.record_global(name);
        }
    }

    fn visit_ts_type(&mut self, _ty: &TSType<'a>) {}
}

fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    let mut st = SourceType::default()
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx") | Some("js")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts")));

    // .cjs/.cts stay scripts, everything else may carry module syntax
    if !matches!(ext, Some("cjs") | Some("cts")) {
        st = st.with_module(true);
    }

    st
}
