//! First scanner pass: which tracked names each scope declares.
//!
//! Function-like scopes (program, function, arrow) hold `var` and function
//! declarations wherever they appear. Blocks, `catch` clauses, `for` heads,
//! `switch` bodies and classes hold their lexical bindings (`let`, `const`,
//! `class`, catch parameters). Only names the second pass asks about are
//! stored.

use oxc_ast::ast::{
    ArrowFunctionExpression, BindingIdentifier, BlockStatement, CatchClause, Class,
    ForInStatement, ForOfStatement, ForStatement, Function, Program, SwitchStatement,
    TSInterfaceDeclaration, TSType, TSTypeAliasDeclaration, VariableDeclarationKind,
    VariableDeclarator,
};
use oxc_ast_visit::{Visit, walk};
use oxc_span::Span;
use oxc_syntax::scope::ScopeFlags;
use std::collections::{HashMap, HashSet};

use crate::constants::is_watched_global;

pub(crate) const REQUIRE: &str = "require";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ScopeKind {
    Program,
    Function,
    Arrow,
    Block,
    Class,
}

impl ScopeKind {
    fn holds_var(self) -> bool {
        matches!(self, ScopeKind::Program | ScopeKind::Function | ScopeKind::Arrow)
    }
}

pub(crate) type ScopeId = (ScopeKind, Span);

pub(crate) fn is_tracked(name: &str) -> bool {
    name == REQUIRE || is_watched_global(name)
}

#[derive(Debug, Default)]
pub(crate) struct ScopeBindings {
    scopes: HashMap<ScopeId, HashSet<String>>,
}

impl ScopeBindings {
    pub(crate) fn collect(program: &Program) -> Self {
        let mut collector = BindingCollector {
            bindings: ScopeBindings::default(),
            stack: vec![(ScopeKind::Program, program.span)],
            hoisting: false,
        };
        walk::walk_program(&mut collector, program);
        collector.bindings
    }

    pub(crate) fn declares(&self, scope: &ScopeId, name: &str) -> bool {
        self.scopes.get(scope).is_some_and(|names| names.contains(name))
    }
}

struct BindingCollector {
    bindings: ScopeBindings,
    stack: Vec<ScopeId>,
    /// Set while visiting the names of a `var` declarator.
    hoisting: bool,
}

impl BindingCollector {
    fn declare(&mut self, name: &str) {
        if !is_tracked(name) {
            return;
        }
        let scope = if self.hoisting {
            self.stack.iter().rev().find(|(kind, _)| kind.holds_var())
        } else {
            self.stack.last()
        };
        if let Some(scope) = scope {
            self.bindings.scopes.entry(*scope).or_default().insert(name.to_string());
        }
    }

    fn declare_hoisted(&mut self, name: &str) {
        let hoisting = std::mem::replace(&mut self.hoisting, true);
        self.declare(name);
        self.hoisting = hoisting;
    }

    fn scoped(&mut self, scope: ScopeId, visit: impl FnOnce(&mut Self)) {
        let hoisting = std::mem::replace(&mut self.hoisting, false);
        self.stack.push(scope);
        visit(self);
        self.stack.pop();
        self.hoisting = hoisting;
    }
}

impl<'a> Visit<'a> for BindingCollector {
    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        self.declare(ident.name.as_str());
    }

    fn visit_variable_declarator(&mut self, declarator: &VariableDeclarator<'a>) {
        let hoisting = std::mem::replace(
            &mut self.hoisting,
            matches!(declarator.kind, VariableDeclarationKind::Var),
        );
        self.visit_binding_pattern(&declarator.id);
        self.hoisting = hoisting;
        if let Some(init) = &declarator.init {
            self.visit_expression(init);
        }
    }

    fn visit_function(&mut self, func: &Function<'a>, _flags: ScopeFlags) {
        // a declaration names the enclosing function scope, an expression only its own
        if func.is_declaration()
            && let Some(id) = &func.id
        {
            self.declare_hoisted(id.name.as_str());
        }
        self.scoped((ScopeKind::Function, func.span), |this| {
            if !func.is_declaration()
                && let Some(id) = &func.id
            {
                this.declare(id.name.as_str());
            }
            this.visit_formal_parameters(&func.params);
            if let Some(body) = &func.body {
                this.visit_function_body(body);
            }
        });
    }

    fn visit_arrow_function_expression(&mut self, arrow: &ArrowFunctionExpression<'a>) {
        self.scoped((ScopeKind::Arrow, arrow.span), |this| {
            this.visit_formal_parameters(&arrow.params);
            this.visit_function_body(&arrow.body);
        });
    }

    fn visit_class(&mut self, class: &Class<'a>) {
        if class.is_declaration()
            && let Some(id) = &class.id
        {
            self.declare(id.name.as_str());
        }
        // the class's own name is also bound inside its body
        self.scoped((ScopeKind::Class, class.span), |this| walk::walk_class(this, class));
    }

    fn visit_block_statement(&mut self, block: &BlockStatement<'a>) {
        self.scoped((ScopeKind::Block, block.span), |this| walk::walk_block_statement(this, block));
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause<'a>) {
        self.scoped((ScopeKind::Block, clause.span), |this| walk::walk_catch_clause(this, clause));
    }

    fn visit_for_statement(&mut self, stmt: &ForStatement<'a>) {
        self.scoped((ScopeKind::Block, stmt.span), |this| walk::walk_for_statement(this, stmt));
    }

    fn visit_for_in_statement(&mut self, stmt: &ForInStatement<'a>) {
        self.scoped((ScopeKind::Block, stmt.span), |this| walk::walk_for_in_statement(this, stmt));
    }

    fn visit_for_of_statement(&mut self, stmt: &ForOfStatement<'a>) {
        self.scoped((ScopeKind::Block, stmt.span), |this| walk::walk_for_of_statement(this, stmt));
    }

    fn visit_switch_statement(&mut self, stmt: &SwitchStatement<'a>) {
        self.scoped((ScopeKind::Block, stmt.span), |this| walk::walk_switch_statement(this, stmt));
    }

    // type-level names never shadow runtime values
    fn visit_ts_type(&mut self, _ty: &TSType<'a>) {}

    fn visit_ts_interface_declaration(&mut self, _decl: &TSInterfaceDeclaration<'a>) {}

    fn visit_ts_type_alias_declaration(&mut self, _decl: &TSTypeAliasDeclaration<'a>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn program_declares(source: &str, name: &str) -> bool {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::tsx()).parse();
        let bindings = ScopeBindings::collect(&ret.program);
        bindings.declares(&(ScopeKind::Program, ret.program.span), name)
    }

    #[test]
    fn test_top_level_declarations() {
        assert!(program_declares("const process = {};", "process"));
        assert!(program_declares("let Buffer;", "Buffer"));
        assert!(program_declares("import http from 'http';", "http"));
        assert!(program_declares("class process {}", "process"));
        assert!(program_declares("function require() {}", "require"));
    }

    #[test]
    fn test_hoisted_after_use() {
        assert!(program_declares("process.env;\nfunction process() {}", "process"));
    }

    #[test]
    fn test_nested_bindings_stay_nested() {
        assert!(!program_declares("function f(process) { return process; }", "process"));
        assert!(!program_declares("const f = (Buffer) => Buffer;", "Buffer"));
        assert!(!program_declares("const f = function process() {};", "process"));
    }

    #[test]
    fn test_lexical_bindings_stay_in_blocks() {
        assert!(!program_declares("if (a) { let process = 1; }", "process"));
        assert!(!program_declares("try {} catch (Buffer) {}", "Buffer"));
        assert!(!program_declares("for (const __dirname of xs) {}", "__dirname"));
        assert!(!program_declares("switch (a) { case 1: const http = 1; }", "http"));
        assert!(!program_declares("const C = class process {};", "process"));
    }

    #[test]
    fn test_var_and_functions_hoist_out_of_blocks() {
        assert!(program_declares("if (a) { var process = 1; }", "process"));
        assert!(program_declares("for (var Buffer of xs) {}", "Buffer"));
        assert!(program_declares("{ function require() {} }", "require"));
        assert!(!program_declares("const f = () => { if (a) { var process = 1; } };", "process"));
    }

    #[test]
    fn test_type_names_are_not_bindings() {
        assert!(!program_declares("interface Buffer { a: string }", "Buffer"));
        assert!(!program_declares("type process = string;", "process"));
    }

    #[test]
    fn test_untracked_names_are_dropped() {
        assert!(!program_declares("const window = {};", "window"));
    }
}
