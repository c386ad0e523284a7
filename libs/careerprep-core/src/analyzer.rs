/// Static Analyzer - Syntax Check and Structural Heuristics
///
/// **Core Responsibility:**
/// Parse a submitted Python program and describe its shape before anything runs.
///
/// **Produces:**
/// - Syntax verdict with a 1-based line/column on failure
/// - Loop count and nesting, recursion, `bfs`/`dfs` calls
/// - A complexity label and substring-based style warnings
///
/// **Parse Verdict:**
/// The grammar is CPython's, including the checks CPython makes while building
/// the tree (assignment and deletion targets). A token pre-scan applies the
/// tokenizer limits first: 200 nested brackets, 100 indentation levels, and an
/// upper bound on syntax-tree depth. Nothing deeper ever reaches the parser, so
/// every later walk has bounded depth.
///
/// **Complexity Policy (advisory only):**
/// - 2 or more loops anywhere: quadratic-or-worse
/// - exactly 1 loop: linearithmic-ish
/// - no loops: linear-or-better
///
/// Recursion cost and repeated linear scans are not accounted for. The label is
/// a nudge for the learner, not a bound.

use careerprep_common::types::{
    ComplexityEstimate, DetectedPattern, StaticAnalysisResult, SyntaxFailure,
};
use rustpython_parser::ast::{self, Constant, Expr, Ranged, Stmt};
use rustpython_parser::{lexer, Mode, Parse, Tok};

pub const FIX_SYNTAX_WARNING: &str = "fix syntax errors first";
pub const NO_OUTPUT_WARNING: &str = "reads input but may never print output";
pub const INFINITE_LOOP_WARNING: &str = "possible infinite loop, verify termination condition";

pub const TOO_MANY_PARENS: &str = "too many nested parentheses";
pub const TOO_MANY_INDENTS: &str = "too many levels of indentation";
pub const TOO_DEEPLY_NESTED: &str = "too many nested expressions or blocks";

/// CPython tokenizer limit on open brackets
pub const MAX_PAREN_DEPTH: usize = 200;
/// CPython tokenizer limit on indentation levels
pub const MAX_INDENT_LEVELS: usize = 100;
/// Upper bound on estimated syntax-tree depth
pub const MAX_NESTING_DEPTH: usize = 1000;

/// The parser and the tree walks run on their own thread with this stack
const ANALYZER_STACK_BYTES: usize = 16 * 1024 * 1024;

const INPUT_MARKERS: &[&str] = &["input(", "sys.stdin"];
const OUTPUT_MARKERS: &[&str] = &["print(", "sys.stdout.write"];
const INFINITE_LOOP_MARKERS: &[&str] = &["while true", "while 1:"];
const SEARCH_FUNCTION_NAMES: &[&str] = &["bfs", "dfs"];
const LEGACY_STATEMENTS: &[&str] = &["print", "exec"];

/// Accumulated facts from one walk over the syntax tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSummary {
    pub total_loops: usize,
    pub max_loop_depth: usize,
    pub patterns: Vec<DetectedPattern>,
}

impl TreeSummary {
    fn add_pattern(&mut self, pattern: DetectedPattern) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }

    fn add_loop(&mut self, depth: usize) {
        self.total_loops += 1;
        self.max_loop_depth = self.max_loop_depth.max(depth);
        if depth >= 2 {
            self.add_pattern(DetectedPattern::NestedLoop);
        }
    }
}

/// Analyze a submission. Never fails: parser problems become a syntax failure.
pub fn analyze(source: &str) -> StaticAnalysisResult {
    let span = tracing::Span::current();
    std::thread::scope(|scope| {
        let worker = std::thread::Builder::new()
            .name("careerprep-analyzer".to_string())
            .stack_size(ANALYZER_STACK_BYTES)
            .spawn_scoped(scope, || span.in_scope(|| analyze_in_place(source)));

        match worker {
            Ok(handle) => handle.join().unwrap_or_else(|_| {
                tracing::error!("Analyzer thread panicked");
                syntax_failure(SyntaxFailure {
                    message: "analysis failed".to_string(),
                    line: 1,
                    column: 1,
                })
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Could not start analyzer thread, analyzing inline");
                analyze_in_place(source)
            }
        }
    })
}

fn analyze_in_place(source: &str) -> StaticAnalysisResult {
    let summary = match check_nesting_limits(source) {
        Some(failure) => Err(failure),
        None => parse_and_summarize(source),
    };

    let summary = match summary {
        Ok(summary) => summary,
        Err(failure) => {
            tracing::debug!(line = failure.line, column = failure.column, "Submission failed to parse");
            return syntax_failure(failure);
        }
    };

    let complexity = ComplexityEstimate::from_loop_count(summary.total_loops);
    tracing::debug!(
        total_loops = summary.total_loops,
        max_loop_depth = summary.max_loop_depth,
        patterns = summary.patterns.len(),
        complexity = %complexity,
        "Static analysis complete"
    );

    StaticAnalysisResult {
        parse_ok: true,
        syntax_error: None,
        complexity,
        patterns: summary.patterns,
        warnings: style_warnings(source),
    }
}

fn syntax_failure(failure: SyntaxFailure) -> StaticAnalysisResult {
    StaticAnalysisResult {
        parse_ok: false,
        syntax_error: Some(failure),
        complexity: ComplexityEstimate::NotApplicable,
        patterns: Vec::new(),
        warnings: vec![FIX_SYNTAX_WARNING.to_string()],
    }
}

fn parse_and_summarize(source: &str) -> Result<TreeSummary, SyntaxFailure> {
    let suite = ast::Suite::parse(source, "<submission>").map_err(|e| {
        let offset = usize::from(e.offset);
        let (line, _) = position_of(source, offset);
        let message = legacy_statement_message(source, line).unwrap_or_else(|| e.error.to_string());
        failure_at(source, offset, message)
    })?;
    summarize(&suite, source)
}

/// 1-based line and character column of a byte offset
fn position_of(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let prefix = &source[..offset];
    let line_start = prefix.rfind('\n').map_or(0, |idx| idx + 1);
    let line = prefix.matches('\n').count() + 1;
    (line, prefix[line_start..].chars().count() + 1)
}

fn failure_at(source: &str, offset: usize, message: impl Into<String>) -> SyntaxFailure {
    let (line, column) = position_of(source, offset);
    SyntaxFailure {
        message: message.into(),
        line,
        column,
    }
}

/// Python 2 `print x` / `exec code` on the failing line
fn legacy_statement_message(source: &str, line: usize) -> Option<String> {
    let text = source.lines().nth(line.checked_sub(1)?)?.trim_start();
    LEGACY_STATEMENTS.iter().find_map(|keyword| {
        let rest = text.strip_prefix(keyword)?;
        let argument = rest.trim_start().chars().next()?;
        let separated = rest.starts_with([' ', '\t']);
        let looks_like_operand =
            argument.is_alphanumeric() || matches!(argument, '_' | '"' | '\'');
        (separated && looks_like_operand).then(|| {
            format!(
                "Missing parentheses in call to '{}'. Did you mean {}(...)?",
                keyword, keyword
            )
        })
    })
}

#[derive(Debug, Default)]
struct BracketLevel {
    /// Estimated depth of everything outside this bracket
    base: usize,
    /// Depth of the current comma-separated item
    current: usize,
    /// Deepest finished item
    widest: usize,
}

impl BracketLevel {
    fn finish_item(&mut self) {
        self.widest = self.widest.max(self.current);
        self.current = 0;
    }
}

/// Token pass bounding bracket depth, indentation and tree depth
///
/// Every operator-like token may add one level to the expression it sits in;
/// commas, colons and statement ends start a new item. `elif` chains nest in
/// the tree, so each one counts toward the enclosing block depth. Lexical
/// errors end the scan and are left for the parser to report.
fn check_nesting_limits(source: &str) -> Option<SyntaxFailure> {
    let mut brackets = vec![BracketLevel::default()];
    let mut elif_runs: Vec<usize> = vec![0];
    let mut block_depth = 0usize;
    let mut at_statement_start = true;

    for item in lexer::lex(source, Mode::Module) {
        let Ok((tok, range)) = item else {
            break;
        };
        let offset = usize::from(range.start());
        let starts_statement = std::mem::replace(&mut at_statement_start, false);

        if starts_statement && !matches!(tok, Tok::Elif | Tok::Else | Tok::Indent | Tok::Dedent | Tok::Newline) {
            if let Some(run) = elif_runs.last_mut() {
                block_depth -= *run;
                *run = 0;
            }
        }

        match tok {
            Tok::Lpar | Tok::Lsqb | Tok::Lbrace => {
                if brackets.len() > MAX_PAREN_DEPTH {
                    return Some(failure_at(source, offset, TOO_MANY_PARENS));
                }
                let base = brackets.last().map_or(0, |top| top.base + top.current + 1);
                brackets.push(BracketLevel {
                    base,
                    ..BracketLevel::default()
                });
            }
            Tok::Rpar | Tok::Rsqb | Tok::Rbrace => {
                if brackets.len() > 1 {
                    if let Some(mut closed) = brackets.pop() {
                        closed.finish_item();
                        if let Some(top) = brackets.last_mut() {
                            top.current += closed.widest + 1;
                        }
                    }
                }
            }
            Tok::Comma | Tok::Colon | Tok::Semi => {
                if let Some(top) = brackets.last_mut() {
                    top.finish_item();
                }
            }
            Tok::Newline => {
                brackets.truncate(1);
                brackets[0] = BracketLevel::default();
                at_statement_start = true;
            }
            Tok::Indent => {
                if elif_runs.len() > MAX_INDENT_LEVELS {
                    return Some(failure_at(source, offset, TOO_MANY_INDENTS));
                }
                elif_runs.push(0);
                block_depth += 1;
                at_statement_start = true;
            }
            Tok::Dedent => {
                if elif_runs.len() > 1 {
                    if let Some(run) = elif_runs.pop() {
                        block_depth -= run + 1;
                    }
                }
                at_statement_start = true;
            }
            Tok::Elif if starts_statement => {
                if let Some(run) = elif_runs.last_mut() {
                    *run += 1;
                    block_depth += 1;
                }
            }
            Tok::Else if starts_statement => {}
            Tok::Name { .. } | Tok::Int { .. } | Tok::Float { .. } | Tok::Complex { .. } => {}
            Tok::String { .. } => {
                let text = source
                    .get(usize::from(range.start())..usize::from(range.end()))
                    .unwrap_or_default();
                let (field_brackets, field_operators) = fstring_field_nesting(text);
                if brackets.len() - 1 + field_brackets > MAX_PAREN_DEPTH {
                    return Some(failure_at(source, offset, TOO_MANY_PARENS));
                }
                if let Some(top) = brackets.last_mut() {
                    top.current += field_brackets + field_operators;
                }
            }
            _ => {
                if let Some(top) = brackets.last_mut() {
                    top.current += 1;
                }
            }
        }

        let estimate = block_depth + brackets.last().map_or(0, |top| top.base + top.current);
        if estimate > MAX_NESTING_DEPTH {
            return Some(failure_at(source, offset, TOO_DEEPLY_NESTED));
        }
    }

    None
}

/// Deepest bracket nesting and operator count inside f-string replacement fields
fn fstring_field_nesting(literal: &str) -> (usize, usize) {
    let prefix: String = literal
        .chars()
        .take_while(|ch| *ch != '"' && *ch != '\'')
        .collect();
    if !prefix.chars().any(|ch| ch == 'f' || ch == 'F') {
        return (0, 0);
    }

    let mut field_depth = 0usize;
    let mut deepest = 0usize;
    let mut operators = 0usize;
    let mut chars = literal[prefix.len()..].chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' if field_depth == 0 && chars.peek() == Some(&'{') => {
                chars.next();
            }
            '{' | '(' | '[' if field_depth > 0 || ch == '{' => {
                field_depth += 1;
                deepest = deepest.max(field_depth);
            }
            '}' | ')' | ']' if field_depth > 0 => field_depth -= 1,
            '+' | '-' | '*' | '/' | '%' | '@' | '&' | '|' | '^' | '~' | '<' | '>' | '=' | '!' | '.'
                if field_depth > 0 =>
            {
                operators += 1
            }
            _ => {}
        }
    }
    (deepest, operators)
}

#[derive(Debug, Clone, Copy, Default)]
struct Scope<'a> {
    loop_depth: usize,
    /// Innermost named function whose body contains the node
    function: Option<&'a str>,
}

impl<'a> Scope<'a> {
    fn inside_loop(self) -> Self {
        Scope {
            loop_depth: self.loop_depth + 1,
            ..self
        }
    }

    fn inside_function(self, name: &'a str) -> Self {
        Scope {
            function: Some(name),
            ..self
        }
    }
}

enum Visit<'a> {
    Stmt(&'a Stmt, Scope<'a>),
    Expr(&'a Expr, Scope<'a>),
}

/// Collects a node's children in source order
struct Children<'a> {
    visits: Vec<Visit<'a>>,
}

impl<'a> Children<'a> {
    fn new() -> Self {
        Self { visits: Vec::new() }
    }

    fn stmts(&mut self, stmts: &'a [Stmt], scope: Scope<'a>) {
        self.visits.extend(stmts.iter().map(|s| Visit::Stmt(s, scope)));
    }

    fn expr(&mut self, expr: &'a Expr, scope: Scope<'a>) {
        self.visits.push(Visit::Expr(expr, scope));
    }

    fn exprs(&mut self, exprs: &'a [Expr], scope: Scope<'a>) {
        self.visits.extend(exprs.iter().map(|e| Visit::Expr(e, scope)));
    }

    fn maybe(&mut self, expr: Option<&'a Expr>, scope: Scope<'a>) {
        if let Some(expr) = expr {
            self.expr(expr, scope);
        }
    }

    /// Queue so the first child is popped first
    fn schedule(self, pending: &mut Vec<Visit<'a>>) {
        pending.extend(self.visits.into_iter().rev());
    }
}

/// Pre-order walk with an explicit stack
fn summarize(suite: &[Stmt], source: &str) -> Result<TreeSummary, SyntaxFailure> {
    let mut summary = TreeSummary::default();
    let mut root = Children::new();
    root.stmts(suite, Scope::default());
    let mut pending = Vec::new();
    root.schedule(&mut pending);

    while let Some(visit) = pending.pop() {
        let children = match visit {
            Visit::Stmt(stmt, scope) => visit_stmt(stmt, scope, source, &mut summary)?,
            Visit::Expr(expr, scope) => visit_expr(expr, scope, source, &mut summary)?,
        };
        children.schedule(&mut pending);
    }

    Ok(summary)
}

fn visit_stmt<'a>(
    stmt: &'a Stmt,
    scope: Scope<'a>,
    source: &str,
    summary: &mut TreeSummary,
) -> Result<Children<'a>, SyntaxFailure> {
    let mut children = Children::new();

    match stmt {
        Stmt::FunctionDef(ast::StmtFunctionDef { name, body, decorator_list, .. }) => {
            children.exprs(decorator_list, scope);
            children.stmts(body, scope.inside_function(name.as_str()));
        }
        Stmt::AsyncFunctionDef(ast::StmtAsyncFunctionDef { name, body, decorator_list, .. }) => {
            children.exprs(decorator_list, scope);
            children.stmts(body, scope.inside_function(name.as_str()));
        }
        Stmt::ClassDef(ast::StmtClassDef { bases, keywords, body, decorator_list, .. }) => {
            children.exprs(decorator_list, scope);
            children.exprs(bases, scope);
            for keyword in keywords {
                children.expr(&keyword.value, scope);
            }
            children.stmts(body, scope);
        }
        Stmt::Return(ast::StmtReturn { value, .. }) => children.maybe(value.as_deref(), scope),
        Stmt::Delete(ast::StmtDelete { targets, .. }) => {
            for target in targets {
                check_target(target, TargetUse::Delete, source)?;
            }
            children.exprs(targets, scope);
        }
        Stmt::Assign(ast::StmtAssign { targets, value, .. }) => {
            for target in targets {
                check_target(target, TargetUse::Store, source)?;
            }
            children.exprs(targets, scope);
            children.expr(value, scope);
        }
        Stmt::AugAssign(ast::StmtAugAssign { target, value, .. }) => {
            check_augmented_target(target, source)?;
            children.expr(target, scope);
            children.expr(value, scope);
        }
        Stmt::AnnAssign(ast::StmtAnnAssign { target, annotation, value, .. }) => {
            check_annotated_target(target, source)?;
            children.expr(target, scope);
            children.expr(annotation, scope);
            children.maybe(value.as_deref(), scope);
        }
        Stmt::For(ast::StmtFor { target, iter, body, orelse, .. }) => {
            check_target(target, TargetUse::Store, source)?;
            summary.add_loop(scope.loop_depth + 1);
            let inner = scope.inside_loop();
            children.expr(target, inner);
            children.expr(iter, inner);
            children.stmts(body, inner);
            children.stmts(orelse, inner);
        }
        Stmt::AsyncFor(ast::StmtAsyncFor { target, iter, body, orelse, .. }) => {
            check_target(target, TargetUse::Store, source)?;
            summary.add_loop(scope.loop_depth + 1);
            let inner = scope.inside_loop();
            children.expr(target, inner);
            children.expr(iter, inner);
            children.stmts(body, inner);
            children.stmts(orelse, inner);
        }
        Stmt::While(ast::StmtWhile { test, body, orelse, .. }) => {
            summary.add_loop(scope.loop_depth + 1);
            let inner = scope.inside_loop();
            children.expr(test, inner);
            children.stmts(body, inner);
            children.stmts(orelse, inner);
        }
        Stmt::If(ast::StmtIf { test, body, orelse, .. }) => {
            children.expr(test, scope);
            children.stmts(body, scope);
            children.stmts(orelse, scope);
        }
        Stmt::With(ast::StmtWith { items, body, .. }) => {
            for item in items {
                children.expr(&item.context_expr, scope);
                if let Some(vars) = item.optional_vars.as_deref() {
                    check_target(vars, TargetUse::Store, source)?;
                    children.expr(vars, scope);
                }
            }
            children.stmts(body, scope);
        }
        Stmt::AsyncWith(ast::StmtAsyncWith { items, body, .. }) => {
            for item in items {
                children.expr(&item.context_expr, scope);
                if let Some(vars) = item.optional_vars.as_deref() {
                    check_target(vars, TargetUse::Store, source)?;
                    children.expr(vars, scope);
                }
            }
            children.stmts(body, scope);
        }
        Stmt::Match(ast::StmtMatch { subject, cases, .. }) => {
            children.expr(subject, scope);
            for case in cases {
                children.maybe(case.guard.as_deref(), scope);
                children.stmts(&case.body, scope);
            }
        }
        Stmt::Raise(ast::StmtRaise { exc, cause, .. }) => {
            children.maybe(exc.as_deref(), scope);
            children.maybe(cause.as_deref(), scope);
        }
        Stmt::Try(ast::StmtTry { body, handlers, orelse, finalbody, .. }) => {
            children.stmts(body, scope);
            for ast::ExceptHandler::ExceptHandler(handler) in handlers {
                children.maybe(handler.type_.as_deref(), scope);
                children.stmts(&handler.body, scope);
            }
            children.stmts(orelse, scope);
            children.stmts(finalbody, scope);
        }
        Stmt::TryStar(ast::StmtTryStar { body, handlers, orelse, finalbody, .. }) => {
            children.stmts(body, scope);
            for ast::ExceptHandler::ExceptHandler(handler) in handlers {
                children.maybe(handler.type_.as_deref(), scope);
                children.stmts(&handler.body, scope);
            }
            children.stmts(orelse, scope);
            children.stmts(finalbody, scope);
        }
        Stmt::Assert(ast::StmtAssert { test, msg, .. }) => {
            children.expr(test, scope);
            children.maybe(msg.as_deref(), scope);
        }
        Stmt::Expr(ast::StmtExpr { value, .. }) => children.expr(value, scope),
        // imports, pass, break, continue, global, nonlocal
        _ => {}
    }

    Ok(children)
}

fn visit_expr<'a>(
    expr: &'a Expr,
    scope: Scope<'a>,
    source: &str,
    summary: &mut TreeSummary,
) -> Result<Children<'a>, SyntaxFailure> {
    let mut children = Children::new();

    match expr {
        Expr::Call(ast::ExprCall { func, args, keywords, .. }) => {
            if let Expr::Name(ast::ExprName { id, .. }) = func.as_ref() {
                record_call(id.as_str(), scope, summary);
            }
            children.expr(func, scope);
            children.exprs(args, scope);
            for keyword in keywords {
                children.expr(&keyword.value, scope);
            }
        }
        Expr::BoolOp(ast::ExprBoolOp { values, .. }) => children.exprs(values, scope),
        Expr::NamedExpr(ast::ExprNamedExpr { target, value, .. }) => {
            children.expr(target, scope);
            children.expr(value, scope);
        }
        Expr::BinOp(ast::ExprBinOp { left, right, .. }) => {
            children.expr(left, scope);
            children.expr(right, scope);
        }
        Expr::UnaryOp(ast::ExprUnaryOp { operand, .. }) => children.expr(operand, scope),
        Expr::Lambda(ast::ExprLambda { body, .. }) => children.expr(body, scope),
        Expr::IfExp(ast::ExprIfExp { test, body, orelse, .. }) => {
            children.expr(body, scope);
            children.expr(test, scope);
            children.expr(orelse, scope);
        }
        Expr::Dict(ast::ExprDict { keys, values, .. }) => {
            for (key, value) in keys.iter().zip(values) {
                children.maybe(key.as_ref(), scope);
                children.expr(value, scope);
            }
        }
        Expr::Set(ast::ExprSet { elts, .. }) => children.exprs(elts, scope),
        Expr::ListComp(ast::ExprListComp { elt, generators, .. }) => {
            children.expr(elt, scope);
            comprehension_children(generators, scope, source, &mut children)?;
        }
        Expr::SetComp(ast::ExprSetComp { elt, generators, .. }) => {
            children.expr(elt, scope);
            comprehension_children(generators, scope, source, &mut children)?;
        }
        Expr::GeneratorExp(ast::ExprGeneratorExp { elt, generators, .. }) => {
            children.expr(elt, scope);
            comprehension_children(generators, scope, source, &mut children)?;
        }
        Expr::DictComp(ast::ExprDictComp { key, value, generators, .. }) => {
            children.expr(key, scope);
            children.expr(value, scope);
            comprehension_children(generators, scope, source, &mut children)?;
        }
        Expr::Await(ast::ExprAwait { value, .. }) => children.expr(value, scope),
        Expr::Yield(ast::ExprYield { value, .. }) => children.maybe(value.as_deref(), scope),
        Expr::YieldFrom(ast::ExprYieldFrom { value, .. }) => children.expr(value, scope),
        Expr::Compare(ast::ExprCompare { left, comparators, .. }) => {
            children.expr(left, scope);
            children.exprs(comparators, scope);
        }
        Expr::FormattedValue(ast::ExprFormattedValue { value, format_spec, .. }) => {
            children.expr(value, scope);
            children.maybe(format_spec.as_deref(), scope);
        }
        Expr::JoinedStr(ast::ExprJoinedStr { values, .. }) => children.exprs(values, scope),
        Expr::Attribute(ast::ExprAttribute { value, .. }) => children.expr(value, scope),
        Expr::Subscript(ast::ExprSubscript { value, slice, .. }) => {
            children.expr(value, scope);
            children.expr(slice, scope);
        }
        Expr::Starred(ast::ExprStarred { value, .. }) => children.expr(value, scope),
        Expr::List(ast::ExprList { elts, .. }) => children.exprs(elts, scope),
        Expr::Tuple(ast::ExprTuple { elts, .. }) => children.exprs(elts, scope),
        Expr::Slice(ast::ExprSlice { lower, upper, step, .. }) => {
            children.maybe(lower.as_deref(), scope);
            children.maybe(upper.as_deref(), scope);
            children.maybe(step.as_deref(), scope);
        }
        // names and constants are leaves
        _ => {}
    }

    Ok(children)
}

fn comprehension_children<'a>(
    generators: &'a [ast::Comprehension],
    scope: Scope<'a>,
    source: &str,
    children: &mut Children<'a>,
) -> Result<(), SyntaxFailure> {
    for generator in generators {
        check_target(&generator.target, TargetUse::Store, source)?;
        children.expr(&generator.target, scope);
        children.expr(&generator.iter, scope);
        children.exprs(&generator.ifs, scope);
    }
    Ok(())
}

/// Patterns contributed by a call whose callee is a bare name
fn record_call(callee: &str, scope: Scope<'_>, summary: &mut TreeSummary) {
    let lowered = callee.to_lowercase();
    if SEARCH_FUNCTION_NAMES.contains(&lowered.as_str()) {
        summary.add_pattern(DetectedPattern::NamedSearchCall {
            name: callee.to_string(),
        });
    }
    if scope.function == Some(callee) {
        summary.add_pattern(DetectedPattern::Recursion);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetUse {
    Store,
    Delete,
}

/// Name, attribute, subscript, or a tuple/list of them (starred only when storing)
fn check_target(target: &Expr, usage: TargetUse, source: &str) -> Result<(), SyntaxFailure> {
    let mut pending = vec![target];
    while let Some(expr) = pending.pop() {
        match expr {
            Expr::Name(_) | Expr::Attribute(_) | Expr::Subscript(_) => {}
            Expr::Tuple(ast::ExprTuple { elts, .. }) | Expr::List(ast::ExprList { elts, .. }) => {
                pending.extend(elts.iter());
            }
            Expr::Starred(ast::ExprStarred { value, .. }) if usage == TargetUse::Store => {
                pending.push(value);
            }
            other => {
                let message = match usage {
                    TargetUse::Store => format!("cannot assign to {}", describe(other)),
                    TargetUse::Delete => format!("cannot delete {}", describe(other)),
                };
                return Err(failure_at(source, usize::from(other.range().start()), message));
            }
        }
    }
    Ok(())
}

fn check_augmented_target(target: &Expr, source: &str) -> Result<(), SyntaxFailure> {
    match target {
        Expr::Name(_) | Expr::Attribute(_) | Expr::Subscript(_) => Ok(()),
        other => Err(failure_at(
            source,
            usize::from(other.range().start()),
            format!("'{}' is an illegal expression for augmented assignment", describe(other)),
        )),
    }
}

fn check_annotated_target(target: &Expr, source: &str) -> Result<(), SyntaxFailure> {
    let message = match target {
        Expr::Name(_) | Expr::Attribute(_) | Expr::Subscript(_) => return Ok(()),
        Expr::Tuple(_) | Expr::List(_) => {
            format!("only single target (not {}) can be annotated", describe(target))
        }
        _ => "illegal target for annotation".to_string(),
    };
    Err(failure_at(source, usize::from(target.range().start()), message))
}

/// Expression kind as CPython names it in syntax errors
fn describe(expr: &Expr) -> &'static str {
    match expr {
        Expr::Attribute(_) => "attribute",
        Expr::Subscript(_) => "subscript",
        Expr::Starred(_) => "starred",
        Expr::Name(_) => "name",
        Expr::List(_) => "list",
        Expr::Tuple(_) => "tuple",
        Expr::Lambda(_) => "lambda",
        Expr::Call(_) => "function call",
        Expr::BoolOp(_) | Expr::BinOp(_) | Expr::UnaryOp(_) => "expression",
        Expr::GeneratorExp(_) => "generator expression",
        Expr::Yield(_) | Expr::YieldFrom(_) => "yield expression",
        Expr::Await(_) => "await expression",
        Expr::ListComp(_) => "list comprehension",
        Expr::SetComp(_) => "set comprehension",
        Expr::DictComp(_) => "dict comprehension",
        Expr::Dict(_) => "dict literal",
        Expr::Set(_) => "set display",
        Expr::JoinedStr(_) | Expr::FormattedValue(_) => "f-string expression",
        Expr::Compare(_) => "comparison",
        Expr::IfExp(_) => "conditional expression",
        Expr::NamedExpr(_) => "named expression",
        Expr::Constant(ast::ExprConstant { value, .. }) => match value {
            Constant::None => "None",
            Constant::Bool(true) => "True",
            Constant::Bool(false) => "False",
            Constant::Ellipsis => "ellipsis",
            _ => "literal",
        },
        _ => "expression",
    }
}

/// Substring heuristics over the lowercased source, independent of the tree
fn style_warnings(source: &str) -> Vec<String> {
    let lowered = source.to_lowercase();
    let contains_any = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

    let mut warnings = Vec::new();
    if contains_any(INPUT_MARKERS) && !contains_any(OUTPUT_MARKERS) {
        warnings.push(NO_OUTPUT_WARNING.to_string());
    }
    if contains_any(INFINITE_LOOP_MARKERS) {
        warnings.push(INFINITE_LOOP_WARNING.to_string());
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(source: &str) -> SyntaxFailure {
        let result = analyze(source);
        assert!(!result.parse_ok, "expected a syntax failure for {:?}", source);
        assert_eq!(result.complexity, ComplexityEstimate::NotApplicable);
        assert_eq!(result.warnings, vec![FIX_SYNTAX_WARNING.to_string()]);
        result.syntax_error.expect("syntax error expected")
    }

    fn single_expr(source: &str) -> Expr {
        ast::Expr::parse(source, "<test>").unwrap()
    }

    #[test]
    fn test_simple_sum_has_no_patterns() {
        let result = analyze("print(sum(map(int,input().split())))");

        assert!(result.parse_ok);
        assert!(result.syntax_error.is_none());
        assert!(result.patterns.is_empty());
        assert_eq!(result.complexity, ComplexityEstimate::LinearOrBetter);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_nested_loops() {
        let source = "\
n = 3
grid = [[0] * n for _ in range(n)]
for i in range(n):
    for j in range(n):
        grid[i][j] = i * j
print(grid)
";
        let result = analyze(source);

        assert!(result.parse_ok);
        assert_eq!(result.patterns, vec![DetectedPattern::NestedLoop]);
        assert_eq!(result.complexity, ComplexityEstimate::QuadraticOrWorse);
    }

    #[test]
    fn test_single_loop_is_linearithmic() {
        let result = analyze("for x in range(10):\n    print(x)\n");
        assert_eq!(result.complexity, ComplexityEstimate::LinearithmicIsh);
        assert!(result.patterns.is_empty());
    }

    #[test]
    fn test_sequential_loops_are_quadratic_without_nesting() {
        let source = "for a in range(3):\n    print(a)\nwhile False:\n    pass\n";
        let result = analyze(source);
        assert_eq!(result.complexity, ComplexityEstimate::QuadraticOrWorse);
        assert!(!result.patterns.contains(&DetectedPattern::NestedLoop));
    }

    #[test]
    fn test_loop_inside_else_of_loop_is_nested() {
        let source = "for a in range(3):\n    pass\nelse:\n    while False:\n        pass\n";
        let result = analyze(source);
        assert!(result.patterns.contains(&DetectedPattern::NestedLoop));
    }

    #[test]
    fn test_comprehensions_are_not_loops() {
        let result = analyze("print([x * x for x in range(5)])");
        assert_eq!(result.complexity, ComplexityEstimate::LinearOrBetter);
    }

    #[test]
    fn test_recursion_detected() {
        let source = "\
def fact(n):
    if n <= 1:
        return 1
    return n * fact(n - 1)
print(fact(5))
";
        let result = analyze(source);
        assert_eq!(result.patterns, vec![DetectedPattern::Recursion]);
    }

    #[test]
    fn test_call_from_other_function_is_not_recursion() {
        let source = "\
def helper(x):
    return x + 1
def main():
    return helper(1)
print(main())
";
        let result = analyze(source);
        assert!(result.patterns.is_empty());
    }

    #[test]
    fn test_inner_function_scope_wins() {
        let source = "\
def outer():
    def inner():
        return outer()
    return inner()
";
        let result = analyze(source);
        assert!(!result.patterns.contains(&DetectedPattern::Recursion));
    }

    #[test]
    fn test_named_search_call_keeps_name() {
        let source = "\
def BFS(start):
    return [start]
print(BFS(0))
";
        let result = analyze(source);
        assert_eq!(
            result.patterns,
            vec![DetectedPattern::NamedSearchCall { name: "BFS".to_string() }]
        );
    }

    #[test]
    fn test_recursive_dfs_reports_both_patterns_in_order() {
        let source = "\
def dfs(v, seen):
    seen.add(v)
    for w in graph[v]:
        if w not in seen:
            dfs(w, seen)
";
        let result = analyze(source);
        assert_eq!(
            result.patterns,
            vec![
                DetectedPattern::NamedSearchCall { name: "dfs".to_string() },
                DetectedPattern::Recursion,
            ]
        );
        assert_eq!(result.complexity, ComplexityEstimate::LinearithmicIsh);
    }

    #[test]
    fn test_method_calls_ignored_for_search_names() {
        let result = analyze("graph.bfs(0)\n");
        assert!(result.patterns.is_empty());
    }

    #[test]
    fn test_syntax_error_location() {
        let failure = failure("x = 1\ndef broken(:\n    pass\n");
        assert_eq!(failure.line, 2);
        assert!(failure.column >= 1);
    }

    #[test]
    fn test_missing_paren_is_reported() {
        failure("print(1\n");
    }

    #[test]
    fn test_bad_dedent_is_an_indentation_error() {
        let failure = failure("if True:\n        x = 1\n    y = 2\nprint(1)\n");
        assert_eq!(failure.line, 3);
        assert!(failure.message.contains("indent"), "message: {}", failure.message);
    }

    #[test]
    fn test_unexpected_indent() {
        let failure = failure("x = 1\n    y = 2\n");
        assert_eq!(failure.line, 2);
    }

    #[test]
    fn test_python2_print_rejected() {
        let failure = failure("print \"hello\"\n");
        assert_eq!(failure.line, 1);
        assert!(failure.message.contains("Missing parentheses in call to 'print'"));
    }

    #[test]
    fn test_python2_and_invalid_constructs_rejected() {
        let invalid = [
            "del 1\n",
            "print(x=1, 2)\n",
            "try:\n    pass\nexcept Exception, e:\n    pass\n",
            "x = 0777\n",
            "x = `1`\n",
            "(a, b) += 1\n",
            "1 = x\n",
            "f() = 3\n",
            "for 1 in range(3):\n    pass\n",
            "exec \"code\"\n",
            "def f(:\n    pass\n",
            "x = [1, 2\n",
        ];
        for source in invalid {
            let result = analyze(source);
            assert!(!result.parse_ok, "accepted invalid source {:?}", source);
            assert!(result.syntax_error.is_some());
        }
    }

    #[test]
    fn test_valid_python3_constructs_accepted() {
        let valid = [
            "a, *rest = [1, 2, 3]\n",
            "x = {'k': 1}\nx['k'] += 1\n",
            "del x[0], y.attr\n",
            "print(*args, sep='')\n",
            "with open('f') as handle:\n    handle.read()\n",
            "total: int = 0\n",
            "print(x := 5)\n",
            "async def main():\n    async for item in source():\n        await item\n",
        ];
        for source in valid {
            let result = analyze(source);
            assert!(result.parse_ok, "rejected {:?}: {:?}", source, result.syntax_error);
        }
    }

    #[test]
    fn test_target_messages_follow_cpython_wording() {
        let literal = single_expr("1");
        let err = check_target(&literal, TargetUse::Delete, "1").unwrap_err();
        assert_eq!(err.message, "cannot delete literal");

        let call = single_expr("f()");
        let err = check_target(&call, TargetUse::Store, "f()").unwrap_err();
        assert_eq!(err.message, "cannot assign to function call");

        let tuple = single_expr("(a, b)");
        let err = check_augmented_target(&tuple, "(a, b)").unwrap_err();
        assert_eq!(err.message, "'tuple' is an illegal expression for augmented assignment");

        let none = single_expr("None");
        let err = check_target(&none, TargetUse::Store, "None").unwrap_err();
        assert_eq!(err.message, "cannot assign to None");

        let nested = single_expr("(a, [b, *c])");
        assert!(check_target(&nested, TargetUse::Store, "(a, [b, *c])").is_ok());
        assert!(check_target(&nested, TargetUse::Delete, "(a, [b, *c])").is_err());
    }

    #[test]
    fn test_deep_parentheses_fail_without_crashing() {
        let source = format!("x = {}1{}", "(".repeat(20_000), ")".repeat(20_000));
        let failure = failure(&source);

        assert_eq!(failure.message, TOO_MANY_PARENS);
        assert_eq!(failure.line, 1);
        // "x = " plus 200 accepted brackets, then the offending one
        assert_eq!(failure.column, 205);
    }

    #[test]
    fn test_parentheses_at_the_limit_parse() {
        let source = format!("x = {}1{}\n", "(".repeat(MAX_PAREN_DEPTH), ")".repeat(MAX_PAREN_DEPTH));
        assert!(analyze(&source).parse_ok);
    }

    #[test]
    fn test_deep_parentheses_inside_fstring() {
        let source = format!("x = f\"{{{}1{}}}\"\n", "(".repeat(300), ")".repeat(300));
        assert_eq!(failure(&source).message, TOO_MANY_PARENS);
    }

    #[test]
    fn test_long_unary_chain_fails_without_crashing() {
        let source = format!("x = {}1\n", "-".repeat(100_000));
        assert_eq!(failure(&source).message, TOO_DEEPLY_NESTED);
    }

    #[test]
    fn test_long_operator_chain_fails_without_crashing() {
        let source = format!("x = 1{}\n", " + 1".repeat(50_000));
        assert_eq!(failure(&source).message, TOO_DEEPLY_NESTED);
    }

    #[test]
    fn test_long_elif_chain_fails_without_crashing() {
        let mut source = String::from("x = 0\nif x == 0:\n    pass\n");
        for n in 1..5_000 {
            source.push_str(&format!("elif x == {}:\n    pass\n", n));
        }
        assert_eq!(failure(&source).message, TOO_DEEPLY_NESTED);
    }

    #[test]
    fn test_separate_if_statements_do_not_accumulate() {
        let source: String = (0..2_000)
            .map(|n| format!("if x == {n}:\n    pass\nelif x < {n}:\n    pass\n"))
            .collect();
        let source = format!("x = 1\n{}", source);
        assert!(analyze(&source).parse_ok);
    }

    #[test]
    fn test_too_many_indentation_levels() {
        let mut source = String::new();
        for level in 0..150 {
            source.push_str(&"    ".repeat(level));
            source.push_str("if True:\n");
        }
        source.push_str(&"    ".repeat(150));
        source.push_str("pass\n");

        assert_eq!(failure(&source).message, TOO_MANY_INDENTS);
    }

    #[test]
    fn test_moderate_indentation_parses() {
        let mut source = String::new();
        for level in 0..20 {
            source.push_str(&"    ".repeat(level));
            source.push_str("if True:\n");
        }
        source.push_str(&"    ".repeat(20));
        source.push_str("pass\n");
        assert!(analyze(&source).parse_ok);
    }

    #[test]
    fn test_large_flat_literal_parses() {
        let items = vec!["-1"; 50_000].join(", ");
        let source = format!("xs = [{}]\nprint(len(xs))\n", items);
        assert!(analyze(&source).parse_ok);
    }

    #[test]
    fn test_input_without_print_warning() {
        let result = analyze("x = input()\ny = int(x) * 2\n");
        assert_eq!(result.warnings, vec![NO_OUTPUT_WARNING.to_string()]);
    }

    #[test]
    fn test_infinite_loop_warning() {
        let result = analyze("while True:\n    pass\n");
        assert!(result.parse_ok);
        assert!(result.warnings.contains(&INFINITE_LOOP_WARNING.to_string()));
        assert_eq!(result.complexity, ComplexityEstimate::LinearithmicIsh);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let source = "def dfs(n):\n    for i in range(n):\n        for j in range(i):\n            dfs(j)\n";
        assert_eq!(analyze(source), analyze(source));
    }

    #[test]
    fn test_empty_source_parses() {
        let result = analyze("");
        assert!(result.parse_ok);
        assert_eq!(result.complexity, ComplexityEstimate::LinearOrBetter);
    }

    #[test]
    fn test_position_counts_characters() {
        let source = "x = 1\ns = '가나'\n";
        // byte 17 is the closing quote, after two 3-byte syllables on line 2
        assert_eq!(position_of(source, 17), (2, 8));
        assert_eq!(position_of(source, 0), (1, 1));
        // inside a multi-byte character rounds down to its start
        assert_eq!(position_of(source, 12), (2, 6));
    }
}
