use std::io::Write;

use pretty_assertions::assert_eq;

use flow::Program;
use flow::block::{Block, BlockKind};
use flow::parser::{MAX_NESTING, ParseErrorKind};
use flow::source::split_lines;
use flow::statement::VariableKind;
use interpreter::{
    DiagnosticError, Environment, RuntimeError, RuntimeValue, Variable, execute_block,
    execute_program,
};

fn run(source: &str) -> String {
    let parser = flow::parser::Parser::new(source.to_string(), 0);
    let program = parser.parse().expect("parse failed");
    let mut output = Vec::new();
    execute_program(&program, &mut output).expect("execution failed");
    String::from_utf8(output).unwrap()
}

fn run_lines(source: &str) -> Vec<String> {
    run(source).lines().map(|l| l.to_string()).collect()
}

/// Run a program that is expected to fail; returns the error and the
/// output written before the failure.
fn run_err(source: &str) -> (DiagnosticError, String) {
    let parser = flow::parser::Parser::new(source.to_string(), 0);
    let program = parser.parse().expect("parse failed");
    let mut output = Vec::new();
    let err = execute_program(&program, &mut output).expect_err("expected a runtime error");
    (err, String::from_utf8(output).unwrap())
}

fn globals(source: &str) -> Vec<Variable> {
    let mut sink = std::io::sink();
    interpreter::run_source(source, &mut sink).expect("execution failed")
}

#[test]
fn if_true_prints_once() {
    assert_eq!(run("if == 1 1\nprint \"hi\"\nend"), "hi\n");
}

#[test]
fn if_false_without_else_prints_nothing() {
    assert_eq!(run("if == 1 2\nprint \"hi\"\nend"), "");
}

#[test]
fn if_and_else_are_exclusive() {
    let src = "if {op} 1 1\nprint then\nend\nelse\nprint otherwise\nend";
    assert_eq!(run_lines(&src.replace("{op}", "==")), vec!["then"]);
    assert_eq!(run_lines(&src.replace("{op}", "!=")), vec!["otherwise"]);
}

#[test]
fn comparison_operators() {
    let check = |header: &str| run(&format!("{}\nprint yes\nend", header)) == "yes\n";
    assert!(check("if == 4 4"));
    assert!(check("if != 4 5"));
    assert!(check("if > 5 4"));
    assert!(check("if < -2 3"));
    assert!(!check("if > 4 4"));
    assert!(!check("if < 4 4"));
}

#[test]
fn while_runs_until_the_comparison_fails() {
    let src = "int x = 3\nint runs = 0\nwhile != x 0\nsub x 1\nadd runs 1\nend\nprint runs";
    assert_eq!(run(src), "3\n");
}

#[test]
fn while_initially_false_runs_zero_times() {
    assert_eq!(run("while == 1 2\nprint body\nend\nprint after"), "after\n");
}

#[test]
fn dowhile_runs_at_least_once() {
    assert_eq!(run("dowhile == 1 2\nprint body\nend"), "body\n");
}

#[test]
fn dowhile_checks_after_each_pass() {
    let src = "int n = 0\ndowhile < n 3\nadd n 1\nprint n\nend";
    assert_eq!(run_lines(src), vec!["1", "2", "3"]);
}

#[test]
fn nested_if_is_reevaluated_every_iteration() {
    let src = "\
int i = 0
while < i 4
    add i 1
    if == i 2
        print two
    end
    else
        print i
    end
end";
    assert_eq!(run_lines(src), vec!["1", "two", "3", "4"]);
}

#[test]
fn ancestor_variable_wins_over_local_of_same_name() {
    // Lookup searches from the root down before the current block's locals.
    let src = "int x = 1\nif == 1 1\nint x = 2\nprint x\nend";
    assert_eq!(run(src), "1\n");
}

#[test]
fn local_variable_is_visible_when_no_ancestor_declares_it() {
    let src = "if == 1 1\nint y = 5\nprint y\nend";
    assert_eq!(run(src), "5\n");
}

#[test]
fn block_locals_are_dropped_on_exit() {
    let src = "if == 1 1\nint y = 5\nend\nprint y";
    assert_eq!(run(src), "y\n");
    let names: Vec<String> = globals(src).into_iter().map(|v| v.name).collect();
    assert!(names.is_empty());
}

#[test]
fn assignment_updates_the_resolved_variable() {
    let src = "int x = 1\nif == 1 1\nset x = 9\nend\nprint x";
    assert_eq!(run(src), "9\n");
}

#[test]
fn globals_are_returned() {
    let vars = globals("int a = 2\nstring b = two words\nmul a 21");
    assert_eq!(
        vars,
        vec![
            Variable {
                name: "a".into(),
                kind: VariableKind::Integer,
                value: RuntimeValue::Integer(42),
            },
            Variable {
                name: "b".into(),
                kind: VariableKind::String,
                value: RuntimeValue::String("two words".into()),
            },
        ]
    );
}

#[test]
fn redeclaring_replaces_in_place() {
    let vars = globals("int a = 1\nstring a = one");
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0].value, RuntimeValue::String("one".into()));
}

#[test]
fn interpolation_joins_and_trims() {
    let src = "string name = Ada\nint n = 3\nprint \"  hello\" name n \"times  \"";
    assert_eq!(run(src), "hello Ada 3 times\n");
}

#[test]
fn quoted_tokens_are_never_variables() {
    assert_eq!(run("string x = value\nprint \"x\" x"), "x value\n");
}

#[test]
fn variables_compare_numerically() {
    let src = "string n = 10\nif > n 9\nprint ok\nend";
    assert_eq!(run(src), "ok\n");
}

#[test]
fn non_numeric_operand_keeps_earlier_output() {
    let (err, output) = run_err("print first\nif == word 1\nprint never\nend");
    assert_eq!(output, "first\n");
    assert!(matches!(
        err.error,
        RuntimeError::NonNumericOperand { ref value, .. } if value == "word"
    ));
    assert_eq!(err.span, Some(12..24));
}

#[test]
fn undeclared_variable() {
    let (err, _) = run_err("add counter 1");
    assert!(matches!(err.error, RuntimeError::UndeclaredVariable(ref n) if n == "counter"));
}

#[test]
fn unsupported_statement() {
    let (err, _) = run_err("print ok\nbeep");
    assert!(matches!(err.error, RuntimeError::UnsupportedStatement(ref k) if k == "beep"));
    assert_eq!(err.span, Some(9..13));
}

#[test]
fn unsupported_statement_in_a_branch_not_taken_is_ignored() {
    assert_eq!(run("if == 1 2\nbeep\nend\nprint fine"), "fine\n");
}

#[test]
fn malformed_statement() {
    let (err, _) = run_err("int x 4");
    assert!(matches!(err.error, RuntimeError::MalformedStatement(_)));
}

#[test]
fn arithmetic_errors() {
    let (err, _) = run_err("int x = 1\ndiv x 0");
    assert!(matches!(err.error, RuntimeError::DivisionByZero));

    let (err, _) = run_err("int x = 9223372036854775807\nadd x 1");
    assert!(matches!(err.error, RuntimeError::IntegerOverflow(_)));

    let (err, _) = run_err("string s = abc\nadd s 1");
    assert!(matches!(err.error, RuntimeError::TypeError { .. }));

    let (err, _) = run_err("int x = 1\nset x = lots");
    assert!(matches!(err.error, RuntimeError::NonNumericOperand { .. }));
}

#[test]
fn error_inside_loop_stops_the_loop() {
    let src = "int i = 0\nwhile < i 5\nadd i 1\nprint i\nif == i 2\nboom\nend\nend";
    let (err, output) = run_err(src);
    assert_eq!(output, "1\n2\n");
    assert!(matches!(err.error, RuntimeError::UnsupportedStatement(_)));
}

#[test]
fn scope_chain_resolution_order() {
    let mut env = Environment::new();
    let root = env.push_scope(None, "program");
    let middle = env.push_scope(Some(root), "while");
    let inner = env.push_scope(Some(middle), "if");

    env.declare(inner, "v", VariableKind::Integer, RuntimeValue::Integer(3));
    env.declare(middle, "v", VariableKind::Integer, RuntimeValue::Integer(2));
    assert_eq!(env.block_tree(inner), vec![root, middle, inner]);
    assert_eq!(env.lookup(inner, "v").unwrap().value, RuntimeValue::Integer(2));

    env.declare(root, "v", VariableKind::Integer, RuntimeValue::Integer(1));
    assert_eq!(env.lookup(inner, "v").unwrap().value, RuntimeValue::Integer(1));
    assert_eq!(env.lookup(middle, "v").unwrap().value, RuntimeValue::Integer(1));

    assert!(env.has_local(inner, "v"));
    assert!(!env.has_local(inner, "w"));
    assert!(matches!(
        env.lookup(inner, "w"),
        Err(RuntimeError::UndeclaredVariable(_))
    ));

    env.lookup_mut(inner, "v").unwrap().value = RuntimeValue::Integer(10);
    assert_eq!(env.lookup(root, "v").unwrap().value, RuntimeValue::Integer(10));
}

fn nested_ifs(depth: usize) -> String {
    format!(
        "{}print deep\n{}",
        "if == 1 1\n".repeat(depth),
        "end\n".repeat(depth)
    )
}

/// Wrap raw lines in a program without going through the parser.
fn unparsed(source: &str) -> Program {
    Program {
        root: Block::program(split_lines(source), 0),
        warnings: Vec::new(),
        source_id: 0,
    }
}

#[test]
fn deeply_nested_source_is_a_parse_error() {
    let mut output = Vec::new();
    let err = interpreter::run_source(&nested_ifs(2000), &mut output)
        .expect_err("expected a nesting error");
    assert!(matches!(
        err.error,
        RuntimeError::Structure(ref e) if e.kind == ParseErrorKind::NestingTooDeep
    ));
    assert!(output.is_empty());
}

#[test]
fn executor_stops_nesting_at_the_scope_limit() {
    let program = unparsed(&nested_ifs(MAX_NESTING + 10));
    let mut output = Vec::new();
    let err = execute_program(&program, &mut output).expect_err("expected a stack overflow");
    assert!(matches!(err.error, RuntimeError::StackOverflow));
    assert!(err.span.is_some());
    assert!(output.is_empty());
}

#[test]
fn statement_block_without_text_is_an_error() {
    let block = Block {
        kind: BlockKind::Line,
        header: None,
        body: Vec::new(),
        file_id: 0,
    };
    let mut env = Environment::new();
    let root = env.push_scope(None, "program");
    let err = execute_block(&block, root, &mut env, &mut std::io::sink())
        .expect_err("expected an error");
    assert!(matches!(err.error, RuntimeError::MalformedStatement(_)));
}

#[test]
fn output_errors_are_reported() {
    struct Broken;
    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let program = flow::parser::Parser::new("print x".to_string(), 0)
        .parse()
        .expect("parse failed");
    let err = execute_program(&program, &mut Broken).expect_err("expected an I/O error");
    assert!(matches!(err.error, RuntimeError::IoError(_)));
}

#[test]
fn program_from_file() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("countdown.flow");
    std::fs::write(&path, "int n = 2\nwhile > n 0\n  print n\n  sub n 1\nend\n")
        .expect("failed to write program");

    let source = std::fs::read_to_string(&path).expect("failed to read program");
    assert_eq!(run(&source), "2\n1\n");
}
