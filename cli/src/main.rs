mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use flow::block::{Block, BlockKind};
use flow::parser::ParseError;
use interpreter::DiagnosticError;

const SUBCOMMANDS: &[&str] = &["run", "test", "help"];

#[derive(Parser)]
#[command(name = "flow", version, about = "Flow script interpreter")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a Flow program
    Run(RunArgs),

    /// Run .test.flow test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Flow source file to execute
    file: String,

    /// Parse only, don't execute (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Print the block tree
    #[arg(long)]
    ast: bool,

    /// Print top-level variables after the program finishes
    #[arg(long)]
    vars: bool,

    /// Suppress program output (just check for errors)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.flow file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    init_tracing();

    // `flow file.flow` works like `flow run file.flow`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args
        .iter()
        .skip(1)
        .position(|a| !a.starts_with('-'))
        .map(|p| p + 1)
    {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "run".to_string());
        }
    }

    let cli = Cli::parse_from(&args);

    match cli.command {
        Command::Run(run_args) => do_run(run_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG`. Nothing is installed when it is unset.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn do_run(args: RunArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let parser = flow::parser::Parser::new(source, file_id);
    let program = match parser.parse() {
        Ok(p) => p,
        Err(errors) => {
            emit_parse_errors(&writer, &config, &files, &errors);
            process::exit(1);
        }
    };
    emit_parse_errors(&writer, &config, &files, &program.warnings);

    if args.check {
        eprintln!("ok: {} parsed successfully", args.file);
        return;
    }

    if args.ast {
        match print_tree(&program.root, 0) {
            Ok(()) => return,
            Err(error) => {
                emit_parse_errors(&writer, &config, &files, &[error]);
                process::exit(1);
            }
        }
    }

    let result = if args.quiet {
        let mut sink = std::io::sink();
        interpreter::execute_program(&program, &mut sink)
    } else {
        let mut stdout = std::io::stdout();
        interpreter::execute_program(&program, &mut stdout)
    };

    match result {
        Ok(globals) => {
            if args.vars {
                for var in &globals {
                    println!("{} {} = {}", var.kind, var.name, var.value);
                }
            }
        }
        Err(error) => {
            emit_diagnostic_error(&writer, &config, &files, &error);
            process::exit(1);
        }
    }
}

/// Print the block tree, one node per line, children indented.
fn print_tree(block: &Block, indent: usize) -> Result<(), ParseError> {
    let pad = "  ".repeat(indent);
    match (&block.kind, &block.header) {
        (BlockKind::Program, _) => println!("{}program", pad),
        (_, Some(header)) => println!("{}{:>4}: {}", pad, header.number, header.text),
        (kind, None) => println!("{}{}", pad, kind.name()),
    }

    for child in block.children()? {
        print_tree(&child, indent + 1)?;
        if let BlockKind::If {
            otherwise: Some(otherwise),
            ..
        } = &child.kind
        {
            print_tree(otherwise, indent + 1)?;
        }
    }
    Ok(())
}

fn emit_parse_errors(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    errors: &[ParseError],
) {
    for error in errors {
        let diagnostic = error.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
    }
}

fn emit_diagnostic_error(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    error: &DiagnosticError,
) {
    if let Some(span) = &error.span {
        let diagnostic = Diagnostic::new(Severity::Error)
            .with_message(error.to_string())
            .with_labels(vec![Label::primary(error.source_id, span.clone())]);
        let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
    } else {
        eprintln!("runtime error: {}", error);
    }
}
