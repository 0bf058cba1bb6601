//! `code-graph` binary entry point: parses the CLI, wires it to the
//! project root (the current directory), and maps errors to the exit codes
//! in §7 — 0 on success, 1 when the project is uninitialised or a required
//! argument is missing.

use clap::Parser;

use code_graph::cli::Cli;
use code_graph::error::GraphError;
use code_graph::observability;

fn main() {
    observability::init_logging();

    let cli = Cli::parse();
    let project_root = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("code-graph: failed to determine current directory: {e}");
            std::process::exit(1);
        }
    };

    if let Err(err) = code_graph::cli::run(cli, &project_root) {
        report(&err);
        std::process::exit(1);
    }
}

fn report(err: &GraphError) {
    eprintln!("code-graph: {err}");
}
