use clap::Parser;
use keibalog::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
