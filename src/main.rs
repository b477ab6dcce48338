use clap::Parser;
use mtfcross::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
