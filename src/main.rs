//! mdpack CLI entrypoint.
//!
//! Packages collected market-data event files into portable archives, and
//! lists, validates, or imports existing packages.

use clap::Parser;
use mdpack::{Cli, exit_code, run};

fn main() {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let code = exit_code(&run_result, &mut stderr);
    if code != 0 {
        std::process::exit(code);
    }
}
