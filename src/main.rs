use clap::Parser;

use depgraph::cli::{self, Cli};
use depgraph::util::output;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli::run(cli) {
        output::error(&format!("error: {err}"));
        std::process::exit(1);
    }
}
