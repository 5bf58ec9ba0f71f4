use clap::Parser;

use nabsim::args::Args;
use nabsim::runner::Runner;

fn main() {
    let args = Args::parse();
    let mut runner = Runner::new(args).unwrap_or_else(|err| {
        eprintln!("Unable to initialize simulation: {err}.");
        std::process::exit(1);
    });
    runner.start();
}
