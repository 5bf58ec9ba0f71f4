use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = None,
)]
pub struct Args {
    /// Path to settings.
    #[clap(long)]
    pub settings: String,

    /// Path to output directory.
    #[clap(long, short, default_value = "out")]
    pub outdir: String,

    /// Path to log file.
    #[clap(long, default_value = "nabsim.log")]
    pub log_file: String,

    /// Disable the progress bar.
    #[clap(long)]
    pub disable_progress_bar: bool,

    /// Verbosity (-v for debug, -vv for trace).
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
