//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "go-stack-profile",
    version,
    about = "Break a Go goroutine profile down into stack bytes per frame",
    after_help = "\
EXAMPLES:
    go-stack-profile ./server                           List max SP delta per function
    go-stack-profile ./server goroutine.pprof > s.pprof Rewrite a goroutine profile
    go tool pprof -sample_index=goroutine_space s.pprof View the result"
)]
pub struct Args {
    /// Go executable the profile was captured from (ELF or Mach-O)
    #[arg(value_name = "BINARY")]
    pub binary: PathBuf,

    /// Goroutine profile to rewrite; without it, functions are listed
    #[arg(value_name = "PROFILE")]
    pub profile: Option<PathBuf>,

    /// Write the rewritten profile to FILE instead of stdout
    #[arg(short, long, value_name = "FILE", requires = "profile")]
    pub output: Option<PathBuf>,
}
