use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Directory whose files get packed into the image
    #[arg(long, short)]
    pub source: PathBuf,

    /// Output image path
    #[arg(long, short = 'O')]
    pub out: PathBuf,
}
