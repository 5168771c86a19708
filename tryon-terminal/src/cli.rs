//! Command line for the terminal viewer

use std::path::PathBuf;

use clap::Parser;

/// Glasses try-on viewer in the terminal
#[derive(Parser, Debug)]
#[command(name = "tryon-terminal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Head mesh (OBJ); a cube stands in when omitted
    #[arg(long)]
    pub head: Option<PathBuf>,

    /// Pose record (JSON) for the head, enables the calibrated view
    #[arg(long, requires = "head")]
    pub pose: Option<PathBuf>,

    /// Glasses variant as NAME=PATH; repeatable
    #[arg(short, long = "glasses", value_parser = parse_glasses)]
    pub glasses: Vec<(String, PathBuf)>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub fn parse_glasses(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_owned(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got {arg:?}")),
    }
}
