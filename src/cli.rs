use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "medcoder",
    version,
    about = "Deterministic medical coding analysis tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Analyze(AnalyzeArgs),
    Rules(RulesArgs),
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(long, conflicts_with = "input_path")]
    pub text: Option<String>,

    #[arg(long)]
    pub input_path: Option<PathBuf>,

    #[arg(long, default_value_t = 8)]
    pub max_cpt_codes: usize,

    #[arg(long, default_value_t = 8)]
    pub max_icd10_codes: usize,

    #[arg(long, default_value_t = 6)]
    pub max_hcpcs_codes: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    #[arg(long)]
    pub output_path: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Args, Debug, Clone)]
pub struct RulesArgs {
    #[arg(long, value_enum)]
    pub category: Option<CategoryFilter>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CategoryFilter {
    Cpt,
    Icd10,
    Hcpcs,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(long = "code")]
    pub codes: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
