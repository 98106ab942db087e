use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "llmbench",
    version,
    about = "Benchmark suites for LLM tasks: examples, prompt templates, runs, scoring"
)]
pub struct Cli {
    /// SQLite database holding benchmarks and results
    #[arg(long, global = true, default_value = ".llmbench/bench.db")]
    pub db: PathBuf,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    Init(InitArgs),
    #[command(subcommand)]
    Benchmark(BenchmarkCmd),
    #[command(subcommand)]
    Example(ExampleCmd),
    #[command(subcommand)]
    Template(TemplateCmd),
    /// List the model identifiers the registry can dispatch to
    Models,
    Run(RunArgs),
    Retry(RetryArgs),
    Evaluate(EvaluateArgs),
    Pending(PendingArgs),
    Results(ResultsArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "benchmark.yaml")]
    pub config: PathBuf,

    /// also write a starter examples JSONL
    #[arg(long)]
    pub examples: bool,
}

#[derive(Subcommand, Clone)]
pub enum BenchmarkCmd {
    /// Create a benchmark from a YAML definition file
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    List,
    Show {
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand, Clone)]
pub enum ExampleCmd {
    /// Add a single example
    Add {
        #[arg(long)]
        benchmark: String,
        /// JSON object of input values
        #[arg(long)]
        inputs: String,
        /// JSON object of expected output values
        #[arg(long)]
        expected: String,
    },
    /// Bulk import examples from a JSONL file
    Import {
        #[arg(long)]
        benchmark: String,
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Clone)]
pub enum TemplateCmd {
    Create {
        #[arg(long)]
        benchmark: String,
        #[arg(long)]
        name: String,
        /// file holding the system template ("system" message for chat
        /// models, prompt prefix otherwise)
        #[arg(long)]
        system_file: PathBuf,
        /// file holding the optional input template ("user" message for chat
        /// models)
        #[arg(long)]
        input_file: Option<PathBuf>,
    },
    List {
        #[arg(long)]
        benchmark: String,
    },
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    #[arg(long)]
    pub benchmark: String,

    /// model identifier, e.g. openai/gpt-4 (see `llmbench models`)
    #[arg(long)]
    pub model: String,

    #[arg(long)]
    pub template: String,
}

#[derive(Parser, Clone)]
pub struct RetryArgs {
    /// example run to re-execute; its row is overwritten in place
    #[arg(long)]
    pub example_run: i64,
}

#[derive(Parser, Clone)]
pub struct EvaluateArgs {
    #[arg(long)]
    pub example_run: i64,

    /// rate the output as successful
    #[arg(long, conflicts_with = "fail")]
    pub pass: bool,

    /// rate the output as unsuccessful
    #[arg(long)]
    pub fail: bool,
}

#[derive(Parser, Clone)]
pub struct PendingArgs {
    /// benchmark run whose unevaluated rows should be listed
    #[arg(long)]
    pub benchmark_run: i64,
}

#[derive(Parser, Clone)]
pub struct ResultsArgs {
    #[arg(long)]
    pub benchmark_run: i64,
}
