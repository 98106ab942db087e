mod cli;
mod templates;

use clap::Parser;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    init_logging();
    let args = cli::args::Cli::parse();
    let code = match cli::commands::dispatch(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            cli::commands::exit_codes::CONFIG_ERROR
        }
    };
    std::process::exit(code);
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
