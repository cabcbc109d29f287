use clap::Parser;

mod cli;
mod discovery;
mod exit_codes;
mod gitlab;

use cli::args::Cli;
use cli::commands::dispatch;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("fatal: {err:?}");
            exit_codes::EXIT_CONFIG_ERROR
        }
    };
    std::process::exit(code);
}
