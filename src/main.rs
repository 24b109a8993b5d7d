use colored::Colorize;
use std::process;

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    setup_logging();

    if let Err(e) = drake::cli::run().await {
        eprintln!("{} {}", "drake: error:".red().bold(), e);
        process::exit(1);
    }
}
