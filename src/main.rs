use clap::Parser;
use slka_cli::transport::{self, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();

    // Initialize logging; stdout carries only the JSON envelope
    let filter = if cli.verbose {
        "slka_cli=debug"
    } else {
        "slka_cli=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let pretty = cli.pretty;
    let (envelope, code) = transport::run(cli);
    println!("{}", envelope.to_json(pretty));
    std::process::exit(code);
}
