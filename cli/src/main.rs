//! kubetest2-tf - provision Kubernetes clusters with terraform and ansible

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kubetest2_tf::cli::Cli;
use kubetest2_tf::output::stderr_ansi;

// Single-threaded: `up` exports KUBECONFIG into the process environment.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, stderr_ansi(cli.no_color));
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool, ansi: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .init();
}
