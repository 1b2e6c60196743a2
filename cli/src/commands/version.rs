//! Version command

/// Run the version command.
pub fn run() {
    println!("kubetest2-tf {}", env!("CARGO_PKG_VERSION"));
}
