/// Ensure `.build/assets/` exists so `include_dir!()` never panics.
///
/// Real terraform modules and playbooks are staged by the release build;
/// this script only creates placeholder resources when they are missing
/// (CI lint / test, local dev).
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    let assets: PathBuf = [env!("CARGO_MANIFEST_DIR"), "..", ".build", "assets"]
        .iter()
        .collect();

    for (resource, file, content) in [
        ("powervs", "main.tf", "# placeholder powervs module\n"),
        ("vpc", "main.tf", "# placeholder vpc module\n"),
        (
            "k8s-ansible",
            "install-k8s.yml",
            "# placeholder playbook\n- hosts: all\n  tasks: []\n",
        ),
    ] {
        let dir = assets.join(resource);
        if !dir.is_dir() {
            create_stub(&dir, file, content);
        }
    }

    println!("cargo::rerun-if-changed=../.build/assets");
}

fn create_stub(dir: &Path, file: &str, content: &str) {
    fs::create_dir_all(dir).unwrap_or_else(|e| panic!("create {}: {e}", dir.display()));
    fs::write(dir.join(file), content).unwrap_or_else(|e| panic!("write {file}: {e}"));
}
