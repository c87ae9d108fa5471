use std::env;
use std::fs;
use std::path::{Path, PathBuf};

// Puts the repository's config.toml next to the built binary, where
// the settings loader looks first.
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        println!("cargo:warning=config.toml not found, binary will fall back to defaults");
        return;
    }

    // OUT_DIR is target/<profile>/build/<pkg>-<hash>/out
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let Some(profile_dir) = out_dir.ancestors().nth(3) else {
        println!("cargo:warning=unexpected OUT_DIR layout, config.toml not copied");
        return;
    };

    if let Err(err) = fs::copy(config_path, profile_dir.join("config.toml")) {
        println!("cargo:warning=failed to copy config.toml: {err}");
    }
}
