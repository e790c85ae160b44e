use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args([
            "check",
            "--quiet",
            "--manifest-path",
            concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"),
            "--package",
            "mirkwood-cli",
            "--bin",
            "mirkwood",
        ])
        .status()
        .expect("failed to invoke cargo check for mirkwood CLI binary");

    assert!(status.success(), "cargo check --bin mirkwood should succeed");
}
