use std::process::Command;

fn main() {
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(protoc) = protoc_bin_vendored::protoc_bin_path() {
            unsafe {
                std::env::set_var("PROTOC", protoc);
            }
        }
    }

    prost_build::compile_protos(&["proto/update_metadata.proto"], &["proto/"])
        .expect("failed to compile update_metadata.proto");

    println!("cargo:rerun-if-changed=proto/update_metadata.proto");

    let git_commit = run_git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".into());
    let git_branch =
        run_git(&["rev-parse", "--abbrev-ref", "HEAD"]).unwrap_or_else(|| "unknown".into());

    println!("cargo:rustc-env=GIT_COMMIT_SHORT={git_commit}");
    println!("cargo:rustc-env=GIT_BRANCH={git_branch}");
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        chrono::Utc::now().to_rfc3339()
    );
    println!(
        "cargo:rustc-env=RUSTC_VERSION={}",
        rustc_version().unwrap_or_else(|| "unknown".into())
    );
    println!(
        "cargo:rustc-env=BUILD_HOST={}",
        std::env::var("HOST").unwrap_or_else(|_| "unknown".into())
    );
    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        std::env::var("TARGET").unwrap_or_else(|_| "unknown".into())
    );
    println!(
        "cargo:rustc-env=TARGET_ARCH={}",
        std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_else(|_| "unknown".into())
    );
    println!(
        "cargo:rustc-env=TARGET_OS={}",
        std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_else(|_| "unknown".into())
    );
    println!(
        "cargo:rustc-env=BUILD_PROFILE={}",
        std::env::var("PROFILE").unwrap_or_else(|_| "unknown".into())
    );
    println!(
        "cargo:rustc-env=OPT_LEVEL={}",
        std::env::var("OPT_LEVEL").unwrap_or_else(|_| "unknown".into())
    );

    let mut features = Vec::new();
    for (key, _) in std::env::vars() {
        if let Some(f) = key.strip_prefix("CARGO_FEATURE_") {
            features.push(f.to_lowercase());
        }
    }
    features.sort();
    println!("cargo:rustc-env=BUILD_FEATURES={}", features.join(","));
    println!(
        "cargo:rustc-env=DEFAULT_USER_AGENT=payload_dumper/{}",
        std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into())
    );
}

fn run_git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn rustc_version() -> Option<String> {
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".into());
    let output = Command::new(rustc).arg("--version").output().ok()?;
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}
