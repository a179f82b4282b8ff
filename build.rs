use chrono::Utc;
use std::env;

fn main() {
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());

    let mut features = Vec::new();
    if env::var_os("CARGO_FEATURE_PARQUET").is_some() {
        features.push("parquet");
    }
    if env::var_os("CARGO_FEATURE_MINIMAL").is_some() {
        features.push("minimal");
    }
    let features = if features.is_empty() {
        "none".to_string()
    } else {
        features.join(", ")
    };

    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
    println!("cargo:rustc-env=BUILD_TARGET={}", target);
    println!("cargo:rustc-env=BUILD_FEATURES={}", features);
    println!(
        "cargo:rustc-env=BUILD_DATE={}",
        Utc::now().format("%Y-%m-%d")
    );
}
