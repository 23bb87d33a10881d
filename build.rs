use std::{env, path::PathBuf};

const WATCHED_VARIABLES: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // pkg-config finds FFmpeg everywhere except Windows.
    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows" {
        return;
    }

    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=shotframe decodes video with FFmpeg. Set FFMPEG_DIR (or VCPKG_ROOT with an ffmpeg install) so the FFmpeg libraries can be found."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);

    if !candidate.exists() {
        println!(
            "cargo:warning=No vcpkg FFmpeg install found at {}.",
            candidate.display()
        );
        return;
    }

    println!(
        "cargo:warning=Using vcpkg FFmpeg at {}; set FFMPEG_DIR to it to silence this warning.",
        candidate.display()
    );
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        println!("cargo:warning=Set VCPKGRS_DYNAMIC=1 if the vcpkg FFmpeg build is dynamic.");
    }
}
