// Build script for Vulkan shader compilation

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

const SHADERS: &[(&str, &str)] = &[
    ("shaders/shader.vert", "vert.spv"),
    ("shaders/shader.frag", "frag.spv"),
];

fn main() {
    println!("cargo:rerun-if-changed=shaders");
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");

    let vulkan_sdk = match env::var("VULKAN_SDK") {
        Ok(sdk) => sdk,
        Err(_) => {
            eprintln!("warning: VULKAN_SDK not set, shader compilation skipped");
            return;
        }
    };

    let glslc = if cfg!(target_os = "windows") {
        format!("{vulkan_sdk}\\Bin\\glslc.exe")
    } else {
        format!("{vulkan_sdk}/bin/glslc")
    };
    if !Path::new(&glslc).exists() {
        eprintln!("warning: glslc not found at {glslc}, shader compilation skipped");
        return;
    }

    let target_dir = PathBuf::from("target/shaders");
    if let Err(e) = std::fs::create_dir_all(&target_dir) {
        eprintln!("warning: failed to create {target_dir:?}: {e}");
        return;
    }

    for (source, output) in SHADERS {
        let out_file = target_dir.join(output);
        let status = Command::new(&glslc).arg(source).arg("-o").arg(&out_file).status();

        match status {
            Ok(s) if s.success() => {
                eprintln!("info: compiled {source} -> {out_file:?}");
            }
            Ok(s) => {
                eprintln!("error: glslc failed for {source} with exit code {}", s.code().unwrap_or(-1));
                panic!("shader compilation failed");
            }
            Err(e) => {
                eprintln!("error: failed to run glslc for {source}: {e}");
                panic!("failed to execute shader compiler");
            }
        }
    }
}
