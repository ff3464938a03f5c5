//! Build script for hwretro-core.
//!
//! Compiles the C-variadic core logger. Rust can call variadic functions but
//! cannot define them on stable, so the `retro_log_printf_t` handed to cores is
//! a small C function that formats and forwards to the host.

fn main() {
    println!("cargo:rerun-if-changed=csrc/log_shim.c");

    cc::Build::new()
        .file("csrc/log_shim.c")
        .warnings(true)
        .compile("hwretro_log_shim");
}
