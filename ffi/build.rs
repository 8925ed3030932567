fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let config = cbindgen::Config {
        language: cbindgen::Language::C,
        include_guard: Some("NCMB_FFI_H".to_string()),
        ..Default::default()
    };
    // Header generation is a convenience for C hosts; a failure here must
    // not break the Rust build.
    match cbindgen::generate_with_config(&crate_dir, config) {
        Ok(bindings) => {
            let include_dir = format!("{crate_dir}/include");
            if std::fs::create_dir_all(&include_dir).is_ok() {
                bindings.write_to_file(format!("{include_dir}/ncmb_ffi.h"));
            }
        }
        Err(err) => println!("cargo:warning=cbindgen: {err}"),
    }
}
