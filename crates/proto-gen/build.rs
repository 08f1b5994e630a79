// Build script to (optionally) recompile Protocol Buffer definitions.
//
// The generated code is checked in under src/generated/. Enable the
// `regenerate` feature after editing proto/sso.proto to refresh it.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=../../proto/sso.proto");
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "regenerate")]
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .out_dir("src/generated")
        .compile_protos(&["../../proto/sso.proto"], &["../../proto/"])?;

    Ok(())
}
