// build.rs
// Compiles the service definition into client and server stubs.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::compile_protos("proto/hbase.proto")?;
    Ok(())
}
