//! Reading only the first chunk of a file
//!
//! The stream is dropped while the rest of the file is still unread. The
//! pending tail owns the open handle, so dropping the stream releases it.

use lazy_stream::{get_global_resource_tracker, read_file, ReadConfig, ResourceStream};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/partial_read.rs");
    let ResourceStream { stream, probe } = read_file(path, ReadConfig::new().chunk_size(64));

    let chunks = stream.await?;
    let first = chunks.first().await?;
    println!("chunk 0 ({} bytes):", first.len());
    println!("{}", String::from_utf8_lossy(&first));
    println!("handle state while the stream is alive: {:?}", probe.state());

    drop(chunks);

    println!("handle state after dropping the stream: {:?}", probe.state());
    println!("released {} time(s)", probe.release_count());
    println!("tracker: {:?}", get_global_resource_tracker().metrics());
    Ok(())
}
