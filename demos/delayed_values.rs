//! Printing a stream whose values arrive at different times

use lazy_stream::{make, Deferred, Value};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cells = Vec::new();
    for (value, delay_ms) in [(1, 30), (2, 0), (3, 10)] {
        let (resolver, deferred) = Deferred::channel();
        tokio::spawn(async move {
            sleep(Duration::from_millis(delay_ms)).await;
            resolver.resolve(value);
        });
        cells.push(Value::Pending(deferred));
    }

    let stream = make(cells);
    stream.print(None).await?;
    println!("{}", stream.map(|x| x * 10).render().await?);
    Ok(())
}
