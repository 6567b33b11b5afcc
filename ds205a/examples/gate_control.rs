//! Gate control example

use std::time::Duration;
use tokio::time::sleep;

use ds205a::{CancellationToken, Device, DeviceConfig};

#[tokio::main]
async fn main() -> ds205a::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let port = std::env::var("DS205A_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    let device = Device::new(DeviceConfig::new(port))?;
    let cancel = CancellationToken::new();

    device.open().await?;

    // Let one person through the left passage
    println!("Opening left passage...");
    device.left_open(1, &cancel).await?;
    sleep(Duration::from_secs(3)).await;

    // Close the gate again
    println!("Closing gate...");
    device.close_gate(&cancel).await?;

    println!("Done!");

    device.close().await?;

    Ok(())
}
