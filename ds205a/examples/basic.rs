//! Basic status poll example

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
    println!("Device open!");

    let info = device.get_device_info(&cancel).await?;
    println!("{info}");

    let status = device.get_status(&cancel).await?;
    println!("{status}");

    device.close().await?;

    Ok(())
}
