//! DS205A turnstile command-line tool

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::time::timeout;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ds205a::{CancellationToken, Device, DeviceConfig, Parity};

#[derive(Parser)]
#[command(name = "ds205a-cli", about = "DS205A turnstile control tool", version)]
struct Cli {
    /// Serial port
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Baud rate (9600, 19200, 38400, 57600, 115200)
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Parity (none, odd, even, mark, space)
    #[arg(long, default_value = "none")]
    parity: Parity,

    /// Device ID
    #[arg(long, default_value_t = 1)]
    id: u8,

    /// Operation timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Query device status
    Status,
    /// Query device identity
    Info,
    /// Open the left passage
    LeftOpen {
        #[arg(default_value_t = 1)]
        value: u8,
    },
    /// Hold the left passage permanently open
    LeftAlwaysOpen,
    /// Open the right passage
    RightOpen {
        #[arg(default_value_t = 1)]
        value: u8,
    },
    /// Hold the right passage permanently open
    RightAlwaysOpen,
    /// Close the gate
    CloseGate,
    /// Forbid passage through the left side
    ForbidLeft,
    /// Forbid passage through the right side
    ForbidRight,
    /// Lift all passage restrictions
    DisableRestrictions,
    /// Reset the left-side pedestrian counters
    ResetLeftCounters,
    /// Reset the right-side pedestrian counters
    ResetRightCounters,
    /// Set device parameters
    SetParams { value: u8 },
    /// Restart the device
    Restart,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = DeviceConfig::new(&cli.port)
        .with_baud_rate(cli.baud)
        .with_device_id(cli.id)
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    config.parity = cli.parity;

    let device = Device::new(config).context("invalid device configuration")?;

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Ctrl-C received, cancelling");
            ctrl_c_cancel.cancel();
        }
    });

    device
        .open()
        .await
        .with_context(|| format!("failed to open {}", cli.port))?;

    // The session applies timeouts per read/write; the end-to-end deadline
    // for the whole operation is composed here, from the validated config.
    let op_timeout = device.config().timeout;
    let result = timeout(op_timeout, run(&device, &cli.command, &cancel)).await;

    let close_result = device.close().await;

    match result {
        Ok(run_result) => run_result?,
        Err(_) => anyhow::bail!("operation timed out after {}s", op_timeout.as_secs()),
    }
    close_result.context("failed to close device")?;

    Ok(())
}

async fn run(device: &Device, command: &Command, cancel: &CancellationToken) -> anyhow::Result<()> {
    match command {
        Command::Status => {
            let status = device.get_status(cancel).await?;
            println!("Machine number:   0x{:02X}", status.machine_number);
            println!("Version:          {}", status.version_number);
            println!("Fault event:      0x{:02X}", status.fault_event);
            println!("Gate status:      0x{:02X}", status.gate_status);
            println!("Alarm event:      0x{:02X}", status.alarm_event);
            println!("Infrared status:  0x{:02X}", status.infrared_status);
            println!("Supply voltage:   {}", status.power_supply_voltage);
            println!("Left count:       {}", status.left_pedestrian_count);
            println!("Right count:      {}", status.right_pedestrian_count);
        }
        Command::Info => {
            let info = device.get_device_info(cancel).await?;
            println!("{info}");
        }
        Command::LeftOpen { value } => {
            device.left_open(*value, cancel).await?;
            println!("Left passage opened");
        }
        Command::LeftAlwaysOpen => {
            device.left_always_open(cancel).await?;
            println!("Left passage held open");
        }
        Command::RightOpen { value } => {
            device.right_open(*value, cancel).await?;
            println!("Right passage opened");
        }
        Command::RightAlwaysOpen => {
            device.right_always_open(cancel).await?;
            println!("Right passage held open");
        }
        Command::CloseGate => {
            device.close_gate(cancel).await?;
            println!("Gate closed");
        }
        Command::ForbidLeft => {
            device.forbid_left_passage(cancel).await?;
            println!("Left passage forbidden");
        }
        Command::ForbidRight => {
            device.forbid_right_passage(cancel).await?;
            println!("Right passage forbidden");
        }
        Command::DisableRestrictions => {
            device.disable_restrictions(cancel).await?;
            println!("Passage restrictions disabled");
        }
        Command::ResetLeftCounters => {
            device.reset_left_counters(cancel).await?;
            println!("Left counters reset");
        }
        Command::ResetRightCounters => {
            device.reset_right_counters(cancel).await?;
            println!("Right counters reset");
        }
        Command::SetParams { value } => {
            device.set_parameters(*value, cancel).await?;
            println!("Parameters set");
        }
        Command::Restart => {
            device.restart(cancel).await?;
            println!("Device restarting");
        }
    }

    Ok(())
}
