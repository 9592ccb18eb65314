use std::env;
use std::sync::Arc;

use incomfort::{spawn_poll_loop, BoilerDevice, DeviceSettings, IncomfortClient, TracingNotifier};

#[tokio::main]
async fn main() -> incomfort::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let host = args
        .get(1)
        .expect("usage: monitor <host> [username password] [--override <temp>]");

    let mut settings = DeviceSettings::new(host);
    if let (Some(user), Some(pass)) = (args.get(2), args.get(3))
        && !user.starts_with("--")
    {
        settings.username = Some(user.clone());
        settings.password = Some(pass.clone());
    }
    let override_temp = args
        .iter()
        .position(|a| a == "--override")
        .and_then(|i| args.get(i + 1))
        .and_then(|t| t.parse::<f64>().ok());

    let client = IncomfortClient::from_settings(&settings)?;
    let heaters = client.heater_list().await?;
    for heater in &heaters {
        println!("{} (index {})", heater.display_name(), heater.index);
    }
    let Some(heater) = heaters.first() else {
        println!("No heaters found on {host}");
        return Ok(());
    };
    settings.heater_index = heater.index;

    let device = Arc::new(BoilerDevice::from_settings(&settings, TracingNotifier)?);
    if let Some(t) = override_temp {
        device.request_override(t).await?;
    }

    println!("Polling {} every {:?}...", heater.id, settings.refresh_interval());
    let handle = spawn_poll_loop(device, settings.refresh_interval());

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("failed to wait for ctrl-c: {e}");
    }
    handle.join().await;
    Ok(())
}
