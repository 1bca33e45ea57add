//! Example: Open, close and position a cover.

use std::time::Duration;

use somfy_uai::{ControllerConfig, Coordinator, Cover};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ControllerConfig::builder()
        .host("192.168.0.50")
        .username("admin")
        .password("secret")
        .target_ids(["A1B2C3"])
        .build();

    let coordinator = Coordinator::new(config);
    coordinator.connect_and_stay_connected().await;
    coordinator.wait_for_connection_ready().await;

    let mut cover = Cover::new("A1B2C3");
    cover.update(&*coordinator.refresh().await, coordinator.is_connection_ready());
    println!("{} is at {:?}% open", cover.name, cover.position);

    println!("Opening...");
    cover.open(&coordinator).await?;
    tokio::time::sleep(Duration::from_secs(10)).await;

    println!("Moving to 30% open...");
    cover.set_position(&coordinator, 30).await?;
    tokio::time::sleep(Duration::from_secs(10)).await;

    cover.update(&*coordinator.refresh().await, coordinator.is_connection_ready());
    println!("{} is at {:?}% open", cover.name, cover.position);

    println!("Closing...");
    cover.close(&coordinator).await?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    println!("Stopping...");
    cover.stop(&coordinator).await?;

    coordinator.async_disconnect().await?;
    println!("Done.");

    Ok(())
}
