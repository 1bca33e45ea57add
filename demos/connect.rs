//! Example: Connect to a UAI+ controller and print cover and group status.

use somfy_uai::{ControllerConfig, Coordinator, Cover, CoverGroup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ControllerConfig::builder()
        .host("192.168.0.50")
        .username("admin")
        .password("secret")
        .target_ids(["A1B2C3", "D4E5F6"])
        .group_ids(["0000AA"])
        .build();

    println!("Connecting to controller...");
    let coordinator = Coordinator::new(config.clone());
    coordinator.connect_and_stay_connected().await;
    coordinator.wait_for_connection_ready().await;

    let snapshot = coordinator.refresh().await;
    let ready = coordinator.is_connection_ready();

    println!("\n--- Covers ({}) ---", config.target_ids.len());
    for id in &config.target_ids {
        let mut cover = Cover::new(id.clone());
        cover.update(&snapshot, ready);
        println!(
            "  {:6}: {:20} model={:12} position={:>4} closed={:?} available={}",
            cover.target_id,
            cover.name,
            cover.model.as_deref().unwrap_or("-"),
            cover
                .position
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            cover.is_closed,
            cover.available,
        );
    }

    println!("\n--- Groups ({}) ---", config.group_ids.len());
    for id in &config.group_ids {
        let mut group = CoverGroup::new(id.clone());
        group.update(&snapshot, ready);
        println!(
            "  {:6}: {:20} available={}",
            group.group_id, group.name, group.available
        );
    }

    if let Some(error) = &snapshot.error {
        println!("\nLast poll error: {error}");
    }

    println!("\nPress Ctrl+C to disconnect...");
    tokio::signal::ctrl_c().await?;
    coordinator.async_disconnect().await?;
    println!("Disconnected.");

    Ok(())
}
