//! Example: Subscribe to state snapshots and print cover changes.

use somfy_uai::{ConnectionState, ControllerConfig, Coordinator, Cover};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ControllerConfig::builder()
        .host("192.168.0.50")
        .username("admin")
        .password("secret")
        .target_ids(["A1B2C3", "D4E5F6"])
        .build();

    let coordinator = Coordinator::new(config.clone());
    let mut snapshots = coordinator.subscribe();
    let mut connection = coordinator.subscribe_connection();
    coordinator.connect_and_stay_connected().await;

    let mut covers: Vec<Cover> = config.target_ids.iter().map(Cover::new).collect();

    println!("Listening for cover changes (Ctrl+C to stop)...\n");

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    println!("Coordinator closed");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let ready = coordinator.is_connection_ready();
                for cover in &mut covers {
                    let before = (cover.position, cover.is_opening, cover.is_closing, cover.available);
                    cover.update(&snapshot, ready);
                    let after = (cover.position, cover.is_opening, cover.is_closing, cover.available);
                    if before != after {
                        println!(
                            "{} ({}): position={:?} opening={} closing={} available={}",
                            cover.name,
                            cover.target_id,
                            cover.position,
                            cover.is_opening,
                            cover.is_closing,
                            cover.available,
                        );
                    }
                }
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *connection.borrow_and_update();
                match state {
                    ConnectionState::Ready => println!("Controller connected"),
                    ConnectionState::Connecting => println!("Controller connecting..."),
                    ConnectionState::Disconnected => println!("Controller disconnected"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nDisconnecting...");
                coordinator.async_disconnect().await?;
                break;
            }
        }
    }

    Ok(())
}
