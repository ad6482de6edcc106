use joydrop_core::service::JoydropServiceApp;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let app = JoydropServiceApp::new().await?;

    info!(
        address = %app.address(),
        "Starting joydrop-core service"
    );

    app.run().await
}
