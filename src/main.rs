#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sensorbot_lib::run().await
}
