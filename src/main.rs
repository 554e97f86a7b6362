#[tokio::main]
async fn main() -> anyhow::Result<()> {
    folio_app::bootstrap::run().await
}
