#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gst_reconciler::server::run().await
}
