#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quizd_server::start().await
}
