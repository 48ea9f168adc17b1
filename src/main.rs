#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    bookly_gateway::run().await
}
