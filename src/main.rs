#[tokio::main]
async fn main() {
    event_attendance::run().await;
}
