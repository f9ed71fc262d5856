#[tokio::main]
async fn main() {
  fitlog_lib::run().await
}
