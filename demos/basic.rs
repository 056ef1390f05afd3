use std::io::Cursor;

use retryable_http::{RetryClient, RetryOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("TARGET_URL")?;
    let opts = RetryOptions::from_env()?;

    let client = RetryClient::new().with_options(opts);

    let response = client.get(&url).await?;
    println!("GET {url} -> {}", response.status());

    let response = client
        .post(&url, "application/json", Cursor::new(br#"{"ping":true}"#.to_vec()))
        .await?;
    println!("POST {url} -> {}", response.status());
    println!("{}", response.text().await?);

    Ok(())
}
