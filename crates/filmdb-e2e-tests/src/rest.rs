use anyhow::{Result, anyhow};
use reqwest::{StatusCode, Url};
use serde_json::json;
use tracing::info;

/// Posts payload to collection and returns URL of created record
pub async fn create_record(
    client: &reqwest::Client,
    base_url: &Url,
    collection: &str,
    payload: &serde_json::Value,
) -> Result<Url> {
    let api_url = base_url.join(collection)?;

    let response = client.post(api_url).json(payload).send().await?;
    info!("Response: {:#?}", response);
    assert_eq!(response.status(), StatusCode::CREATED);

    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .ok_or_else(|| anyhow!("Missing location header"))?
        .to_str()?;
    Ok(base_url.join(location)?)
}

pub async fn create_director(client: &reqwest::Client, base_url: &Url, name: &str) -> Result<Url> {
    create_record(client, base_url, "directors/", &json!({"name": name})).await
}

pub async fn create_genre(client: &reqwest::Client, base_url: &Url, name: &str) -> Result<Url> {
    create_record(client, base_url, "genres/", &json!({"name": name})).await
}

pub async fn create_movie(
    client: &reqwest::Client,
    base_url: &Url,
    payload: &serde_json::Value,
) -> Result<Url> {
    create_record(client, base_url, "movies/", payload).await
}

/// Id is last segment of record URL
pub fn record_id(url: &Url) -> i64 {
    url.path_segments()
        .and_then(|segments| segments.last())
        .and_then(|id| id.parse().ok())
        .unwrap_or_else(|| panic!("No id in {url}"))
}
