use std::str::FromStr as _;

use axum::{body::Body, Router};
use filmdb_app::state::{AppConfig, AppState};
use futures::TryStreamExt as _;
use http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Executor as _,
};
use tower::ServiceExt;
use tracing_test::traced_test;

const TEST_DATA: &str = r#"
INSERT INTO director (id, name) VALUES (1, 'Andrei Tarkovsky');
INSERT INTO director (id, name) VALUES (2, 'Věra Chytilová');

INSERT INTO genre (id, name) VALUES (1, 'drama');
INSERT INTO genre (id, name) VALUES (2, 'sci-fi');

INSERT INTO movie (id, title, year, rating, genre_id, director_id) VALUES (1, 'Mirror', 1975, 8.0, 1, 1);
INSERT INTO movie (id, title, year, rating, genre_id, director_id) VALUES (2, 'Solaris', 1972, 8.1, 2, 1);
INSERT INTO movie (id, title, year, rating, genre_id, director_id) VALUES (3, 'Daisies', 1966, 7.3, 1, 2);
"#;

async fn spawn_app(strict_references: bool, seed: bool) -> Router {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(false);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    filmdb_dal::migrate(&pool).await.unwrap();
    if seed {
        pool.execute_many(TEST_DATA)
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
    }

    let state = AppState::new(AppConfig { strict_references }, pool);
    filmdb_app::rest_api::router().with_state(state)
}

struct TestResponse {
    status: StatusCode,
    location: Option<String>,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn error_code(&self) -> String {
        self.json()["error"].as_str().unwrap().to_string()
    }
}

async fn send(app: &Router, method: &str, uri: &str, payload: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match payload {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    TestResponse {
        status,
        location,
        body: body.to_vec(),
    }
}

fn ids(response: &TestResponse) -> Vec<i64> {
    response
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
#[traced_test]
async fn test_director_lifecycle() {
    let app = spawn_app(false, false).await;

    let response = send(&app, "POST", "/directors/", Some(json!({"name": "Nolan"}))).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.location.as_deref(), Some("/directors/1"));
    assert!(response.body.is_empty());

    let response = send(&app, "GET", "/directors/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!([{"id": 1, "name": "Nolan"}]));

    let response = send(&app, "PUT", "/directors/1", Some(json!({"name": "C. Nolan"}))).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&app, "GET", "/directors/1", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"id": 1, "name": "C. Nolan"}));

    let response = send(&app, "DELETE", "/directors/1", None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&app, "GET", "/directors/1", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "not_found");

    let response = send(&app, "DELETE", "/directors/1", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = send(&app, "PUT", "/directors/1", Some(json!({"name": "Nobody"}))).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[traced_test]
async fn test_collection_with_and_without_slash() {
    let app = spawn_app(false, true).await;

    for uri in ["/genres", "/genres/"] {
        let response = send(&app, "GET", uri, None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(ids(&response), vec![1, 2]);
    }

    let response = send(&app, "POST", "/genres", Some(json!({"name": "comedy"}))).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.location.as_deref(), Some("/genres/3"));

    let response = send(&app, "GET", "/movies", None).await;
    assert_eq!(ids(&response), vec![1, 2, 3]);
}

#[tokio::test]
#[traced_test]
async fn test_movie_filters() {
    let app = spawn_app(false, true).await;

    let cases = [
        ("/movies/", vec![1, 2, 3]),
        ("/movies/?director_id=1", vec![1, 2]),
        ("/movies/?genre_id=1", vec![1, 3]),
        ("/movies/?director_id=1&genre_id=2", vec![2]),
        ("/movies/?director_id=0&genre_id=0", vec![1, 2, 3]),
        ("/movies?director_id=2&genre_id=0", vec![3]),
        ("/movies/?director_id=&genre_id=1", vec![1, 3]),
        ("/movies/?director_id=1&genre_id=", vec![1, 2]),
    ];
    for (uri, expected) in cases {
        let response = send(&app, "GET", uri, None).await;
        assert_eq!(response.status, StatusCode::OK, "for {uri}");
        assert_eq!(ids(&response), expected, "for {uri}");
    }

    let response = send(&app, "GET", "/movies/?director_id=9&genre_id=9", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "no_match");

    let response = send(&app, "GET", "/movies/?director_id=abc", None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "invalid_query");

    let response = send(&app, "GET", "/movies/?genre_id=-1", None).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.error_code(), "invalid_request");
}

#[tokio::test]
#[traced_test]
async fn test_movie_crud() {
    let app = spawn_app(false, true).await;

    let stalker = json!({
        "title": "Stalker",
        "description": "A guide leads two men through the Zone",
        "year": 1979,
        "rating": 8.1,
        "genre_id": 2,
        "director_id": 1
    });
    let response = send(&app, "POST", "/movies/", Some(stalker)).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.location.as_deref(), Some("/movies/4"));

    let response = send(&app, "GET", "/movies/4", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({
            "id": 4,
            "title": "Stalker",
            "description": "A guide leads two men through the Zone",
            "trailer": null,
            "year": 1979,
            "rating": 8.1,
            "genre": "sci-fi",
            "director": "Andrei Tarkovsky"
        })
    );

    let response = send(&app, "PUT", "/movies/4", Some(json!({"title": "Stalker", "genre_id": 1}))).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let movie = send(&app, "GET", "/movies/4", None).await.json();
    assert_eq!(movie["genre"], json!("drama"));
    assert_eq!(movie["director"], Value::Null);
    assert_eq!(movie["year"], Value::Null);

    let response = send(&app, "DELETE", "/movies/4", None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let response = send(&app, "GET", "/movies/4", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "not_found");
}

#[tokio::test]
#[traced_test]
async fn test_invalid_payloads() {
    let app = spawn_app(false, true).await;

    let response = send(&app, "POST", "/movies/", Some(json!({"year": 1979}))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.error_code(), "malformed_request");

    let response = send(&app, "POST", "/movies/", Some(json!({"title": "Stalker", "rating": 11.0}))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.error_code(), "invalid_request");

    let response = send(&app, "POST", "/movies/", Some(json!({"title": "Stalker", "genre": "sci-fi"}))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.error_code(), "malformed_request");

    let response = send(&app, "POST", "/directors/", Some(json!({"name": ""}))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.error_code(), "invalid_request");

    let response = send(&app, "POST", "/genres/", None).await;
    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let response = send(&app, "GET", "/movies/", None).await;
    assert_eq!(ids(&response), vec![1, 2, 3]);
}

#[tokio::test]
#[traced_test]
async fn test_invalid_record_id() {
    let app = spawn_app(false, true).await;

    let requests = [
        ("GET", "/movies/abc"),
        ("DELETE", "/movies/1.5"),
        ("GET", "/directors/abc"),
        ("DELETE", "/directors/abc"),
        ("GET", "/genres/99999999999999999999"),
    ];
    for (method, uri) in requests {
        let response = send(&app, method, uri, None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "for {method} {uri}");
        assert_eq!(response.error_code(), "invalid_path", "for {method} {uri}");
    }

    let response = send(&app, "PUT", "/genres/abc", Some(json!({"name": "drama"}))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "invalid_path");

    let response = send(&app, "GET", "/movies/", None).await;
    assert_eq!(ids(&response), vec![1, 2, 3]);
}

#[tokio::test]
#[traced_test]
async fn test_replace_requires_complete_record() {
    let app = spawn_app(false, true).await;
    let before = send(&app, "GET", "/movies/1", None).await.json();

    let response = send(&app, "PUT", "/movies/1", Some(json!({"year": 1979}))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.error_code(), "malformed_request");

    let response = send(&app, "PUT", "/movies/1", Some(json!({"title": ""}))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.error_code(), "invalid_request");

    let response = send(&app, "PUT", "/directors/1", Some(json!({}))).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let after = send(&app, "GET", "/movies/1", None).await.json();
    assert_eq!(after, before);
    assert_eq!(after["title"], json!("Mirror"));
    let director = send(&app, "GET", "/directors/1", None).await.json();
    assert_eq!(director["name"], json!("Andrei Tarkovsky"));
}

#[tokio::test]
#[traced_test]
async fn test_lax_references() {
    let app = spawn_app(false, true).await;

    let response = send(&app, "DELETE", "/directors/1", None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let movie = send(&app, "GET", "/movies/1", None).await.json();
    assert_eq!(movie["director"], Value::Null);
    assert_eq!(movie["genre"], json!("drama"));

    // filter still matches rows pointing to deleted director
    let response = send(&app, "GET", "/movies/?director_id=1", None).await;
    assert_eq!(ids(&response), vec![1, 2]);

    let response = send(&app, "POST", "/movies/", Some(json!({"title": "Orphan", "director_id": 99}))).await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
#[traced_test]
async fn test_strict_references() {
    let app = spawn_app(true, true).await;

    let response = send(&app, "DELETE", "/directors/2", None).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "conflict");

    let response = send(&app, "DELETE", "/genres/2", None).await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = send(&app, "DELETE", "/movies/3", None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&app, "DELETE", "/directors/2", None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&app, "DELETE", "/directors/2", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
