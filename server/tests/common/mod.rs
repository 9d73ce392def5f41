#![allow(dead_code)]

use fetcher::{Fetcher, FetcherConfig, Url};
use search_core::MatchStrategy;
use serde_json::{json, Value};
use server::cache::{CacheController, CacheOptions, LoadMode};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PAGE_SIZE: usize = 2;

pub fn messages() -> Vec<Value> {
    vec![
        json!({"id": "m1", "user_name": "Sophia", "message": "Book a table at Nobu in Paris"}),
        json!({"id": "m2", "user_name": "Fatima", "message": "Private jet to Paris please"}),
        json!({"id": "m3", "user_name": "Armand", "message": "Opera tickets for two"}),
        json!({"id": "m4", "user_name": "Hans", "message": "Need a car at the airport"}),
        json!({"id": "m5", "user_name": "Layla", "message": "Dinner in PARIS, then jet home"}),
    ]
}

fn page_body(skip: usize) -> Value {
    let items: Vec<Value> = messages().into_iter().skip(skip).take(PAGE_SIZE).collect();
    json!({ "items": items })
}

/// Serve `messages()` in pages of `PAGE_SIZE`, then an empty page.
pub async fn mount_messages(server: &MockServer, delay: Duration) {
    let total = messages().len();
    let mut skip = 0;
    loop {
        Mock::given(method("GET"))
            .and(path("/messages"))
            .and(query_param("skip", skip.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(skip)).set_delay(delay))
            .mount(server)
            .await;
        if skip >= total {
            break;
        }
        skip += PAGE_SIZE;
    }
}

pub async fn mount_status(server: &MockServer, skip: usize, status: u16) {
    Mock::given(method("GET"))
        .and(path("/messages"))
        .and(query_param("skip", skip.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub async fn mount_page(server: &MockServer, skip: usize) {
    mount_page_delayed(server, skip, Duration::ZERO).await;
}

pub async fn mount_page_delayed(server: &MockServer, skip: usize, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/messages"))
        .and(query_param("skip", skip.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(skip)).set_delay(delay))
        .mount(server)
        .await;
}

pub fn controller(server: &MockServer, mode: LoadMode, strategy: MatchStrategy) -> CacheController {
    let url = Url::parse(&format!("{}/messages", server.uri())).unwrap();
    let fetcher = Fetcher::new(FetcherConfig::new(url).with_page_size(PAGE_SIZE)).unwrap();
    CacheController::new(fetcher, CacheOptions { mode, strategy, serve_empty_on_failure: false })
}

pub async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap().len()
}
