use std::sync::Arc;
use std::time::Duration;

use hn_items::{CellState, Config, HackerNewsClient, HnError, ItemCache, ItemCell, ItemFetcher, ItemKind, MainContext};

fn client_for(server: &mockito::Server) -> HackerNewsClient {
    let config = Config {
        api_base: server.url(),
        request_timeout: Duration::from_secs(5),
        ..Config::default()
    };
    HackerNewsClient::from_config(&config).unwrap()
}

const STORY: &str = r#"{
    "by": "pg",
    "descendants": 3,
    "id": 27492268,
    "kids": [27492300],
    "score": 42,
    "time": 1623456789,
    "title": "Example",
    "type": "story",
    "url": "https://example.com/a"
}"#;

#[test]
fn fetches_and_decodes_an_item() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v0/item/27492268.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(STORY)
        .create();

    let item = client_for(&server).fetch_item(27492268).unwrap().unwrap();
    mock.assert();

    assert_eq!(item.id, 27492268);
    assert_eq!(item.kind, ItemKind::Story);
    assert_eq!(item.title.as_deref(), Some("Example"));
    assert_eq!(item.score, Some(42));
    assert_eq!(item.by.as_deref(), Some("pg"));
    assert_eq!(item.url_host.as_deref(), Some("example.com"));
    assert!(item.time_string_representation.is_some());
}

#[test]
fn null_body_is_an_absent_item() {
    let mut server = mockito::Server::new();
    let _mock = server.mock("GET", "/v0/item/1.json").with_status(200).with_body("null").create();

    assert!(client_for(&server).fetch_item(1).unwrap().is_none());
}

#[test]
fn mismatched_id_is_an_absent_item() {
    let mut server = mockito::Server::new();
    let _mock = server.mock("GET", "/v0/item/5.json").with_status(200).with_body(r#"{"id": 6}"#).create();

    assert!(client_for(&server).fetch_item(5).unwrap().is_none());
}

#[test]
fn server_error_maps_to_status() {
    let mut server = mockito::Server::new();
    let _mock = server.mock("GET", "/v0/item/2.json").with_status(500).create();

    let err = client_for(&server).fetch_item(2).unwrap_err();
    assert!(matches!(err, HnError::Status(500)));
}

#[test]
fn malformed_body_maps_to_decode() {
    let mut server = mockito::Server::new();
    let _mock = server.mock("GET", "/v0/item/3.json").with_status(200).with_body("<html>oops</html>").create();

    let err = client_for(&server).fetch_item(3).unwrap_err();
    assert!(matches!(err, HnError::Decode(_)));
}

#[test]
fn top_story_ids_are_truncated() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/v0/topstories.json")
        .with_status(200)
        .with_body("[30, 20, 10, 5]")
        .create();

    assert_eq!(client_for(&server).top_story_ids(2).unwrap(), vec![30, 20]);
}

#[test]
fn cell_loads_through_http_once() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v0/item/27492268.json")
        .with_status(200)
        .with_body(STORY)
        .expect(1)
        .create();

    let ctx = MainContext::new();
    let fetcher = ItemFetcher::new(ItemCache::default(), Arc::new(client_for(&server)), ctx.dispatcher());

    let mut cell = ItemCell::new(27492268);
    cell.on_appear(&fetcher);
    cell.on_appear(&fetcher);
    for _ in 0..100 {
        if cell.is_settled() {
            break;
        }
        ctx.run_pending_timeout(Duration::from_millis(50));
    }

    assert!(matches!(cell.state(), CellState::Loaded(_)));
    assert_eq!(cell.card().host.text, "example.com");

    // A second card for the same item is served from the shared cache.
    let mut again = ItemCell::new(27492268);
    again.on_appear(&fetcher);
    assert!(matches!(again.state(), CellState::Loaded(_)));
    mock.assert();
}
