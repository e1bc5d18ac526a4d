//! Destination cache behavior against a mock scanning endpoint.


use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use epson_connect::{DestinationType, Error};
use test_utils::*;

fn destination_json(id: &str, alias: &str, target: &str) -> serde_json::Value {
    json!({
        "id": id,
        "alias_name": alias,
        "destination": target,
        "type": "mail",
    })
}

#[tokio::test]
async fn cached_list_reads_bootstrap_once() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(destinations_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "destinations": [
                destination_json("dest-1", "home", "home@example.com"),
                destination_json("dest-2", "office", "office@example.com"),
            ],
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let scanner = client.scanner();
    let first = scanner.list(true).await.expect("list");
    let second = scanner.list(true).await.expect("list");

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    // .expect(1) on the mock verifies the second read came from the cache.
}

#[tokio::test]
async fn fresh_list_replaces_cache_wholesale() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    // First listing knows dest-1, the next one only dest-2: an external
    // mutation happened between the two fresh lists.
    Mock::given(method("GET"))
        .and(path(destinations_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "destinations": [destination_json("dest-1", "home", "home@example.com")],
        })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(destinations_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "destinations": [destination_json("dest-2", "office", "office@example.com")],
        })))
        .mount(&mock_server)
        .await;

    let scanner = client.scanner();
    let first = scanner.list(false).await.expect("first list");
    assert_eq!(first[0].id, "dest-1");

    let second = scanner.list(false).await.expect("second list");
    assert_eq!(second[0].id, "dest-2");

    // No merge: dest-1 must be gone from the cache.
    let cached = scanner.list(true).await.expect("cached list");
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id, "dest-2");
}

#[tokio::test]
async fn add_relists_and_returns_new_destination() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    // Bootstrap sees an empty listing; the re-list after the create sees
    // the new record.
    Mock::given(method("GET"))
        .and(path(destinations_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "destinations": [] })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(destinations_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "destinations": [destination_json("dest-9", "office", "office@example.com")],
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(destinations_path()))
        .and(body_partial_json(json!({
            "alias_name": "office",
            "destination": "office@example.com",
            "type": "mail",
        })))
        .respond_with(empty_json_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let scanner = client.scanner();
    let added = scanner
        .add("office", "office@example.com", DestinationType::Mail)
        .await
        .expect("add");

    assert_eq!(added.id, "dest-9");
    assert_eq!(added.alias_name, "office");

    let cached = scanner.list(true).await.expect("cached list");
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id, "dest-9");
}

#[tokio::test]
async fn add_fails_when_new_destination_missing_from_listing() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(destinations_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "destinations": [] })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(destinations_path()))
        .respond_with(empty_json_response())
        .mount(&mock_server)
        .await;

    let scanner = client.scanner();
    let err = scanner
        .add("office", "office@example.com", DestinationType::Mail)
        .await
        .expect_err("must fail");
    assert!(matches!(err, Error::Scanner(_)));
}

#[tokio::test]
async fn add_validates_before_any_create_call() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(destinations_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "destinations": [] })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(destinations_path()))
        .respond_with(empty_json_response())
        .expect(0)
        .mount(&mock_server)
        .await;

    let scanner = client.scanner();
    let too_long = "a".repeat(33);
    let err = scanner
        .add(&too_long, "office@example.com", DestinationType::Mail)
        .await
        .expect_err("must fail");
    assert!(matches!(err, Error::Scanner(_)));

    let err = scanner
        .add("office", "a@b", DestinationType::Mail)
        .await
        .expect_err("must fail");
    assert!(matches!(err, Error::Scanner(_)));
}

#[tokio::test]
async fn update_unknown_id_fails_before_network() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(destinations_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "destinations": [destination_json("dest-1", "home", "home@example.com")],
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path(destinations_path()))
        .respond_with(empty_json_response())
        .expect(0)
        .mount(&mock_server)
        .await;

    let scanner = client.scanner();
    let err = scanner
        .update("unknown-id", Some("new-alias"), None, None)
        .await
        .expect_err("must fail");
    match err {
        Error::Scanner(message) => assert!(message.contains("not yet registered")),
        other => panic!("expected scanner error, got {other:?}"),
    }
}

#[tokio::test]
async fn update_merges_cached_fields_and_replaces_entry() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(destinations_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "destinations": [destination_json("dest-1", "home", "home@example.com")],
        })))
        .mount(&mock_server)
        .await;
    // Alias and type are omitted by the caller and must fall back to the
    // cached record.
    Mock::given(method("PUT"))
        .and(path(destinations_path()))
        .and(body_partial_json(json!({
            "id": "dest-1",
            "alias_name": "home",
            "destination": "updated@example.com",
            "type": "mail",
        })))
        .respond_with(empty_json_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let scanner = client.scanner();
    let updated = scanner
        .update("dest-1", None, Some("updated@example.com"), None)
        .await
        .expect("update");

    assert_eq!(updated.alias_name, "home");
    assert_eq!(updated.destination, "updated@example.com");

    let cached = scanner.list(true).await.expect("cached list");
    assert_eq!(cached[0].destination, "updated@example.com");
}

#[tokio::test]
async fn bootstrap_failure_reaches_every_waiter() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    // The bootstrap listing fails. The 400 is not transient, so the retry
    // middleware passes it straight through; the delay keeps both callers
    // waiting on the bootstrap at the same time.
    Mock::given(method("GET"))
        .and(path(destinations_path()))
        .respond_with(
            ResponseTemplate::new(400)
                .set_delay(std::time::Duration::from_millis(200))
                .set_body_json(json!({ "code": "internal_error" })),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(destinations_path()))
        .respond_with(empty_json_response())
        .expect(0)
        .mount(&mock_server)
        .await;

    let scanner = client.scanner();
    let (listed, removed) = tokio::join!(scanner.list(true), scanner.remove("dest-1"));

    // Every waiter observes a failure, and no operation runs ahead of the
    // bootstrap: the delete endpoint is never reached.
    assert!(matches!(listed, Err(Error::Api(_))));
    assert!(matches!(removed, Err(Error::Api(_))));
}

#[tokio::test]
async fn remove_deletes_remotely_and_drops_cache_entry() {
    let mock_server = MockServer::start().await;
    let client = authenticated_client(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(destinations_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "destinations": [destination_json("dest-1", "home", "home@example.com")],
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(destinations_path()))
        .and(body_partial_json(json!({ "id": "dest-1" })))
        .respond_with(empty_json_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let scanner = client.scanner();
    scanner.remove("dest-1").await.expect("remove");

    let cached = scanner.list(true).await.expect("cached list");
    assert!(cached.is_empty());
}
