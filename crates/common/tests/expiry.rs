use std::time::Duration;

use chrono::Utc;

use common::exchange::{CreateExchange, ExchangeError};
use common::store::{BlobStore, MetadataStore};
use common::testkit::{envelope, TestRelay};

fn request(passcode: Option<&str>) -> CreateExchange {
    CreateExchange {
        ciphertext: envelope(),
        passcode: passcode.map(str::to_string),
        generate_passcode: false,
        label: None,
        expires_in_secs: None,
        proof: None,
    }
}

/// Rewrite the record so its absolute expiry is in the past while the
/// store TTL still has plenty of headroom. The store collaborator's TTL
/// may be much coarser than the record's expiry; the controller must not
/// rely on the two agreeing.
async fn force_past_expiry(relay: &TestRelay, id: &common::prelude::ExchangeId) {
    let mut record = relay.metadata.get(id).await.unwrap().unwrap();
    record.expires_at_ms = Utc::now().timestamp_millis() - 1;
    relay
        .metadata
        .put(id, &record, Duration::from_secs(60))
        .await
        .unwrap();
}

#[tokio::test]
async fn expired_exchange_is_purged_on_read() {
    let relay = TestRelay::new();
    let created = relay.controller.create(request(None)).await.unwrap();

    force_past_expiry(&relay, &created.id).await;

    // First read past expiry reports the expiry and deletes both artifacts.
    assert!(matches!(
        relay.controller.retrieve(&created.id, None).await,
        Err(ExchangeError::Expired)
    ));
    assert!(relay.blobs.get(&created.id).await.unwrap().is_none());
    assert!(relay.metadata.get(&created.id).await.unwrap().is_none());

    // Any later read, with any passcode, is plain not-found.
    assert!(matches!(
        relay.controller.retrieve(&created.id, Some("9137")).await,
        Err(ExchangeError::NotFound)
    ));
}

#[tokio::test]
async fn passcode_does_not_bypass_expiry() {
    let relay = TestRelay::new();
    let created = relay.controller.create(request(Some("9137"))).await.unwrap();

    force_past_expiry(&relay, &created.id).await;

    // Expiry is checked before any passcode handling.
    assert!(matches!(
        relay.controller.retrieve(&created.id, Some("9137")).await,
        Err(ExchangeError::Expired)
    ));
}

#[tokio::test]
async fn store_ttl_reaps_records_independently() {
    let relay = TestRelay::new();
    let created = relay
        .controller
        .create(CreateExchange {
            expires_in_secs: Some(1),
            ..request(None)
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1_200)).await;

    // Once the store TTL lapses the record is simply gone; expiry and
    // absence are indistinguishable from the outside either way.
    assert!(matches!(
        relay.controller.retrieve(&created.id, None).await,
        Err(ExchangeError::NotFound) | Err(ExchangeError::Expired)
    ));
}
