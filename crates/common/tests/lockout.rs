use common::exchange::{CreateExchange, ExchangeError, MAX_ATTEMPTS};
use common::store::{BlobStore, MetadataStore};
use common::testkit::{envelope, TestRelay};

async fn protected_exchange(relay: &TestRelay) -> common::prelude::ExchangeId {
    relay
        .controller
        .create(CreateExchange {
            ciphertext: envelope(),
            passcode: Some("9137".to_string()),
            generate_passcode: false,
            label: None,
            expires_in_secs: None,
            proof: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn remaining_attempts_strictly_decrease_until_lockout() {
    let relay = TestRelay::new();
    let id = protected_exchange(&relay).await;

    for n in 1..MAX_ATTEMPTS {
        match relay.controller.retrieve(&id, Some("0000")).await {
            Err(ExchangeError::InvalidPasscode { remaining }) => {
                assert_eq!(remaining, MAX_ATTEMPTS - n)
            }
            other => panic!("attempt {}: expected InvalidPasscode, got {:?}", n, other.err()),
        }
    }

    // The exhausting attempt reports the lockout itself.
    assert!(matches!(
        relay.controller.retrieve(&id, Some("0000")).await,
        Err(ExchangeError::Locked)
    ));
}

#[tokio::test]
async fn lockout_deletes_blob_but_leaves_record_to_its_ttl() {
    let relay = TestRelay::new();
    let id = protected_exchange(&relay).await;

    for _ in 0..MAX_ATTEMPTS {
        let _ = relay.controller.retrieve(&id, Some("0000")).await;
    }

    // Blob gone, record retained with an exhausted counter.
    assert!(relay.blobs.get(&id).await.unwrap().is_none());
    let record = relay.metadata.get(&id).await.unwrap().unwrap();
    assert_eq!(record.attempts, MAX_ATTEMPTS);
}

#[tokio::test]
async fn locked_exchange_rejects_the_correct_passcode() {
    let relay = TestRelay::new();
    let id = protected_exchange(&relay).await;

    for _ in 0..MAX_ATTEMPTS {
        let _ = relay.controller.retrieve(&id, Some("0000")).await;
    }

    // Even the right passcode cannot reopen a locked exchange.
    assert!(matches!(
        relay.controller.retrieve(&id, Some("9137")).await,
        Err(ExchangeError::Locked)
    ));

    // That read-time lockout detection purged both artifacts.
    assert!(relay.metadata.get(&id).await.unwrap().is_none());
    assert!(matches!(
        relay.controller.retrieve(&id, Some("9137")).await,
        Err(ExchangeError::NotFound)
    ));
}
