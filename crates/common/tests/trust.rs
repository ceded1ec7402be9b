use axum::routing::get;
use axum::{Json, Router};
use tokio::task::JoinHandle;

use common::exchange::{CreateExchange, ExchangeError, TrustTier};
use common::store::MetadataStore;
use common::testkit::{envelope, envelope_exact_len, TestIssuer, TestRelay};

fn request(ciphertext: String, proof: Option<String>) -> CreateExchange {
    CreateExchange {
        ciphertext,
        passcode: None,
        generate_passcode: false,
        label: None,
        expires_in_secs: None,
        proof,
    }
}

/// Serve `doc` as the key set for `issuer` on an ephemeral local port,
/// returning the directory base address and the server task handle.
async fn spawn_directory(
    issuer: &str,
    doc: serde_json::Value,
) -> (String, JoinHandle<()>) {
    let router = Router::new().route(
        &format!("/{}/jwks.json", issuer),
        get(move || {
            let doc = doc.clone();
            async move { Json(doc) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), handle)
}

#[tokio::test]
async fn unreachable_directory_degrades_creation_to_untrusted() {
    // The testkit gateway refuses connections; a structurally valid proof
    // cannot complete its verification chain.
    let relay = TestRelay::new();
    let header = common::envelope::base64url_encode(br#"{"alg":"ES256"}"#);
    let payload = common::envelope::base64url_encode(br#"{"iss":"sender.example","sub":"x"}"#);
    let proof = format!("{}.{}.{}", header, payload, "AAAA");

    let created = relay
        .controller
        .create(request(envelope(), Some(proof)))
        .await
        .unwrap();

    // Creation still succeeds, just at the untrusted tier, and no issuer
    // leaks into the response or the record.
    assert!(!created.trusted);
    assert!(created.issuer.is_none());

    let record = relay.metadata.get(&created.id).await.unwrap().unwrap();
    assert!(!record.trusted);
    assert!(record.issuer.is_none());
}

#[tokio::test]
async fn malformed_proof_never_aborts_creation() {
    let relay = TestRelay::new();
    let created = relay
        .controller
        .create(request(envelope(), Some("garbage".to_string())))
        .await
        .unwrap();
    assert!(!created.trusted);
}

#[tokio::test]
async fn verified_proof_yields_trusted_exchange() {
    let issuer = TestIssuer::new();
    let (gateway, _server) = spawn_directory("sender.example", issuer.key_set_document()).await;
    let relay = TestRelay::with_gateway(&gateway);

    let ciphertext = envelope();
    let proof = issuer.sign_proof("sender.example", &ciphertext);
    let created = relay
        .controller
        .create(request(ciphertext, Some(proof)))
        .await
        .unwrap();

    assert!(created.trusted);
    assert_eq!(created.issuer.as_deref(), Some("sender.example"));

    let record = relay.metadata.get(&created.id).await.unwrap().unwrap();
    assert!(record.trusted);
    assert_eq!(record.issuer.as_deref(), Some("sender.example"));
}

#[tokio::test]
async fn trusted_size_bound_is_exact() {
    let issuer = TestIssuer::new();
    let (gateway, _server) = spawn_directory("sender.example", issuer.key_set_document()).await;
    let relay = TestRelay::with_gateway(&gateway);
    let limit = TrustTier::Trusted.max_payload_bytes();

    // Exactly at the trusted bound succeeds.
    let at_limit = envelope_exact_len(limit);
    let proof = issuer.sign_proof("sender.example", &at_limit);
    let created = relay
        .controller
        .create(request(at_limit, Some(proof)))
        .await
        .unwrap();
    assert!(created.trusted);

    // One byte over fails with the trusted tier's limit, not the
    // untrusted one.
    let over_limit = envelope_exact_len(limit + 1);
    let proof = issuer.sign_proof("sender.example", &over_limit);
    let result = relay.controller.create(request(over_limit, Some(proof))).await;
    match result {
        Err(ExchangeError::PayloadTooLarge { tier, limit: l }) => {
            assert_eq!(tier, TrustTier::Trusted);
            assert_eq!(l, limit);
        }
        other => panic!("expected PayloadTooLarge, got {:?}", other.map(|c| c.id)),
    }
}

#[tokio::test]
async fn key_set_is_cached_across_creations() {
    let issuer = TestIssuer::new();
    let (gateway, server) = spawn_directory("sender.example", issuer.key_set_document()).await;
    let relay = TestRelay::with_gateway(&gateway);

    let first = envelope();
    let proof = issuer.sign_proof("sender.example", &first);
    let created = relay
        .controller
        .create(request(first, Some(proof)))
        .await
        .unwrap();
    assert!(created.trusted);

    // Take the directory down; the cached key set keeps verifying.
    server.abort();
    let _ = server.await;
    let second = common::testkit::envelope_of_len(128);
    let proof = issuer.sign_proof("sender.example", &second);
    let created = relay
        .controller
        .create(request(second, Some(proof)))
        .await
        .unwrap();
    assert!(created.trusted);
}

#[tokio::test]
async fn failed_verification_applies_untrusted_limits() {
    let relay = TestRelay::new();
    let over_untrusted = envelope_exact_len(TrustTier::Untrusted.max_payload_bytes() + 1);

    // A rejected proof classifies the exchange as untrusted, so the small
    // size bound applies even though a proof was attached.
    let result = relay
        .controller
        .create(request(over_untrusted, Some("garbage".to_string())))
        .await;
    assert!(matches!(
        result,
        Err(ExchangeError::PayloadTooLarge {
            tier: TrustTier::Untrusted,
            ..
        })
    ));
}
