//! Draft preview URL signing tests

use proptest::prelude::*;
use quire_core::signing::{DraftUrlSigner, MemorySecretStore, SecretStore};
use quire_core::PublishingConfig;

#[test]
fn test_non_ascii_query_round_trip() {
    let secrets = MemorySecretStore::new();
    let signer = DraftUrlSigner::new(&secrets, PublishingConfig::default());

    let signed = signer.sign("/search/?q=Eugène O'keeffe").unwrap();

    assert!(signer.verify(&signed));
    assert_eq!(signer.sign(&signed).unwrap(), signed);
}

#[test]
fn test_secret_is_persisted_under_configured_name() {
    let secrets = MemorySecretStore::new();
    let signer = DraftUrlSigner::new(&secrets, PublishingConfig::default());

    signer.sign("/").unwrap();

    let stored = secrets.get("DRAFT_SECRET_KEY").unwrap().unwrap();
    assert_eq!(stored.len(), 50);
    assert!(stored.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn test_secret_key_is_redacted_in_debug() {
    let secrets = MemorySecretStore::new();
    let signer = DraftUrlSigner::new(&secrets, PublishingConfig::default());
    let secret = signer.secret_key().unwrap();
    assert!(!format!("{:?}", secret).contains(secret.expose().as_str()));
}

#[test]
fn test_links_survive_new_signer_on_same_store() {
    let secrets = MemorySecretStore::new();
    let signed = DraftUrlSigner::new(&secrets, PublishingConfig::default())
        .sign("/about/")
        .unwrap();

    let fresh = DraftUrlSigner::new(&secrets, PublishingConfig::default());
    assert!(fresh.verify(&signed));
}

#[test]
fn test_custom_edit_param() {
    let secrets = MemorySecretStore::new();
    let config = PublishingConfig {
        edit_param: "preview".to_string(),
        ..PublishingConfig::default()
    };
    let signer = DraftUrlSigner::new(&secrets, config);

    let signed = signer.sign("/about/").unwrap();

    assert!(signed.contains("preview="));
    assert!(!signed.contains("edit="));
    assert!(signer.verify(&signed));
}

#[test]
fn test_salt_length_follows_config() {
    let secrets = MemorySecretStore::new();
    let signer = DraftUrlSigner::new(&secrets, PublishingConfig::default());
    let signed = signer.sign("/about/").unwrap();
    let token = signed.split("edit=").nth(1).unwrap();
    let (salt, signature) = token.split_once(':').unwrap();
    assert_eq!(salt.len(), 5);
    assert_eq!(signature.len(), 64);
}

proptest! {
    #[test]
    fn prop_sign_verify_round_trip(
        segments in proptest::collection::vec("[a-zA-Z0-9éèüß _-]{1,12}", 1..4),
        query in "[a-zA-Z0-9é ]{0,16}",
    ) {
        let secrets = MemorySecretStore::new();
        let signer = DraftUrlSigner::new(&secrets, PublishingConfig::default());
        let url = format!("/{}/?q={}", segments.join("/"), query);

        let signed = signer.sign(&url).unwrap();

        prop_assert!(signer.verify(&signed));
    }

    #[test]
    fn prop_token_is_bound_to_path(a in "[a-z]{1,10}", b in "[a-z]{1,10}") {
        prop_assume!(a != b);
        let secrets = MemorySecretStore::new();
        let signer = DraftUrlSigner::new(&secrets, PublishingConfig::default());

        let signed = signer.sign(&format!("/{}/", a)).unwrap();
        let (_, query) = signed.split_once('?').unwrap();

        let tampered = format!("/{}/?{}", b, query);
        prop_assert!(!signer.verify(&tampered));
    }
}
