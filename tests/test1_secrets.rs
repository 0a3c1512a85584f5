mod common;

use common::{RecordingSecretStore, scenario_properties, scenario_secrets};
use pg_provisioner::prelude::*;
use pg_provisioner::secrets::{SecretRef, expand};

fn unresolved() -> UnresolvedConfig {
    UnresolvedConfig::decode(&scenario_properties()).unwrap()
}

#[tokio::test]
async fn resolves_user_then_super_user_password_with_decryption() {
    let store = scenario_secrets();
    let cancel = CancellationToken::new();

    let cfg = expand(&store, &cancel, unresolved()).await.unwrap();

    assert_eq!(
        store.calls(),
        vec![("/p/u".to_string(), true), ("/p/a".to_string(), true)]
    );
    assert_eq!(
        cfg,
        RuntimeConfig {
            database_name: "app".into(),
            user: UserConfig {
                name: "appuser".into(),
                password: "userpass".into(),
            },
            connection: ConnectionConfig {
                host: "db.local".into(),
                port: 5432,
                user: "admin".into(),
                password: "adminpass".into(),
            },
            extensions: vec!["uuid-ossp".into()],
        }
    );
}

#[tokio::test]
async fn missing_user_password_stops_before_second_lookup() {
    let store = RecordingSecretStore::with(&[("/p/a", "adminpass")]);
    let cancel = CancellationToken::new();

    let err = expand(&store, &cancel, unresolved()).await.unwrap_err();

    match err {
        ProvisionError::SecretResolution {
            reference,
            key,
            source,
        } => {
            assert_eq!(reference, SecretRef::UserPassword);
            assert_eq!(key, "/p/u");
            assert!(matches!(source, SecretStoreError::NotFound(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.calls().len(), 1);
}

#[tokio::test]
async fn missing_super_user_password_is_named() {
    let store = RecordingSecretStore::with(&[("/p/u", "userpass")]);
    let cancel = CancellationToken::new();

    let err = expand(&store, &cancel, unresolved()).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "loading parameter \"/p/a\" for the super user password failed"
    );
    assert!(matches!(
        err,
        ProvisionError::SecretResolution {
            reference: SecretRef::SuperUserPassword,
            ..
        }
    ));
    assert_eq!(store.calls().len(), 2);
}

#[tokio::test]
async fn cancelled_lookup_surfaces_as_secret_error() {
    let store = scenario_secrets();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = expand(&store, &cancel, unresolved()).await.unwrap_err();

    assert!(matches!(
        err,
        ProvisionError::SecretResolution {
            source: SecretStoreError::Cancelled,
            ..
        }
    ));
}
