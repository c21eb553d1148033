//! Process-wide registry lifecycle.
//!
//! Kept in its own test binary, as a single test, because it mutates the
//! process-wide registry.

use std::sync::Arc;

use telegramity::{ClientConfig, Error, close_global, global, init_global, try_global};

#[test]
fn test_global_registry_lifecycle() {
    // Closing before any init is a no-op.
    assert!(close_global().is_ok());

    // A failed init leaves the registry unusable.
    let err = init_global(ClientConfig::builder("", 123456789).build()).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(try_global().is_err());
    assert!(std::panic::catch_unwind(global).is_err());

    // Until it is reset.
    close_global().unwrap();
    assert!(matches!(try_global(), Err(Error::NotInitialized)));

    let config = ClientConfig::builder("123456:ABC-DEF", 123456789)
        .environment("test_env")
        .app_info("TestApp", "1.0.0")
        .build();
    let first = init_global(config.clone()).unwrap();
    let again = init_global(config.clone()).unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert!(Arc::ptr_eq(&first, &global()));
    assert_eq!(global().config().environment, "test_env");

    close_global().unwrap();
    assert!(first.is_closed());
    assert!(matches!(try_global(), Err(Error::NotInitialized)));

    let fresh = init_global(config).unwrap();
    assert!(!Arc::ptr_eq(&first, &fresh));
    close_global().unwrap();
}
