use flock_domain::config::{
    AccountsConfig, ApiConfig, DatabaseConfig, FeedConfig, NotificationsConfig, ServerConfig,
};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 4583);
    assert!(server.ssl.is_none());

    let db = DatabaseConfig::default();
    assert_eq!(db.url, "mem://");
    assert_eq!(db.namespace, "flock");
    assert_eq!(db.database, "core");
    assert!(db.credentials.is_none());

    let accounts = AccountsConfig::default();
    assert_eq!(accounts.min_password_length, 8);

    let feed = FeedConfig::default();
    assert_eq!((feed.default_page_size, feed.max_page_size, feed.explore_limit), (10, 100, 50));

    let notifications = NotificationsConfig::default();
    assert_eq!(notifications.default_page_size, 20);
    assert_eq!(notifications.preview_length, 100);
}

#[test]
fn api_config_deserializes_partial_sections() {
    let raw = json!({
        "server": { "address": "::", "port": 8080 },
        "database": { "url": "mem://", "namespace": "n", "database": "d", "credentials": null },
        "logging": { "level": "debug", "json": true },
        "feed": { "explore_limit": 5 }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.database.namespace, "n");
    assert_eq!(cfg.logging.level, "debug");
    assert!(cfg.logging.json);
    assert_eq!(cfg.feed.explore_limit, 5);
    assert_eq!(cfg.feed.default_page_size, 10, "unset fields keep their defaults");
    assert_eq!(cfg.security.accounts.token_cache_capacity, 10_000);
}

#[test]
fn api_config_clone_on_write() {
    let original = ApiConfig::default();
    let mut tweaked = original.clone();
    tweaked.server.port = 9999;

    assert_eq!(original.server.port, 4583);
    assert_eq!(tweaked.server.port, 9999);
}
