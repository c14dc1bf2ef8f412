use std::time::Duration;

use docket::presentation::{Environment, Settings};

#[test]
fn given_valid_names_when_parsing_environment_then_matches_case_insensitively() {
    assert_eq!(Environment::try_from("local".to_string()), Ok(Environment::Local));
    assert_eq!(Environment::try_from("TEST".to_string()), Ok(Environment::Test));
    assert_eq!(Environment::try_from("production".to_string()), Ok(Environment::Prod));
}

#[test]
fn given_unknown_name_when_parsing_environment_then_returns_error() {
    let err = Environment::try_from("staging".to_string()).unwrap_err();
    assert!(err.contains("staging"));
}

#[test]
fn given_no_settings_file_when_loading_then_defaults_apply() {
    let settings = Settings::load(Environment::Test).unwrap();

    assert_eq!(settings.server.port, 3000);
    assert_eq!(settings.processing.retry.max_attempts, 3);
    assert_eq!(settings.processing.timeout(), Duration::from_secs(30));
    assert_eq!(settings.callback.timeout(), Duration::from_secs(10));
    assert_eq!(settings.callback.relay_grace(), Duration::from_secs(60));
    assert_eq!(settings.worker.concurrency, 8);
    assert!(settings.worker.queue_capacity > 0);
}

#[test]
fn given_retry_settings_when_building_policy_then_values_carry_over() {
    let settings = Settings::load(Environment::Test).unwrap();

    let policy = settings.callback.retry.policy();

    assert_eq!(policy.max_attempts(), settings.callback.retry.max_attempts);
    assert_eq!(
        policy.backoff_for(1),
        Duration::from_millis(settings.callback.retry.initial_backoff_ms)
    );
}

#[test]
fn given_environment_when_naming_settings_file_then_uses_lowercase_name() {
    assert_eq!(Environment::Local.settings_file(), "appsettings.local");
    assert_eq!(Environment::Prod.settings_file(), "appsettings.prod");
}

#[test]
fn given_no_settings_file_when_loading_then_database_connect_retry_has_defaults() {
    let settings = Settings::load(Environment::Test).unwrap();

    let policy = settings.database.connect_retry.policy();

    assert_eq!(policy.max_attempts(), 6);
    assert_eq!(policy.backoff_for(1), Duration::from_millis(500));
    assert_eq!(policy.backoff_for(10), Duration::from_secs(8));
    assert!(settings.database.run_migrations);
}
