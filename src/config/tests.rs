use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.cache.health_ttl_ms = Some(5_000);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        cache_health_ttl_ms: Some(1_000),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.cache.health_ttl, Duration::from_millis(1_000));
}

#[test]
fn cache_defaults_match_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.cache.results_enabled);
    assert_eq!(settings.cache.results_stale_time, Duration::from_secs(86_400));
    assert_eq!(settings.cache.health_ttl, Duration::from_millis(180_000));
}

#[test]
fn zero_health_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.health_ttl_ms = Some(0);

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "cache.health_ttl_ms"),
        other => panic!("expected invalid health ttl, got {other:?}"),
    }
}

#[test]
fn zero_results_stale_time_is_accepted() {
    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&ServeOverrides {
        cache_results_stale_time_seconds: Some(0),
        ..Default::default()
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.results_stale_time, Duration::ZERO);

    let config = crate::cache::CacheConfig::from(&settings.cache);
    let gate = crate::cache::FreshnessGate::from(&config);
    assert_eq!(gate.buffer_ms(), 0);
}

#[test]
fn store_keys_are_not_part_of_deployment_settings() {
    let raw: RawSettings = Config::builder()
        .set_override("cache.store_sweep_interval_ms", 0)
        .expect("override")
        .build()
        .expect("build")
        .try_deserialize()
        .expect("deserialize");

    let settings = Settings::from_raw(raw).expect("unknown cache keys are ignored");
    assert_eq!(settings.cache.health_ttl, Duration::from_millis(180_000));
}

#[test]
fn results_cache_can_be_disabled_via_cli() {
    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&ServeOverrides {
        cache_results_enabled: Some(false),
        ..Default::default()
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(!settings.cache.results_enabled);
}

#[test]
fn site_mode_and_install_type_are_parsed() {
    let mut raw = RawSettings::default();
    raw.site.mode = Some("cloud_beta".to_string());
    raw.site.install_type = Some("heroku".to_string());
    raw.site.url = Some("https://app.example.test/".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.site.mode, Mode::CloudBeta);
    assert_eq!(settings.site.install_type, InstallType::Heroku);
    assert_eq!(settings.site.url, "https://app.example.test");
}

#[test]
fn unknown_site_mode_is_rejected() {
    let mut raw = RawSettings::default();
    raw.site.mode = Some("staging".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "site.mode",
            ..
        })
    ));
}

#[test]
fn blank_pylon_values_are_treated_as_absent() {
    let mut raw = RawSettings::default();
    raw.pylon.app_id = Some("  ".to_string());
    raw.pylon.identity_verification_secret = Some("deadbeef".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.pylon.app_id.is_none());
    assert_eq!(
        settings.pylon.identity_verification_secret.as_deref(),
        Some("deadbeef")
    );
}

#[test]
fn pylon_secret_is_redacted_in_debug_output() {
    let pylon = PylonSettings {
        app_id: Some("app".to_string()),
        identity_verification_secret: Some("deadbeef".to_string()),
    };
    let rendered = format!("{pylon:?}");
    assert!(!rendered.contains("deadbeef"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
fn invalid_port_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);

    let err = Settings::from_raw(raw).expect_err("port zero");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "server.port",
            ..
        }
    ));
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "logging.level",
            ..
        })
    ));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "freshgate",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--cache-results-enabled",
        "false",
        "--site-mode",
        "demo",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(serve.overrides.cache_results_enabled, Some(false));
            assert_eq!(serve.overrides.site_mode.as_deref(), Some("demo"));
        }
    }
}
