use super::*;

#[test]
fn test_validate_default_config() {
    let result = ConfigValidator::validate(&Config::default());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_debounce_out_of_range_is_error() {
    let mut config = Config::default();
    config.monitor.debounce_ms = 50;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "monitor.debounce_ms"));
}

#[test]
fn test_debounce_outside_recommended_is_warning() {
    let mut config = Config::default();
    config.monitor.debounce_ms = 2000;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "monitor.debounce_ms"));
}

#[test]
fn test_zero_panel_timeout() {
    let mut config = Config::default();
    config.resolver.panel_timeout_ms = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "resolver.panel_timeout_ms"));
}

#[test]
fn test_introspection_depth_bounds() {
    let mut config = Config::default();
    config.resolver.introspection_depth = 0;
    assert!(!ConfigValidator::validate(&config).is_valid());

    config.resolver.introspection_depth = 17;
    assert!(!ConfigValidator::validate(&config).is_valid());

    config.resolver.introspection_depth = 16;
    assert!(ConfigValidator::validate(&config).is_valid());
}

#[test]
fn test_empty_endpoint() {
    let mut config = Config::default();
    config.browser.endpoint = "  ".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "browser.endpoint"));
}

#[test]
fn test_endpoint_scheme() {
    let mut config = Config::default();
    config.browser.endpoint = "localhost:9222".to_string();
    assert!(!ConfigValidator::validate(&config).is_valid());
}

#[test]
fn test_into_result() {
    let mut config = Config::default();
    config.resolver.panel_timeout_ms = 0;

    let err = ConfigValidator::validate(&config).into_result().unwrap_err();
    assert!(err.to_string().contains("resolver.panel_timeout_ms"));

    config.resolver.panel_timeout_ms = 1500;
    config.monitor.debounce_ms = 300;
    let warnings = ConfigValidator::validate(&config).into_result().unwrap();
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_validation_result_default() {
    let result = ValidationResult::default();
    assert!(result.is_valid());
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}
