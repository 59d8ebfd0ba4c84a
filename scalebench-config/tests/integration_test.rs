//! Integration tests for scalebench-config

use scalebench_config::*;
use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;

#[test]
fn test_default_config_validation() {
    let config = BenchConfig::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("SCALEBENCH_LOG_LEVEL", Some("debug")),
        ("SCALEBENCH_NAMESPACE", Some("bench")),
        ("SCALEBENCH_RESOLVABLE_DOMAIN", Some("true")),
        ("SCALEBENCH_PROBE_MAX_RETRIES", Some("7")),
        ("SCALEBENCH_LOAD_TOOL", Some("hey")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.cluster.namespace.as_deref(), Some("bench"));
        assert!(config.cluster.resolvable_domain);
        assert_eq!(config.probe.max_retries, 7);
        assert_eq!(config.load.tool, "hey");
    });
}

#[test]
fn test_invalid_env_override() {
    with_vars(vec![("SCALEBENCH_GENERATE_CONCURRENCY", Some("many"))], || {
        let result = ConfigLoader::new().from_env();
        assert!(matches!(result, Err(ConfigError::EnvError(_))));
    });
}

#[test]
fn test_unsupported_tool_from_env_fails_validation() {
    with_vars(vec![("SCALEBENCH_LOAD_TOOL", Some("ab"))], || {
        let result = ConfigLoader::new().from_env();
        assert!(matches!(result, Err(ConfigError::DomainError { .. })));
    });
}

#[test]
fn test_yaml_config_roundtrip() {
    let yaml = BenchConfig::generate_sample();
    let parsed: BenchConfig = serde_yaml::from_str(&yaml).unwrap();
    assert!(parsed.validate_all().is_ok());
}

#[test]
fn test_comprehensive_config_file() {
    let yaml = r#"
cluster:
  namespace_prefix: testns
  namespace_range: "1,4"
  service_prefix: svc
  resolvable_domain: false
  ingress:
    namespace: kourier-system
    service: kourier
    pod_selector: app=3scale-kourier-gateway
    port_name: http2

generate:
  count: 8
  batch_size: 2
  interval: 1s
  concurrency: 2
  wait_ready: true
  ready_timeout: 2m
  failure_policy: best_effort

probe:
  max_retries: 5
  request_interval: 250ms
  request_timeout: 30s
  settle: 2s

load:
  tool: wrk
  rate: 200
  workers: 4
  duration: 1m

logging:
  level: warn
  format: json
"#;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    with_vars(vec![("SCALEBENCH_LOG_LEVEL", None::<&str>)], || {
        let config = ConfigLoader::new().from_file(file.path()).unwrap();

        assert_eq!(
            config.cluster.target_namespaces().unwrap(),
            vec!["testns-1", "testns-2", "testns-3", "testns-4"]
        );
        assert_eq!(config.cluster.ingress.service, "kourier");
        assert_eq!(config.generate.interval, Duration::from_secs(1));
        assert_eq!(config.generate.ready_timeout, Duration::from_secs(120));
        assert_eq!(config.generate.failure_policy, FailurePolicy::BestEffort);
        assert_eq!(config.probe.request_interval, Duration::from_millis(250));
        assert_eq!(config.load.tool, "wrk");
        assert_eq!(config.load.duration, Duration::from_secs(60));
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.logging.format, LogFormat::Json);
    });
}

#[test]
fn test_malformed_range_in_file() {
    let yaml = r#"
cluster:
  namespace_prefix: testns
  namespace_range: "ten,twenty"
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    with_vars(vec![("SCALEBENCH_GENERATE_CONCURRENCY", None::<&str>)], || {
        let result = ConfigLoader::new().from_file(file.path());
        assert!(matches!(result, Err(ConfigError::InvalidRange { .. })));
    });
}
