//! Target cluster configuration

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::range::parse_range;
use crate::validation::{validate_enum_choice, validate_required_string, Validatable};

/// Where workloads live and how to reach them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Single target namespace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Prefix for ranged namespaces (`<prefix>-<i>`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_prefix: Option<String>,

    /// Inclusive `start,end` range of namespace suffixes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_range: Option<String>,

    /// Workload name prefix (`<prefix>-<index>`)
    #[serde(default = "default_service_prefix")]
    pub service_prefix: String,

    /// Whether workload URLs resolve through DNS from where scalebench runs
    #[serde(default)]
    pub resolvable_domain: bool,

    /// Ingress gateway used when domains are not resolvable
    #[serde(default)]
    pub ingress: IngressConfig,
}

/// Ingress gateway lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    #[serde(default = "default_ingress_namespace")]
    pub namespace: String,

    /// Name of the gateway service
    #[serde(default = "default_ingress_service")]
    pub service: String,

    /// Label selector for the gateway pods
    #[serde(default = "default_ingress_pod_selector")]
    pub pod_selector: String,

    /// Name of the service port to use for node-port access
    #[serde(default = "default_ingress_port_name")]
    pub port_name: String,

    #[serde(default = "default_scheme")]
    pub scheme: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            namespace_prefix: None,
            namespace_range: None,
            service_prefix: default_service_prefix(),
            resolvable_domain: false,
            ingress: IngressConfig::default(),
        }
    }
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            namespace: default_ingress_namespace(),
            service: default_ingress_service(),
            pod_selector: default_ingress_pod_selector(),
            port_name: default_ingress_port_name(),
            scheme: default_scheme(),
        }
    }
}

impl ClusterConfig {
    /// Resolve the namespaces a command operates on.
    ///
    /// A namespace range wins over a single namespace. Having neither is an
    /// error.
    pub fn target_namespaces(&self) -> ConfigResult<Vec<String>> {
        match (&self.namespace_range, &self.namespace_prefix, &self.namespace) {
            (Some(range), Some(prefix), _) => Ok(parse_range(range)?
                .map(|i| format!("{}-{}", prefix, i))
                .collect()),
            (Some(_), None, _) => Err(self.validation_error("namespace_range requires namespace_prefix")),
            (None, _, Some(ns)) if !ns.is_empty() => Ok(vec![ns.clone()]),
            _ => Err(ConfigError::DomainError {
                domain: self.domain_name().to_string(),
                message: "either namespace or namespace_prefix with namespace_range must be set"
                    .to_string(),
            }),
        }
    }
}

impl Validatable for ClusterConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.service_prefix, "service_prefix", self.domain_name())?;

        if let Some(ref range) = self.namespace_range {
            parse_range(range)?;
            if self.namespace_prefix.as_deref().map_or(true, str::is_empty) {
                return Err(self.validation_error("namespace_range requires namespace_prefix"));
            }
        }

        self.ingress.validate()
    }

    fn domain_name(&self) -> &'static str {
        "cluster"
    }
}

impl Validatable for IngressConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.namespace, "namespace", self.domain_name())?;
        validate_required_string(&self.service, "service", self.domain_name())?;
        validate_required_string(&self.pod_selector, "pod_selector", self.domain_name())?;
        validate_required_string(&self.port_name, "port_name", self.domain_name())?;
        validate_enum_choice(&self.scheme, &["http", "https"], "scheme", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "cluster.ingress"
    }
}

// Default value functions
fn default_service_prefix() -> String {
    "ksvc".to_string()
}

fn default_ingress_namespace() -> String {
    "istio-system".to_string()
}

fn default_ingress_service() -> String {
    "istio-ingressgateway".to_string()
}

fn default_ingress_pod_selector() -> String {
    "istio=ingressgateway".to_string()
}

fn default_ingress_port_name() -> String {
    "http2".to_string()
}

fn default_scheme() -> String {
    "http".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_config_defaults() {
        let config = ClusterConfig::default();
        assert_eq!(config.service_prefix, "ksvc");
        assert_eq!(config.ingress.service, "istio-ingressgateway");
        assert_eq!(config.ingress.port_name, "http2");
        assert!(!config.resolvable_domain);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_target_namespaces() {
        let mut config = ClusterConfig {
            namespace: Some("bench".to_string()),
            ..Default::default()
        };
        assert_eq!(config.target_namespaces().unwrap(), vec!["bench"]);

        config.namespace_prefix = Some("testns".to_string());
        config.namespace_range = Some("1,3".to_string());
        assert_eq!(
            config.target_namespaces().unwrap(),
            vec!["testns-1", "testns-2", "testns-3"]
        );

        assert!(ClusterConfig::default().target_namespaces().is_err());
    }

    #[test]
    fn test_range_without_prefix_is_invalid() {
        let config = ClusterConfig {
            namespace_range: Some("1,3".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(config.target_namespaces().is_err());
    }

    #[test]
    fn test_malformed_range_is_invalid() {
        let config = ClusterConfig {
            namespace_prefix: Some("testns".to_string()),
            namespace_range: Some("3-1".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRange { .. })));
    }
}
