//! Lifecycle of the long-running parts of the adapter
//!
//! The event handler (and whatever the host adds next to it) registers here and
//! is started and stopped as a group. A service starts after everything it
//! [depends on](Service::dependencies); ties keep registration order. Stopping
//! walks the started services backwards.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Health status of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Result of a service health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServiceHealth {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Degraded,
            message: Some(message.into()),
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

/// Something with a background task or connection that the host controls.
///
/// Lifecycle logging goes through [tracing] with the service name as a field:
/// `info` for start/stop, `debug` for periodic work, `warn`/`error` for failures.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Unique name used in logs and for dependency references (e.g. "stump-events").
    fn name(&self) -> &str;

    /// Services that must be running before this one starts.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Must be idempotent.
    async fn start(&self) -> Result<()>;

    /// Must be idempotent.
    async fn stop(&self) -> Result<()>;

    async fn restart(&self) -> Result<()> {
        self.stop().await?;
        self.start().await
    }

    async fn health(&self) -> Result<ServiceHealth> {
        Ok(ServiceHealth::healthy())
    }
}

#[derive(Default)]
pub struct ServicesManager {
    /// In registration order
    services: RwLock<Vec<Arc<dyn Service>>>,
    /// Names in the order they were started
    running: RwLock<Vec<String>>,
}

impl ServicesManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service without starting it. A service registered under an
    /// existing name takes over that slot; the old instance is left as is.
    pub async fn register(&self, service: Arc<dyn Service>) {
        let name = service.name().to_string();
        let mut services = self.services.write().await;
        match services.iter().position(|s| s.name() == name) {
            Some(index) => {
                warn!(service = %name, "Replacing registered service");
                services[index] = service;
            }
            None => {
                debug!(service = %name, "Service registered");
                services.push(service);
            }
        }
    }

    /// Registered services ordered so that dependencies come first.
    async fn ordered(&self) -> Result<Vec<Arc<dyn Service>>> {
        let services = self.services.read().await.clone();
        let mut ordered = Vec::with_capacity(services.len());
        let mut placed = HashSet::new();
        let mut visiting = HashSet::new();
        for service in &services {
            visit(service, &services, &mut visiting, &mut placed, &mut ordered)?;
        }
        Ok(ordered)
    }

    /// Start every registered service. Stops at the first failure; services
    /// started before it keep running.
    pub async fn start_all(&self) -> Result<()> {
        for service in self.ordered().await? {
            let name = service.name().to_string();
            if self.is_started(&name).await {
                continue;
            }
            service
                .start()
                .await
                .with_context(|| format!("Failed to start service {name}"))?;
            info!(service = %name, "Service started");
            self.running.write().await.push(name);
        }
        Ok(())
    }

    /// Stop started services, most recently started first. A failed stop is
    /// logged and the rest are still stopped.
    pub async fn stop_all(&self) -> Result<()> {
        let running = std::mem::take(&mut *self.running.write().await);
        let services = self.services.read().await.clone();
        for name in running.iter().rev() {
            let Some(service) = services.iter().find(|s| s.name() == name) else {
                continue;
            };
            match service.stop().await {
                Ok(()) => info!(service = %name, "Service stopped"),
                Err(e) => warn!(service = %name, error = %e, "Failed to stop service"),
            }
        }
        Ok(())
    }

    /// Health of every registered service in registration order. A failing
    /// check is reported as [Unhealthy](HealthStatus::Unhealthy).
    pub async fn health_all(&self) -> Vec<(String, ServiceHealth)> {
        let services = self.services.read().await.clone();
        let mut report = Vec::with_capacity(services.len());
        for service in services {
            let health = service
                .health()
                .await
                .unwrap_or_else(|e| ServiceHealth::unhealthy(e.to_string()));
            report.push((service.name().to_string(), health));
        }
        report
    }

    pub async fn is_started(&self, name: &str) -> bool {
        self.running.read().await.iter().any(|n| n == name)
    }
}

fn visit(
    service: &Arc<dyn Service>,
    all: &[Arc<dyn Service>],
    visiting: &mut HashSet<String>,
    placed: &mut HashSet<String>,
    ordered: &mut Vec<Arc<dyn Service>>,
) -> Result<()> {
    let name = service.name().to_string();
    if placed.contains(&name) {
        return Ok(());
    }
    if !visiting.insert(name.clone()) {
        anyhow::bail!("Service dependency cycle through {name}");
    }
    for dependency in service.dependencies() {
        let target = all
            .iter()
            .find(|s| s.name() == dependency)
            .with_context(|| format!("Service {name} depends on unregistered {dependency}"))?;
        visit(target, all, visiting, placed, ordered)?;
    }
    visiting.remove(&name);
    placed.insert(name);
    ordered.push(service.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    struct Recorder {
        name: String,
        deps: Vec<String>,
        fail_start: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Service for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn dependencies(&self) -> Vec<String> {
            self.deps.clone()
        }

        async fn start(&self) -> Result<()> {
            if self.fail_start {
                anyhow::bail!("{} cannot start", self.name);
            }
            self.log.lock().push(format!("start {}", self.name));
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            self.log.lock().push(format!("stop {}", self.name));
            Ok(())
        }

        async fn health(&self) -> Result<ServiceHealth> {
            if self.name == "broken" {
                anyhow::bail!("no answer");
            }
            Ok(ServiceHealth::healthy())
        }
    }

    fn recorder(name: &str, deps: &[&str], log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Service> {
        Arc::new(Recorder {
            name: name.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            fail_start: false,
            log: log.clone(),
        })
    }

    #[tokio::test]
    async fn test_dependencies_start_first_and_stop_last() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager.register(recorder("events", &["client"], &log)).await;
        manager.register(recorder("client", &[], &log)).await;

        manager.start_all().await.unwrap();
        assert!(manager.is_started("events").await);
        manager.stop_all().await.unwrap();
        assert!(!manager.is_started("events").await);

        assert_eq!(
            *log.lock(),
            vec!["start client", "start events", "stop events", "stop client"]
        );
    }

    #[tokio::test]
    async fn test_unknown_dependency_and_cycles_are_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager.register(recorder("events", &["missing"], &log)).await;
        assert!(manager.start_all().await.is_err());

        let manager = ServicesManager::new();
        manager.register(recorder("a", &["b"], &log)).await;
        manager.register(recorder("b", &["a"], &log)).await;
        let err = manager.start_all().await.unwrap_err();
        assert!(err.to_string().contains("cycle"));

        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_start_keeps_earlier_services_running() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager.register(recorder("client", &[], &log)).await;
        manager
            .register(Arc::new(Recorder {
                name: "events".to_string(),
                deps: vec!["client".to_string()],
                fail_start: true,
                log: log.clone(),
            }))
            .await;

        assert!(manager.start_all().await.is_err());
        assert!(manager.is_started("client").await);
        assert!(!manager.is_started("events").await);

        manager.stop_all().await.unwrap();
        assert_eq!(*log.lock(), vec!["start client", "stop client"]);
    }

    #[tokio::test]
    async fn test_health_all_reports_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager.register(recorder("client", &[], &log)).await;
        manager.register(recorder("broken", &[], &log)).await;

        let health = manager.health_all().await;
        assert_eq!(health[0], ("client".to_string(), ServiceHealth::healthy()));
        assert_eq!(health[1].0, "broken");
        assert_eq!(health[1].1.status, HealthStatus::Unhealthy);
    }
}
