//! Registry backend selection.

use std::sync::Arc;
use std::time::Duration;

use hn_membership::{RegistryClient, TcpRegistryClient};
use tracing::info;

use crate::container::{RegistryConfig, RegistryEndpoint};
use crate::runtime::StartupError;

/// Open the registry named by `config`.
///
/// The dev TCP registry is connectionless until the first request, so this
/// never fails for `tcp://` endpoints. etcd connects eagerly.
///
/// # Errors
///
/// - [`StartupError::BackendUnavailable`] for `etcd://` without the `etcd` feature
/// - [`StartupError::Registry`] if etcd cannot be reached
pub async fn open_registry(
    config: &RegistryConfig,
) -> Result<Arc<dyn RegistryClient>, StartupError> {
    match &config.endpoint {
        RegistryEndpoint::Tcp(addr) => {
            info!(endpoint = %addr, "Using dev TCP registry");
            Ok(Arc::new(TcpRegistryClient::new(
                addr.clone(),
                config.request_timeout,
            )))
        }
        RegistryEndpoint::Etcd(endpoints) => open_etcd(endpoints, config.request_timeout).await,
    }
}

/// Every etcd call is bounded by `timeout`, both inside the client and
/// around it.
#[cfg(feature = "etcd")]
async fn open_etcd(
    endpoints: &[String],
    timeout: Duration,
) -> Result<Arc<dyn RegistryClient>, StartupError> {
    info!(?endpoints, ?timeout, "Using etcd registry");
    let registry = hn_membership::EtcdRegistry::connect(endpoints.to_vec(), timeout).await?;
    Ok(Arc::new(hn_membership::TimeoutRegistry::new(
        registry,
        timeout,
        format!("etcd://{}", endpoints.join(",")),
    )))
}

#[cfg(not(feature = "etcd"))]
async fn open_etcd(
    _endpoints: &[String],
    _timeout: Duration,
) -> Result<Arc<dyn RegistryClient>, StartupError> {
    Err(StartupError::BackendUnavailable("etcd"))
}
