use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::MetricsConfig;
use crate::observability::metrics::describe_all;

/// Install the Prometheus exporter when metrics are enabled.
pub fn init_metrics(config: &MetricsConfig) {
    if !config.enabled {
        return;
    }
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    info!(%addr, "installing Prometheus exporter");
    match builder.install() {
        Ok(()) => {
            let described = describe_all();
            info!(
                "Prometheus exporter listening on http://{}/metrics ({} metrics described)",
                addr, described
            );
        }
        Err(e) => {
            warn!("Prometheus exporter install failed (possibly already installed): {}", e);
        }
    }
}
