// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

pub const NOTES_PROCESSED: &str = "xdl_notes_processed_total";
pub const MEDIA_DOWNLOADED: &str = "xdl_media_downloaded_total";
pub const MEDIA_FAILED: &str = "xdl_media_failed_total";
pub const RUNS: &str = "xdl_runs_total";

/// 注册指标说明
pub fn describe_metrics() {
    describe_counter!(NOTES_PROCESSED, "Notes fully processed by download runs");
    describe_counter!(MEDIA_DOWNLOADED, "Media downloads started, by kind");
    describe_counter!(MEDIA_FAILED, "Media downloads rejected, by kind");
    describe_counter!(RUNS, "Finished download runs, by terminal status");
}

/// 安装 Prometheus 导出器
pub fn init_metrics(addr: SocketAddr) {
    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}
