//! `flichub probe`: confirm the configured address belongs to the hub.

use serde::Serialize;

use flichub_core::{BridgeConfig, CompatibilityIssue, NetworkInfo};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ProbeReport {
    address: String,
    interface: &'static str,
    mac: String,
    buttons: usize,
    issues: Vec<CompatibilityIssue>,
}

/// Interface carrying `host`. Wifi wins when both report it.
fn interface_for(network: &NetworkInfo, host: &str) -> &'static str {
    let on_wifi = network
        .wifi
        .as_ref()
        .is_some_and(|w| w.ip.as_deref() == Some(host));
    if on_wifi { "wifi" } else { "ethernet" }
}

fn detail(report: &ProbeReport, color: bool) -> String {
    let mut lines = vec![format!(
        "{} hub at {} answers on {} (MAC {})",
        output::good("ok:", color),
        report.address,
        report.interface,
        report.mac
    )];
    lines.push(format!("   {} button(s) paired", report.buttons));
    for issue in &report.issues {
        lines.push(format!(
            "{} hub server {} does not match required {}",
            output::bad("warning:", color),
            issue.reported_version,
            issue.required_version
        ));
    }
    lines.join("\n")
}

pub async fn handle(config: BridgeConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let address = config.address.clone();
    let report = super::with_bridge(config, |bridge| async move {
        let mac = bridge.verify_address()?;
        let snapshot = bridge.snapshot();
        Ok(ProbeReport {
            address,
            interface: interface_for(&snapshot.network, bridge.config().host()),
            mac,
            buttons: snapshot.buttons.len(),
            issues: bridge.issues().issues(),
        })
    })
    .await?;

    let color = output::should_color(global.color);
    let rendered = output::render_single(global.output, &report, |r| detail(r, color), |r| r.mac.clone())?;
    output::print_output(&rendered, global.quiet)
}
