//! `flichub snapshot`: one refresh, rendered.

use tabled::Tabled;

use flichub_core::{ButtonState, NetworkInfo};

use crate::cli::{GlobalOpts, OutputFormat, SnapshotArgs};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ButtonRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Connected")]
    connected: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Battery")]
    battery: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
    #[tabled(rename = "Last click")]
    click: String,
}

fn row(b: &&ButtonState) -> ButtonRow {
    ButtonRow {
        serial: b.serial_number.to_string(),
        name: output::or_dash(b.name.as_deref()),
        connected: yes_no(b.connected),
        ready: yes_no(b.ready),
        battery: b.battery_status.map_or_else(|| "-".into(), |p| format!("{p}%")),
        firmware: b.firmware_version.map_or_else(|| "-".into(), |v| v.to_string()),
        click: match (b.click_type, b.active) {
            (Some(t), true) => format!("{t} (pressed)"),
            (Some(t), false) => t.to_string(),
            (None, true) => "(pressed)".into(),
            (None, false) => "-".into(),
        },
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.into()
}

fn network_detail(network: &NetworkInfo, color: bool) -> String {
    let mut lines = Vec::new();

    match &network.wifi {
        Some(wifi) => {
            let state = if wifi.connected {
                output::good("connected", color)
            } else {
                output::bad("disconnected", color)
            };
            lines.push(format!("Wifi:      {state}"));
            lines.push(format!("  SSID:    {}", output::or_dash(wifi.ssid.as_deref())));
            lines.push(format!("  IP:      {}", output::or_dash(wifi.ip.as_deref())));
            lines.push(format!("  MAC:     {}", output::or_dash(wifi.mac.as_deref())));
        }
        None => lines.push(format!("Wifi:      {}", output::muted("not reported", color))),
    }

    match &network.ethernet {
        Some(eth) => {
            let state = if eth.connected {
                output::good("connected", color)
            } else {
                output::bad("disconnected", color)
            };
            lines.push(format!("Ethernet:  {state}"));
            lines.push(format!("  IP:      {}", output::or_dash(eth.ip.as_deref())));
            lines.push(format!("  MAC:     {}", output::or_dash(eth.mac.as_deref())));
        }
        None => lines.push(format!("Ethernet:  {}", output::muted("not reported", color))),
    }

    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: flichub_core::BridgeConfig,
    args: &SnapshotArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = super::with_bridge(config, |bridge| async move { Ok(bridge.snapshot()) }).await?;
    let buttons: Vec<&ButtonState> = snapshot.buttons.values().collect();
    let format = global.output;

    let rendered = match format {
        OutputFormat::Table => {
            let mut out = output::render_list(format, &buttons, row, serial)?;
            if !args.buttons_only {
                out.push_str("\n\n");
                out.push_str(&network_detail(&snapshot.network, output::should_color(global.color)));
            }
            out
        }
        _ if args.buttons_only || format == OutputFormat::Plain => {
            output::render_list(format, &buttons, row, serial)?
        }
        _ => output::render_single(format, snapshot.as_ref(), |_| String::new(), |_| String::new())?,
    };

    output::print_output(&rendered, global.quiet)
}

fn serial(b: &&ButtonState) -> String {
    b.serial_number.to_string()
}
