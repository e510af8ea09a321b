//! `flichub watch`: stream bridge events until Ctrl-C or link loss.

use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use flichub_api::TcpLink;
use flichub_core::{Bridge, BridgeConfig, BridgeEvent, ConnectionState};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::{self, CliError};
use crate::output;

/// Which events to print.
struct Filter<'a> {
    serials: &'a [String],
    clicks_only: bool,
}

impl Filter<'_> {
    fn accepts(&self, event: &BridgeEvent) -> bool {
        if self.clicks_only && !matches!(event, BridgeEvent::Click { .. }) {
            return false;
        }
        if self.serials.is_empty() {
            return true;
        }
        event
            .serial_number()
            .is_some_and(|s| self.serials.iter().any(|wanted| wanted == s.as_str()))
    }
}

/// One human-readable line, prefixed with local time.
fn describe(event: &BridgeEvent, color: bool) -> String {
    let body = match event {
        BridgeEvent::Click {
            serial_number,
            name,
            action,
        } => {
            let who = name
                .as_deref()
                .map_or_else(|| serial_number.to_string(), |n| format!("{serial_number} ({n})"));
            format!("click    {who}  {}", output::good(action, color))
        }
        BridgeEvent::StateChanged {
            serial_number,
            active,
            click_type,
        } => format!(
            "state    {serial_number}  active={active} click={}",
            click_type.map_or_else(|| "-".into(), |t| t.to_string())
        ),
        BridgeEvent::FieldChanged { field } => format!("update   {field}"),
        BridgeEvent::Refreshed { buttons } => format!("refresh  {buttons} button(s)"),
    };
    let time = chrono::Local::now().format("%H:%M:%S").to_string();
    format!("{}  {body}", output::muted(&time, color))
}

fn render(event: &BridgeEvent, format: OutputFormat, color: bool) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json_compact(event),
        OutputFormat::Yaml => Ok(format!("---\n{}", output::render_yaml(event)?)),
        OutputFormat::Table | OutputFormat::Plain => Ok(describe(event, color)),
    }
}

pub async fn handle(config: BridgeConfig, args: &WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let address = config.address.clone();
    let link = TcpLink::new(config.request_timeout);
    let bridge = Bridge::new(config, link);

    // Subscribe first so the initial refresh is reported too.
    let mut events = bridge.events();
    bridge.setup().await.map_err(error::at_address(&address))?;
    let mut connection = bridge.watch_connection();

    if !global.quiet {
        eprintln!("watching {address}, press Ctrl-C to stop");
    }

    let filter = Filter {
        serials: &args.serial,
        clicks_only: args.clicks_only,
    };
    let color = output::should_color(global.color);

    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            _ = connection.wait_for(|s| *s != ConnectionState::Ready) => {
                break Err(CliError::Disconnected);
            }
            next = events.recv() => match next {
                Ok(event) if filter.accepts(&event) => {
                    let printed = render(&event, global.output, color)
                        .and_then(|line| output::print_output(&line, global.quiet));
                    if let Err(e) = printed {
                        break Err(e);
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break Err(CliError::Disconnected),
            },
        }
    };

    bridge.shutdown().await;
    result
}
