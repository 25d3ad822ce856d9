//! Status-Line Shell
//!
//! Terminal stand-in for the button panel: one line of input is one click,
//! one line of output is one result. Input handling and result display share
//! a single `select!` loop; the network work itself runs on spawned tasks, so
//! the loop never waits on a request.

use crate::config::DevicePanel;
use switchbot_cloud::dispatcher::Completion;
use switchbot_cloud::Dispatcher;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub const READY: &str = "SwitchBot Controller Ready";

const HELP: &str = "Commands: <device #|name> <action>  (e.g. `1 on`, `Desk Lamp off`), list, help, quit";

/// One parsed line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Trigger { device: String, action: String },
    List,
    Help,
    Quit,
    Empty,
}

/// `<device> <action>`; the action is the last word so names may contain spaces
pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => return Input::Empty,
        "list" | "ls" => return Input::List,
        "help" | "?" => return Input::Help,
        "quit" | "exit" | "q" => return Input::Quit,
        _ => {}
    }

    match line.rsplit_once(char::is_whitespace) {
        Some((device, action)) if !device.trim().is_empty() => Input::Trigger {
            device: device.trim().to_string(),
            action: action.to_ascii_lowercase(),
        },
        _ => Input::Help,
    }
}

pub struct Shell {
    panels: Vec<DevicePanel>,
    dispatcher: Dispatcher,
}

impl Shell {
    pub fn new(panels: Vec<DevicePanel>, dispatcher: Dispatcher) -> Self {
        Self { panels, dispatcher }
    }

    /// Find a panel by 1-based index or case-insensitive name
    pub fn find(&self, device: &str) -> Option<&DevicePanel> {
        if let Ok(index) = device.parse::<usize>() {
            return index.checked_sub(1).and_then(|i| self.panels.get(i));
        }
        self.panels
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(device))
    }

    /// Device list, one line per panel
    pub fn listing(&self) -> Vec<String> {
        if self.panels.is_empty() {
            return vec!["No devices configured".to_string()];
        }
        self.panels
            .iter()
            .enumerate()
            .map(|(i, panel)| {
                let actions: Vec<&str> = panel.actions.keys().map(String::as_str).collect();
                format!("{:>2}. {} [{}]", i + 1, panel.name, actions.join("/"))
            })
            .collect()
    }

    /// Handle a click. Returns a status line when nothing was dispatched;
    /// otherwise the result arrives later on `sink`.
    pub fn trigger(&self, device: &str, action: &str, sink: &mpsc::UnboundedSender<Completion>) -> Option<String> {
        let Some(panel) = self.find(device) else {
            return Some(format!("Unknown device '{}'", device));
        };
        let Some(descriptor) = panel.descriptor(action) else {
            return Some(format!("No '{}' command configured for {}", action, panel.name));
        };

        info!(device = %panel.name, action, "Button pressed");
        self.dispatcher.invoke_into(descriptor.clone(), sink.clone());
        None
    }

    /// Run until `quit` or end of input. In-flight commands are not awaited.
    pub async fn run<R, W>(self, input: R, mut out: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
        let mut lines = input.lines();

        emit(&mut out, READY).await?;
        for line in self.listing() {
            emit(&mut out, &line).await?;
        }
        out.flush().await?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Input closed");
                        break;
                    };
                    match parse_line(&line) {
                        Input::Trigger { device, action } => {
                            if let Some(status) = self.trigger(&device, &action, &tx) {
                                emit(&mut out, &status).await?;
                            }
                        }
                        Input::List => {
                            for line in self.listing() {
                                emit(&mut out, &line).await?;
                            }
                        }
                        Input::Help => emit(&mut out, HELP).await?,
                        Input::Quit => break,
                        Input::Empty => {}
                    }
                }
                Some(done) = rx.recv() => {
                    emit(&mut out, &done.status_line()).await?;
                }
            }
            out.flush().await?;
        }

        Ok(())
    }
}

async fn emit<W: AsyncWrite + Unpin>(out: &mut W, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await
}
