//! Terminal rendering and keyboard commands.

use pulse_ws::StreamSnapshot;

/// Keyboard command read from stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Toggle,
    Connect,
    Disconnect,
    Quit,
}

impl ConsoleCommand {
    /// Parse one input line. Unknown input yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "t" | "toggle" => Some(Self::Toggle),
            "c" | "connect" => Some(Self::Connect),
            "d" | "disconnect" => Some(Self::Disconnect),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

pub const HELP: &str = "commands: [t]oggle  [c]onnect  [d]isconnect  [q]uit";

/// One-line summary of a snapshot.
pub fn render_line(snapshot: &StreamSnapshot) -> String {
    let mut line = format!("[{}]", snapshot.connection.state.label());

    match &snapshot.reading {
        Some(reading) => {
            line.push_str(&format!(" {} BPM", reading.value.round()));
            if let Some(delta) = reading.delta {
                line.push_str(&format!(" ({})", format_delta(delta)));
            }
            line.push_str(&format!(" {}", reading.status));
            line.push_str(&format!(
                " | avg {:.1} min {:.1} max {:.1} | {} samples",
                snapshot.stats.avg,
                snapshot.stats.min,
                snapshot.stats.max,
                snapshot.samples.len()
            ));
        }
        None => line.push_str(" no data"),
    }

    if let Some(error) = &snapshot.connection.error {
        line.push_str(&format!(" ! {error}"));
    }

    line
}

fn format_delta(delta: f64) -> String {
    let rounded = delta.round();
    if rounded > 0.0 {
        format!("+{rounded}")
    } else if rounded == 0.0 {
        // Avoid printing "-0"
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}
