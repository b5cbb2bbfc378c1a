//! Application wiring: controller, terminal output and keyboard input.

use crate::config::AppConfig;
use crate::console::{render_line, ConsoleCommand, HELP};
use crate::error::AppResult;
use pulse_ws::{StreamController, StreamHandle, WsConnector};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Console monitor application.
pub struct Application {
    config: AppConfig,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run until the user quits, stdin closes after a quit, or Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        pulse_ws::init_crypto();

        let connector = WsConnector::new(self.config.stream.close_timeout());
        let handle = StreamController::spawn(
            self.config.stream.clone(),
            self.config.display.clone(),
            connector,
        );
        let mut updates = handle.subscribe();

        println!("{HELP}");
        println!("{}", render_line(&handle.snapshot()));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        warn!("Controller stopped publishing");
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    if let Some(reading) = &snapshot.reading {
                        debug!(
                            state = ?snapshot.connection.state,
                            value = reading.value,
                            zone = %reading.zone.label,
                            samples = snapshot.samples.len(),
                            "Snapshot"
                        );
                    }
                    println!("{}", render_line(&snapshot));
                }
                line = lines.next_line(), if stdin_open => {
                    match line {
                        Ok(Some(line)) => {
                            if line.trim().is_empty() {
                                continue;
                            }
                            match ConsoleCommand::parse(&line) {
                                Some(ConsoleCommand::Quit) => break,
                                Some(command) => dispatch(&handle, command)?,
                                None => println!("{HELP}"),
                            }
                        }
                        Ok(None) => {
                            debug!("stdin closed, keyboard controls disabled");
                            stdin_open = false;
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to read stdin");
                            stdin_open = false;
                        }
                    }
                }
                _ = &mut ctrl_c => {
                    info!("Received Ctrl+C");
                    break;
                }
            }
        }

        info!("Shutting down");
        handle.shutdown().await;
        Ok(())
    }
}

fn dispatch(handle: &StreamHandle, command: ConsoleCommand) -> AppResult<()> {
    debug!(?command, "Console command");
    match command {
        ConsoleCommand::Toggle => handle.toggle()?,
        ConsoleCommand::Connect => handle.connect()?,
        ConsoleCommand::Disconnect => handle.disconnect()?,
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = AppConfig::default();
        config.stream.url = "http://localhost:8000/ws".to_string();
        assert!(matches!(Application::new(config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_new_accepts_defaults() {
        let app = Application::new(AppConfig::default()).unwrap();
        assert_eq!(app.config().stream.window_capacity, 20);
    }
}
