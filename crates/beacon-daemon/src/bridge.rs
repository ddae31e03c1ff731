use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::app::write_json_line;
use crate::dispatch::Dispatcher;

/// Serve JSON-line bridge requests from stdin until EOF or Ctrl-C.
/// Responses and lifecycle events share stdout; logs go to stderr.
pub async fn serve(dispatcher: &Dispatcher) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("bridge listening on stdin");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed");
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let response = dispatcher.respond_line(line);
                debug!(id = %response.id, ok = response.ok, "bridge response");
                write_json_line(&response)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
        }
    }
    Ok(())
}
