//! TCP connection handler
//!
//! Handles one client connection: greeting and login, then a writer task
//! draining the connection's outbound channel while this task forwards
//! each input line to the dispatcher.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::message::Notice;
use crate::server::DispatchCommand;
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// A connection that closes before sending a name is dropped silently.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<DispatchCommand>,
    config: Arc<ServerConfig>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    let greeting = Notice::Greeting {
        server: config.server_name.clone(),
    };
    writer.write_all(greeting.to_string().as_bytes()).await?;

    let name = match read_line(&mut reader, &mut buf).await {
        Ok(Some(line)) => line,
        Ok(None) | Err(_) => {
            debug!("{} closed before logging in", peer_addr);
            return Ok(());
        }
    };

    let client_id = ClientId::new();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let (close_tx, mut close_rx) = oneshot::channel();

    cmd_tx
        .send(DispatchCommand::Login {
            client_id,
            name: name.clone(),
            outbound: out_tx,
            closer: close_tx,
        })
        .await
        .map_err(|_| AppError::ChannelSend)?;
    debug!("Client {} sent login '{}' from {}", client_id, name, peer_addr);

    // Ends once every sender is dropped or the socket refuses a write.
    let write_task = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if writer.write_all(text.as_bytes()).await.is_err() {
                debug!("Write to {} failed, ending write task", client_id);
                break;
            }
        }
        let _ = writer.shutdown().await;
    });

    loop {
        tokio::select! {
            line = read_line(&mut reader, &mut buf) => match line {
                Ok(Some(line)) => {
                    if cmd_tx
                        .send(DispatchCommand::Input { client_id, line })
                        .await
                        .is_err()
                    {
                        return Err(AppError::ChannelSend);
                    }
                }
                Ok(None) | Err(_) => {
                    debug!("Read side of {} closed", client_id);
                    let _ = cmd_tx
                        .send(DispatchCommand::Disconnected { client_id })
                        .await;
                    return Ok(());
                }
            },
            _ = &mut close_rx => {
                // Let the quit acknowledgement reach the socket first.
                let _ = write_task.await;
                info!("Client {} closed by server", client_id);
                return Ok(());
            }
        }
    }
}

/// Read one line, without its terminator. `Ok(None)` at end of stream.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected. A
/// partial read interrupted by cancellation stays in `buf`.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    if reader.read_until(b'\n', buf).await? == 0 && buf.is_empty() {
        return Ok(None);
    }

    let line = String::from_utf8_lossy(buf)
        .trim_end_matches(['\r', '\n'])
        .to_string();
    buf.clear();
    Ok(Some(line))
}
