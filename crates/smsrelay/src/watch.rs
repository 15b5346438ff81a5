// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `smsrelay watch`: a minimal subscriber that prints lifecycle events.

use futures::StreamExt;
use smsrelay_bus::LifecycleEvent;
use smsrelay_core::SmsRelayError;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

pub async fn run_watch(url: &str, raw: bool) -> Result<(), SmsRelayError> {
    let (mut socket, _) = connect_async(url)
        .await
        .map_err(|e| SmsRelayError::Gateway {
            message: format!("failed to connect to {url}: {e}"),
            source: Some(Box::new(e)),
        })?;
    eprintln!("smsrelay: watching {url} (Ctrl+C to stop)");

    loop {
        tokio::select! {
            frame = socket.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let text = text.as_str();
                    if raw {
                        println!("{text}");
                    } else {
                        println!("{}", summarize(text));
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    eprintln!("smsrelay: server closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Err(SmsRelayError::Gateway {
                        message: format!("websocket error: {e}"),
                        source: Some(Box::new(e)),
                    });
                }
            },
            _ = tokio::signal::ctrl_c() => {
                let _ = socket.close(None).await;
                break;
            }
        }
    }
    Ok(())
}

/// One line per event: time, kind, id, status, type, phone, app.
///
/// Frames that are not lifecycle events are printed as received.
fn summarize(frame: &str) -> String {
    let Ok(event) = serde_json::from_str::<LifecycleEvent>(frame) else {
        return frame.to_string();
    };
    let data = &event.data;
    format!(
        "{} {:<14} {} {:<7} {:<4} {} {}",
        event.emitted_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
        event.event.as_ref(),
        data.id,
        data.status.as_ref(),
        data.message_type.as_ref(),
        data.phone,
        data.app,
    )
}
