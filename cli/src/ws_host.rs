use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pixelbattle_core::{ChannelEvent, ChannelHost, Generation};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Runs each socket in its own task and reports what happens to it as
/// `ChannelEvent`s. Dropping the host tears everything down.
pub struct TokioHost {
    ws_url: Url,
    events: UnboundedSender<ChannelEvent>,
    outbound: Option<UnboundedSender<String>>,
    socket_task: Option<JoinHandle<()>>,
    reconnect_task: Option<JoinHandle<()>>,
}

impl TokioHost {
    pub fn new(ws_url: Url) -> (Self, UnboundedReceiver<ChannelEvent>) {
        let (events, receiver) = unbounded_channel();
        let host = Self {
            ws_url,
            events,
            outbound: None,
            socket_task: None,
            reconnect_task: None,
        };
        (host, receiver)
    }
}

impl ChannelHost for TokioHost {
    fn open(&mut self, generation: Generation) {
        self.close();
        let (outbound, receiver) = unbounded_channel();
        self.outbound = Some(outbound);
        self.socket_task = Some(tokio::spawn(run_socket(
            self.ws_url.clone(),
            generation,
            receiver,
            self.events.clone(),
        )));
    }

    fn send_text(&mut self, text: &str) -> bool {
        match &self.outbound {
            Some(outbound) => outbound.send(text.to_string()).is_ok(),
            None => false,
        }
    }

    fn close(&mut self) {
        self.outbound = None;
        if let Some(task) = self.socket_task.take() {
            task.abort();
        }
    }

    fn schedule_reconnect(&mut self, delay: Duration) {
        self.cancel_reconnect();
        let events = self.events.clone();
        self.reconnect_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ChannelEvent::ReconnectDue);
        }));
    }

    fn cancel_reconnect(&mut self) {
        if let Some(task) = self.reconnect_task.take() {
            task.abort();
        }
    }
}

impl Drop for TokioHost {
    fn drop(&mut self) {
        self.close();
        self.cancel_reconnect();
    }
}

async fn run_socket(
    url: Url,
    generation: Generation,
    mut outbound: UnboundedReceiver<String>,
    events: UnboundedSender<ChannelEvent>,
) {
    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(err) => {
            tracing::warn!(%err, %url, "websocket connect failed");
            let _ = events.send(ChannelEvent::Closed(generation));
            return;
        }
    };
    let _ = events.send(ChannelEvent::Opened(generation));
    let (mut write, mut read) = ws.split();
    loop {
        tokio::select! {
            outgoing = outbound.recv() => {
                let Some(text) = outgoing else {
                    let _ = write.close().await;
                    break;
                };
                if let Err(err) = write.send(Message::Text(text.into())).await {
                    tracing::warn!(%err, "websocket send failed");
                    break;
                }
            }
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(ChannelEvent::Message(generation, text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(?frame, "server closed the socket");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::warn!(%err, "websocket read failed");
                    break;
                }
                None => break,
            },
        }
    }
    let _ = events.send(ChannelEvent::Closed(generation));
}
