use std::future::Future;
use std::rc::Rc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use pixelbattle_core::{Backoff, ChannelEvent, ChannelHost, ClientStore, PixelApi, PixelClient};
use tokio::sync::mpsc::UnboundedReceiver;
use url::Url;

use crate::http_api::HttpApi;
use crate::ws_host::TokioHost;

pub type CliClient = PixelClient<TokioHost, HttpApi>;

/// Owns the client and pumps host events into it.
pub struct Session {
    client: Rc<CliClient>,
    events: UnboundedReceiver<ChannelEvent>,
}

impl Session {
    pub fn new(api_url: Url, ws_url: Url, store: Rc<dyn ClientStore>, backoff: Backoff) -> Self {
        let (host, events) = TokioHost::new(ws_url);
        let client = Rc::new(PixelClient::new(host, HttpApi::new(api_url), store, backoff));
        Self { client, events }
    }

    pub fn client(&self) -> &Rc<CliClient> {
        &self.client
    }

    /// Dispatches host events until `until` completes. Returns `None` if the
    /// host went away first.
    pub async fn run_until<F: Future>(&mut self, until: F) -> Option<F::Output> {
        pump(&self.client, &mut self.events, until).await
    }
}

/// Feeds `events` into `client` while earlier dispatches are still running,
/// so a close arriving mid-replay stops the replay. Unfinished dispatches
/// are dropped once `until` completes.
pub async fn pump<H, A, F>(
    client: &Rc<PixelClient<H, A>>,
    events: &mut UnboundedReceiver<ChannelEvent>,
    until: F,
) -> Option<F::Output>
where
    H: ChannelHost,
    A: PixelApi,
    F: Future,
{
    tokio::pin!(until);
    let mut in_flight = FuturesUnordered::new();
    loop {
        tokio::select! {
            biased;
            output = &mut until => return Some(output),
            Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
            event = events.recv() => {
                let event = event?;
                let client = Rc::clone(client);
                in_flight.push(async move { client.dispatch(event).await });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    use pixelbattle_core::{
        ApiError, CellCoord, Color, ConnectionState, Generation, GridResponse, MemoryStore,
        PlacePixelRequest, WriteIntent,
    };
    use tokio::sync::{mpsc, Notify};

    #[derive(Default)]
    struct SilentHost;

    impl ChannelHost for SilentHost {
        fn open(&mut self, _generation: Generation) {}

        fn send_text(&mut self, _text: &str) -> bool {
            true
        }

        fn close(&mut self) {}

        fn schedule_reconnect(&mut self, _delay: Duration) {}

        fn cancel_reconnect(&mut self) {}
    }

    /// Holds every placement until `gate` is notified.
    #[derive(Default)]
    struct GatedApi {
        gate: Notify,
        started: Cell<usize>,
        completed: Cell<usize>,
    }

    impl PixelApi for GatedApi {
        async fn fetch_grid(&self) -> Result<GridResponse, ApiError> {
            Err(ApiError::Transport("unused".into()))
        }

        async fn place_pixel(&self, _request: &PlacePixelRequest) -> Result<(), ApiError> {
            self.started.set(self.started.get() + 1);
            self.gate.notified().await;
            self.completed.set(self.completed.get() + 1);
            Ok(())
        }
    }

    #[tokio::test]
    async fn close_during_replay_keeps_the_rest_queued() {
        let store: Rc<dyn ClientStore> = Rc::new(MemoryStore::new());
        let client = Rc::new(PixelClient::new(
            SilentHost,
            GatedApi::default(),
            store,
            Backoff::default(),
        ));
        client.connect();
        for x in 0..3 {
            let intent = WriteIntent::new(CellCoord::new(x, 0), Color::black());
            client.submit_write(intent).await;
        }
        assert_eq!(client.pending_len(), 3);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let generation = client.generation();
        tx.send(ChannelEvent::Opened(generation)).unwrap();
        tx.send(ChannelEvent::Closed(generation)).unwrap();

        let watched = Rc::clone(&client);
        let until = async move {
            while watched.connection_state() != ConnectionState::Disconnected {
                tokio::task::yield_now().await;
            }
            watched.api().gate.notify_one();
            while watched.api().completed.get() == 0 {
                tokio::task::yield_now().await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), pump(&client, &mut rx, until))
            .await
            .expect("close was not handled while the replay was in flight")
            .expect("event channel closed early");

        assert_eq!(client.api().started.get(), 1);
        assert_eq!(client.pending_len(), 2);
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }
}
