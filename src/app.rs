use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::events::EventListener;
use pixelbattle_core::{
    Backoff, ChannelEvent, ClientConfig, ClientEvent, ClientStore, PixelClient, RenderEngine,
    Subscription,
};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlCanvasElement};

use crate::app_router;
use crate::canvas_surface::CanvasSurface;
use crate::dom_input::CanvasBindings;
use crate::http_api::BrowserApi;
use crate::local_store::LocalStore;
use crate::socket_host::{BrowserHost, EventSink};
use crate::ui::{self, Palette, SharedEngine, StatusPanel};

pub(crate) type BrowserClient = PixelClient<BrowserHost, BrowserApi>;

const CANVAS_ID: &str = "pixelCanvas";

thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
}

/// Everything the page keeps alive: the engine, the client and the DOM
/// bindings that feed them.
#[allow(dead_code)]
struct App {
    engine: SharedEngine,
    client: Rc<BrowserClient>,
    panel: Rc<StatusPanel>,
    palette: Rc<Palette>,
    subscription: Subscription<ClientEvent>,
    canvas_input: CanvasBindings,
    listeners: Vec<EventListener>,
}

pub(crate) fn start() {
    match App::mount(ClientConfig::default()) {
        Ok(app) => APP.with(|slot| {
            *slot.borrow_mut() = Some(app);
        }),
        Err(err) => tracing::error!(%err, "failed to start pixel battle"),
    }
}

fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
    match canvas.parent_element() {
        Some(parent) => (parent.client_width() as f64, parent.client_height() as f64),
        None => (canvas.width() as f64, canvas.height() as f64),
    }
}

fn find_canvas(document: &Document) -> Result<HtmlCanvasElement, String> {
    document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| format!("#{CANVAS_ID} not found"))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| format!("#{CANVAS_ID} is not a canvas"))
}

fn dispatch_sink(client: &Weak<BrowserClient>) -> EventSink {
    let client = client.clone();
    // Host callbacks can fire while the channel is borrowed, so every event
    // is handled on a fresh task.
    Rc::new(move |event: ChannelEvent| {
        let Some(client) = client.upgrade() else {
            return;
        };
        spawn_local(async move {
            client.dispatch(event).await;
        });
    })
}

impl App {
    fn mount(config: ClientConfig) -> Result<Self, String> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = find_canvas(&document)?;
        let (width, height) = parent_size(&canvas);
        canvas.set_width(width.max(0.0) as u32);
        canvas.set_height(height.max(0.0) as u32);

        let endpoints = app_router::load_endpoints().ok_or("could not derive server endpoints")?;
        tracing::info!(api = %endpoints.api, ws = %endpoints.ws, "endpoints");

        let engine: SharedEngine = Rc::new(RefCell::new(RenderEngine::new(
            CanvasSurface::new(canvas.clone())?,
            config.grid,
            config.view.clone(),
            config.style.clone(),
        )));
        {
            let weak = Rc::downgrade(&engine);
            engine
                .borrow_mut()
                .surface_mut()
                .set_frame_callback(Rc::new(move || {
                    if let Some(engine) = weak.upgrade() {
                        engine.borrow_mut().on_frame();
                    }
                }));
        }
        engine.borrow_mut().request_frame();

        let store: Rc<dyn ClientStore> = Rc::new(LocalStore);
        let ws_url = endpoints.ws.to_string();
        let api = BrowserApi::new(endpoints.api.to_string());
        let backoff = Backoff::from_config(&config.backoff);
        let client = Rc::new_cyclic(|weak| {
            PixelClient::new(BrowserHost::new(ws_url, dispatch_sink(weak)), api, store, backoff)
        });
        tracing::info!(client_id = %client.client_id(), "client identity");

        let panel = Rc::new(StatusPanel::new(document.clone()));
        let (palette, mut listeners) = Palette::mount(&document, Rc::clone(&engine));
        listeners.extend(ui::bind_view_buttons(&document, &engine));
        {
            let engine = Rc::clone(&engine);
            let canvas = canvas.clone();
            listeners.push(EventListener::new(&window, "resize", move |_event| {
                let (width, height) = parent_size(&canvas);
                engine.borrow_mut().resize(width, height);
            }));
        }
        let canvas_input = CanvasBindings::install(
            &canvas,
            &engine,
            &client,
            &panel,
            config.view.hover_throttle_ms,
            config.view.wheel_settle_ms,
        );

        let subscription = {
            let engine = Rc::clone(&engine);
            let panel = Rc::clone(&panel);
            client.subscribe(move |event| match event {
                ClientEvent::PixelChanged { update, .. } => {
                    if let Err(err) = engine
                        .borrow_mut()
                        .set_pixel(update.coord(), update.color.clone())
                    {
                        tracing::warn!(%err, "ignoring pixel update");
                    }
                }
                ClientEvent::Connection(state) => panel.show_connection(*state),
                ClientEvent::OnlineUsers(count) => panel.show_online_users(*count),
                ClientEvent::WritePlaced { total_placed, .. } => {
                    panel.show_pixels_placed(*total_placed)
                }
                ClientEvent::WriteCooldown { seconds, .. } => panel.start_cooldown(*seconds),
                ClientEvent::WriteRejected { message, .. } => {
                    tracing::warn!(%message, "pixel not placed");
                }
                _ => {}
            })
        };

        panel.show_pixels_placed(client.pixels_placed());
        {
            let client = Rc::clone(&client);
            let engine = Rc::clone(&engine);
            spawn_local(async move {
                let cells = client.load_initial_grid().await;
                tracing::info!(pixels = cells.len(), "initial grid loaded");
                engine.borrow_mut().set_grid(cells);
            });
        }
        client.connect();

        Ok(Self {
            engine,
            client,
            panel,
            palette,
            subscription,
            canvas_input,
            listeners,
        })
    }
}
