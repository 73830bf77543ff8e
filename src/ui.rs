use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::events::EventListener;
use gloo::timers::future::TimeoutFuture;
use pixelbattle_core::cooldown::COUNTDOWN_TICK;
use pixelbattle_core::{Color, ConnectionState, CooldownTimer, GridPoint, RenderEngine, PALETTE};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlInputElement};

use crate::canvas_surface::CanvasSurface;

pub(crate) type SharedEngine = Rc<RefCell<RenderEngine<CanvasSurface>>>;

/// Connection, online users, pixels placed, cooldown and pointer readouts.
pub(crate) struct StatusPanel {
    document: Document,
    cooldown_epoch: Cell<u64>,
}

impl StatusPanel {
    pub(crate) fn new(document: Document) -> Self {
        Self {
            document,
            cooldown_epoch: Cell::new(0),
        }
    }

    fn element(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(element) = self.element(id) {
            element.set_text_content(Some(text));
        }
    }

    pub(crate) fn show_connection(&self, state: ConnectionState) {
        let Some(status) = self.element("connectionStatus") else {
            return;
        };
        let label = match state {
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected (reconnecting...)",
        };
        if let Ok(Some(indicator)) = status.query_selector(".status-indicator") {
            indicator.set_class_name(&format!("status-indicator {state}"));
        }
        if let Ok(Some(text)) = status.query_selector(".status-text") {
            text.set_text_content(Some(label));
        }
    }

    pub(crate) fn show_online_users(&self, count: u64) {
        self.set_text("onlineUsers", &count.to_string());
    }

    pub(crate) fn show_pixels_placed(&self, count: u64) {
        self.set_text("pixelsPlaced", &count.to_string());
    }

    pub(crate) fn show_coordinates(&self, point: GridPoint) {
        self.set_text("coordinates", &format!("X: {}, Y: {}", point.x, point.y));
    }

    /// Shows the countdown and ticks it down. A newer cooldown replaces a
    /// running one.
    pub(crate) fn start_cooldown(self: &Rc<Self>, seconds: f64) {
        let epoch = self.cooldown_epoch.get().wrapping_add(1);
        self.cooldown_epoch.set(epoch);
        let mut timer = CooldownTimer::new(seconds);
        self.set_text("cooldownTime", &timer.label());
        self.set_hidden("cooldown", false);
        let panel = Rc::clone(self);
        spawn_local(async move {
            loop {
                TimeoutFuture::new(COUNTDOWN_TICK.as_millis() as u32).await;
                if panel.cooldown_epoch.get() != epoch {
                    return;
                }
                if !timer.tick() {
                    panel.set_hidden("cooldown", true);
                    return;
                }
                panel.set_text("cooldownTime", &timer.label());
            }
        });
    }

    fn set_hidden(&self, id: &str, hidden: bool) {
        if let Some(element) = self.element(id) {
            let _ = element.class_list().toggle_with_force("hidden", hidden);
        }
    }
}

/// Swatches from the fixed palette plus the free-form colour input.
pub(crate) struct Palette {
    engine: SharedEngine,
    swatches: Vec<(Element, Color)>,
    input: Option<HtmlInputElement>,
}

impl Palette {
    pub(crate) fn mount(
        document: &Document,
        engine: SharedEngine,
    ) -> (Rc<Self>, Vec<EventListener>) {
        let mut swatches = Vec::new();
        if let Some(grid) = document.get_element_by_id("colorsGrid") {
            grid.set_inner_html("");
            for entry in PALETTE {
                let (Ok(color), Ok(swatch)) = (Color::parse(entry), document.create_element("div"))
                else {
                    continue;
                };
                swatch.set_class_name("color-swatch");
                let style = format!("background-color: {}", color.as_str());
                let _ = swatch.set_attribute("style", &style);
                let _ = swatch.set_attribute("data-color", color.as_str());
                let _ = swatch.set_attribute("title", color.as_str());
                if grid.append_child(&swatch).is_ok() {
                    swatches.push((swatch, color));
                }
            }
        }
        let input = document
            .get_element_by_id("colorInput")
            .and_then(|element| element.dyn_into::<HtmlInputElement>().ok());
        let palette = Rc::new(Self {
            engine,
            swatches,
            input,
        });

        let mut listeners = Vec::new();
        for (swatch, color) in &palette.swatches {
            let target = Rc::clone(&palette);
            let color = color.clone();
            listeners.push(EventListener::new(swatch, "click", move |_event| {
                target.select(color.clone());
            }));
        }
        if let Some(input) = &palette.input {
            let target = Rc::clone(&palette);
            let field = input.clone();
            listeners.push(EventListener::new(input, "input", move |_event| {
                match Color::parse(&field.value()) {
                    Ok(color) => target.select(color),
                    Err(err) => tracing::debug!(%err, "ignoring colour input"),
                }
            }));
        }
        if let Some((_, first)) = palette.swatches.first() {
            palette.select(first.clone());
        }
        (palette, listeners)
    }

    pub(crate) fn select(&self, color: Color) {
        for (swatch, swatch_color) in &self.swatches {
            let _ = swatch
                .class_list()
                .toggle_with_force("selected", *swatch_color == color);
        }
        if let Some(input) = &self.input {
            input.set_value(&color.as_str().to_ascii_lowercase());
        }
        self.engine.borrow_mut().set_selected_color(color);
    }
}

/// Zoom in/out and reset buttons.
pub(crate) fn bind_view_buttons(document: &Document, engine: &SharedEngine) -> Vec<EventListener> {
    let actions: [(&str, fn(&mut RenderEngine<CanvasSurface>)); 3] = [
        ("zoomIn", |engine| {
            engine.zoom_in();
        }),
        ("zoomOut", |engine| {
            engine.zoom_out();
        }),
        ("resetView", |engine| engine.reset_view()),
    ];
    actions
        .into_iter()
        .filter_map(|(id, action)| {
            let button = document.get_element_by_id(id)?;
            let engine = Rc::clone(engine);
            Some(EventListener::new(&button, "click", move |_event| {
                action(&mut engine.borrow_mut());
            }))
        })
        .collect()
}
