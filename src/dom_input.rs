use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::timers::callback::Timeout;
use pixelbattle_core::{CanvasInput, InputModifiers, PointerButton, ScreenPoint};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, HtmlCanvasElement, MouseEvent, WheelEvent};

use crate::app::BrowserClient;
use crate::ui::{SharedEngine, StatusPanel};

fn canvas_position(canvas: &HtmlCanvasElement, event: &MouseEvent) -> ScreenPoint {
    let rect = canvas.get_bounding_client_rect();
    ScreenPoint::new(
        event.client_x() as f64 - rect.left(),
        event.client_y() as f64 - rect.top(),
    )
}

fn modifiers(event: &MouseEvent) -> InputModifiers {
    InputModifiers {
        shift: event.shift_key(),
        ctrl: event.ctrl_key(),
        alt: event.alt_key(),
        meta: event.meta_key(),
    }
}

fn blocking() -> EventListenerOptions {
    EventListenerOptions {
        phase: EventListenerPhase::Bubble,
        passive: false,
    }
}

/// Canvas mouse handling: pan on right-drag or Ctrl-drag, zoom on wheel,
/// hover readout on move and placement on click.
pub(crate) struct CanvasBindings {
    _listeners: Vec<EventListener>,
    _settle: Rc<RefCell<Option<Timeout>>>,
}

impl CanvasBindings {
    pub(crate) fn install(
        canvas: &HtmlCanvasElement,
        engine: &SharedEngine,
        client: &Rc<BrowserClient>,
        panel: &Rc<StatusPanel>,
        hover_throttle_ms: u64,
        wheel_settle_ms: u64,
    ) -> Self {
        let input = Rc::new(RefCell::new(CanvasInput::new(hover_throttle_ms)));
        let settle: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));
        let mut listeners = Vec::new();

        {
            let input = Rc::clone(&input);
            let target = canvas.clone();
            listeners.push(EventListener::new_with_options(
                canvas,
                "mousedown",
                blocking(),
                move |event: &Event| {
                    let Some(event) = event.dyn_ref::<MouseEvent>() else {
                        return;
                    };
                    let consumed = input.borrow_mut().pointer_down(
                        canvas_position(&target, event),
                        PointerButton::from_dom(event.button()),
                        modifiers(event),
                    );
                    if consumed {
                        event.prevent_default();
                    }
                },
            ));
        }

        {
            let input = Rc::clone(&input);
            listeners.push(EventListener::new(canvas, "mouseup", move |_event| {
                input.borrow_mut().pointer_up();
            }));
        }

        {
            let input = Rc::clone(&input);
            let engine = Rc::clone(engine);
            let panel = Rc::clone(panel);
            let target = canvas.clone();
            listeners.push(EventListener::new(canvas, "mousemove", move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                let position = canvas_position(&target, event);
                let hovered = input.borrow_mut().pointer_move(
                    &mut engine.borrow_mut(),
                    position,
                    event.time_stamp(),
                );
                if let Some(point) = hovered {
                    panel.show_coordinates(point);
                }
            }));
        }

        {
            let input = Rc::clone(&input);
            let engine = Rc::clone(engine);
            listeners.push(EventListener::new(canvas, "mouseleave", move |_event| {
                input.borrow_mut().leave(&mut engine.borrow_mut());
            }));
        }

        {
            let input = Rc::clone(&input);
            let engine = Rc::clone(engine);
            let client = Rc::clone(client);
            let target = canvas.clone();
            listeners.push(EventListener::new(canvas, "click", move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                let intent = input.borrow().click(
                    &engine.borrow(),
                    canvas_position(&target, event),
                    modifiers(event),
                );
                let Some(intent) = intent else {
                    return;
                };
                let client = Rc::clone(&client);
                spawn_local(async move {
                    client.submit_write(intent).await;
                });
            }));
        }

        {
            let input = Rc::clone(&input);
            let engine = Rc::clone(engine);
            let panel = Rc::clone(panel);
            let settle = Rc::clone(&settle);
            let target = canvas.clone();
            listeners.push(EventListener::new_with_options(
                canvas,
                "wheel",
                blocking(),
                move |event: &Event| {
                    let Some(event) = event.dyn_ref::<WheelEvent>() else {
                        return;
                    };
                    event.prevent_default();
                    let position = canvas_position(&target, event);
                    input
                        .borrow_mut()
                        .wheel(&mut engine.borrow_mut(), event.delta_y(), position);

                    let input = Rc::clone(&input);
                    let engine = Rc::clone(&engine);
                    let panel = Rc::clone(&panel);
                    let delay = u32::try_from(wheel_settle_ms).unwrap_or(u32::MAX);
                    // Replacing the pending timeout cancels it.
                    *settle.borrow_mut() = Some(Timeout::new(delay, move || {
                        let settled = input.borrow_mut().settle_hover(&mut engine.borrow_mut());
                        if let Some(point) = settled {
                            panel.show_coordinates(point);
                        }
                    }));
                },
            ));
        }

        listeners.push(EventListener::new_with_options(
            canvas,
            "contextmenu",
            blocking(),
            |event: &Event| event.prevent_default(),
        ));

        Self {
            _listeners: listeners,
            _settle: settle,
        }
    }
}
