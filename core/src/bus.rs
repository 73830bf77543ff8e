use std::cell::RefCell;
use std::rc::Rc;

type Listener<E> = Rc<dyn Fn(&E)>;

/// Typed fire-and-forget event fan-out. Listeners stay registered for as
/// long as their `Subscription` lives.
pub struct EventBus<E> {
    listeners: Rc<RefCell<Vec<Listener<E>>>>,
}

impl<E: 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> Subscription<E> {
        let listener: Listener<E> = Rc::new(listener);
        self.listeners.borrow_mut().push(listener.clone());
        Subscription {
            listener,
            listeners: Rc::clone(&self.listeners),
        }
    }

    /// Listeners may subscribe or unsubscribe while an event is delivered;
    /// the change applies from the next publish.
    pub fn publish(&self, event: &E) {
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
        }
    }
}

pub struct Subscription<E> {
    listener: Listener<E>,
    listeners: Rc<RefCell<Vec<Listener<E>>>>,
}

impl<E> Subscription<E> {
    /// Keeps the listener registered for the lifetime of the bus.
    pub fn detach(self) {
        std::mem::forget(self);
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|item| !Rc::ptr_eq(item, &self.listener));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn delivers_to_every_listener() {
        let bus = EventBus::<u32>::new();
        let total = Rc::new(Cell::new(0));
        let a = {
            let total = total.clone();
            bus.subscribe(move |value| total.set(total.get() + value))
        };
        let b = {
            let total = total.clone();
            bus.subscribe(move |value| total.set(total.get() + value * 10))
        };
        bus.publish(&2);
        assert_eq!(total.get(), 22);
        drop(a);
        bus.publish(&1);
        assert_eq!(total.get(), 32);
        drop(b);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn listener_can_unsubscribe_during_publish() {
        let bus = EventBus::<()>::new();
        let slot: Rc<RefCell<Option<Subscription<()>>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));
        let subscription = {
            let slot = slot.clone();
            let calls = calls.clone();
            bus.subscribe(move |_| {
                calls.set(calls.get() + 1);
                slot.borrow_mut().take();
            })
        };
        *slot.borrow_mut() = Some(subscription);
        bus.publish(&());
        bus.publish(&());
        assert_eq!(calls.get(), 1);
    }
}
