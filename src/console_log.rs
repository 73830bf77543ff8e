use std::fmt::{self, Write};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Formats each event as `target: message key=value ...` and hands the line
/// to `write`.
pub(crate) struct ConsoleLayer<W> {
    write: W,
}

impl<W> ConsoleLayer<W>
where
    W: Fn(Level, &str) + 'static,
{
    pub(crate) fn new(write: W) -> Self {
        Self { write }
    }
}

impl<S, W> Layer<S> for ConsoleLayer<W>
where
    S: Subscriber,
    W: Fn(Level, &str) + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        let line = format!("{}: {}{}", metadata.target(), visitor.message, visitor.fields);
        (self.write)(*metadata.level(), &line);
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

pub(crate) fn init(max_level: LevelFilter) {
    let subscriber = tracing_subscriber::registry()
        .with(max_level)
        .with(ConsoleLayer::new(emit));
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(target_arch = "wasm32")]
fn emit(level: Level, line: &str) {
    match level {
        Level::ERROR => gloo::console::error!(line),
        Level::WARN => gloo::console::warn!(line),
        Level::INFO => gloo::console::info!(line),
        _ => gloo::console::debug!(line),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(level: Level, line: &str) {
    eprintln!("{level:>5} {line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn events_become_single_lines() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::INFO)
            .with(ConsoleLayer::new(move |level: Level, line: &str| {
                sink.lock().unwrap().push((level, line.to_string()));
            }));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "pixelbattle::test", count = 3, "online users");
            tracing::warn!(target: "pixelbattle::test", reason = %"gone", "socket closed");
            tracing::debug!(target: "pixelbattle::test", "filtered out");
        });
        let lines = lines.lock().unwrap();
        assert_eq!(
            *lines,
            vec![
                (Level::INFO, "pixelbattle::test: online users count=3".to_string()),
                (Level::WARN, "pixelbattle::test: socket closed reason=gone".to_string()),
            ]
        );
    }
}
