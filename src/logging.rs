use log::{log, Level};
use std::collections::HashMap;
use std::sync::Once;
use tracing::field::{Field, Visit};
use tracing::span::Attributes;
use tracing::{Event, Id, Subscriber};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::Context, Layer};

static INIT: Once = Once::new();

/// Install a global subscriber forwarding controller activity to the `log` crate
///
/// Calling this more than once has no effect.
pub fn init() {
    INIT.call_once(|| tracing_subscriber::registry().with(ToLogLayer).init());
}

#[derive(Default)]
pub struct ToLogLayer;

impl<S> Layer<S> for ToLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let mut map = HashMap::new();
            let mut visitor = FieldMapVisitor::from_map(&mut map);
            attrs.record(&mut visitor);

            let meta = span.metadata();
            if meta.name() == "activate" {
                if let Some(locator) = map.get("locator") {
                    log!(target: meta.target(), Level::Debug, "{}: activating", locator);
                }
            }

            // Store the initial fields in span extensions
            span.extensions_mut().insert(map);
        }
    }

    fn on_record(&self, id: &Id, values: &tracing::span::Record<'_>, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let mut exts = span.extensions_mut();

            if let Some(fields) = exts.get_mut::<HashMap<String, String>>() {
                let mut visitor = FieldMapVisitor::from_map(fields);
                values.record(&mut visitor);
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.event_span(event) else {
            return;
        };
        if span.name() != "activate" {
            return;
        }

        let mut message = HashMap::new();
        let mut visitor = FieldMapVisitor::from_map(&mut message);
        event.record(&mut visitor);

        let meta = event.metadata();
        let ext = span.extensions();
        if let (Some(fields), Some(message)) =
            (ext.get::<HashMap<String, String>>(), message.get("message"))
        {
            if let Some(locator) = fields.get("locator") {
                log!(target: meta.target(), map_level(meta.level()), "{}: {}", locator, message);
            }
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(&id) {
            let meta = span.metadata();
            if meta.name() != "activate" {
                return;
            }

            let ext = span.extensions();
            let Some(map) = ext.get::<HashMap<String, String>>() else {
                return;
            };
            let Some(locator) = map.get("locator") else {
                return;
            };

            match map.get("return").map(String::as_str) {
                Some("resolved") => {
                    log!(target: meta.target(), Level::Info, "{}: success", locator)
                }
                Some("rejected") => {
                    if let Some(err) = map.get("error") {
                        log!(target: meta.target(), Level::Warn, "{}: failed - {}", locator, err)
                    } else {
                        log!(target: meta.target(), Level::Warn, "{}: failed", locator)
                    }
                }
                Some("skipped") => {
                    log!(target: meta.target(), Level::Debug, "{}: skipped by guard", locator)
                }
                Some("blocked") => {
                    log!(target: meta.target(), Level::Debug, "{}: nothing to do", locator)
                }
                Some("superseded") | Some("discarded") => {
                    log!(target: meta.target(), Level::Debug, "{}: configuration changed, outcome ignored", locator)
                }
                _ => {}
            }
        }
    }
}

#[derive(Default)]
pub struct FieldMapVisitor<'a> {
    fields: Option<&'a mut HashMap<String, String>>,
}

impl<'a> FieldMapVisitor<'a> {
    pub fn from_map(map: &'a mut HashMap<String, String>) -> Self {
        Self { fields: Some(map) }
    }
}

impl Visit for FieldMapVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if let Some(ref mut map) = self.fields {
            map.insert(field.name().into(), format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if let Some(ref mut map) = self.fields {
            map.insert(field.name().into(), value.to_string());
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if let Some(ref mut map) = self.fields {
            map.insert(field.name().into(), value.to_string());
        }
    }
}

fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::TRACE => Level::Trace,
        tracing::Level::DEBUG => Level::Debug,
        tracing::Level::INFO => Level::Info,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::ERROR => Level::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::FetchController;
    use crate::request::{FetchConfig, Guard};
    use crate::testing::MockTransport;
    use log::{LevelFilter, Metadata, Record};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

    struct Recorder;

    impl log::Log for Recorder {
        fn enabled(&self, _: &Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &Record<'_>) {
            if let Ok(mut records) = RECORDS.lock() {
                records.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static RECORDER: Recorder = Recorder;

    fn records_for(locator: &str) -> Vec<(Level, String)> {
        RECORDS
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, msg)| msg.starts_with(&format!("{locator}:")))
            .cloned()
            .collect()
    }

    #[test]
    fn it_initializes_only_once() {
        init();
        init();
        assert!(INIT.is_completed());
    }

    #[test]
    fn it_forwards_activation_outcomes_to_log() {
        // another logger may already be installed by a previous run in this process
        let _ = log::set_logger(&RECORDER);
        log::set_max_level(LevelFilter::Trace);

        let subscriber = tracing_subscriber::registry().with(ToLogLayer);
        tracing::subscriber::with_default(subscriber, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            runtime.block_on(async {
                let transport = MockTransport::new()
                    .resolve_once(json!({"id": 1}))
                    .reject_once("Failed to fetch");
                let mut controller: FetchController<MockTransport> =
                    FetchController::new(transport);

                controller
                    .render(FetchConfig::new("log/resolved"))
                    .unwrap()
                    .settled()
                    .await;
                controller
                    .render(FetchConfig::new("log/rejected"))
                    .unwrap()
                    .settled()
                    .await;
                controller
                    .render(FetchConfig::new("log/skipped").guard(Guard::new(|| false)))
                    .unwrap()
                    .settled()
                    .await;
            });
        });

        assert_eq!(
            records_for("log/resolved"),
            vec![
                (Level::Debug, "log/resolved: activating".to_string()),
                (Level::Debug, "log/resolved: retrieving".to_string()),
                (Level::Info, "log/resolved: success".to_string()),
            ]
        );
        assert_eq!(
            records_for("log/rejected"),
            vec![
                (Level::Debug, "log/rejected: activating".to_string()),
                (Level::Debug, "log/rejected: retrieving".to_string()),
                (
                    Level::Warn,
                    "log/rejected: failed - Failed to fetch".to_string()
                ),
            ]
        );
        assert_eq!(
            records_for("log/skipped"),
            vec![
                (Level::Debug, "log/skipped: activating".to_string()),
                (Level::Debug, "log/skipped: skipped by guard".to_string()),
            ]
        );
    }
}
