use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid logging.level '{0}'. Valid values: trace, debug, info, warn, error")]
    InvalidLevel(String),
    #[error("Invalid logging.format '{0}'. Valid values: json, console")]
    InvalidFormat(String),
    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Collects event fields as JSON attributes.
#[derive(Default)]
struct AttributeCollector(Map<String, Value>);

impl AttributeCollector {
    fn put(&mut self, field: &Field, value: Value) {
        // `event_name` style fields map to their dotted OTel names.
        let name = match field.name() {
            "event_name" => "event.name",
            "event_domain" => "event.domain",
            other => other,
        };
        self.0.insert(name.to_string(), value);
    }
}

impl Visit for AttributeCollector {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::from(format!("{:?}", value)));
    }
}

/// One JSON object per line, shaped like an OpenTelemetry log record.
#[derive(Clone)]
struct OtelJsonFormat {
    resource: Map<String, Value>,
}

impl OtelJsonFormat {
    fn new(config: &LoggingConfig) -> Self {
        let mut resource = Map::new();
        resource.insert(
            "service.name".to_string(),
            Value::from(config.service_name.as_str()),
        );
        resource.insert(
            "service.version".to_string(),
            Value::from(config.service_version.as_str()),
        );
        Self { resource }
    }

    fn severity_number(level: &Level) -> u64 {
        match *level {
            Level::TRACE => 1,
            Level::DEBUG => 5,
            Level::INFO => 9,
            Level::WARN => 13,
            Level::ERROR => 17,
        }
    }
}

impl<S, N> FormatEvent<S, N> for OtelJsonFormat
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut collector = AttributeCollector::default();
        event.record(&mut collector);
        let mut attributes = collector.0;

        let body = match attributes.remove("message") {
            Some(Value::String(message)) => message,
            _ => metadata.name().to_string(),
        };
        if let Some(file) = metadata.file() {
            attributes.insert("code.filepath".to_string(), Value::from(file));
        }
        if let Some(line) = metadata.line() {
            attributes.insert("code.lineno".to_string(), Value::from(line));
        }
        attributes.insert("code.target".to_string(), Value::from(metadata.target()));

        let record = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "severity_text": metadata.level().as_str(),
            "severity_number": Self::severity_number(metadata.level()),
            "body": body,
            "resource": Value::Object(self.resource.clone()),
            "attributes": Value::Object(attributes),
        });

        let line = serde_json::to_string(&record).map_err(|_| std::fmt::Error)?;
        writer.write_str(&line)?;
        writer.write_char('\n')
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        _ => Err(LoggingError::InvalidLevel(level.to_string())),
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` directives are honoured on
/// top of the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let level = parse_level(&config.level)?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let result = match config.format.trim().to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().event_format(OtelJsonFormat::new(config)))
            .try_init(),
        "console" => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .try_init(),
        other => return Err(LoggingError::InvalidFormat(other.to_string())),
    };
    result.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}
