use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use hydro_logging::{JsonLogger, LogLevel, LogRecord};
use serde_json::Value;
use uuid::Uuid;

/// Builder for engine telemetry sinks.
pub struct EngineTelemetryBuilder {
    component: String,
    log_path: Option<PathBuf>,
    min_level: LogLevel,
}

impl EngineTelemetryBuilder {
    /// Creates the builder for the named component.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            log_path: None,
            min_level: LogLevel::Debug,
        }
    }

    /// Sets the log file path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Sets the minimum level written to disk.
    #[must_use]
    pub const fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Builds the telemetry handle.
    pub fn build(self) -> Result<EngineTelemetry> {
        let logger = if let Some(path) = self.log_path {
            Some(JsonLogger::with_min_level(path, self.min_level)?)
        } else {
            None
        };
        Ok(EngineTelemetry {
            inner: Arc::new(TelemetryInner {
                component: self.component,
                run_id: Uuid::new_v4(),
                logger,
            }),
        })
    }
}

/// Telemetry handle shared across pipeline components. Cloning is cheap and
/// all clones write to the same sink.
#[derive(Clone)]
pub struct EngineTelemetry {
    inner: Arc<TelemetryInner>,
}

struct TelemetryInner {
    component: String,
    run_id: Uuid,
    logger: Option<JsonLogger>,
}

impl fmt::Debug for EngineTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineTelemetry")
            .field("component", &self.inner.component)
            .finish()
    }
}

impl EngineTelemetry {
    /// Returns a builder for the named component.
    #[must_use]
    pub fn builder(component: impl Into<String>) -> EngineTelemetryBuilder {
        EngineTelemetryBuilder::new(component)
    }

    /// Identifier tying together every record from this process.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.inner.run_id
    }

    /// Logs a structured record; a missing sink makes this a no-op.
    pub fn log(&self, level: LogLevel, message: &str, mut fields: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            if let Value::Object(map) = &mut fields {
                map.insert(
                    "run_id".to_owned(),
                    Value::String(self.inner.run_id.to_string()),
                );
            }
            let record =
                LogRecord::new(&self.inner.component, level, message).with_fields(fields);
            logger.log(&record)?;
        }
        Ok(())
    }
}
