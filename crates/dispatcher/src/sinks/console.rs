//! ConsoleSink - category-tagged lines on stdout

use std::collections::HashMap;
use std::io::{self, Write};

use anstyle::{AnsiColor, Color, Style};
use contracts::{LevelCell, LogLevel, MetricStats, Properties, Sink, TelemetryError};
use parking_lot::Mutex;

/// Default registry name
pub const CONSOLE_SINK_NAME: &str = "console";

/// Sink that writes one human-readable line per event
///
/// Lines look like `Warning: disk almost full, Data: {"free_mb":12}`.
/// Mostly useful while debugging.
pub struct ConsoleSink {
    name: String,
    level: LevelCell,
    color: bool,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    /// Create a ConsoleSink writing to stdout
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_writer(name, io::stdout())
    }

    /// Create a ConsoleSink writing to `writer`
    pub fn with_writer(name: impl Into<String>, writer: impl Write + Send + 'static) -> Self {
        Self {
            name: name.into(),
            level: LevelCell::new(LogLevel::NONE),
            color: true,
            out: Mutex::new(Box::new(writer)),
        }
    }

    pub fn with_level(self, level: LogLevel) -> Self {
        self.level.set(level);
        self
    }

    /// Toggle ANSI colouring of the category tag
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Create from params (for factory)
    ///
    /// Recognised params: `color` (`true` / `false`, default `true`).
    pub fn from_params(
        name: impl Into<String>,
        level: LogLevel,
        params: &HashMap<String, String>,
    ) -> Result<Self, TelemetryError> {
        let name = name.into();
        let color = match params.get("color").map(String::as_str) {
            None => true,
            Some(raw) => raw.parse::<bool>().map_err(|_| {
                TelemetryError::config(
                    format!("sinks[name={name}].params.color"),
                    format!("expected true or false, got '{raw}'"),
                )
            })?,
        };

        Ok(Self::new(name).with_level(level).with_color(color))
    }

    fn style(&self, color: AnsiColor) -> Style {
        if self.color {
            Style::new().fg_color(Some(Color::Ansi(color)))
        } else {
            Style::new()
        }
    }

    fn paint(&self, color: AnsiColor, text: &str) -> String {
        let style = self.style(color);
        format!("{}{}{}", style.render(), text, style.render_reset())
    }

    /// `message` followed by `, Data: <json>` when data is present
    fn format(&self, message: &str, data: Option<&Properties>) -> Result<String, TelemetryError> {
        match data {
            None => Ok(message.to_string()),
            Some(data) => {
                let json = serde_json::to_string(data)
                    .map_err(|e| TelemetryError::sink_write(&self.name, e.to_string()))?;
                Ok(format!("{message}, Data: {json}"))
            }
        }
    }

    fn write_line(&self, line: &str) -> Result<(), TelemetryError> {
        let mut out = self.out.lock();
        writeln!(out, "{line}")
            .and_then(|()| out.flush())
            .map_err(|e| TelemetryError::sink_write(&self.name, e.to_string()))
    }

    fn log(
        &self,
        color: AnsiColor,
        tag: &str,
        message: &str,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        let line = format!("{}{}", self.paint(color, tag), self.format(message, data)?);
        self.write_line(&line)
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> LogLevel {
        self.level.get()
    }

    fn set_level(&self, level: LogLevel) {
        self.level.set(level);
    }

    fn error(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.log(AnsiColor::Red, "Error: ", message, data)
    }

    fn warn(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.log(AnsiColor::Yellow, "Warning: ", message, data)
    }

    fn info(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.log(AnsiColor::Green, "Info: ", message, data)
    }

    fn verbose(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.log(AnsiColor::Cyan, "Verbose: ", message, data)
    }

    fn debug(&self, message: &str, data: Option<&Properties>) -> Result<(), TelemetryError> {
        self.log(AnsiColor::Blue, "Debug: ", message, data)
    }

    fn event(
        &self,
        name: &str,
        duration_ms: f64,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        let line = format!(
            "{}{} {}{}",
            self.paint(AnsiColor::Green, "Event: "),
            name,
            self.paint(AnsiColor::BrightBlack, &format!("({duration_ms}ms)")),
            self.format("", data)?
        );
        self.write_line(&line)
    }

    fn metric(
        &self,
        name: &str,
        value: f64,
        _stats: MetricStats,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        self.log(
            AnsiColor::Blue,
            "Metric: ",
            &format!("{name}, Value: {value}"),
            data,
        )
    }

    fn exception(
        &self,
        error: &dyn std::error::Error,
        data: Option<&Properties>,
    ) -> Result<(), TelemetryError> {
        self.log(AnsiColor::Red, "Exception: ", &error.to_string(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    /// Writer whose contents stay readable after the sink takes ownership
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn plain_sink() -> (ConsoleSink, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let sink = ConsoleSink::with_writer("console", buffer.clone()).with_color(false);
        (sink, buffer)
    }

    fn data() -> Properties {
        json!({ "free_mb": 12, "disk": "sda" })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_leveled_lines() {
        let (sink, buffer) = plain_sink();
        sink.error("e", None).unwrap();
        sink.warn("w", None).unwrap();
        sink.info("i", None).unwrap();
        sink.verbose("v", None).unwrap();
        sink.debug("d", None).unwrap();

        assert_eq!(
            buffer.contents(),
            "Error: e\nWarning: w\nInfo: i\nVerbose: v\nDebug: d\n"
        );
    }

    #[test]
    fn test_data_is_appended_as_json() {
        let (sink, buffer) = plain_sink();
        sink.warn("disk almost full", Some(&data())).unwrap();
        assert_eq!(
            buffer.contents(),
            "Warning: disk almost full, Data: {\"disk\":\"sda\",\"free_mb\":12}\n"
        );
    }

    #[test]
    fn test_telemetry_lines() {
        let (sink, buffer) = plain_sink();
        sink.event("startup", 15.0, None).unwrap();
        sink.metric("queue_depth", 2.5, MetricStats::default(), None)
            .unwrap();
        sink.exception(&io::Error::other("disk gone"), None).unwrap();

        assert_eq!(
            buffer.contents(),
            "Event: startup (15ms)\nMetric: queue_depth, Value: 2.5\nException: disk gone\n"
        );
    }

    #[test]
    fn test_color_wraps_tag() {
        let buffer = SharedBuffer::default();
        let sink = ConsoleSink::with_writer("console", buffer.clone());
        sink.error("boom", None).unwrap();
        assert_eq!(buffer.contents(), "\x1b[31mError: \x1b[0mboom\n");
    }

    #[test]
    fn test_color_marks_event_duration() {
        let buffer = SharedBuffer::default();
        let sink = ConsoleSink::with_writer("console", buffer.clone());
        sink.event("startup", 15.0, None).unwrap();
        assert_eq!(
            buffer.contents(),
            "\x1b[32mEvent: \x1b[0mstartup \x1b[90m(15ms)\x1b[0m\n"
        );
    }

    #[test]
    fn test_color_off_writes_no_escapes() {
        let (sink, buffer) = plain_sink();
        sink.exception(&io::Error::other("disk gone"), None).unwrap();
        sink.metric("depth", 1.0, MetricStats::default(), None)
            .unwrap();
        assert!(!buffer.contents().contains('\x1b'));
    }

    #[test]
    fn test_enable_and_disable_level() {
        let (sink, _) = plain_sink();
        sink.enable_level(LogLevel::ERROR | LogLevel::WARNING);
        sink.enable_level(LogLevel::WARNING | LogLevel::EVENT);
        assert_eq!(
            sink.level(),
            LogLevel::ERROR | LogLevel::WARNING | LogLevel::EVENT
        );

        sink.disable_level(LogLevel::WARNING | LogLevel::DEBUG);
        assert_eq!(sink.level(), LogLevel::ERROR | LogLevel::EVENT);
    }

    #[test]
    fn test_direct_calls_ignore_level() {
        let (sink, buffer) = plain_sink();
        assert_eq!(sink.level(), LogLevel::NONE);
        sink.info("still written", None).unwrap();
        assert_eq!(buffer.contents(), "Info: still written\n");
    }

    #[test]
    fn test_write_failure_is_reported() {
        let sink = ConsoleSink::with_writer("broken", BrokenPipe);
        let err = sink.info("lost", None).unwrap_err();
        assert!(matches!(err, TelemetryError::SinkWrite { ref sink_name, .. } if sink_name == "broken"));
    }

    #[test]
    fn test_from_params() {
        let params = HashMap::from([("color".to_string(), "false".to_string())]);
        let sink = ConsoleSink::from_params("con", LogLevel::ERROR, &params).unwrap();
        assert_eq!(sink.name(), "con");
        assert_eq!(sink.level(), LogLevel::ERROR);
        assert!(!sink.color);

        let params = HashMap::from([("color".to_string(), "sometimes".to_string())]);
        assert!(matches!(
            ConsoleSink::from_params("con", LogLevel::ERROR, &params),
            Err(TelemetryError::Config { .. })
        ));
    }
}
