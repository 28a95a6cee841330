//! # Integration Tests
//!
//! End-to-end scenarios across crates:
//! - level mask contract checks
//! - config file -> logger -> console/telemetry sinks
//! - telemetry exporter pipeline (queue + worker + JSON lines)

#[cfg(test)]
mod contract_tests {
    use contracts::LogLevel;

    #[test]
    fn test_union_commutative_and_idempotent() {
        for m in 0..=255u8 {
            for b in [0u8, 1, 6, 32, 200, 255] {
                let (m, b) = (LogLevel::from_bits(m), LogLevel::from_bits(b));
                assert_eq!(m.union(b), b.union(m));
                assert_eq!(m.union(b).union(b), m.union(b));
                assert_eq!(m.union(b).subtract(b), m.subtract(b));
            }
        }
    }

    #[test]
    fn test_default_global_level() {
        assert_eq!(LogLevel::default_global(), LogLevel::ALL - LogLevel::DEBUG);
        assert_eq!(LogLevel::default_global().bits(), 239);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::{self, Write};
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{LogLevel, Payload, Sink, TelemetryClient, TelemetryError};
    use dispatcher::{
        create_logger, ConsoleSink, ExporterHandle, JsonLinesExporter, Logger, MemoryClient,
        TelemetrySink,
    };
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
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

    fn console(name: &str, level: LogLevel) -> (Arc<dyn Sink>, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let sink = ConsoleSink::with_writer(name, buffer.clone())
            .with_color(false)
            .with_level(level);
        (Arc::new(sink), buffer)
    }

    /// Two console sinks: A (error) and B (error|info)
    #[test]
    fn test_e2e_console_fan_out() {
        let logger = Logger::new("app");
        let (a, a_out) = console("A", LogLevel::ERROR);
        let (b, b_out) = console("B", LogLevel::ERROR | LogLevel::INFO);
        logger.add_sink(a).unwrap();
        logger.add_sink(b).unwrap();

        logger.info("msg", None).unwrap();
        assert!(a_out.lines().is_empty());
        assert_eq!(b_out.lines(), vec!["Info: msg".to_string()]);

        logger.error("boom", None).unwrap();
        assert_eq!(a_out.lines(), vec!["Error: boom".to_string()]);
        assert_eq!(b_out.lines().len(), 2);
        assert_eq!(logger.sink_ids(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_e2e_shared_sink_between_loggers() {
        let (shared, _out) = console("shared", LogLevel::ERROR | LogLevel::WARNING);
        let first = Logger::new("first");
        let second = Logger::new("second");
        first.add_sink(Arc::clone(&shared)).unwrap();
        second.add_sink(shared).unwrap();

        first.set_sink_level("shared", LogLevel::NONE).unwrap();
        assert_eq!(second.sink_level("shared").unwrap(), LogLevel::NONE);

        first.enable_sink_level("shared", LogLevel::METRIC).unwrap();
        assert_eq!(second.sink_level("shared").unwrap(), LogLevel::METRIC);
    }

    #[test]
    fn test_e2e_level_management() {
        let logger = Logger::with_level("app", LogLevel::ERROR | LogLevel::WARNING);
        let (inherit, _) = console("inherit", LogLevel::NONE);
        let (explicit, _) = console("explicit", LogLevel::ERROR | LogLevel::WARNING);
        logger.add_sink(inherit).unwrap();
        logger.add_sink(explicit).unwrap();
        assert_eq!(
            logger.sink_level("inherit").unwrap(),
            LogLevel::ERROR | LogLevel::WARNING
        );

        logger
            .enable_sink_level("explicit", LogLevel::ERROR | LogLevel::INFO)
            .unwrap();
        assert_eq!(
            logger.sink_level("explicit").unwrap(),
            LogLevel::ERROR | LogLevel::WARNING | LogLevel::INFO
        );

        logger.enable_level(LogLevel::INFO);
        logger.disable_level(LogLevel::INFO | LogLevel::VERBOSE);
        assert_eq!(logger.level(), LogLevel::ERROR | LogLevel::WARNING);
        assert_eq!(
            logger.sink_level("explicit").unwrap(),
            LogLevel::ERROR | LogLevel::WARNING
        );

        logger.set_level(LogLevel::NONE);
        assert_eq!(logger.sink_level("inherit").unwrap(), LogLevel::NONE);
        assert_eq!(logger.sink_level("explicit").unwrap(), LogLevel::NONE);

        assert!(matches!(
            logger.sink_level("missing"),
            Err(TelemetryError::SinkNotFound { .. })
        ));
    }

    #[test]
    fn test_e2e_config_to_telemetry_envelopes() {
        let config = ConfigLoader::load_from_str(
            r#"
name = "svc"
level = "all"

[[sinks]]
name = "appInsights"
sink_type = "telemetry"
level = "event|metric|exception|error"
[sinks.params]
access_key = "ikey"

[[sinks]]
name = "trace"
sink_type = "tracing"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let client = Arc::new(MemoryClient::new());
        let logger = create_logger(&config, Some(client.clone() as Arc<dyn TelemetryClient>)).unwrap();
        assert_eq!(logger.sink_ids(), vec!["appInsights".to_string(), "trace".to_string()]);
        assert_eq!(logger.sink_level("trace").unwrap(), LogLevel::ALL);

        let mut data = serde_json::Map::new();
        data.insert("user".to_string(), json!("u1"));
        logger.info("not for telemetry", Some(&data)).unwrap();
        logger.event("signup", 12.0, Some(&data)).unwrap();
        logger.error("failed", Some(&data)).unwrap();

        let envelopes = client.take();
        assert_eq!(envelopes.len(), 2);
        assert!(envelopes.iter().all(|e| e.access_key == "ikey"));
        assert!(matches!(&envelopes[0].payload, Payload::Event { name, .. } if name == "signup"));
        match &envelopes[1].payload {
            Payload::Trace {
                message,
                properties,
                ..
            } => {
                assert_eq!(message, "failed");
                assert_eq!(properties["user"], "u1");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_e2e_nested_logger() {
        let (leaf, leaf_out) = console("leaf", LogLevel::NONE);
        let inner = Logger::with_level("inner", LogLevel::WARNING);
        inner.add_sink(leaf).unwrap();

        let outer = Logger::with_level("outer", LogLevel::ERROR | LogLevel::WARNING);
        outer.add_sink(Arc::new(inner)).unwrap();

        outer.warn("careful", None).unwrap();
        outer.error("not enabled inside", None).unwrap();
        assert_eq!(leaf_out.lines(), vec!["Warning: careful".to_string()]);

        outer.set_level(LogLevel::NONE);
        outer.warn("dropped", None).unwrap();
        assert_eq!(leaf_out.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_e2e_exporter_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");

        let exporter = JsonLinesExporter::create("file", &path).await.unwrap();
        let handle = ExporterHandle::spawn(exporter, 64);

        let sink = TelemetrySink::new("ikey", Arc::new(handle.client()))
            .unwrap()
            .with_level(LogLevel::ALL);
        let logger = Logger::new("pipeline");
        logger.add_sink(Arc::new(sink)).unwrap();

        logger.verbose("chatty", None).unwrap();
        logger
            .metric("latency", 3.5, Default::default(), None)
            .unwrap();

        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;
        assert_eq!(metrics.snapshot().export_count, 2);

        let lines: Vec<Value> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["payload"]["kind"], "trace");
        assert_eq!(lines[0]["payload"]["severity"], 0);
        assert_eq!(lines[1]["payload"]["kind"], "metric");
        assert_eq!(lines[1]["payload"]["value"], 3.5);
        assert_eq!(lines[0]["session_id"], lines[1]["session_id"]);

        // Queue closed after shutdown: the sink reports, the logger aggregates
        let err = logger.info("late", None).unwrap_err();
        assert_eq!(err.failures().len(), 1);
    }
}
