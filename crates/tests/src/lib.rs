//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 端到端测试：配置 → DispatcherBuilder → put → 上层解码器 / sinks

#[cfg(test)]
mod contract_tests {
    use contracts::{OutputKind, PacketSubtype};

    #[test]
    fn test_kind_codes_are_stable() {
        let codes: Vec<_> = [
            OutputKind::Annotation,
            OutputKind::Passthrough,
            OutputKind::Binary,
            OutputKind::Meta,
            OutputKind::Packet,
        ]
        .iter()
        .map(OutputKind::code)
        .collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4]);
        assert_eq!(OutputKind::from_code(5), OutputKind::Unsupported(5));
        assert_eq!(PacketSubtype::LOCATION, 0);
        assert_eq!(PacketSubtype::FIELD, 1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        ContractError, Decoder, DecoderOutput, OutputKind, OutputSink, PacketSubtype,
        ProtocolEvent, StackBlueprint, Value,
    };
    use dispatcher::{Dispatcher, DispatcherBuilder};

    /// uart-1 (bytes) -> line-1 (text lines)
    const STACK: &str = r#"
[[decoders]]
id = "uart"
annotation_classes = [
    { id = "rx-data", description = "RX data" },
    { id = "rx-error", description = "RX error" },
]
binary_classes = [{ id = "rx", description = "RX dump" }]

[[decoders]]
id = "line"
annotation_classes = [{ id = "line", description = "Text line" }]

[[instances]]
id = "uart-1"
decoder = "uart"
stack = ["line-1"]
outputs = [
    { kind = "annotation" },
    { kind = "passthrough" },
    { kind = "meta", meta = { value_type = "int", name = "bitrate", description = "Bitrate" } },
    { kind = "binary" },
]

[[instances]]
id = "line-1"
decoder = "line"
outputs = [{ kind = "annotation" }, { kind = "packet", proto_id = "line" }]

[[sinks]]
name = "dump"
kind = "binary"
sink_type = "file"
params = { path = "PATH" }
"#;

    const ANN: u32 = 0;
    const PASS: u32 = 1;
    const META: u32 = 2;
    const BIN: u32 = 3;

    /// Lower decoder: one byte per call
    struct UartDecoder {
        bitrate_sent: bool,
    }

    impl Decoder for UartDecoder {
        fn decode(
            &mut self,
            start: u64,
            end: u64,
            data: &Value,
            out: &mut dyn DecoderOutput,
        ) -> Result<(), ContractError> {
            if !self.bitrate_sent {
                out.put(0, 0, META, &Value::Int(115_200))?;
                self.bitrate_sent = true;
            }

            let byte = data
                .as_int()
                .ok_or_else(|| ContractError::decode(out.instance_id().to_string(), "expected int"))?;
            let text = format!("0x{byte:02x}");
            out.put(
                start,
                end,
                ANN,
                &Value::List(vec![Value::Int(0), Value::str_list([text])]),
            )?;
            out.put(
                start,
                end,
                BIN,
                &Value::Tuple(vec![Value::Int(0), Value::from(&[byte as u8][..])]),
            )?;
            out.put(start, end, PASS, data)?;
            Ok(())
        }
    }

    /// Upper decoder: collects bytes into newline terminated lines
    #[derive(Default)]
    struct LineDecoder {
        buf: String,
        line_start: Option<u64>,
        lines: i64,
    }

    impl Decoder for LineDecoder {
        fn decode(
            &mut self,
            start: u64,
            end: u64,
            data: &Value,
            out: &mut dyn DecoderOutput,
        ) -> Result<(), ContractError> {
            let Some(byte) = data.as_int().and_then(|b| u8::try_from(b).ok()) else {
                return Err(ContractError::decode(out.instance_id().to_string(), "not a byte"));
            };
            let line_start = *self.line_start.get_or_insert(start);

            if byte != b'\n' {
                self.buf.push(char::from(byte));
                return Ok(());
            }

            let line = std::mem::take(&mut self.buf);
            self.line_start = None;
            out.put(
                line_start,
                end,
                0,
                &Value::List(vec![Value::Int(0), Value::str_list([line.clone()])]),
            )?;
            out.put(
                line_start,
                end,
                1,
                &Value::List(vec![
                    Value::Int(0),
                    Value::Int(PacketSubtype::FIELD),
                    Value::Int(self.lines),
                    Value::from("text"),
                    Value::from(line),
                ]),
            )?;
            self.lines += 1;
            Ok(())
        }
    }

    type Recorded = Arc<Mutex<Vec<serde_json::Value>>>;

    struct RecordingSink {
        name: String,
        events: Recorded,
    }

    impl OutputSink for RecordingSink {
        fn name(&self) -> &str {
            &self.name
        }

        fn deliver(&mut self, event: &ProtocolEvent<'_>) -> Result<(), ContractError> {
            let json = serde_json::to_value(event)
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
            self.events.lock().unwrap().push(json);
            Ok(())
        }
    }

    fn load(path: &std::path::Path) -> StackBlueprint {
        let content = STACK.replace("PATH", &path.display().to_string());
        ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap()
    }

    fn build(blueprint: StackBlueprint) -> Dispatcher {
        DispatcherBuilder::new(blueprint)
            .build(|cfg, _| -> Box<dyn Decoder> {
                match cfg.decoder.as_str() {
                    "uart" => Box::new(UartDecoder {
                        bitrate_sent: false,
                    }),
                    _ => Box::new(LineDecoder::default()),
                }
            })
            .unwrap()
    }

    fn record(dispatcher: &mut Dispatcher, kind: OutputKind) -> Recorded {
        let events = Recorded::default();
        dispatcher.register_sink(
            0,
            kind,
            Box::new(RecordingSink {
                name: format!("recording-{kind}"),
                events: Arc::clone(&events),
            }),
        );
        events
    }

    fn feed(dispatcher: &mut Dispatcher, text: &str) {
        for (i, byte) in text.bytes().enumerate() {
            let start = i as u64 * 10;
            dispatcher
                .send("uart-1", start, start + 10, &Value::Int(i64::from(byte)))
                .unwrap();
        }
    }

    /// End-to-end: blueprint -> builder -> lower decoder -> stacked decoder -> sinks
    #[test]
    fn test_e2e_stacked_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("dump.jsonl");
        let mut dispatcher = build(load(&dump));

        let annotations = record(&mut dispatcher, OutputKind::Annotation);
        let packets = record(&mut dispatcher, OutputKind::Packet);
        let meta = record(&mut dispatcher, OutputKind::Meta);

        feed(&mut dispatcher, "hi\nok\n");
        dispatcher.flush();

        // 6 byte annotations from uart-1, 2 line annotations from line-1
        let annotations = annotations.lock().unwrap();
        let by_instance = |id: &str| {
            annotations
                .iter()
                .filter(|e| e["stream"]["instance"] == id)
                .count()
        };
        assert_eq!(by_instance("uart-1"), 6);
        assert_eq!(by_instance("line-1"), 2);

        let lines: Vec<_> = annotations
            .iter()
            .filter(|e| e["stream"]["instance"] == "line-1")
            .map(|e| e["body"]["annotation"]["text"][0].clone())
            .collect();
        assert_eq!(lines, vec!["hi", "ok"]);

        // Line spans cover all their bytes, newline included
        let first_line = annotations
            .iter()
            .find(|e| e["stream"]["instance"] == "line-1")
            .unwrap();
        assert_eq!(first_line["start_sample"], 0);
        assert_eq!(first_line["end_sample"], 30);

        let packets = packets.lock().unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[1]["stream"]["proto_id"], "line");
        assert_eq!(
            packets[1]["body"]["packet"]["subtype"]["field"]["field_value"],
            "ok"
        );

        let meta = meta.lock().unwrap();
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0]["body"]["meta"]["int64"], 115_200);

        let dumped = std::fs::read_to_string(&dump).unwrap();
        assert_eq!(dumped.lines().count(), 6);

        let snap = dispatcher.snapshot();
        assert_eq!(snap.forwarded, 6);
        assert_eq!(snap.conversion_failures, 0);
        assert_eq!(snap.forward_failures, 0);
    }

    /// A failing stacked decoder is logged and counted; the lower decoder keeps going
    #[test]
    fn test_e2e_upper_failure_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = build(load(&dir.path().join("dump.jsonl")));
        let annotations = record(&mut dispatcher, OutputKind::Annotation);

        // 300 is not a byte: LineDecoder fails, UartDecoder still annotates
        dispatcher
            .send("uart-1", 0, 10, &Value::Int(300))
            .unwrap();
        feed(&mut dispatcher, "a\n");

        let snap = dispatcher.snapshot();
        assert_eq!(snap.forward_failures, 1);
        assert_eq!(snap.forwarded, 2);
        // 3 byte annotations and the "a" line
        assert_eq!(annotations.lock().unwrap().len(), 4);
    }

    /// Sinks are registered per session
    #[test]
    fn test_e2e_session_isolation() {
        let dir = tempfile::tempdir().unwrap();
        let mut blueprint = load(&dir.path().join("dump.jsonl"));
        for instance in &mut blueprint.instances {
            instance.session = 1;
        }
        let mut dispatcher = build(blueprint);
        let session0 = record(&mut dispatcher, OutputKind::Annotation);

        feed(&mut dispatcher, "x\n");
        assert!(session0.lock().unwrap().is_empty());
    }

    /// A Meta type mismatch reaches the producing decoder as an error
    #[test]
    fn test_e2e_meta_mismatch_reaches_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = build(load(&dir.path().join("dump.jsonl")));
        let _meta = record(&mut dispatcher, OutputKind::Meta);

        let seen: Arc<Mutex<Option<String>>> = Arc::default();
        let seen_in = Arc::clone(&seen);
        let blueprint = StackBlueprint {
            decoders: load(&dir.path().join("other.jsonl")).decoders,
            instances: vec![contracts::InstanceConfig {
                id: "probe".into(),
                decoder: "uart".into(),
                session: 0,
                outputs: vec![contracts::OutputConfig {
                    kind: OutputKind::Meta,
                    proto_id: None,
                    meta: Some(contracts::MetaSpec::new(
                        contracts::ValueType::Int,
                        "bitrate",
                        "",
                    )),
                }],
                stack: vec![],
            }],
            ..Default::default()
        };

        let mut probe = DispatcherBuilder::new(blueprint)
            .build(move |_, _| -> Box<dyn Decoder> {
                let seen = Arc::clone(&seen_in);
                Box::new(
                    move |s: u64, e: u64, _: &Value, out: &mut dyn DecoderOutput| {
                        if let Err(err) = out.put(s, e, 0, &Value::Float(9600.0)) {
                            *seen.lock().unwrap() = Some(err.to_string());
                        }
                        Ok::<(), ContractError>(())
                    },
                )
            })
            .unwrap();
        let _probe_meta = record(&mut probe, OutputKind::Meta);

        probe.send("probe", 0, 1, &Value::Null).unwrap();
        let err = seen.lock().unwrap().clone().unwrap();
        assert!(err.contains("meta value"), "got: {err}");

        // The well-typed stack is unaffected
        feed(&mut dispatcher, "\n");
        assert_eq!(dispatcher.snapshot().conversion_failures, 0);
    }

    /// Replaying through the JSON lines sink yields parseable output per event
    #[test]
    fn test_e2e_jsonl_sink_output() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("nested").join("dump.jsonl");
        let mut dispatcher = build(load(&dump));

        feed(&mut dispatcher, "AB");
        dispatcher.flush();

        let lines: Vec<HashMap<String, serde_json::Value>> = std::fs::read_to_string(&dump)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["body"]["binary"]["bytes"], serde_json::json!([0x41]));
        assert_eq!(lines[1]["start_sample"], 10);
    }
}
