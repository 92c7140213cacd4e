//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 -> 负载曲线 -> 分发循环 的端到端测试（暂停时钟）
//! - sink 行为与持久化

#[cfg(test)]
mod contract_tests {
    use contracts::{EventType, LoadMode, QueryEvent};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_event_wire_shape() {
        let event = event_factory::EventFactory::seeded(1)
            .generate(1, false, false)
            .next()
            .unwrap();
        let json = serde_json::to_value(&event).unwrap();

        for key in [
            "query_id",
            "timestamp",
            "event_type",
            "query_text",
            "metadata",
            "payload",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        let event_type = json["event_type"].as_str().unwrap();
        assert!(EventType::ALL.iter().any(|t| t.as_str() == event_type));
        assert_eq!(json["payload"]["stage"], "processing");

        let back: QueryEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_mode_rates() {
        let rates: Vec<_> = LoadMode::ALL.iter().map(|m| m.rate(100)).collect();
        assert_eq!(rates, vec![100, 200, 0, 100]);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader, SinkStore};
    use contracts::{EventSink, LoadMode, QueryEvent, SinkType};
    use dispatcher::{
        create_sink, AnySink, CancellationToken, DispatchConfig, DispatchLoopBuilder, MemorySink,
    };
    use load_profile::RunProfile;

    const RUN_TOML: &str = r#"
[run]
base_rate = 3
duration_secs = 6
include_errors = false
large_queries = false
seed = 11

[[schedule]]
mode = "steady"
duration_secs = 2

[[schedule]]
mode = "outage"
duration_secs = 2

[[schedule]]
mode = "recovery"
duration_secs = 2

[sink]
name = "mem"
sink_type = "memory"
"#;

    /// End-to-end test: RunBlueprint -> RunProfile -> DispatchLoop -> MemorySink
    ///
    /// 验证完整的数据流：
    /// 1. 配置解析与校验
    /// 2. schedule 决定每个 epoch 的速率
    /// 3. 每个事件编码后发送到 sink
    #[tokio::test(start_paused = true)]
    async fn test_e2e_scheduled_run() {
        let blueprint = ConfigLoader::load_from_str(RUN_TOML, ConfigFormat::Toml).unwrap();
        let profile = RunProfile::from_blueprint(&blueprint).unwrap();
        let sink = Arc::new(MemorySink::new("mem"));

        let mut dispatch = DispatchLoopBuilder::new(Arc::clone(&sink), profile)
            .config(DispatchConfig::from(&blueprint.run))
            .build()
            .unwrap();
        let report = dispatch.run().await;

        let per_epoch: Vec<_> = report.epochs.iter().map(|e| e.dispatched()).collect();
        assert_eq!(per_epoch, vec![15, 15, 0, 0, 15, 15]);
        assert_eq!(sink.len(), 60);
        assert!(report.duration >= Duration::from_secs(6));
        assert!(report.duration < Duration::from_millis(6_100));

        // every payload is a complete JSON event, no errors injected
        for payload in sink.payloads() {
            let event: QueryEvent = serde_json::from_slice(&payload).unwrap();
            assert!(event.metadata.error.is_none());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_e2e_sink_from_blueprint() {
        let blueprint = ConfigLoader::load_from_str(RUN_TOML, ConfigFormat::Toml).unwrap();
        let sink_config = blueprint.sink.clone().unwrap();
        let sink = Arc::new(create_sink(&sink_config).await.unwrap());
        assert_eq!(sink.sink_type(), SinkType::Memory);

        let mut dispatch = DispatchLoopBuilder::new(Arc::clone(&sink), LoadMode::Burst)
            .config(DispatchConfig {
                duration_secs: 2,
                ..DispatchConfig::from(&blueprint.run)
            })
            .build()
            .unwrap();
        let report = dispatch.run().await;
        sink.close().await.unwrap();

        assert_eq!(report.totals().sent, 60);
        let AnySink::Memory(memory) = sink.as_ref() else {
            panic!("expected memory sink");
        };
        assert!(memory.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_e2e_same_seed_same_payload_content() {
        async fn run_once() -> Vec<QueryEvent> {
            let sink = Arc::new(MemorySink::new("mem"));
            let mut dispatch = DispatchLoopBuilder::new(Arc::clone(&sink), LoadMode::Steady)
                .config(DispatchConfig {
                    base_rate: 2,
                    duration_secs: 1,
                    max_in_flight: 1,
                    seed: Some(99),
                    ..Default::default()
                })
                .build()
                .unwrap();
            dispatch.run().await;
            sink.payloads()
                .iter()
                .map(|p| serde_json::from_slice(p).unwrap())
                .collect()
        }

        let ids = |events: Vec<QueryEvent>| -> Vec<_> {
            events.into_iter().map(|e| (e.query_id, e.query_text)).collect()
        };
        assert_eq!(ids(run_once().await), ids(run_once().await));
    }

    #[tokio::test(start_paused = true)]
    async fn test_e2e_cancel_mid_run() {
        let sink = Arc::new(MemorySink::new("mem"));
        let cancel = CancellationToken::new();
        let mut dispatch = DispatchLoopBuilder::new(Arc::clone(&sink), LoadMode::Steady)
            .config(DispatchConfig {
                base_rate: 1,
                duration_secs: 60,
                large_queries: false,
                ..Default::default()
            })
            .cancellation(cancel.clone())
            .build()
            .unwrap();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            cancel.cancel();
        });
        let report = dispatch.run().await;
        canceller.await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.epoch_count(), 3);
        assert_eq!(sink.len(), 15);
    }

    #[tokio::test]
    async fn test_e2e_udp_oversized_skip() {
        let receiver = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap();

        let config = contracts::SinkConfig {
            name: "udp".to_string(),
            sink_type: SinkType::Network,
            params: [
                ("addr".to_string(), addr.to_string()),
                ("max_packet_size".to_string(), "64".to_string()),
            ]
            .into_iter()
            .collect(),
        };
        let sink = Arc::new(create_sink(&config).await.unwrap());

        let mut dispatch = DispatchLoopBuilder::new(Arc::clone(&sink), LoadMode::Steady)
            .config(DispatchConfig {
                base_rate: 2,
                duration_secs: 3,
                epoch: Duration::from_millis(10),
                ..Default::default()
            })
            .build()
            .unwrap();
        let report = dispatch.run().await;
        sink.close().await.unwrap();

        assert_eq!(report.epoch_count(), 3);
        let totals = report.totals();
        assert_eq!(totals.sent, 0);
        assert_eq!(totals.failed, 0);
        assert!(totals.skipped >= 30);
        assert_eq!(totals.skipped, report.stats.dispatched);
    }

    #[test]
    fn test_sink_store_feeds_create_sink_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = SinkStore::new(dir.path().join("sink.config.json"));
        let blueprint = ConfigLoader::load_from_str(RUN_TOML, ConfigFormat::Toml).unwrap();

        store.save(blueprint.sink.as_ref().unwrap()).unwrap();
        assert_eq!(store.load().unwrap(), blueprint.sink);
    }
}
