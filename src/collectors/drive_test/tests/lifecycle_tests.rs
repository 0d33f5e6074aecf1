//! Start/stop transitions of the drive-test collector

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    use crate::collectors::drive_test::tests::support::{
        FakeCells, FakeLocation, MemoryStore, collector, config,
    };
    use crate::collectors::drive_test::{CollectorError, CollectorEvent, CollectorStatus};
    use crate::models::ProbeKind;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_runs_immediately() {
        let store = Arc::new(MemoryStore::default());
        let collector = collector(FakeLocation::at(52.0, 4.0), FakeCells::lte(), store.clone());

        collector.start(config(&[ProbeKind::Ping])).await.unwrap();
        sleep(Duration::from_millis(100)).await;

        assert_eq!(store.len(), 1);
        assert!(collector.is_active());
        assert_eq!(collector.status().samples_collected, 1);

        collector.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_active_keeps_single_loop() {
        let store = Arc::new(MemoryStore::default());
        let collector = collector(FakeLocation::at(52.0, 4.0), FakeCells::lte(), store.clone());

        collector.start(config(&[ProbeKind::Ping])).await.unwrap();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(store.len(), 1);

        let second = collector.start(config(&[ProbeKind::Dns])).await;
        assert!(matches!(second, Err(CollectorError::AlreadyActive)));
        assert_eq!(collector.status().samples_collected, 1);

        // One interval later exactly one more tick has run.
        sleep(Duration::from_secs(5)).await;
        assert_eq!(store.len(), 2);

        assert_eq!(collector.stop().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stop_while_idle_is_harmless() {
        let store = Arc::new(MemoryStore::default());
        let collector = collector(FakeLocation::at(52.0, 4.0), FakeCells::lte(), store.clone());

        let result = collector.stop().await;

        assert!(matches!(result, Err(CollectorError::NotActive)));
        assert_eq!(collector.status(), CollectorStatus::idle());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_invalid_interval_is_rejected() {
        let store = Arc::new(MemoryStore::default());
        let collector = collector(FakeLocation::at(52.0, 4.0), FakeCells::lte(), store);

        let result = collector
            .start(config(&[]).with_interval(Duration::ZERO))
            .await;

        assert!(matches!(result, Err(CollectorError::InvalidInterval(_))));
        assert!(!collector.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_publishes_final_status() {
        let store = Arc::new(MemoryStore::default());
        let collector = collector(FakeLocation::at(52.0, 4.0), FakeCells::lte(), store);
        let mut events = collector.subscribe();

        collector.start(config(&[])).await.unwrap();
        sleep(Duration::from_millis(100)).await;
        let total = collector.stop().await.unwrap();

        assert_eq!(total, 1);
        let status = collector.status();
        assert!(!status.active);
        assert_eq!(status.samples_collected, 1);
        assert_eq!(status.message, "Drive test stopped. 1 samples collected");
        assert!(status.last_preview.unwrap().ends_with("Sample #1"));

        assert!(matches!(events.recv().await.unwrap(), CollectorEvent::Started { .. }));
        match events.recv().await.unwrap() {
            CollectorEvent::SampleCollected { sample_number, .. } => assert_eq!(sample_number, 1),
            other => panic!("expected a sample, got {other:?}"),
        }
        assert!(matches!(
            events.recv().await.unwrap(),
            CollectorEvent::Stopped { total_samples: 1 }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_counter() {
        let store = Arc::new(MemoryStore::default());
        let collector = collector(FakeLocation::at(52.0, 4.0), FakeCells::lte(), store.clone());

        collector.start(config(&[])).await.unwrap();
        sleep(Duration::from_millis(100)).await;
        collector.stop().await.unwrap();

        collector.start(config(&[])).await.unwrap();
        sleep(Duration::from_millis(100)).await;

        assert_eq!(collector.status().samples_collected, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(collector.stop().await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_stop() {
        let store = Arc::new(MemoryStore::default());
        let collector = collector(FakeLocation::at(52.0, 4.0), FakeCells::lte(), store.clone());

        collector.start(config(&[])).await.unwrap();
        sleep(Duration::from_millis(100)).await;
        collector.stop().await.unwrap();

        sleep(Duration::from_secs(60)).await;
        assert_eq!(store.len(), 1);
    }
}
