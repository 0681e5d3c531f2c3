#[cfg(test)]
mod tests {
    use dcplus::libs::activity::ActivityAggregator;
    use dcplus::libs::config::{DetectionConfig, IdleScopeMode};
    use dcplus::libs::monitors::MonitorGeometry;
    use dcplus::libs::sources::hooks::{HookDispatcher, InputEvent};
    use dcplus::libs::sources::idle_gauge::NoGauge;
    use std::sync::Arc;
    use tokio::time::{self, Duration};

    const A: MonitorGeometry = MonitorGeometry::new(0, 0, 1920, 1080);
    const B: MonitorGeometry = MonitorGeometry::new(1920, 0, 3840, 1080);

    fn aggregator(scope: IdleScopeMode) -> Arc<ActivityAggregator> {
        let detection = DetectionConfig {
            scope,
            ..DetectionConfig::default()
        };
        let aggregator = Arc::new(ActivityAggregator::new(Arc::new(NoGauge), detection));
        aggregator.set_monitors(&[A, B]);
        aggregator
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_pixel_jitter_does_not_count() {
        let aggregator = aggregator(IdleScopeMode::System);
        let mut dispatcher = HookDispatcher::new(aggregator.clone());

        assert!(dispatcher.handle(InputEvent::MouseMove { x: 100, y: 100 }));
        time::advance(Duration::from_secs(3)).await;

        assert!(!dispatcher.handle(InputEvent::MouseMove { x: 101, y: 100 }));
        assert!(!dispatcher.handle(InputEvent::MouseMove { x: 100, y: 101 }));
        assert_eq!(aggregator.get_idle_times().system(), Duration::from_secs(3));

        assert!(dispatcher.handle(InputEvent::MouseMove { x: 102, y: 100 }));
        assert_eq!(aggregator.get_idle_times().system(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_press_always_counts() {
        let aggregator = aggregator(IdleScopeMode::PerMonitor);
        let mut dispatcher = HookDispatcher::new(aggregator.clone());

        time::advance(Duration::from_secs(7)).await;
        assert!(dispatcher.handle(InputEvent::Key));

        let times = aggregator.get_idle_times();
        assert_eq!(times.system(), Duration::ZERO);
        assert_eq!(times.monitor(&A), Some(Duration::ZERO));
        assert_eq!(times.monitor(&B), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mouse_move_resets_monitor_under_cursor() {
        let aggregator = aggregator(IdleScopeMode::PerMonitor);
        let mut dispatcher = HookDispatcher::new(aggregator.clone());

        time::advance(Duration::from_secs(4)).await;
        dispatcher.handle(InputEvent::MouseMove { x: 2500, y: 600 });

        let times = aggregator.get_idle_times();
        assert_eq!(times.monitor(&A), Some(Duration::from_secs(4)));
        assert_eq!(times.monitor(&B), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_is_attributed_to_last_cursor_position() {
        let aggregator = aggregator(IdleScopeMode::PerMonitor);
        let mut dispatcher = HookDispatcher::new(aggregator.clone());

        dispatcher.handle(InputEvent::MouseMove { x: 50, y: 50 });
        time::advance(Duration::from_secs(6)).await;
        // Filtered jitter still moves the cursor the click is attributed to.
        dispatcher.handle(InputEvent::MouseMove { x: 51, y: 50 });
        assert!(dispatcher.handle(InputEvent::MouseButton));

        let times = aggregator.get_idle_times();
        assert_eq!(times.monitor(&A), Some(Duration::ZERO));
        assert_eq!(times.monitor(&B), Some(Duration::from_secs(6)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wheel_before_any_move_resets_everything() {
        let aggregator = aggregator(IdleScopeMode::PerMonitor);
        let mut dispatcher = HookDispatcher::new(aggregator.clone());

        time::advance(Duration::from_secs(2)).await;
        assert!(dispatcher.handle(InputEvent::Wheel));

        let times = aggregator.get_idle_times();
        assert_eq!(times.monitor(&A), Some(Duration::ZERO));
        assert_eq!(times.monitor(&B), Some(Duration::ZERO));
    }
}
