#[cfg(test)]
mod tests {
    use dcplus::libs::config::{Config, ConfigStore, DetectionMode, IdleScopeMode, CONFIG_FILE_NAME};
    use dcplus::libs::error::DcError;
    use dcplus::libs::monitors::MonitorGeometry;
    use dcplus::libs::overlay::OverlayMode;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    const A: MonitorGeometry = MonitorGeometry::new(0, 0, 1920, 1080);
    const B: MonitorGeometry = MonitorGeometry::new(1920, 0, 3840, 1080);

    /// Test context with a config store inside a temporary directory.
    struct ConfigTestContext {
        temp_dir: TempDir,
        store: ConfigStore,
    }

    impl ConfigTestContext {
        fn write(&self, json: &str) {
            fs::write(self.store.path(), json).unwrap();
        }
    }

    impl TestContext for ConfigTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let store = ConfigStore::at(temp_dir.path().join(CONFIG_FILE_NAME));
            ConfigTestContext { temp_dir, store }
        }
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_missing_file_reads_as_none(ctx: &mut ConfigTestContext) {
        assert!(ctx.store.read().unwrap().is_none());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_first_load_creates_default_with_all_monitors(ctx: &mut ConfigTestContext) {
        let config = ctx.store.load(&vec![A, B]).unwrap();

        assert!(ctx.store.path().exists());
        assert_eq!(config.monitors, vec![A, B]);
        assert_eq!(config.monitor_indices, vec![0, 1]);
        assert_eq!(ctx.store.read().unwrap(), Some(config));
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_missing_keys_take_defaults(ctx: &mut ConfigTestContext) {
        ctx.write(r#"{"timeout": 2}"#);
        let config = ctx.store.read().unwrap().unwrap();

        assert!(config.enabled);
        assert_eq!(config.mode, OverlayMode::Blank);
        assert_eq!(config.interval, 30);
        assert_eq!(config.scope, IdleScopeMode::System);
        assert_eq!(config.detection_mode, DetectionMode::Input);
        assert!(config.controller.enabled);
        assert!(!config.controller.rawinput);
        assert_eq!(config.controller.stick_deadzone, 7849);
        assert_eq!(config.controller.trigger_threshold, 30);
        assert_eq!(config.scheduler().timeout(), Duration::from_secs(120));
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_gui_keys_are_parsed_and_unknown_keys_ignored(ctx: &mut ConfigTestContext) {
        ctx.write(
            r#"{
                "enabled": true,
                "timeout": 0.5,
                "mode": "slideshow",
                "monitors": [[0, 0, 1920, 1080], [1920, 0, 3840, 1080]],
                "monitor_indices": [0, 1],
                "file_paths": ["C:/a.png", "C:/b.png"],
                "interval": 12,
                "scope": "per-monitor",
                "detection_mode": "both",
                "monitor_modes": {"1": "gif"},
                "controller": {"rawinput": true, "stick_deadzone": 9000, "trigger_threshold": 50},
                "auto_update_enabled": false
            }"#,
        );
        let config = ctx.store.read().unwrap().unwrap();
        let scheduler = config.scheduler();

        assert_eq!(scheduler.mode, OverlayMode::Slideshow);
        assert_eq!(scheduler.target_monitors, vec![A, B]);
        assert_eq!(scheduler.interval_seconds, 12);
        assert_eq!(scheduler.scope, IdleScopeMode::PerMonitor);
        assert_eq!(scheduler.detection_mode, DetectionMode::Both);
        assert_eq!(scheduler.mode_for(0), OverlayMode::Slideshow);
        assert_eq!(scheduler.mode_for(1), OverlayMode::Gif);
        assert_eq!(scheduler.timeout(), Duration::from_secs(30));

        let detection = config.detection();
        assert!(detection.controller_enabled);
        assert!(detection.controller_use_raw_input);
        assert_eq!(detection.stick_deadzone, 9000);
        assert_eq!(detection.trigger_threshold, 50);
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_raw_input_requires_controller_support(ctx: &mut ConfigTestContext) {
        ctx.write(r#"{"controller": {"enabled": false, "rawinput": true}}"#);
        let detection = ctx.store.read().unwrap().unwrap().detection();

        assert!(!detection.controller_enabled);
        assert!(!detection.controller_use_raw_input);
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_malformed_json_is_invalid(ctx: &mut ConfigTestContext) {
        ctx.write(r#"{"enabled": true, "timeout": "#);

        match ctx.store.read() {
            Err(DcError::ConfigInvalid(_)) => {}
            other => panic!("expected ConfigInvalid, got {:?}", other),
        }
        // A broken file is never replaced by the default.
        assert!(matches!(ctx.store.load(&vec![A]), Err(DcError::ConfigInvalid(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_read_retries_while_file_is_rewritten() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(temp_dir.path().join(CONFIG_FILE_NAME));
        fs::write(store.path(), r#"{"enabled": true, "timeout": "#).unwrap();

        let path = store.path().to_path_buf();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            fs::write(path, r#"{"enabled": true, "timeout": 3}"#).unwrap();
        });

        let started = tokio::time::Instant::now();
        let config = store.read_async().await.unwrap().unwrap();

        assert_eq!(config.timeout, 3.0);
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(started.elapsed() < Duration::from_millis(150));
        writer.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_load_gives_up_on_broken_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(temp_dir.path().join(CONFIG_FILE_NAME));
        fs::write(store.path(), "{\"enabled\": tru").unwrap();

        assert!(matches!(store.load_async(&vec![A]).await, Err(DcError::ConfigInvalid(_))));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{\"enabled\": tru");
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_save_then_read(ctx: &mut ConfigTestContext) {
        let mut config = Config::with_monitors(&[A]);
        config.timeout = 0.25;
        config.mode = OverlayMode::Single;
        config.file_paths = vec!["image.png".to_string()];
        ctx.store.save(&config).unwrap();

        assert_eq!(ctx.store.read().unwrap(), Some(config));
        assert!(!ctx.temp_dir.path().join("config.json.tmp").exists());
    }

    #[test]
    fn test_timeout_is_truncated_to_whole_seconds() {
        let config = Config {
            timeout: 0.1667,
            ..Config::default()
        };
        assert_eq!(config.scheduler().timeout(), Duration::from_secs(10));

        let config = Config {
            timeout: 0.0,
            ..Config::default()
        };
        assert_eq!(config.scheduler().timeout(), Duration::ZERO);
    }

    #[test]
    fn test_unusable_timeout_falls_back_to_five_minutes() {
        for raw in [r#"{"timeout": null}"#, r#"{"timeout": "soon"}"#, r#"{"timeout": -3}"#] {
            let config: Config = serde_json::from_str(raw).unwrap();
            let scheduler = config.scheduler();
            assert_eq!(scheduler.timeout(), Duration::from_secs(300), "{}", raw);
            // Structural comparison must stay stable for the hot-reload check.
            assert_eq!(scheduler, config.scheduler());
        }

        let config: Config = serde_json::from_str(r#"{"timeout": "1.5"}"#).unwrap();
        assert_eq!(config.scheduler().timeout(), Duration::from_secs(90));
    }
}
