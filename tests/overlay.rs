#[cfg(test)]
mod tests {
    use dcplus::commands::preview::show_preview;
    use dcplus::libs::config::{Config, SchedulerConfig};
    use dcplus::libs::error::DcError;
    use dcplus::libs::monitors::MonitorGeometry;
    use dcplus::libs::overlay::{build_tasks, resolve_targets, OverlayMode, OverlayTarget, OverlayTask, ProcessRenderer, Renderer};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use tokio::time::{Duration, Instant};

    const A: MonitorGeometry = MonitorGeometry::new(0, 0, 1920, 1080);
    const B: MonitorGeometry = MonitorGeometry::new(1920, 0, 3840, 1080);
    const C: MonitorGeometry = MonitorGeometry::new(-1280, 0, 0, 1024);

    /// Renderer that keeps every task it was asked to show.
    #[derive(Default, Clone)]
    struct RecordingRenderer {
        shown: Arc<Mutex<Vec<OverlayTask>>>,
        terminated: Arc<Mutex<Vec<usize>>>,
    }

    impl Renderer for RecordingRenderer {
        type Handle = usize;

        fn show(&self, task: &OverlayTask) -> Result<usize, DcError> {
            let mut shown = self.shown.lock().unwrap();
            shown.push(task.clone());
            Ok(shown.len() - 1)
        }

        fn is_alive(&self, handle: &mut usize) -> bool {
            !self.terminated.lock().unwrap().contains(handle)
        }

        fn terminate(&self, handle: usize) {
            self.terminated.lock().unwrap().push(handle);
        }
    }

    fn paths(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn scheduler_config(edit: impl FnOnce(&mut Config)) -> SchedulerConfig {
        let mut config = Config::default();
        edit(&mut config);
        config.scheduler()
    }

    #[test]
    fn test_media_modes_pick_their_files() {
        let files = paths(&["one.png", "two.png", "three.png"]);

        let single = OverlayTask::new(A, OverlayMode::Single, &files, 30, false);
        assert_eq!(single.media_paths, paths(&["one.png"]));

        let gif = OverlayTask::new(A, OverlayMode::Gif, &files, 30, false);
        assert_eq!(gif.media_paths, paths(&["one.png"]));

        let slideshow = OverlayTask::new(A, OverlayMode::Slideshow, &files, 12, true);
        assert_eq!(slideshow.media_paths, files);
        assert_eq!(slideshow.interval_seconds, 12);
        assert!(slideshow.demo);

        let blank = OverlayTask::new(A, OverlayMode::Blank, &files, 30, false);
        assert!(blank.media_paths.is_empty());
    }

    #[test]
    fn test_media_mode_without_files_falls_back_to_blank() {
        for mode in [OverlayMode::Single, OverlayMode::Slideshow, OverlayMode::Gif] {
            let task = OverlayTask::new(B, mode, &[], 30, false);
            assert_eq!(task.mode, OverlayMode::Blank);
            assert!(task.media_paths.is_empty());
            assert_eq!(task.monitor_geometry, B);
        }
    }

    #[test]
    fn test_task_serializes_for_the_renderer() {
        let task = OverlayTask::new(A, OverlayMode::Gif, &paths(&["cat.gif"]), 30, true);
        let json: serde_json::Value = serde_json::to_value(&task).unwrap();

        assert_eq!(json["monitor_geometry"], serde_json::json!([0, 0, 1920, 1080]));
        assert_eq!(json["mode"], "gif");
        assert_eq!(json["demo"], true);
    }

    #[test]
    fn test_stored_geometries_win_over_enumeration() {
        let config = scheduler_config(|config| {
            config.monitors = vec![B];
            config.monitor_indices = vec![1];
        });

        let targets = resolve_targets(&config, &[A, C]);
        assert_eq!(targets, vec![OverlayTarget { index: 1, geometry: B }]);
    }

    #[test]
    fn test_indices_resolve_against_enumeration() {
        let config = scheduler_config(|config| config.monitor_indices = vec![2, 0, 9]);

        let targets = resolve_targets(&config, &[A, B, C]);
        assert_eq!(
            targets,
            vec![OverlayTarget { index: 2, geometry: C }, OverlayTarget { index: 0, geometry: A }]
        );
    }

    #[test]
    fn test_empty_selection_covers_every_monitor() {
        let config = scheduler_config(|_| {});

        let targets = resolve_targets(&config, &[A, B]);
        assert_eq!(targets.iter().map(|target| target.geometry).collect::<Vec<_>>(), vec![A, B]);
        assert_eq!(targets.iter().map(|target| target.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_degenerate_geometry_is_skipped() {
        let broken = MonitorGeometry::new(100, 100, 100, 900);
        let config = scheduler_config(|config| config.monitors = vec![broken, A]);

        let targets = resolve_targets(&config, &[A]);
        assert_eq!(targets, vec![OverlayTarget { index: 1, geometry: A }]);
    }

    #[test]
    fn test_per_monitor_mode_override() {
        let config = scheduler_config(|config| {
            config.mode = OverlayMode::Slideshow;
            config.file_paths = paths(&["a.png", "b.png"]);
            config.monitor_modes = BTreeMap::from([("1".to_string(), OverlayMode::Blank)]);
        });
        let targets = resolve_targets(&config, &[A, B]);

        let tasks = build_tasks(&config, &targets, false);
        assert_eq!(tasks[0].mode, OverlayMode::Slideshow);
        assert_eq!(tasks[0].media_paths.len(), 2);
        assert_eq!(tasks[1].mode, OverlayMode::Blank);
        assert!(tasks.iter().all(|task| !task.demo));
    }

    #[test]
    fn test_missing_renderer_program_is_a_launch_failure() {
        let renderer = ProcessRenderer::new("/nonexistent/dcplus-overlay-missing");
        let task = OverlayTask::new(A, OverlayMode::Blank, &[], 30, false);

        match renderer.show(&task) {
            Err(DcError::RendererLaunchFailure { geometry, .. }) => assert_eq!(geometry, A),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("renderer should not start"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_preview_shows_demo_overlays_then_closes_them() {
        let renderer = RecordingRenderer::default();
        let config = Config {
            enabled: false,
            ..Config::default()
        };
        let started = Instant::now();

        let shown = show_preview(&renderer, &config, &vec![A, B], Duration::from_secs(3)).await;

        assert_eq!(shown, 2);
        assert!(started.elapsed() >= Duration::from_secs(3));
        let tasks = renderer.shown.lock().unwrap().clone();
        assert!(tasks.iter().all(|task| task.demo));
        assert_eq!(renderer.terminated.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preview_without_monitors_shows_nothing() {
        let renderer = RecordingRenderer::default();

        let shown = show_preview(&renderer, &Config::default(), &Vec::<MonitorGeometry>::new(), Duration::from_secs(3)).await;

        assert_eq!(shown, 0);
        assert!(renderer.shown.lock().unwrap().is_empty());
    }
}
