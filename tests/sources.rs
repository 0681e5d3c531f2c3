#[cfg(test)]
mod tests {
    use dcplus::libs::config::DetectionConfig;
    use dcplus::libs::error::DcError;
    use dcplus::libs::sources::{InputSource, InputSources};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Source that only records how often it was started.
    struct FakeSource {
        name: &'static str,
        available: bool,
        running: bool,
        starts: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn boxed(name: &'static str, available: bool) -> (Box<dyn InputSource>, Arc<AtomicUsize>) {
            let starts = Arc::new(AtomicUsize::new(0));
            let source = FakeSource {
                name,
                available,
                running: false,
                starts: starts.clone(),
            };
            (Box::new(source), starts)
        }
    }

    impl InputSource for FakeSource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn start(&mut self) -> Result<(), DcError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if !self.available {
                return Err(DcError::source_unavailable(self.name, "not supported here"));
            }
            self.running = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.running = false;
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    fn detection(controller: bool, raw: bool) -> DetectionConfig {
        DetectionConfig {
            controller_enabled: controller,
            controller_use_raw_input: raw,
            ..DetectionConfig::default()
        }
    }

    #[test]
    fn test_sources_follow_controller_settings() {
        let (hooks, _) = FakeSource::boxed("hooks", true);
        let (gamepad, _) = FakeSource::boxed("gamepad", true);
        let (raw, _) = FakeSource::boxed("raw-input", true);
        let mut sources = InputSources::from_parts(hooks, gamepad, raw);

        sources.reconcile(&detection(false, false));
        assert_eq!(sources.running(), vec!["hooks"]);

        sources.reconcile(&detection(true, true));
        assert_eq!(sources.running(), vec!["hooks", "gamepad", "raw-input"]);

        sources.reconcile(&detection(true, false));
        assert_eq!(sources.running(), vec!["hooks", "gamepad"]);

        sources.stop_all();
        assert!(sources.running().is_empty());
    }

    #[test]
    fn test_running_sources_are_not_restarted() {
        let (hooks, hook_starts) = FakeSource::boxed("hooks", true);
        let (gamepad, gamepad_starts) = FakeSource::boxed("gamepad", true);
        let (raw, _) = FakeSource::boxed("raw-input", true);
        let mut sources = InputSources::from_parts(hooks, gamepad, raw);

        sources.reconcile(&detection(true, false));
        sources.reconcile(&detection(true, false));

        assert_eq!(hook_starts.load(Ordering::SeqCst), 1);
        assert_eq!(gamepad_starts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unavailable_source_does_not_block_others() {
        let (hooks, _) = FakeSource::boxed("hooks", false);
        let (gamepad, _) = FakeSource::boxed("gamepad", true);
        let (raw, raw_starts) = FakeSource::boxed("raw-input", false);
        let mut sources = InputSources::from_parts(hooks, gamepad, raw);

        sources.reconcile(&detection(true, true));

        assert_eq!(sources.running(), vec!["gamepad"]);
        assert_eq!(raw_starts.load(Ordering::SeqCst), 1);
    }
}
