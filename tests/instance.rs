#[cfg(test)]
mod tests {
    use dcplus::libs::error::DcError;
    use dcplus::libs::instance::{process_alive, InstanceGuard, MARKER_FILE};
    use std::fs;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    /// A PID far above anything the OS hands out.
    const DEAD_PID: u32 = 2_147_483_000;

    struct InstanceTestContext {
        _temp_dir: TempDir,
        guard: InstanceGuard,
    }

    impl InstanceTestContext {
        fn write_marker(&self, content: &str) {
            fs::write(self.guard.marker(), content).unwrap();
        }

        fn marker_content(&self) -> Option<String> {
            fs::read_to_string(self.guard.marker()).ok()
        }
    }

    impl TestContext for InstanceTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let guard = InstanceGuard::at(temp_dir.path().join(MARKER_FILE));
            InstanceTestContext { _temp_dir: temp_dir, guard }
        }
    }

    #[test_context(InstanceTestContext)]
    #[test]
    fn test_acquire_writes_own_pid(ctx: &mut InstanceTestContext) {
        let lock = ctx.guard.acquire().unwrap();

        assert_eq!(lock.pid(), std::process::id());
        assert_eq!(ctx.marker_content(), Some(std::process::id().to_string()));
        assert!(ctx.guard.is_running());
    }

    #[test_context(InstanceTestContext)]
    #[test]
    fn test_dropping_lock_removes_marker(ctx: &mut InstanceTestContext) {
        {
            let _lock = ctx.guard.acquire().unwrap();
            assert!(ctx.guard.marker().exists());
        }
        assert!(!ctx.guard.marker().exists());
        assert!(!ctx.guard.is_running());
    }

    #[test_context(InstanceTestContext)]
    #[test]
    fn test_live_owner_blocks_second_instance(ctx: &mut InstanceTestContext) {
        let lock = ctx.guard.acquire().unwrap();

        match ctx.guard.acquire() {
            Err(DcError::AlreadyRunning(pid)) => assert_eq!(pid, std::process::id()),
            other => panic!("expected AlreadyRunning, got {:?}", other.map(|lock| lock.pid())),
        }

        lock.release().unwrap();
        assert!(ctx.guard.acquire().is_ok());
    }

    #[test_context(InstanceTestContext)]
    #[test]
    fn test_stale_marker_is_replaced(ctx: &mut InstanceTestContext) {
        assert!(!process_alive(DEAD_PID));
        ctx.write_marker(&DEAD_PID.to_string());

        assert_eq!(ctx.guard.running_pid().unwrap(), None);
        assert!(!ctx.guard.marker().exists());

        ctx.write_marker(&DEAD_PID.to_string());
        let lock = ctx.guard.acquire().unwrap();
        assert_eq!(ctx.marker_content(), Some(lock.pid().to_string()));
    }

    #[test_context(InstanceTestContext)]
    #[test]
    fn test_garbage_marker_is_cleared(ctx: &mut InstanceTestContext) {
        ctx.write_marker("not-a-pid\n");

        assert_eq!(ctx.guard.running_pid().unwrap(), None);
        assert!(!ctx.guard.marker().exists());
    }

    #[test_context(InstanceTestContext)]
    #[test]
    fn test_release_leaves_foreign_marker(ctx: &mut InstanceTestContext) {
        ctx.write_marker(&DEAD_PID.to_string());

        ctx.guard.release().unwrap();
        assert_eq!(ctx.marker_content(), Some(DEAD_PID.to_string()));
    }

    #[test_context(InstanceTestContext)]
    #[test]
    fn test_marker_with_whitespace_is_accepted(ctx: &mut InstanceTestContext) {
        ctx.write_marker(&format!("{}\r\n", std::process::id()));

        assert_eq!(ctx.guard.running_pid().unwrap(), Some(std::process::id()));
    }
}
