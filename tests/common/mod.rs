#![allow(dead_code)]

pub mod temp_files {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};

    // Global counter and lock for thread-safe temporary file creation
    static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);
    static TEMP_LOCK: Mutex<()> = Mutex::new(());

    /// Creates a temporary route table with a guaranteed unique name
    pub fn create_temp_table(content: &str) -> PathBuf {
        let _lock = TEMP_LOCK.lock().unwrap();
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();

        let path = std::env::temp_dir().join(format!(
            "mvc_test_{}_{}_{}.yaml",
            std::process::id(),
            counter,
            nanos
        ));

        std::fs::write(&path, content).unwrap();
        path
    }

    /// Cleanup temporary files (best effort)
    pub fn cleanup_temp_files(paths: &[PathBuf]) {
        for path in paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

pub mod http {
    use mvc_dispatch::mvc::Mvc;
    use mvc_dispatch::server::{DispatchServlet, ServletRequest, ServletResponse};

    /// Dispatch through the prefix map, panicking on a 5xx-class failure.
    pub fn dispatch(mvc: &Mvc, req: ServletRequest) -> ServletResponse {
        let mut res = ServletResponse::new();
        mvc.dispatch(req, &mut res).unwrap();
        res
    }

    /// Serve directly on one servlet, panicking on a 5xx-class failure.
    pub fn service(servlet: &DispatchServlet, req: ServletRequest) -> ServletResponse {
        let mut res = ServletResponse::new();
        servlet.service(req, &mut res).unwrap();
        res
    }
}

pub mod counters {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Shared call counter handed to controllers under test.
    #[derive(Debug, Clone, Default)]
    pub struct Calls(Arc<AtomicUsize>);

    impl Calls {
        pub fn hit(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        pub fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }
}
