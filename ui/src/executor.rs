use std::future::Future;

use iced::executor::Executor;
use iced::futures;
use tokio::runtime::{Builder, Runtime};

const WORKER_STACK_SIZE_BYTES: usize = 4_200_000;
const WORKER_THREAD_NAME: &str = "casedesk-worker";

/// Multi-threaded tokio runtime that drives gateway requests for the shell.
#[derive(Debug)]
pub struct DashboardExecutor {
    runtime: Runtime,
}

impl Executor for DashboardExecutor {
    fn new() -> Result<Self, futures::io::Error> {
        let runtime = Builder::new_multi_thread()
            .thread_name(WORKER_THREAD_NAME)
            .thread_stack_size(WORKER_STACK_SIZE_BYTES)
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }

    fn spawn(&self, future: impl Future<Output = ()> + Send + 'static) {
        let _ = self.runtime.spawn(future);
    }

    fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.runtime.enter();
        f()
    }
}
