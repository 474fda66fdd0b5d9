use tokio::runtime::Handle;

use crate::Result;

/// Thread pool that runs blocking calls on behalf of async tasks.
///
/// Backed by the blocking pool of a tokio runtime. Awaiting [`run`] suspends
/// only the calling task, the rest of the scheduler keeps going.
///
/// [`run`]: BlockingPool::run
#[derive(Clone, Debug)]
pub struct BlockingPool {
    handle: Handle,
}

impl BlockingPool {
    /// Pool of the runtime the caller is running in.
    ///
    /// # Panics
    /// Outside of a tokio runtime, see [`BlockingPool::try_current`].
    pub fn current() -> Self {
        Self::from_handle(Handle::current())
    }

    pub fn try_current() -> Result<Self> {
        let handle = Handle::try_current().map_err(anyhow::Error::from)?;
        Ok(Self::from_handle(handle))
    }

    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }

    /// Run `f` on a worker thread and wait for its result.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        Ok(self.handle.spawn_blocking(f).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StreamError;

    #[tokio::test]
    async fn runs_on_another_thread() {
        let caller = std::thread::current().id();
        let pool = BlockingPool::current();
        let worker = pool.run(|| std::thread::current().id()).await.unwrap();
        assert_ne!(caller, worker);
    }

    #[tokio::test]
    async fn panic_becomes_task_error() {
        let pool = BlockingPool::current();
        let res = pool.run(|| -> usize { panic!("worker died") }).await;
        assert!(matches!(res, Err(StreamError::Task(_))));
    }

    #[test]
    fn no_runtime_is_an_error() {
        assert!(BlockingPool::try_current().is_err());
    }
}
