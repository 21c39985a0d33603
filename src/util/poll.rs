use std::{
    future::Future,
    task::{Context, Poll},
    thread,
    time::Duration,
};

use futures::task::noop_waker_ref;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Drives `future` to completion on the calling thread.
///
/// The future is polled with a no-op waker, so anything it waits on must be
/// progressed elsewhere (the SDK's connection tasks run on the tokio worker
/// pool started by the binary).
pub fn poll_until_ready<Fut, T>(future: Fut) -> T
where
    Fut: Future<Output = T>,
{
    let mut future = Box::pin(future);
    let mut context = Context::from_waker(noop_waker_ref());

    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(result) => {
                return result;
            }
            Poll::Pending => {
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
}
