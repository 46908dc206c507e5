//! Fine-grained observation of shared state
//!
//! State containers publish whole snapshots on a `tokio::sync::watch`
//! channel. A consumer that only cares about one derived value wraps the
//! receiver in a [`Selector`] so it is woken only when that value changes,
//! not on every field update of the snapshot.

use tokio::sync::watch;

/// Projection of a watched snapshot
pub struct Selector<S, T, F> {
    rx: watch::Receiver<S>,
    project: F,
    last: T,
}

impl<S, T, F> Selector<S, T, F>
where
    T: Clone + PartialEq,
    F: Fn(&S) -> T,
{
    /// Start observing; the current value is computed immediately
    pub fn new(mut rx: watch::Receiver<S>, project: F) -> Self {
        let last = project(&rx.borrow_and_update());
        Self { rx, project, last }
    }

    /// Most recently observed value
    pub fn get(&self) -> T {
        self.last.clone()
    }

    /// Wait until the projected value differs from the last one seen.
    ///
    /// Returns `None` once the publishing side is dropped.
    pub async fn changed(&mut self) -> Option<T> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let next = (self.project)(&self.rx.borrow_and_update());
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Snapshot {
        playing: bool,
        tick: u32,
    }

    #[tokio::test]
    async fn ignores_unrelated_field_updates() {
        let (tx, rx) = watch::channel(Snapshot::default());
        let mut playing = Selector::new(rx, |s: &Snapshot| s.playing);
        assert!(!playing.get());

        tx.send_modify(|s| s.tick += 1);
        tx.send_modify(|s| s.tick += 1);
        tx.send_modify(|s| s.playing = true);

        assert_eq!(playing.changed().await, Some(true));
        assert!(playing.get());
    }

    #[tokio::test]
    async fn ends_when_publisher_drops() {
        let (tx, rx) = watch::channel(Snapshot::default());
        let mut playing = Selector::new(rx, |s: &Snapshot| s.playing);
        drop(tx);
        assert_eq!(playing.changed().await, None);
    }
}
