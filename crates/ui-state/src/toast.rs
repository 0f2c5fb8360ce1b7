use std::time::{Duration, Instant};

/// How long a regular toast stays up.
const DEFAULT_DURATION: Duration = Duration::from_secs(4);

/// How long an error toast stays up (longer for visibility).
const ERROR_DURATION: Duration = Duration::from_secs(6);

/// Toasts visible at once; the oldest is dropped beyond this.
const MAX_VISIBLE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// A transient notification.
#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub title: String,
    pub message: Option<String>,
    pub duration: Duration,
    pub shown_at: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.duration
    }
}

/// Queue of visible toasts with monotonic ids.
///
/// Expiry is driven by the caller's clock through [`expire`](Self::expire).
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a toast at `now`. Returns its id.
    pub fn push_at(
        &mut self,
        kind: ToastKind,
        title: impl Into<String>,
        message: Option<String>,
        now: Instant,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let duration = match kind {
            ToastKind::Error => ERROR_DURATION,
            ToastKind::Success | ToastKind::Info => DEFAULT_DURATION,
        };
        self.toasts.push(Toast {
            id,
            kind,
            title: title.into(),
            message,
            duration,
            shown_at: now,
        });
        if self.toasts.len() > MAX_VISIBLE {
            self.toasts.remove(0);
        }
        id
    }

    pub fn push(&mut self, kind: ToastKind, title: impl Into<String>, message: Option<String>) -> u64 {
        self.push_at(kind, title, message, Instant::now())
    }

    pub fn success(&mut self, title: impl Into<String>) -> u64 {
        self.push(ToastKind::Success, title, None)
    }

    pub fn info(&mut self, title: impl Into<String>) -> u64 {
        self.push(ToastKind::Info, title, None)
    }

    /// Error toast with a detail line.
    pub fn error_with(&mut self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.push(ToastKind::Error, title, Some(message.into()))
    }

    /// Removes a toast by id. Returns `true` if it was visible.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Drops every toast whose time is up at `now`; returns their ids.
    pub fn expire(&mut self, now: Instant) -> Vec<u64> {
        let mut expired = Vec::new();
        self.toasts.retain(|t| {
            let keep = !t.is_expired(now);
            if !keep {
                expired.push(t.id);
            }
            keep
        });
        expired
    }

    pub fn get(&self, id: u64) -> Option<&Toast> {
        self.toasts.iter().find(|t| t.id == id)
    }

    /// Visible toasts, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let mut q = ToastQueue::new();
        assert_eq!(q.success("a"), 0);
        assert_eq!(q.info("b"), 1);
        assert_eq!(q.error_with("c", "details"), 2);

        let titles: Vec<&str> = q.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn error_toasts_last_longer() {
        let mut q = ToastQueue::new();
        let ok = q.success("done");
        let err = q.error_with("failed", "network error");

        assert_eq!(q.get(ok).unwrap().duration, Duration::from_secs(4));
        assert_eq!(q.get(err).unwrap().duration, Duration::from_secs(6));
        assert_eq!(q.get(err).unwrap().message.as_deref(), Some("network error"));
    }

    #[test]
    fn expire_by_clock() {
        let start = Instant::now();
        let mut q = ToastQueue::new();
        let ok = q.push_at(ToastKind::Success, "done", None, start);
        let err = q.push_at(ToastKind::Error, "failed", None, start);

        assert!(q.expire(start + Duration::from_secs(3)).is_empty());
        assert_eq!(q.expire(start + Duration::from_secs(4)), vec![ok]);
        assert_eq!(q.expire(start + Duration::from_secs(6)), vec![err]);
        assert!(q.is_empty());
    }

    #[test]
    fn dismiss() {
        let mut q = ToastQueue::new();
        let a = q.success("a");
        q.info("b");

        assert!(q.dismiss(a));
        assert!(!q.dismiss(a));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn oldest_dropped_past_limit() {
        let mut q = ToastQueue::new();
        for i in 0..7 {
            q.info(format!("t{i}"));
        }
        assert_eq!(q.len(), 5);
        assert_eq!(q.iter().next().unwrap().title, "t2");
    }
}
