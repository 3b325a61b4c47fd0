// src/timeout.rs
// Upper bound on a session's lifetime. Expiry is the only cancellation
// source; whichever of expiry and normal completion happens first wins.

use std::time::Duration;

use tracing::warn;

use crate::config::EngineConfig;

/// Kind of logical request a session serves. Execute sessions get the
/// longer bound: they pay a round-trip delay per supplied argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Compile,
    Execute,
}

impl RequestKind {
    pub fn bound(&self, config: &EngineConfig) -> Duration {
        match self {
            Self::Compile => config.compile_timeout,
            Self::Execute => config.execute_timeout,
        }
    }
}

/// Marker for an expired guard; the caller kills the process and assembles
/// a timeout outcome from whatever output was captured.
#[derive(Debug, Clone, Copy)]
pub struct GuardExpired {
    pub bound: Duration,
}

/// Bounds one session's driving future.
pub struct TimeoutGuard {
    bound: Duration,
}

impl TimeoutGuard {
    pub fn new(bound: Duration) -> Self {
        Self { bound }
    }

    pub fn for_kind(kind: RequestKind, config: &EngineConfig) -> Self {
        Self::new(kind.bound(config))
    }

    /// Run the driving future under the bound. On expiry the future is
    /// dropped and `GuardExpired` returned; the two resolutions never race
    /// into a double outcome.
    pub async fn run<T>(
        &self,
        fut: impl std::future::Future<Output = T>,
    ) -> std::result::Result<T, GuardExpired> {
        match tokio::time::timeout(self.bound, fut).await {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(bound_ms = self.bound.as_millis() as u64, "Session exceeded its bound");
                Err(GuardExpired { bound: self.bound })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_completion_wins_inside_bound() {
        let guard = TimeoutGuard::new(Duration::from_millis(200));
        let result = guard.run(async { 42 }).await;
        assert!(matches!(result, Ok(42)));
    }

    #[tokio::test]
    async fn test_expiry_returns_within_bound_plus_slack() {
        let guard = TimeoutGuard::new(Duration::from_millis(50));
        let start = Instant::now();
        let result = guard
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
            })
            .await;
        assert!(result.is_err());
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_kind_bounds_are_distinct() {
        let config = EngineConfig::default();
        assert!(RequestKind::Execute.bound(&config) > RequestKind::Compile.bound(&config));
    }
}
