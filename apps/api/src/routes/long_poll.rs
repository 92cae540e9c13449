use std::time::Duration;

use serde::Deserialize;

const DEFAULT_WAIT: Duration = Duration::from_secs(25);
const MAX_WAIT: Duration = Duration::from_secs(60);

/// `?wait_ms=` query for long-poll routes. Missing means the default wait; anything
/// above the cap is clamped.
#[derive(Debug, Default, Deserialize)]
pub struct LongPoll {
    wait_ms: Option<u64>,
}

impl LongPoll {
    pub fn wait(&self) -> Duration {
        self.wait_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_WAIT)
            .min(MAX_WAIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_defaults_and_clamps() {
        assert_eq!(LongPoll::default().wait(), DEFAULT_WAIT);
        assert_eq!(
            LongPoll { wait_ms: Some(40) }.wait(),
            Duration::from_millis(40)
        );
        assert_eq!(
            LongPoll {
                wait_ms: Some(10 * 60 * 1000)
            }
            .wait(),
            MAX_WAIT
        );
    }
}
