//! Elapsed-time annotation for long-running steps.

use std::time::Duration;

/// Format an elapsed duration: `31s` below a minute, `1m 15s` above.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Append ` (<elapsed>)` to `text` once `elapsed` reaches `threshold`.
pub fn annotate(text: &str, elapsed: Duration, threshold: Duration) -> String {
    if elapsed >= threshold {
        format!("{} ({})", text, format_elapsed(elapsed))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_below_a_minute() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0s");
        assert_eq!(format_elapsed(Duration::from_millis(31_900)), "31s");
        assert_eq!(format_elapsed(Duration::from_secs(59)), "59s");
    }

    #[test]
    fn minutes_and_seconds_from_a_minute() {
        assert_eq!(format_elapsed(Duration::from_secs(60)), "1m 0s");
        assert_eq!(format_elapsed(Duration::from_secs(75)), "1m 15s");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "62m 5s");
    }

    #[test]
    fn annotate_only_at_threshold() {
        let threshold = Duration::from_secs(30);
        assert_eq!(
            annotate("Installing", Duration::from_secs(29), threshold),
            "Installing"
        );
        assert_eq!(
            annotate("Installing", Duration::from_secs(30), threshold),
            "Installing (30s)"
        );
        assert_eq!(
            annotate("Installing", Duration::from_secs(75), threshold),
            "Installing (1m 15s)"
        );
    }
}
