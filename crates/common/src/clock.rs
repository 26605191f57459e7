//! Session clock and export stamps.
//!
//! A booth session is anchored to a monotonic epoch for elapsed-time
//! reporting and to a wall-clock time for the human-readable parts of an
//! export: the footer date, the short session identifier and the file name.
//! Those are the only non-deterministic inputs to a render, so they are
//! produced here and handed to the renderer as plain data.

use std::time::Instant;

use chrono::{DateTime, Local};
use rand::Rng;

/// Alphabet for the short session identifier.
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Number of random characters in a session identifier.
pub const SESSION_ID_LEN: usize = 4;

/// A session clock that provides monotonic elapsed time relative to a fixed
/// epoch, plus the wall-clock time at that epoch.
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant the session started.
    epoch: Instant,

    /// Wall-clock time at epoch.
    epoch_wall: DateTime<Local>,
}

impl SessionClock {
    /// Create a new session clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: Local::now(),
        }
    }

    /// Get milliseconds elapsed since the session started.
    pub fn elapsed_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Get seconds elapsed since the session started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> DateTime<Local> {
        self.epoch_wall
    }
}

/// The non-deterministic text printed in a composite's footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterStamp {
    /// Date and time, e.g. `10/18/2026 • 14:05`.
    pub date_time: String,

    /// Short random identifier, e.g. `#K3Z9`.
    pub session_id: String,
}

impl FooterStamp {
    /// Stamp for the current local time with a fresh random identifier.
    pub fn now() -> Self {
        Self::at(Local::now())
    }

    /// Stamp for a given time with a fresh random identifier.
    pub fn at(time: DateTime<Local>) -> Self {
        Self {
            date_time: format_footer_time(&time),
            session_id: random_session_id(&mut rand::rng()),
        }
    }

    /// Stamp with caller-chosen values, for reproducible renders.
    pub fn fixed(date_time: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            date_time: date_time.into(),
            session_id: session_id.into(),
        }
    }
}

/// Format a time the way the footer shows it.
pub fn format_footer_time(time: &DateTime<Local>) -> String {
    format!("{} • {}", time.format("%m/%d/%Y"), time.format("%H:%M"))
}

/// Draw a `#XXXX` identifier from the given random source.
pub fn random_session_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut id = String::with_capacity(SESSION_ID_LEN + 1);
    id.push('#');
    for _ in 0..SESSION_ID_LEN {
        let idx = rng.random_range(0..BASE36.len());
        id.push(BASE36[idx] as char);
    }
    id
}

/// File name for an export written at `time`.
pub fn export_file_name(time: &DateTime<Local>) -> String {
    format!("snapbooth-{}.png", time.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 0).unwrap()
    }

    #[test]
    fn test_clock_elapsed() {
        let clock = SessionClock::start();
        assert!(clock.elapsed_ms() < 1_000);
        assert!(clock.elapsed_secs() >= 0.0);
    }

    #[test]
    fn test_footer_time_format() {
        assert_eq!(format_footer_time(&sample_time()), "03/07/2026 • 09:05");
    }

    #[test]
    fn test_session_id_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..64 {
            let id = random_session_id(&mut rng);
            assert_eq!(id.len(), SESSION_ID_LEN + 1);
            assert!(id.starts_with('#'));
            assert!(id[1..]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_export_file_name_uses_millis() {
        let time = sample_time();
        let name = export_file_name(&time);
        assert_eq!(name, format!("snapbooth-{}.png", time.timestamp_millis()));
    }

    #[test]
    fn test_fixed_stamp() {
        let stamp = FooterStamp::fixed("01/01/2026 • 00:00", "#TEST");
        assert_eq!(stamp.session_id, "#TEST");
    }
}
