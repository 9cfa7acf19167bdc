use std::time::Duration;

/// Formats a signal duration as `HH:MM:SS.mmm`.
///
/// Hours widen past two digits instead of wrapping; negative or non-finite
/// input formats as zero.
pub fn time_str(sec: f64) -> String {
    let duration = Duration::try_from_secs_f64(sec).unwrap_or_default();
    let total_ms = duration.as_millis();

    let hours = total_ms / 3_600_000;
    let minutes = total_ms / 60_000 % 60;
    let seconds = total_ms / 1000 % 60;
    let milliseconds = total_ms % 1000;

    format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
}
