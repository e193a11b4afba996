//! Human-readable byte and duration formatting helpers.

use std::time::Duration;

const KIB: f64 = 1024.0;

/// Format a byte count using binary units with two decimals
/// (e.g., "1.50 KB", "3.25 GB"). Values below 1 KB stay in plain bytes.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn fmt_bytes(bytes: u64) -> String {
    let kb = bytes as f64 / KIB;
    let mb = kb / KIB;
    let gb = mb / KIB;

    if gb >= 1.0 {
        format!("{gb:.2} GB")
    } else if mb >= 1.0 {
        format!("{mb:.2} MB")
    } else if kb >= 1.0 {
        format!("{kb:.2} KB")
    } else {
        format!("{bytes} B")
    }
}

/// Format an elapsed duration as `HH:MM:SS`. Hours do not wrap at 24.
///
/// `None` (no handshake yet) renders as `--:--:--`.
pub fn fmt_hms(elapsed: Option<Duration>) -> String {
    let Some(elapsed) = elapsed else {
        return "--:--:--".into();
    };
    let secs = elapsed.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Format an RX/TX pair as "↓ 1.50 MB  ↑ 12.00 KB".
pub fn fmt_rx_tx(rx: u64, tx: u64) -> String {
    format!("↓ {}  ↑ {}", fmt_bytes(rx), fmt_bytes(tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_below_one_kib() {
        assert_eq!(fmt_bytes(0), "0 B");
        assert_eq!(fmt_bytes(1023), "1023 B");
    }

    #[test]
    fn bytes_binary_units() {
        assert_eq!(fmt_bytes(1024), "1.00 KB");
        assert_eq!(fmt_bytes(1536), "1.50 KB");
        assert_eq!(fmt_bytes(1_572_864), "1.50 MB");
        assert_eq!(fmt_bytes(1_610_612_736), "1.50 GB");
        assert_eq!(fmt_bytes(5 * 1024 * 1024 * 1024 * 1024), "5120.00 GB");
    }

    #[test]
    fn hms() {
        assert_eq!(fmt_hms(Some(Duration::from_millis(3_661_000))), "01:01:01");
        assert_eq!(fmt_hms(Some(Duration::ZERO)), "00:00:00");
        assert_eq!(fmt_hms(Some(Duration::from_secs(100 * 3600 + 59))), "100:00:59");
        assert_eq!(fmt_hms(None), "--:--:--");
    }

    #[test]
    fn rx_tx_pair() {
        assert_eq!(fmt_rx_tx(1536, 12), "↓ 1.50 KB  ↑ 12 B");
    }
}
