//! Frame count arithmetic

/// Longest capture accepted for one target, in hours
pub const MAX_CAPTURE_HOURS: f64 = 24.0;

/// Frames that fit into `capture_hours`: `floor(hours * 3600 / seconds_per_frame)`.
///
/// Non-positive durations and divisors give zero frames. Counts beyond
/// `u32::MAX` saturate; the emitter rejects durations above
/// [`MAX_CAPTURE_HOURS`] first, so a session never reaches that point.
pub fn frame_count(capture_hours: f64, seconds_per_frame: f64) -> u32 {
    if !(capture_hours > 0.0 && seconds_per_frame > 0.0) {
        return 0;
    }
    let frames = (capture_hours * 3600.0 / seconds_per_frame).floor();
    if frames >= u32::MAX as f64 {
        u32::MAX
    } else {
        frames as u32
    }
}

/// Capture hours left after deducting a setup allowance (minutes), never negative
pub fn hours_after_allowance(capture_hours: f64, allowance_minutes: f64) -> f64 {
    (capture_hours - allowance_minutes / 60.0).max(0.0)
}

/// Split `total` frames into blocks of at most `cap`.
///
/// Without a cap (or with a zero cap) the whole count is one block. The
/// blocks always sum to `total`.
pub fn split_into_blocks(total: u32, cap: Option<u32>) -> Vec<u32> {
    let cap = match cap {
        Some(cap) if cap > 0 && total > cap => cap,
        _ => return vec![total],
    };

    let mut blocks = Vec::with_capacity((total / cap + 1) as usize);
    let mut remaining = total;
    while remaining > 0 {
        let block = remaining.min(cap);
        blocks.push(block);
        remaining -= block;
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_formula() {
        assert_eq!(frame_count(1.0, 35.08), 102);
        assert_eq!(frame_count(2.0, 35.08), 205);
        assert_eq!(frame_count(3.0, 247.0), 43);
        assert_eq!(frame_count(0.5, 70.16), 25);
    }

    #[test]
    fn test_frame_count_degenerate_inputs() {
        assert_eq!(frame_count(0.0, 35.08), 0);
        assert_eq!(frame_count(-1.0, 35.08), 0);
        assert_eq!(frame_count(1.0, 0.0), 0);
        assert_eq!(frame_count(f64::NAN, 35.08), 0);
    }

    #[test]
    fn test_setup_allowance() {
        let hours = hours_after_allowance(2.0, 11.0);
        assert!((hours - (2.0 - 11.0 / 60.0)).abs() < 1e-12);
        assert_eq!(frame_count(hours, 35.08), 186);
        assert_eq!(hours_after_allowance(0.1, 11.0), 0.0);
    }

    #[test]
    fn test_split_sums_to_total_and_respects_cap() {
        for total in [0u32, 1, 39, 40, 41, 119, 120, 121, 240, 487] {
            for cap in [1u32, 40, 120] {
                let blocks = split_into_blocks(total, Some(cap));
                assert_eq!(blocks.iter().sum::<u32>(), total, "total={total} cap={cap}");
                assert!(blocks.iter().all(|b| *b <= cap), "total={total} cap={cap}");
            }
        }
    }

    #[test]
    fn test_split_shapes() {
        assert_eq!(split_into_blocks(300, Some(120)), vec![120, 120, 60]);
        assert_eq!(split_into_blocks(80, Some(40)), vec![40, 40]);
        assert_eq!(split_into_blocks(300, None), vec![300]);
        assert_eq!(split_into_blocks(0, Some(40)), vec![0]);
    }
}
