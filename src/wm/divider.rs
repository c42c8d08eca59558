//! Divider - 1-D allocation of a split's long axis among its children

use super::layout::LayoutError;

/// Smallest number of cells a pane may occupy along a split axis
pub const MIN_CELLS: u16 = 3;

/// A contiguous run of cells along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: u16,
    pub len: u16,
}

/// Parse a size specification relative to the available length `l`.
///
/// Accepted forms: `10` (cells), `0.5` (fraction), `1/4` (ratio), `50%`.
/// The result is clamped into `[MIN_CELLS, l]`. Anything else yields `None`
/// and the child is treated as unsized.
pub fn parse_size(spec: &str, l: u16) -> Option<u16> {
    let spec = spec.trim();
    // Wide enough that `l * u64::MAX` cannot overflow
    let l128 = l as u128;

    let cells = if is_digits(spec) {
        spec.parse::<u64>().ok()? as u128
    } else if let Some(pct) = spec.strip_suffix('%') {
        if !is_digits(pct) {
            return None;
        }
        l128 * pct.parse::<u64>().ok()? as u128 / 100
    } else if let Some((num, den)) = spec.split_once('/') {
        if !is_digits(num) || !is_digits(den) {
            return None;
        }
        let den = den.parse::<u64>().ok()?;
        if den == 0 {
            return None;
        }
        l128 * num.parse::<u64>().ok()? as u128 / den as u128
    } else if let Some((int, frac)) = spec.split_once('.') {
        if !is_digits(int) || !is_digits(frac) {
            return None;
        }
        let factor: f64 = spec.parse().ok()?;
        (l as f64 * factor).floor() as u128
    } else {
        return None;
    };

    Some(cells.clamp(MIN_CELLS as u128, l128.max(MIN_CELLS as u128)) as u16)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Divide `l` cells starting at `start` among children with optional size specs.
///
/// The returned segments are contiguous, in child order, each at least
/// `MIN_CELLS` long, and their lengths always sum to exactly `l`.
pub fn divide(start: u16, l: u16, specs: &[Option<&str>]) -> Result<Vec<Segment>, LayoutError> {
    let n = specs.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    if (l as usize) < n * MIN_CELLS as usize {
        return Err(LayoutError::TooSmall);
    }

    // Explicit sizes first, then an even share for the rest
    let even = (l / n as u16).max(MIN_CELLS);
    let mut sizes: Vec<u16> = specs
        .iter()
        .map(|spec| spec.and_then(|s| parse_size(s, l)).unwrap_or(even))
        .collect();

    // Shrink or grow round-robin until the total matches exactly
    loop {
        let requested: u32 = sizes.iter().map(|&s| s as u32).sum();
        if requested > l as u32 {
            let mut shrink = requested - l as u32;
            for size in sizes.iter_mut() {
                if shrink == 0 {
                    break;
                }
                if *size > MIN_CELLS {
                    *size -= 1;
                    shrink -= 1;
                }
            }
        } else if requested < l as u32 {
            let mut grow = l as u32 - requested;
            for size in sizes.iter_mut() {
                if grow == 0 {
                    break;
                }
                *size += 1;
                grow -= 1;
            }
        } else {
            break;
        }
    }

    let mut pos = start;
    Ok(sizes
        .into_iter()
        .map(|len| {
            let seg = Segment { start: pos, len };
            pos += len;
            seg
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_size_forms() {
        assert_eq!(parse_size("10", 20), Some(10));
        assert_eq!(parse_size("0.5", 20), Some(10));
        assert_eq!(parse_size("1/4", 20), Some(5));
        assert_eq!(parse_size("50%", 20), Some(10));
    }

    #[test]
    fn test_parse_size_clamps() {
        assert_eq!(parse_size("1", 20), Some(3));
        assert_eq!(parse_size("500", 20), Some(20));
        assert_eq!(parse_size("0.01", 20), Some(3));
        assert_eq!(parse_size("150%", 20), Some(20));
    }

    #[test]
    fn test_huge_sizes_clamp_to_length() {
        assert_eq!(parse_size("1000000000000000000%", 100), Some(100));
        assert_eq!(parse_size("18446744073709551615/2", 100), Some(100));
        assert_eq!(parse_size("1000000000000000000/1000000000000000000", 100), Some(100));
        assert_eq!(parse_size("18446744073709551615", 100), Some(100));
        assert_eq!(parse_size("99999999999999999999", 100), None);
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        assert_eq!(parse_size("abc", 20), None);
        assert_eq!(parse_size("1/0", 20), None);
        assert_eq!(parse_size("-5", 20), None);
        assert_eq!(parse_size("", 20), None);
        assert_eq!(parse_size("5.%", 20), None);
    }

    #[test]
    fn test_even_split() {
        let segs = divide(0, 40, &[None, None]).unwrap();
        assert_eq!(segs, vec![Segment { start: 0, len: 20 }, Segment { start: 20, len: 20 }]);
    }

    #[test]
    fn test_remainder_goes_to_first_children() {
        let segs = divide(5, 10, &[None, None, None]).unwrap();
        let lens: Vec<u16> = segs.iter().map(|s| s.len).collect();
        assert_eq!(lens, vec![4, 3, 3]);
        assert_eq!(segs[0].start, 5);
        assert_eq!(segs[2].start, 12);
    }

    #[test]
    fn test_explicit_and_implicit_mix() {
        // 25% of 80 = 20, the other gets 40, then grow 20 round-robin
        let segs = divide(0, 80, &[Some("25%"), None]).unwrap();
        let lens: Vec<u16> = segs.iter().map(|s| s.len).collect();
        assert_eq!(lens.iter().sum::<u16>(), 80);
        assert_eq!(lens, vec![30, 50]);
    }

    #[test]
    fn test_oversized_specs_shrink() {
        let segs = divide(0, 30, &[Some("30"), Some("30")]).unwrap();
        let lens: Vec<u16> = segs.iter().map(|s| s.len).collect();
        assert_eq!(lens, vec![15, 15]);
    }

    #[test]
    fn test_too_small() {
        assert!(matches!(divide(0, 8, &[None, None, None]), Err(LayoutError::TooSmall)));
    }

    fn size_spec() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            (0u32..200).prop_map(|n| Some(n.to_string())),
            (0u32..100).prop_map(|n| Some(format!("{}%", n))),
            (1u32..10, 1u32..10).prop_map(|(a, b)| Some(format!("{}/{}", a, b))),
            (0u32..100).prop_map(|n| Some(format!("0.{:02}", n))),
        ]
    }

    proptest! {
        #[test]
        fn divide_is_exact(
            specs in prop::collection::vec(size_spec(), 1..8),
            extra in 0u16..300,
            start in 0u16..100,
        ) {
            let n = specs.len() as u16;
            let l = n * MIN_CELLS + extra;
            let refs: Vec<Option<&str>> = specs.iter().map(|s| s.as_deref()).collect();
            let segs = divide(start, l, &refs).unwrap();

            prop_assert_eq!(segs.len(), specs.len());
            prop_assert_eq!(segs.iter().map(|s| s.len as u32).sum::<u32>(), l as u32);
            let mut pos = start;
            for seg in &segs {
                prop_assert!(seg.len >= MIN_CELLS);
                prop_assert_eq!(seg.start, pos);
                pos += seg.len;
            }
        }
    }
}
