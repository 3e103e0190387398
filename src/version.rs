use std::cmp::Ordering;

/// Orders two `MAJOR.MINOR.PATCH` version strings.
///
/// A leading `v` and any `-suffix` are ignored, missing parts count as `0`, and a
/// string that does not parse compares as `0.0.0`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    parse_version(a).cmp(&parse_version(b))
}

fn parse_version(version: &str) -> (u64, u64, u64) {
    let version = version.trim().trim_start_matches(['v', 'V']);
    let core = version.split('-').next().unwrap_or_default();

    let mut parts = [0u64; 3];
    for (slot, part) in parts.iter_mut().zip(core.split('.')) {
        match part.parse() {
            Ok(n) => *slot = n,
            Err(_) => return (0, 0, 0),
        }
    }
    (parts[0], parts[1], parts[2])
}
