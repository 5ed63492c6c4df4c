use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

static STABLE_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]+(\.[0-9]+)?$").expect("valid regex"));

/// Release identifiers only: snapshots, pre-releases and candidates never match.
pub fn is_stable_version(id: &str) -> bool {
    STABLE_VERSION.is_match(id)
}

/// Numeric, component-wise ordering (`1.20.10` > `1.20.9`). Missing
/// components count as zero; non-numeric components sort before numeric ones.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = a.split('.').collect();
    let right: Vec<&str> = b.split('.').collect();

    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).copied().unwrap_or("0");
        let r = right.get(i).copied().unwrap_or("0");
        let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(l), Ok(r)) => l.cmp(&r),
            (Ok(_), Err(_)) => Ordering::Greater,
            (Err(_), Ok(_)) => Ordering::Less,
            (Err(_), Err(_)) => l.cmp(r),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Most recent stable identifier of `ids`, whatever order they come in.
pub fn latest_stable<I, S>(ids: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut stable: Vec<String> = ids
        .into_iter()
        .filter(|id| is_stable_version(id.as_ref()))
        .map(|id| id.as_ref().to_string())
        .collect();
    stable.sort_by(|a, b| compare_versions(b, a));
    stable.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_filter() {
        assert!(is_stable_version("1.20"));
        assert!(is_stable_version("1.20.4"));
        assert!(is_stable_version("0.16.5"));
        assert!(!is_stable_version("1.21-pre1"));
        assert!(!is_stable_version("1.21-rc1"));
        assert!(!is_stable_version("24w14a"));
        assert!(!is_stable_version("1.20.4.1"));
        assert!(!is_stable_version("v1.20"));
        assert!(!is_stable_version("1.20.4 "));
        assert!(!is_stable_version(""));
    }

    #[test]
    fn test_numeric_ordering() {
        assert_eq!(compare_versions("1.20.10", "1.20.9"), Ordering::Greater);
        assert_eq!(compare_versions("1.9", "1.10"), Ordering::Less);
        assert_eq!(compare_versions("1.20", "1.20.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.21", "1.20.6"), Ordering::Greater);
    }

    #[test]
    fn test_latest_stable_never_selects_prerelease() {
        let ids = ["1.20.6", "1.21-pre2", "1.21-rc1", "24w21b", "1.20.10", "1.9"];
        assert_eq!(latest_stable(ids), Some("1.20.10".to_string()));
    }

    #[test]
    fn test_latest_stable_ignores_input_order() {
        let ascending = ["1.18.2", "1.19.4", "1.20.4"];
        let descending = ["1.20.4", "1.19.4", "1.18.2"];
        assert_eq!(latest_stable(ascending), latest_stable(descending));
    }

    #[test]
    fn test_latest_stable_empty_when_nothing_qualifies() {
        assert_eq!(latest_stable(["1.21-pre1", "snapshot"]), None);
        assert_eq!(latest_stable(Vec::<String>::new()), None);
    }
}
