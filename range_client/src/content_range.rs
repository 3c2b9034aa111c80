//! Parsing of the `Content-Range` response header (RFC 9110 §14.4).

/// A parsed `Content-Range: bytes <start>-<end>/<total>` or `bytes */<total>` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContentRange {
    /// Inclusive byte range, absent for the unsatisfied-range form `bytes */<total>`.
    pub range: Option<(u64, u64)>,
    /// Total resource length, absent when the server sends `*`.
    pub total: Option<u64>,
}

pub(crate) fn parse_content_range(value: &str) -> Option<ContentRange> {
    let rest = value.trim().strip_prefix("bytes")?.trim_start();
    let (range_part, total_part) = rest.split_once('/')?;

    let total = match total_part.trim() {
        "*" => None,
        t => Some(t.parse::<u64>().ok()?),
    };

    let range = match range_part.trim() {
        "*" => None,
        r => {
            let (start, end) = r.split_once('-')?;
            let start = start.trim().parse::<u64>().ok()?;
            let end = end.trim().parse::<u64>().ok()?;
            if end < start {
                return None;
            }
            Some((start, end))
        },
    };

    if range.is_none() && total.is_none() {
        return None;
    }

    Some(ContentRange { range, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_satisfied_range() {
        assert_eq!(
            parse_content_range("bytes 0-0/1234"),
            Some(ContentRange {
                range: Some((0, 0)),
                total: Some(1234)
            })
        );
        assert_eq!(
            parse_content_range("bytes 100-199/*"),
            Some(ContentRange {
                range: Some((100, 199)),
                total: None
            })
        );
    }

    #[test]
    fn test_parse_unsatisfied_range() {
        assert_eq!(
            parse_content_range("bytes */0"),
            Some(ContentRange {
                range: None,
                total: Some(0)
            })
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_content_range(""), None);
        assert_eq!(parse_content_range("items 0-1/2"), None);
        assert_eq!(parse_content_range("bytes 5-1/10"), None);
        assert_eq!(parse_content_range("bytes */*"), None);
        assert_eq!(parse_content_range("bytes 0-9"), None);
    }
}
