use proptest::prelude::*;

use vouch_types::{Email, Timestamp};

proptest! {
    /// Timestamp ordering: from_millis(a) <= from_millis(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// RFC 3339 rendering survives a parse for any instant in a sane range.
    #[test]
    fn timestamp_rfc3339_roundtrip(millis in 0u64..4_102_444_800_000u64) {
        let ts = Timestamp::from_millis(millis);
        prop_assert_eq!(Timestamp::parse_rfc3339(&ts.to_rfc3339().unwrap()).unwrap(), ts);
    }

    /// Normalization is idempotent and case-insensitive.
    #[test]
    fn email_normalization_idempotent(local in "[a-zA-Z0-9._]{1,20}", domain in "[a-zA-Z]{1,12}\\.[a-zA-Z]{2,4}") {
        let raw = format!("  {local}@{domain} ");
        let once = Email::parse(&raw).unwrap();
        let twice = Email::parse(once.as_str()).unwrap();
        prop_assert_eq!(&once, &twice);
        let upper = Email::parse(&raw.to_uppercase()).unwrap();
        prop_assert_eq!(once, upper);
    }
}
