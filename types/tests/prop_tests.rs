use proptest::prelude::*;

use phillet_types::{format_balance, short_address, ResourceKey, Session, Timestamp};

proptest! {
    /// Whole units of an 18-decimal token always render with six zero decimals.
    #[test]
    fn whole_units_render_exactly(units in 0u64..u64::MAX) {
        let raw = format!("{units}000000000000000000");
        prop_assert_eq!(format_balance(&raw, 18).unwrap(), format!("{units}.000000"));
    }

    /// With six decimals formatting is a pure split of the digits.
    #[test]
    fn six_decimals_is_a_split(raw in 0u128..10u128.pow(30)) {
        let expected = format!("{}.{:06}", raw / 1_000_000, raw % 1_000_000);
        prop_assert_eq!(format_balance(&raw.to_string(), 6).unwrap(), expected);
    }

    /// Output always has exactly six fractional digits.
    #[test]
    fn always_six_fraction_digits(raw in 0u128..u128::MAX / 1_000_000, decimals in 0u32..=30) {
        let out = format_balance(&raw.to_string(), decimals).unwrap();
        let (_, frac) = out.split_once('.').unwrap();
        prop_assert_eq!(frac.len(), 6);
    }

    /// Rounding never moves a value by more than half a display unit.
    #[test]
    fn rounding_is_within_half_unit(raw in 0u128..10u128.pow(24)) {
        let out = format_balance(&raw.to_string(), 12).unwrap();
        let (whole, frac) = out.split_once('.').unwrap();
        let shown: u128 = format!("{whole}{frac}").parse().unwrap();
        let exact_scaled = raw; // in units of 1e-12
        let shown_scaled = shown * 1_000_000;
        let diff = shown_scaled.abs_diff(exact_scaled);
        prop_assert!(diff <= 500_000);
    }

    /// Balance keys built from the same parts are equal; any part change separates them.
    #[test]
    fn balance_key_is_deterministic(chain in "[a-z]{1,10}", net in "[a-z]{1,10}") {
        let a = ResourceKey::balance(&chain, &net, None);
        let b = ResourceKey::balance(&chain, &net, Some("native"));
        prop_assert_eq!(a.clone(), b);
        prop_assert_ne!(a, ResourceKey::balance(&chain, &net, Some("0xtoken")));
    }

    /// A session is valid strictly before its expiry.
    #[test]
    fn session_validity_matches_expiry(expiry in 1u64..u64::MAX, now in 0u64..u64::MAX) {
        let session = Session::new("a", "r", Timestamp::new(expiry));
        prop_assert_eq!(session.is_valid_at(Timestamp::new(now)), now < expiry);
    }

    /// Abbreviated addresses never grow.
    #[test]
    fn short_address_never_grows(addr in "[0-9a-zA-Z]{0,64}") {
        prop_assert!(short_address(&addr).len() <= addr.len().max(17));
    }
}
