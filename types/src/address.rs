//! Address display helpers.

/// Leading characters kept by [`short_address`].
const HEAD: usize = 8;
/// Trailing characters kept by [`short_address`].
const TAIL: usize = 6;

/// Abbreviate an address for display: `0x1234ab...9f8e7d`.
///
/// Addresses too short to benefit are returned unchanged.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= HEAD + TAIL + 3 {
        return address.to_string();
    }
    let head: String = chars[..HEAD].iter().collect();
    let tail: String = chars[chars.len() - TAIL..].iter().collect();
    format!("{head}...{tail}")
}
