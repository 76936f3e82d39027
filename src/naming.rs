//! Naming helpers for derived association tables.
//!
//! Association table and column names are derived deterministically from the
//! owning model's name, which requires a camel-case to snake-case conversion.

/// Convert a string to snake_case.
///
/// Consecutive uppercase letters are treated as an acronym and kept together
/// until the next lowercase letter.
///
/// # Examples
///
/// ```rust
/// use reinhardt_generic_m2m::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("Article"), "article");
/// assert_eq!(to_snake_case("UserProfile"), "user_profile");
/// assert_eq!(to_snake_case("HTTPRequest"), "http_request");
/// assert_eq!(to_snake_case("already_snake"), "already_snake");
/// ```
pub fn to_snake_case(s: &str) -> String {
	let mut result = String::with_capacity(s.len() + 4);
	let chars: Vec<char> = s.chars().collect();

	for (i, &ch) in chars.iter().enumerate() {
		if ch.is_ascii_uppercase() {
			let prev_lower_or_digit = i > 0
				&& (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit());
			let acronym_boundary = i > 0
				&& chars[i - 1].is_ascii_uppercase()
				&& chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase());
			if prev_lower_or_digit || acronym_boundary {
				result.push('_');
			}
			result.push(ch.to_ascii_lowercase());
		} else {
			result.push(ch);
		}
	}

	result
}
