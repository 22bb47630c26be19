//! # Parsing
//! Squares, moves, castling rights and whole positions can be parsed from raw
//! strings using the standard Rust [`FromStr`](std::str::FromStr) trait.
//!
//! On top of that, these types implement the [`PartialFromStr`] trait, which
//! allows combining parsers.
//!
//! Unlike [`FromStr`](std::str::FromStr), the `Ok` variant returned by
//! [`PartialFromStr`] contains two values:
//! - The parsed value
//! - A suffix of the input that was not part of the parsed value.
//!
//! A string like "d4rest" would return `Ok((Square::D4, "rest"))` when parsed.
//! The string "e2e4" can then be parsed as two squares by successive calls to
//! `partial_from_str`.

use std::convert::Infallible;

pub trait PartialFromStr: Sized {
    type Err;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err>;
}
impl<T: PartialFromStr> PartialFromStr for Option<T> {
    type Err = Infallible;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        match T::partial_from_str(s) {
            Ok((value, rest)) => Ok((Some(value), rest)),
            Err(_) => Ok((None, s)),
        }
    }
}

/// Consumes exactly one `expected` character.
pub(crate) fn parse_char(src: &str, expected: char) -> Result<&str, ()> {
    src.strip_prefix(expected).ok_or(())
}

/// Splits off the leading run of decimal digits, if there is one.
pub(crate) fn split_digits(src: &str) -> Option<(&str, &str)> {
    let digits = src.bytes().take_while(u8::is_ascii_digit).count();
    (digits != 0).then(|| src.split_at(digits))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn digits_stop_at_first_non_digit() {
        assert_eq!(split_digits("42 1"), Some(("42", " 1")));
        assert_eq!(split_digits("700000"), Some(("700000", "")));
        assert_eq!(split_digits("x"), None);
    }

    #[test]
    fn chars_are_consumed_once() {
        assert_eq!(parse_char(" w", ' '), Ok("w"));
        assert_eq!(parse_char("w", ' '), Err(()));
    }
}
