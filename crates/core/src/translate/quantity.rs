use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use super::error::{Error, InvalidQuantitySnafu};

const BINARY_SUFFIXES: [&str; 6] = ["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];
const DECIMAL_SUFFIXES: [&str; 7] = ["m", "k", "M", "G", "T", "P", "E"];

/// Validates `value` against the Kubernetes quantity grammar.
///
/// ```text
/// <quantity>     ::= <signedNumber><suffix>
/// <suffix>       ::= <binarySI> | <decimalExponent> | <decimalSI>
/// <binarySI>     ::= Ki | Mi | Gi | Ti | Pi | Ei
/// <decimalSI>    ::= m | "" | k | M | G | T | P | E
/// <decimalExponent> ::= "e" <signedNumber> | "E" <signedNumber>
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidQuantity`] when `value` is not a quantity.
pub fn parse_quantity(value: &str) -> Result<Quantity, Error> {
    let (number, suffix) = split_number(value);
    if !is_signed_number(number) || !is_suffix(suffix) {
        return InvalidQuantitySnafu { value }.fail();
    }
    Ok(Quantity(value.to_string()))
}

/// Splits at the first character that cannot belong to the leading number.
fn split_number(value: &str) -> (&str, &str) {
    let is_number_char =
        |index: usize, c: char| c.is_ascii_digit() || c == '.' || (index == 0 && matches!(c, '+' | '-'));
    let end = value
        .char_indices()
        .find(|&(index, c)| !is_number_char(index, c))
        .map_or(value.len(), |(index, _)| index);
    value.split_at(end)
}

fn is_signed_number(value: &str) -> bool {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    !(integer.is_empty() && fraction.is_empty()) && all_digits(integer) && all_digits(fraction)
}

fn is_suffix(suffix: &str) -> bool {
    if suffix.is_empty() || BINARY_SUFFIXES.contains(&suffix) || DECIMAL_SUFFIXES.contains(&suffix)
    {
        return true;
    }
    suffix
        .strip_prefix(['e', 'E'])
        .is_some_and(|exponent| !exponent.contains('.') && is_signed_number(exponent))
}
