// 🔢 Registry Id - CNPJ check-digit validation
//
// A CNPJ is a 12-digit base followed by two check digits, usually written
// as NN.NNN.NNN/NNNN-NN. Each check digit is a weighted sum mod 11.

use std::fmt;

// ============================================================================
// WEIGHTS
// ============================================================================

const FIRST_DIGIT_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const SECOND_DIGIT_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Length of the canonical (separator-free) form
pub const DIGIT_COUNT: usize = 14;

const BASE_LEN: usize = 12;

// ============================================================================
// VALIDATION
// ============================================================================

/// Check a raw registry id.
///
/// `.` and `/` are stripped, then the remainder must be a 12-digit base and a
/// 2-digit suffix separated by exactly one `-`. Never panics; anything
/// malformed is simply invalid.
pub fn validate(raw: &str) -> bool {
    RegistryId::parse(raw).is_ok()
}

/// Strip every separator (`.`, `/`, `-`). This is the form sent upstream.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| !matches!(c, '.' | '/' | '-')).collect()
}

/// Compute both check digits for a 12-digit base (values 0-9).
pub fn check_digits(base: &[u8; BASE_LEN]) -> [u8; 2] {
    let first = digit_for(base, &FIRST_DIGIT_WEIGHTS);

    let mut extended = [0u8; BASE_LEN + 1];
    extended[..BASE_LEN].copy_from_slice(base);
    extended[BASE_LEN] = first;

    // Second digit uses its own remainder, never the first one's
    let second = digit_for(&extended, &SECOND_DIGIT_WEIGHTS);

    [first, second]
}

fn digit_for(digits: &[u8], weights: &[u32]) -> u8 {
    let sum: u32 = digits
        .iter()
        .zip(weights)
        .map(|(&d, &w)| u32::from(d) * w)
        .sum();

    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        (11 - remainder) as u8
    }
}

/// Render 14 canonical digits as `NN.NNN.NNN/NNNN-NN`.
pub fn format_digits(digits: &str) -> Option<String> {
    if digits.len() != DIGIT_COUNT || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(format!(
        "{}.{}.{}/{}-{}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..14]
    ))
}

// ============================================================================
// REGISTRY ID VALUE
// ============================================================================

/// Why a raw string is not a valid registry id
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRegistryId {
    #[error("expected exactly one '-' before the check digits")]
    MissingSeparator,

    #[error("base must be exactly 12 digits")]
    MalformedBase,

    #[error("check-digit suffix must be exactly 2 digits")]
    MalformedSuffix,

    #[error("first check digit does not match")]
    FirstDigitMismatch,

    #[error("second check digit does not match")]
    SecondDigitMismatch,
}

/// A registry id that passed check-digit validation.
///
/// Keeps the caller's raw spelling alongside the canonical digits; the raw
/// spelling is what the store is keyed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryId {
    raw: String,
    digits: String,
}

impl RegistryId {
    pub fn parse(raw: &str) -> Result<Self, InvalidRegistryId> {
        let stripped: String = raw.chars().filter(|c| !matches!(c, '.' | '/')).collect();

        let parts: Vec<&str> = stripped.split('-').collect();
        let [base, suffix] = parts.as_slice() else {
            return Err(InvalidRegistryId::MissingSeparator);
        };

        let base = parse_digits::<BASE_LEN>(base).ok_or(InvalidRegistryId::MalformedBase)?;
        let suffix = parse_digits::<2>(suffix).ok_or(InvalidRegistryId::MalformedSuffix)?;

        let expected = check_digits(&base);
        if suffix[0] != expected[0] {
            return Err(InvalidRegistryId::FirstDigitMismatch);
        }
        if suffix[1] != expected[1] {
            return Err(InvalidRegistryId::SecondDigitMismatch);
        }

        Ok(RegistryId {
            raw: raw.to_string(),
            digits: normalize(raw),
        })
    }

    /// The string exactly as submitted
    pub fn as_raw(&self) -> &str {
        &self.raw
    }

    /// 14 canonical digits
    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn formatted(&self) -> String {
        // digits are always 14 ASCII digits once parsed
        format_digits(&self.digits).unwrap_or_else(|| self.digits.clone())
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_digits<const N: usize>(s: &str) -> Option<[u8; N]> {
    let bytes = s.as_bytes();
    if bytes.len() != N {
        return None;
    }

    let mut out = [0u8; N];
    for (slot, b) in out.iter_mut().zip(bytes) {
        if !b.is_ascii_digit() {
            return None;
        }
        *slot = b - b'0';
    }
    Some(out)
}
