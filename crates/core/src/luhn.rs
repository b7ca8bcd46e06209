use thiserror::Error;

/// Number of digits in an IMEI, check digit included.
pub const IMEI_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LuhnError {
    #[error("Expected exactly {IMEI_LEN} ASCII digits, got '{0}'")]
    InvalidFormat(String),
    #[error("Luhn checksum mismatch for '{0}'")]
    ChecksumMismatch(String),
}

/// Luhn check of a 15-digit IMEI string.
///
/// Anything other than exactly 15 ASCII digits is rejected with
/// [`LuhnError::InvalidFormat`] instead of being reported as a failed checksum.
pub fn is_valid(number: &str) -> Result<bool, LuhnError> {
    if !is_well_formed(number) {
        return Err(LuhnError::InvalidFormat(number.to_string()));
    }
    Ok(checksum(number.as_bytes()) % 10 == 0)
}

/// Compute the check digit that completes a 14-digit IMEI body.
pub fn check_digit(body: &str) -> Result<u8, LuhnError> {
    if body.len() != IMEI_LEN - 1 || !body.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LuhnError::InvalidFormat(body.to_string()));
    }
    // Appending a zero puts the body digits in their final positions.
    let mut padded = body.as_bytes().to_vec();
    padded.push(b'0');
    let rem = checksum(&padded) % 10;
    Ok(((10 - rem) % 10) as u8)
}

pub(crate) fn is_well_formed(number: &str) -> bool {
    number.len() == IMEI_LEN && number.bytes().all(|b| b.is_ascii_digit())
}

/// Sum of the Luhn-transformed digits, walking right to left.
/// Caller guarantees `digits` holds only ASCII digits.
fn checksum(digits: &[u8]) -> u32 {
    digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum()
}
