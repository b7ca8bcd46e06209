use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::luhn::{self, LuhnError};

/// A 15-digit IMEI that has passed the Luhn check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Imei(String);

impl Imei {
    pub fn parse(s: &str) -> Result<Self, LuhnError> {
        if luhn::is_valid(s)? {
            Ok(Imei(s.to_string()))
        } else {
            Err(LuhnError::ChecksumMismatch(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Type Allocation Code: the first eight digits, identifying the device model.
    pub fn tac(&self) -> &str {
        &self.0[..8]
    }

    pub fn check_digit(&self) -> u8 {
        self.0.as_bytes()[luhn::IMEI_LEN - 1] - b'0'
    }
}

impl fmt::Display for Imei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Imei {
    type Err = LuhnError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Imei::parse(s)
    }
}

impl TryFrom<String> for Imei {
    type Error = LuhnError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Imei::parse(&s)
    }
}

impl From<Imei> for String {
    fn from(imei: Imei) -> Self {
        imei.0
    }
}

impl AsRef<str> for Imei {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_valid() {
        let imei = Imei::parse("490154203237518").unwrap();
        assert_eq!(imei.as_str(), "490154203237518");
        assert_eq!(imei.tac(), "49015420");
        assert_eq!(imei.check_digit(), 8);
    }

    #[test]
    fn parse_distinguishes_format_from_checksum() {
        assert!(matches!(Imei::parse("49015420323751"), Err(LuhnError::InvalidFormat(_))));
        assert!(matches!(
            Imei::parse("490154203237519"),
            Err(LuhnError::ChecksumMismatch(_))
        ));
    }

    #[test]
    fn serializes_as_plain_string() {
        let imei: Imei = "356938035643809".parse().unwrap();
        assert_eq!(serde_json::to_string(&imei).unwrap(), "\"356938035643809\"");
    }

    #[test]
    fn deserialize_rejects_bad_checksum() {
        assert!(serde_json::from_str::<Imei>("\"490154203237518\"").is_ok());
        assert!(serde_json::from_str::<Imei>("\"490154203237519\"").is_err());
    }
}
