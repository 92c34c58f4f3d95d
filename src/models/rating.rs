use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A star rating in the range 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn new(value: i64) -> AppResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(AppError::InvalidArgument(format!(
                "rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn value(self) -> i64 {
        self.0 as i64
    }
}

impl TryFrom<i64> for Rating {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

/// One entry of a visitor's rating history.
///
/// Persisted as a two-element array `[catalog_id, rating]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(i64, i64)", into = "(i64, i64)")]
pub struct RatingEntry {
    pub catalog_id: i64,
    pub rating: Rating,
}

impl RatingEntry {
    /// Validates both halves of an entry. Zero is the context padding sentinel,
    /// so catalog ids must be positive.
    pub fn new(catalog_id: i64, rating: i64) -> AppResult<Self> {
        validate_catalog_id(catalog_id)?;
        Ok(Self {
            catalog_id,
            rating: Rating::new(rating)?,
        })
    }
}

impl TryFrom<(i64, i64)> for RatingEntry {
    type Error = AppError;

    fn try_from((catalog_id, rating): (i64, i64)) -> Result<Self, Self::Error> {
        RatingEntry::new(catalog_id, rating)
    }
}

impl From<RatingEntry> for (i64, i64) {
    fn from(entry: RatingEntry) -> Self {
        (entry.catalog_id, entry.rating.value())
    }
}

pub fn validate_catalog_id(catalog_id: i64) -> AppResult<()> {
    if catalog_id < 1 {
        return Err(AppError::InvalidArgument(format!(
            "catalog id must be positive, got {}",
            catalog_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(1).is_ok());
        assert!(Rating::new(5).is_ok());
        assert!(matches!(Rating::new(0), Err(AppError::InvalidArgument(_))));
        assert!(matches!(Rating::new(6), Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_entry_rejects_sentinel_id() {
        assert!(matches!(
            RatingEntry::new(0, 3),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_entry_serializes_as_pair() {
        let entry = RatingEntry::new(7, 2).unwrap();
        assert_eq!(serde_json::to_string(&entry).unwrap(), "[7,2]");

        let parsed: RatingEntry = serde_json::from_str("[7,2]").unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_entry_rejects_out_of_range_rating_on_parse() {
        let parsed: Result<RatingEntry, _> = serde_json::from_str("[7,9]");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_entry_rejects_sentinel_id_on_parse() {
        let parsed: Result<RatingEntry, _> = serde_json::from_str("[0,3]");
        assert!(parsed.is_err());

        let negative: Result<RatingEntry, _> = serde_json::from_str("[-4,3]");
        assert!(negative.is_err());
    }
}
