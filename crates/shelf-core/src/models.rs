//! Data models for SHELF
//!
//! Defines the `Book` record, its reading `Status`, and the normalization
//! rules every record passes through before it is stored, whether it comes
//! from a form or from an imported file.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Highest rating a book can carry
pub const MAX_RATING: u8 = 5;

/// Unique, immutable identifier of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub i64);

impl BookId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(BookId)
    }
}

/// Reading status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    YetToStart,
    Ongoing,
    Completed,
    Dropped,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::YetToStart,
        Status::Ongoing,
        Status::Completed,
        Status::Dropped,
    ];

    /// Wire form used in storage and JSON files
    pub fn as_str(self) -> &'static str {
        match self {
            Status::YetToStart => "yet-to-start",
            Status::Ongoing => "ongoing",
            Status::Completed => "completed",
            Status::Dropped => "dropped",
        }
    }

    /// Title-cased form for display ("Yet To Start")
    pub fn label(self) -> &'static str {
        match self {
            Status::YetToStart => "Yet To Start",
            Status::Ongoing => "Ongoing",
            Status::Completed => "Completed",
            Status::Dropped => "Dropped",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the four status values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status '{0}' (expected yet-to-start, ongoing, completed or dropped)")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A tracked book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub name: String,
    pub review: String,
    /// Always within 0..=5
    pub rating: u8,
    pub bookmark_page: Option<u32>,
    pub bookmark_line: Option<u32>,
    pub status: Status,
}

impl Book {
    /// Lowercased name used for collision detection
    pub fn name_key(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn has_bookmark(&self) -> bool {
        self.bookmark_page.is_some() || self.bookmark_line.is_some()
    }
}

/// A normalized book that has not been given an id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub name: String,
    pub review: String,
    pub rating: u8,
    pub bookmark_page: Option<u32>,
    pub bookmark_line: Option<u32>,
    pub status: Status,
}

impl BookDraft {
    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            name: self.name,
            review: self.review,
            rating: self.rating,
            bookmark_page: self.bookmark_page,
            bookmark_line: self.bookmark_line,
            status: self.status,
        }
    }
}

/// Reasons raw input is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid format: expected an object")]
    NotAnObject,

    #[error("invalid format: missing or non-string name")]
    MissingName,

    #[error("name cannot be empty")]
    EmptyName,
}

/// Normalize raw input into a draft book
///
/// Strings are trimmed, the rating is clamped into 0..=5 (non-numeric
/// becomes 0), bookmarks must be positive integers or are left unset, and
/// an unknown status falls back to `yet-to-start`.
pub fn normalize(raw: &Value) -> Result<BookDraft, ValidationError> {
    let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingName)?
        .trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    let review = obj
        .get("review")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();

    let rating = obj
        .get("rating")
        .and_then(parse_int)
        .map(|r| r.clamp(0, MAX_RATING as i64) as u8)
        .unwrap_or(0);

    let status = obj
        .get("status")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();

    Ok(BookDraft {
        name: name.to_string(),
        review,
        rating,
        bookmark_page: obj.get("bookmarkPage").and_then(parse_bookmark),
        bookmark_line: obj.get("bookmarkLine").and_then(parse_bookmark),
        status,
    })
}

/// Integer-prefix parsing of a JSON value
///
/// Numbers are truncated toward zero; strings yield their leading
/// `[+-]?[0-9]+` run after trimming. Everything else is non-numeric.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => parse_int_prefix(s),
        _ => None,
    }
}

fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    // Saturate rather than fail on absurdly long digit runs
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_bookmark(value: &Value) -> Option<u32> {
    parse_int(value)
        .filter(|&n| n > 0)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Ids at or above this value are never issued
///
/// Imported records may still carry such ids; they are kept as-is but do not
/// advance the generator, so generated ids can never reach them.
pub const ID_CEILING: i64 = i64::MAX / 2;

/// Issues timestamp-derived ids that only ever increase
///
/// Each id is the current time in milliseconds, bumped past the last id
/// issued or observed so that two ids can never be equal. Issued ids stay
/// below [`ID_CEILING`].
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator that will never issue any of the given ids
    pub fn seeded<'a>(existing: impl IntoIterator<Item = &'a Book>) -> Self {
        let mut ids = Self::new();
        for book in existing {
            ids.observe(book.id);
        }
        ids
    }

    /// Record an id that is already in use
    pub fn observe(&mut self, id: BookId) {
        if id.0 < ID_CEILING {
            self.last = self.last.max(id.0);
        }
    }

    /// Issue a fresh id
    pub fn next(&mut self) -> BookId {
        self.reserve(1)
    }

    /// Reserve `count` consecutive fresh ids and return the first
    pub fn reserve(&mut self, count: usize) -> BookId {
        let now = Utc::now().timestamp_millis();
        let base = now.max(self.last.saturating_add(1));
        let count = i64::try_from(count.max(1)).unwrap_or(i64::MAX);
        self.last = base.saturating_add(count - 1);
        BookId(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_trims_and_defaults() {
        let draft = normalize(&json!({"name": "  Dune  ", "review": "  classic "})).unwrap();
        assert_eq!(draft.name, "Dune");
        assert_eq!(draft.review, "classic");
        assert_eq!(draft.rating, 0);
        assert_eq!(draft.bookmark_page, None);
        assert_eq!(draft.bookmark_line, None);
        assert_eq!(draft.status, Status::YetToStart);
    }

    #[test]
    fn test_normalize_full_record() {
        let draft = normalize(&json!({
            "name": "Hyperion",
            "review": "Pilgrims",
            "rating": 4,
            "bookmarkPage": 120,
            "bookmarkLine": "7",
            "status": "ongoing"
        }))
        .unwrap();

        assert_eq!(draft.rating, 4);
        assert_eq!(draft.bookmark_page, Some(120));
        assert_eq!(draft.bookmark_line, Some(7));
        assert_eq!(draft.status, Status::Ongoing);
    }

    #[test]
    fn test_rating_is_clamped() {
        let rating = |v: Value| normalize(&json!({"name": "x", "rating": v})).unwrap().rating;

        assert_eq!(rating(json!(99)), 5);
        assert_eq!(rating(json!(-3)), 0);
        assert_eq!(rating(json!("abc")), 0);
        assert_eq!(rating(json!("3 stars")), 3);
        assert_eq!(rating(json!(4.9)), 4);
        assert_eq!(rating(json!(null)), 0);
        assert_eq!(rating(json!(true)), 0);
    }

    #[test]
    fn test_rejects_bad_names() {
        assert_eq!(normalize(&json!("Dune")), Err(ValidationError::NotAnObject));
        assert_eq!(normalize(&json!(null)), Err(ValidationError::NotAnObject));
        assert_eq!(normalize(&json!({"foo": "bar"})), Err(ValidationError::MissingName));
        assert_eq!(normalize(&json!({"name": 42})), Err(ValidationError::MissingName));
        assert_eq!(normalize(&json!({"name": ""})), Err(ValidationError::EmptyName));
        assert_eq!(normalize(&json!({"name": "   "})), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_bookmarks_zero_and_negative_are_unset() {
        let draft = normalize(&json!({
            "name": "x",
            "bookmarkPage": 0,
            "bookmarkLine": -4
        }))
        .unwrap();
        assert_eq!(draft.bookmark_page, None);
        assert_eq!(draft.bookmark_line, None);

        let draft = normalize(&json!({"name": "x", "bookmarkPage": "page"})).unwrap();
        assert_eq!(draft.bookmark_page, None);
    }

    #[test]
    fn test_invalid_status_defaults() {
        let draft = normalize(&json!({"name": "x", "status": "reading"})).unwrap();
        assert_eq!(draft.status, Status::YetToStart);

        let draft = normalize(&json!({"name": "x", "status": 3})).unwrap();
        assert_eq!(draft.status, Status::YetToStart);
    }

    #[test]
    fn test_non_string_review_is_empty() {
        let draft = normalize(&json!({"name": "x", "review": 12})).unwrap();
        assert_eq!(draft.review, "");
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int(&json!("  42abc")), Some(42));
        assert_eq!(parse_int(&json!("-7")), Some(-7));
        assert_eq!(parse_int(&json!("+3")), Some(3));
        assert_eq!(parse_int(&json!("")), None);
        assert_eq!(parse_int(&json!("-")), None);
        assert_eq!(parse_int(&json!("x1")), None);
        assert_eq!(parse_int(&json!(-2.5)), Some(-2));
    }

    #[test]
    fn test_status_round_trip() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!(Status::YetToStart.label(), "Yet To Start");
        assert!("Ongoing".parse::<Status>().is_err());
    }

    #[test]
    fn test_book_serialization_uses_camel_case() {
        let book = BookDraft {
            name: "Dune".into(),
            review: String::new(),
            rating: 5,
            bookmark_page: Some(10),
            bookmark_line: None,
            status: Status::Completed,
        }
        .into_book(BookId(1));

        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["id"], json!(1));
        assert_eq!(value["bookmarkPage"], json!(10));
        assert_eq!(value["bookmarkLine"], json!(null));
        assert_eq!(value["status"], json!("completed"));

        let back: Book = serde_json::from_value(value).unwrap();
        assert_eq!(back, book);
    }

    #[test]
    fn test_id_generator_is_strictly_increasing() {
        let mut ids = IdGenerator::new();
        let a = ids.next();
        let b = ids.next();
        let c = ids.next();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_id_generator_skips_observed_and_reserved() {
        let mut ids = IdGenerator::new();
        let future = BookId(Utc::now().timestamp_millis() + 1_000_000);
        ids.observe(future);
        assert_eq!(ids.next(), BookId(future.0 + 1));

        let base = ids.reserve(3);
        assert_eq!(base, BookId(future.0 + 2));
        assert_eq!(ids.next(), BookId(future.0 + 5));
    }

    #[test]
    fn test_id_generator_ignores_ids_at_the_top_of_the_range() {
        let mut ids = IdGenerator::new();
        ids.observe(BookId(i64::MAX));
        ids.observe(BookId(ID_CEILING));

        let a = ids.next();
        let b = ids.next();
        assert_ne!(a, b);
        assert!(a < b);
        assert!(b.0 < ID_CEILING);

        let base = ids.reserve(3);
        assert!(base > b);
        assert!(base.0 + 2 < ID_CEILING);
    }

    #[test]
    fn test_id_generator_still_skips_large_ids_below_ceiling() {
        let mut ids = IdGenerator::new();
        ids.observe(BookId(ID_CEILING - 10));
        assert_eq!(ids.next(), BookId(ID_CEILING - 9));
    }
}
