//! Card view models
//!
//! Maps a `Book` to the values a front end needs to draw its card. Pure
//! functions only; nothing here knows how the card is rendered.

use serde::Serialize;

use crate::models::{Book, BookId, Status, MAX_RATING};

/// Display-ready projection of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookCard {
    pub id: BookId,
    pub title: String,
    pub status: Status,
    /// "Yet To Start", "Ongoing", ...
    pub status_label: &'static str,
    /// "status-yet-to-start", "status-ongoing", ...
    pub status_class: String,
    pub rating: u8,
    /// One entry per star, filled for positions below the rating
    pub stars: [bool; MAX_RATING as usize],
    /// "Page 12", "Line 3" or "Page 12, Line 3"
    pub bookmark: Option<String>,
    /// `None` when the review is empty
    pub review: Option<String>,
}

/// Build the card for a book
pub fn card(book: &Book) -> BookCard {
    let mut stars = [false; MAX_RATING as usize];
    for (i, star) in stars.iter_mut().enumerate() {
        *star = i < book.rating as usize;
    }

    BookCard {
        id: book.id,
        title: book.name.clone(),
        status: book.status,
        status_label: book.status.label(),
        status_class: format!("status-{}", book.status.as_str()),
        rating: book.rating,
        stars,
        bookmark: bookmark_label(book.bookmark_page, book.bookmark_line),
        review: if book.review.is_empty() {
            None
        } else {
            Some(book.review.clone())
        },
    }
}

/// Build cards for a whole collection, keeping its order
pub fn cards(books: &[Book]) -> Vec<BookCard> {
    books.iter().map(card).collect()
}

/// Describe a bookmark position
pub fn bookmark_label(page: Option<u32>, line: Option<u32>) -> Option<String> {
    match (page, line) {
        (Some(p), Some(l)) => Some(format!("Page {}, Line {}", p, l)),
        (Some(p), None) => Some(format!("Page {}", p)),
        (None, Some(l)) => Some(format!("Line {}", l)),
        (None, None) => None,
    }
}

/// Render a rating as five star glyphs
pub fn star_string(rating: u8) -> String {
    (0..MAX_RATING)
        .map(|i| if i < rating { '★' } else { '☆' })
        .collect()
}
