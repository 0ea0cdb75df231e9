//! Book stock types

use super::ids::BookId;

/// Category given to titles added without one
pub const DEFAULT_CATEGORY: &str = "General";

/// Per-title stock and pricing
///
/// `available` counts copies on the shelf and `on_loan` copies out with a
/// renter. A reservation moves one copy from the first to the second and a
/// release moves it back; restocking only grows `available`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookStock {
    /// The title this stock belongs to
    pub book: BookId,

    /// Display title
    pub title: String,

    pub category: String,

    /// Current rental fee in the smallest currency unit
    ///
    /// Changing this never affects rentals that were already charged.
    pub rental_cost: u64,

    /// Copies currently available to rent
    pub available: u32,

    /// Copies reserved or rented out
    pub on_loan: u32,
}

impl BookStock {
    pub fn new(
        book: BookId,
        title: impl Into<String>,
        category: impl Into<String>,
        rental_cost: u64,
        available: u32,
    ) -> Self {
        BookStock {
            book,
            title: title.into(),
            category: category.into(),
            rental_cost,
            available,
            on_loan: 0,
        }
    }
}
