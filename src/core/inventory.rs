//! Thread-safe book stock
//!
//! This module provides the `Inventory` struct, which owns the per-title
//! available-copy counters and implements [`BookInventory`].
//!
//! # Design
//!
//! Stock lives in a `DashMap` keyed by book ID. Every mutation goes through
//! `get_mut`, which holds the entry's shard lock for the whole
//! check-and-decrement, so the counter can never be driven below zero by
//! racing reservations. Reads return clones (snapshots).

use crate::core::traits::BookInventory;
use crate::types::{BookId, BookStock, LedgerError};
use dashmap::DashMap;
use tracing::debug;

/// Per-title stock counters
#[derive(Debug, Default)]
pub struct Inventory {
    /// Stock by book ID
    books: DashMap<BookId, BookStock>,
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
        }
    }

    /// Add a title to the catalogue
    ///
    /// A title may start with zero copies and be restocked later.
    ///
    /// # Arguments
    ///
    /// * `book` - The new book ID
    /// * `title` - Display title, must not be blank
    /// * `category` - Shelf category, must not be blank
    /// * `rental_cost` - Fee charged per rental, must be positive
    /// * `copies` - Initial available copies
    ///
    /// # Returns
    ///
    /// * `Ok(BookStock)` - Snapshot of the new stock
    /// * `Err(LedgerError::InvalidBook)` - Blank title or category, or a zero fee
    /// * `Err(LedgerError::DuplicateBook)` - If the ID is already in use; the
    ///   existing entry is left untouched
    pub fn add_book(
        &self,
        book: BookId,
        title: impl Into<String>,
        category: impl Into<String>,
        rental_cost: u64,
        copies: u32,
    ) -> Result<BookStock, LedgerError> {
        let title = non_blank(book, title.into(), "title")?;
        let category = non_blank(book, category.into(), "category")?;
        if rental_cost == 0 {
            return Err(LedgerError::invalid_book(book, "rental cost must be positive"));
        }

        let mut inserted = false;
        let stock = self
            .books
            .entry(book)
            .or_insert_with(|| {
                inserted = true;
                BookStock::new(book, title, category, rental_cost, copies)
            })
            .clone();

        if !inserted {
            return Err(LedgerError::DuplicateBook { book });
        }

        debug!(book, rental_cost, copies, "Book added");
        Ok(stock)
    }

    /// Add copies to an existing title
    pub fn restock(&self, book: BookId, copies: u32) -> Result<BookStock, LedgerError> {
        let mut entry = self
            .books
            .get_mut(&book)
            .ok_or_else(|| LedgerError::book_not_found(book))?;

        entry.available = entry
            .available
            .checked_add(copies)
            .ok_or_else(|| LedgerError::arithmetic_overflow("restock"))?;

        debug!(book, copies, available = entry.available, "Book restocked");
        Ok(entry.clone())
    }

    /// Change the fee for future rentals
    ///
    /// Rentals already created keep the fee they were charged.
    pub fn set_rental_cost(&self, book: BookId, rental_cost: u64) -> Result<BookStock, LedgerError> {
        if rental_cost == 0 {
            return Err(LedgerError::invalid_book(book, "rental cost must be positive"));
        }

        let mut entry = self
            .books
            .get_mut(&book)
            .ok_or_else(|| LedgerError::book_not_found(book))?;

        entry.rental_cost = rental_cost;
        Ok(entry.clone())
    }

    /// Rename a title or move it to another category
    ///
    /// `None` keeps the current value. Both values are validated before
    /// either is written.
    pub fn update_details(
        &self,
        book: BookId,
        title: Option<String>,
        category: Option<String>,
    ) -> Result<BookStock, LedgerError> {
        let title = title.map(|t| non_blank(book, t, "title")).transpose()?;
        let category = category.map(|c| non_blank(book, c, "category")).transpose()?;

        let mut entry = self
            .books
            .get_mut(&book)
            .ok_or_else(|| LedgerError::book_not_found(book))?;

        if let Some(title) = title {
            entry.title = title;
        }
        if let Some(category) = category {
            entry.category = category;
        }

        debug!(book, title = %entry.title, category = %entry.category, "Book details updated");
        Ok(entry.clone())
    }

    /// Drop a title from the catalogue
    ///
    /// Refused while any copy is reserved or rented out, so every rental of
    /// a removed title has already been returned.
    ///
    /// # Returns
    ///
    /// * `Ok(BookStock)` - The removed entry
    /// * `Err(LedgerError::BookOnLoan)` - Copies are still out; nothing changed
    /// * `Err(LedgerError::BookNotFound)` - Unknown book
    pub fn remove_book(&self, book: BookId) -> Result<BookStock, LedgerError> {
        // The predicate runs under the entry lock, so no reservation can
        // slip in between the check and the removal.
        if let Some((_, stock)) = self.books.remove_if(&book, |_, stock| stock.on_loan == 0) {
            debug!(book, "Book removed");
            return Ok(stock);
        }

        match self.books.get(&book) {
            Some(stock) => Err(LedgerError::BookOnLoan {
                book,
                on_loan: stock.on_loan,
            }),
            None => Err(LedgerError::book_not_found(book)),
        }
    }

    pub fn get(&self, book: BookId) -> Option<BookStock> {
        self.books.get(&book).map(|entry| entry.value().clone())
    }

    /// Snapshot of every title, sorted by book ID
    pub fn all_books(&self) -> Vec<BookStock> {
        let mut books: Vec<BookStock> = self
            .books
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        books.sort_by_key(|stock| stock.book);
        books
    }
}

fn non_blank(book: BookId, value: String, field: &str) -> Result<String, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::invalid_book(
            book,
            &format!("{} must not be empty", field),
        ));
    }
    Ok(trimmed.to_string())
}

impl BookInventory for Inventory {
    fn rental_cost(&self, book: BookId) -> Result<u64, LedgerError> {
        self.books
            .get(&book)
            .map(|entry| entry.rental_cost)
            .ok_or_else(|| LedgerError::book_not_found(book))
    }

    fn reserve(&self, book: BookId) -> Result<(), LedgerError> {
        let mut entry = self
            .books
            .get_mut(&book)
            .ok_or_else(|| LedgerError::book_not_found(book))?;

        if entry.available == 0 {
            return Err(LedgerError::out_of_stock(book));
        }

        entry.on_loan = entry
            .on_loan
            .checked_add(1)
            .ok_or_else(|| LedgerError::arithmetic_overflow("reserve"))?;
        entry.available -= 1;
        debug!(book, available = entry.available, "Copy reserved");
        Ok(())
    }

    fn release(&self, book: BookId) -> Result<(), LedgerError> {
        let mut entry = self
            .books
            .get_mut(&book)
            .ok_or_else(|| LedgerError::book_not_found(book))?;

        let on_loan = entry
            .on_loan
            .checked_sub(1)
            .ok_or_else(|| LedgerError::invalid_book(book, "no copy is on loan"))?;
        let available = entry
            .available
            .checked_add(1)
            .ok_or_else(|| LedgerError::arithmetic_overflow("release"))?;
        entry.on_loan = on_loan;
        entry.available = available;
        debug!(book, available, "Copy released");
        Ok(())
    }
}
