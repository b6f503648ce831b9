//! Row-range and page-range pagination.
//!
//! Both may be set on one criteria; setting one never clears the other.
//! The row range wins when both are present.

///
/// RowRange
/// Half-open row interval `[start, end)`, 0-based.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RowRange {
    pub start: u64,
    pub end: u64,
}

///
/// PageRange
/// Inclusive 1-based page interval with a fixed page size.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageRange {
    pub start: u64,
    pub end: u64,
    pub size: u64,
}

///
/// Window
/// Concrete `LIMIT` / `OFFSET` pair.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

///
/// Pagination
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Pagination {
    pub rows: Option<RowRange>,
    pub pages: Option<PageRange>,
}

impl Pagination {
    /// Resolve to a window. Inverted ranges yield a zero limit; page 0 is
    /// treated as page 1.
    #[must_use]
    pub fn window(&self) -> Option<Window> {
        if let Some(rows) = self.rows {
            return Some(Window {
                offset: rows.start,
                limit: rows.end.saturating_sub(rows.start),
            });
        }

        self.pages.map(|pages| {
            let start = pages.start.max(1);
            let count = pages.end.saturating_add(1).saturating_sub(start);

            Window {
                offset: (start - 1).saturating_mul(pages.size),
                limit: count.saturating_mul(pages.size),
            }
        })
    }

    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.rows.is_some() || self.pages.is_some()
    }
}

///
/// TESTS
///
