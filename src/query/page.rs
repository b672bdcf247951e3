use serde::{Deserialize, Serialize};

use super::error::QueryError;

/// Bounds applied to `page_size` / `page_number`. Both bounds are inclusive.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PagePolicy {
    pub max_page_size: i64,
    pub max_page_number: i64,
    /// Used when the caller asks for a page size of 0. Not bounded by
    /// `max_page_size`.
    pub default_page_size: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct PageRequest {
    pub page_size: i64,
    pub page_number: i64,
}

/// Store-level window for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

impl Default for PagePolicy {
    fn default() -> Self {
        Self {
            max_page_size: 15,
            max_page_number: 10,
            default_page_size: 100,
        }
    }
}

impl PagePolicy {
    pub fn window(&self, page: PageRequest) -> Result<PageWindow, QueryError> {
        if !(0..=self.max_page_size).contains(&page.page_size) {
            return Err(QueryError::Validation(format!(
                "page size should be within [0,{}] range",
                self.max_page_size
            )));
        }
        if !(0..=self.max_page_number).contains(&page.page_number) {
            return Err(QueryError::Validation(format!(
                "page number should be within [0,{}] range",
                self.max_page_number
            )));
        }

        let page_size = match page.page_size {
            0 => self.default_page_size,
            n => n,
        };
        let offset = page
            .page_number
            .checked_mul(page_size)
            .and_then(|o| usize::try_from(o).ok());
        let (Some(offset), Ok(limit)) = (offset, usize::try_from(page_size)) else {
            return Err(QueryError::Validation(format!(
                "page {} of size {page_size} is out of range",
                page.page_number
            )));
        };

        Ok(PageWindow { offset, limit })
    }

    /// Checks the bounds themselves, so a loaded policy can never produce
    /// a negative or empty default window.
    pub fn check(&self) -> Result<(), &'static str> {
        if self.max_page_size < 0 {
            return Err("max_page_size must not be negative");
        }
        if self.max_page_number < 0 {
            return Err("max_page_number must not be negative");
        }
        if self.default_page_size < 1 {
            return Err("default_page_size must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn page(page_size: i64, page_number: i64) -> PageRequest {
        PageRequest {
            page_size,
            page_number,
        }
    }

    #[test]
    fn test_window_math() {
        let policy = PagePolicy::default();
        assert_eq!(
            policy.window(page(10, 0)).unwrap(),
            PageWindow { offset: 0, limit: 10 }
        );
        assert_eq!(
            policy.window(page(5, 3)).unwrap(),
            PageWindow { offset: 15, limit: 5 }
        );
        assert_eq!(
            policy.window(page(15, 10)).unwrap(),
            PageWindow { offset: 150, limit: 15 }
        );
    }

    #[test]
    fn test_zero_page_size_uses_default() {
        let policy = PagePolicy::default();
        assert_eq!(
            policy.window(page(0, 0)).unwrap(),
            PageWindow { offset: 0, limit: 100 }
        );
        assert_eq!(
            policy.window(page(0, 2)).unwrap(),
            PageWindow { offset: 200, limit: 100 }
        );
    }

    #[test]
    fn test_bounds() {
        let policy = PagePolicy::default();
        for bad in [page(16, 0), page(-1, 0), page(5, 11), page(5, -1)] {
            assert!(matches!(policy.window(bad), Err(QueryError::Validation(_))));
        }

        let Err(QueryError::Validation(msg)) = policy.window(page(16, 0)) else {
            panic!("expected validation error");
        };
        assert_eq!(msg, "page size should be within [0,15] range");

        let Err(QueryError::Validation(msg)) = policy.window(page(1, 11)) else {
            panic!("expected validation error");
        };
        assert_eq!(msg, "page number should be within [0,10] range");
    }

    #[test]
    fn test_window_overflow() {
        let policy = PagePolicy {
            max_page_number: i64::MAX,
            ..PagePolicy::default()
        };
        assert!(matches!(
            policy.window(page(0, i64::MAX / 10)),
            Err(QueryError::Validation(_))
        ));

        let policy = PagePolicy {
            default_page_size: -5,
            ..PagePolicy::default()
        };
        assert!(matches!(policy.window(page(0, 1)), Err(QueryError::Validation(_))));
    }

    #[test]
    fn test_check() {
        assert!(PagePolicy::default().check().is_ok());
        for policy in [
            PagePolicy { max_page_size: -1, ..PagePolicy::default() },
            PagePolicy { max_page_number: -1, ..PagePolicy::default() },
            PagePolicy { default_page_size: 0, ..PagePolicy::default() },
            PagePolicy { default_page_size: -5, ..PagePolicy::default() },
        ] {
            assert!(policy.check().is_err(), "{policy:?}");
        }
    }
}
