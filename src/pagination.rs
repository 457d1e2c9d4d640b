///Students are listed 10 to a page.
pub const PER_PAGE: i64 = 10;

///1-based pager. Out-of-range pages are not an error, the query just
///comes back empty.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pager {
    page: i64,
    per_page: i64,
}

impl Pager {
    pub fn new(page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: PER_PAGE,
        }
    }

    pub const fn page(self) -> i64 {
        self.page
    }

    pub const fn per_page(self) -> i64 {
        self.per_page
    }

    pub const fn offset(self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub const fn total_pages(self, total_count: i64) -> i64 {
        (total_count + self.per_page - 1) / self.per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_starts_at_zero() {
        assert_eq!(Pager::new(1).offset(), 0);
        assert_eq!(Pager::new(2).offset(), 10);
        assert_eq!(Pager::new(7).offset(), 60);
    }

    #[test]
    fn nonsense_pages_clamp_to_one() {
        assert_eq!(Pager::new(0).offset(), 0);
        assert_eq!(Pager::new(-3).page(), 1);
    }

    #[test]
    fn total_pages_is_a_ceiling_division() {
        let pager = Pager::new(1);
        assert_eq!(pager.total_pages(0), 0);
        assert_eq!(pager.total_pages(1), 1);
        assert_eq!(pager.total_pages(10), 1);
        assert_eq!(pager.total_pages(11), 2);
        assert_eq!(pager.total_pages(95), 10);
    }
}
