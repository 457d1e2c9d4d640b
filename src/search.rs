///Which student field a search targets. The list page submits these as the
///string codes `"0"` through `"7"`; anything unrecognised searches everything.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchFilter {
    Any,
    Id,
    FirstName,
    LastName,
    Course,
    Year,
    Gender,
    College,
}

impl SearchFilter {
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Self::Id,
            "2" => Self::FirstName,
            "3" => Self::LastName,
            "4" => Self::Course,
            "5" => Self::Year,
            "6" => Self::Gender,
            "7" => Self::College,
            _ => Self::Any,
        }
    }

    ///Human-readable name of the searched field, shown when nothing matched.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Any => "Student ID or NAME or COURSE or YEAR or GENDER",
            Self::Id => "Student ID",
            Self::FirstName => "Student FirstName",
            Self::LastName => "Student Last Name",
            Self::Course => "Student Course",
            Self::Year => "Student Year",
            Self::Gender => "Student Gender",
            Self::College => "Student College",
        }
    }

    ///The WHERE clause this filter dispatches to. Every arm matches the one
    ///`$1` bind holding the `%input%` pattern.
    pub const fn where_clause(self) -> &'static str {
        match self {
            Self::Any => {
                "id ILIKE $1 OR firstname ILIKE $1 OR lastname ILIKE $1 \
                 OR course_code ILIKE $1 OR CAST(year AS TEXT) ILIKE $1 OR gender ILIKE $1"
            }
            Self::Id => "id ILIKE $1",
            Self::FirstName => "firstname ILIKE $1",
            Self::LastName => "lastname ILIKE $1",
            Self::Course => "course_code ILIKE $1",
            Self::Year => "CAST(year AS TEXT) ILIKE $1",
            Self::Gender => "gender ILIKE $1",
            Self::College => {
                "course_code IN (SELECT code FROM courses WHERE college_code ILIKE $1)"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_dispatch_exactly() {
        assert_eq!(SearchFilter::from_code("0"), SearchFilter::Any);
        assert_eq!(SearchFilter::from_code("1"), SearchFilter::Id);
        assert_eq!(SearchFilter::from_code("2"), SearchFilter::FirstName);
        assert_eq!(SearchFilter::from_code("3"), SearchFilter::LastName);
        assert_eq!(SearchFilter::from_code("4"), SearchFilter::Course);
        assert_eq!(SearchFilter::from_code("5"), SearchFilter::Year);
        assert_eq!(SearchFilter::from_code("6"), SearchFilter::Gender);
        assert_eq!(SearchFilter::from_code("7"), SearchFilter::College);
    }

    #[test]
    fn unknown_codes_fall_back_to_any() {
        assert_eq!(SearchFilter::from_code(""), SearchFilter::Any);
        assert_eq!(SearchFilter::from_code("8"), SearchFilter::Any);
        assert_eq!(SearchFilter::from_code("id"), SearchFilter::Any);
    }

    #[test]
    fn every_clause_binds_the_single_pattern() {
        for filter in [
            SearchFilter::Any,
            SearchFilter::Id,
            SearchFilter::FirstName,
            SearchFilter::LastName,
            SearchFilter::Course,
            SearchFilter::Year,
            SearchFilter::Gender,
            SearchFilter::College,
        ] {
            assert!(filter.where_clause().contains("$1"), "{filter:?}");
            assert!(!filter.where_clause().contains("$2"), "{filter:?}");
        }
    }
}
