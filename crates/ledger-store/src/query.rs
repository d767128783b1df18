use thiserror::Error;

/// Default page size for listings.
pub const DEFAULT_LIMIT: usize = 100;

/// Error returned when a sort expression cannot be parsed.
#[derive(Debug, Clone, Error)]
#[error("Invalid sort expression '{0}', expected '<field>,<asc|desc>'")]
pub struct ParseSortError(pub String);

/// Whitelisted fields a listing may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Name,
    StockAvailable,
    StockReserved,
}

impl SortField {
    /// Returns the database column backing this field.
    pub fn as_column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::StockAvailable => "stock_available",
            SortField::StockReserved => "stock_reserved",
        }
    }

    /// Returns the wire name of this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::StockAvailable => "stockAvailable",
            SortField::StockReserved => "stockReserved",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(SortField::Id),
            "name" => Some(SortField::Name),
            "stockAvailable" | "stock_available" => Some(SortField::StockAvailable),
            "stockReserved" | "stock_reserved" => Some(SortField::StockReserved),
            _ => None,
        }
    }
}

/// Sort order for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns the SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// A parsed sort clause, e.g. `"stockAvailable,desc"`.
///
/// A bare field name sorts ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    /// Creates a sort clause.
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

impl std::str::FromStr for Sort {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(',') {
            Some((field, direction)) => (
                SortField::parse(field.trim()),
                SortDirection::parse(direction.trim()),
            ),
            None => (SortField::parse(s.trim()), Some(SortDirection::Asc)),
        };
        match (field, direction) {
            (Some(field), Some(direction)) => Ok(Sort { field, direction }),
            _ => Err(ParseSortError(s.to_string())),
        }
    }
}

impl std::fmt::Display for Sort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{},{}", self.field.as_str(), direction)
    }
}

/// Paging and ordering for item listings.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Maximum number of entries to return.
    pub limit: usize,

    /// Number of entries to skip.
    pub offset: usize,

    /// Ordering of the listing.
    pub sort: Sort,
}

impl ListQuery {
    /// Creates a query with the default page (first 100 entries by id).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the number of entries to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the ordering.
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort: Sort::default(),
        }
    }
}
