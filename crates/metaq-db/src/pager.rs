use bson::Document;

/// Clamped offset/limit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl Window {
    /// Limit used when only an offset was requested. Renders as MySQL's
    /// "all remaining rows" idiom.
    pub const UNBOUNDED: u64 = u64::MAX;

    /// `None` when neither bound was requested. Otherwise the offset is raised
    /// to at least 0 and the limit to at least 1. A missing offset is 0 and a
    /// missing limit is [`Window::UNBOUNDED`].
    pub fn clamp(offset: Option<i64>, limit: Option<i64>) -> Option<Self> {
        if offset.is_none() && limit.is_none() {
            return None;
        }
        Some(Self {
            offset: offset.unwrap_or(0).max(0) as u64,
            limit: limit.map_or(Self::UNBOUNDED, |l| l.max(1) as u64),
        })
    }

    pub fn is_bounded(&self) -> bool {
        self.limit != Self::UNBOUNDED
    }
}

/// What the storage collaborator handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Rows(Vec<Document>),
    Count(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PagedResult {
    Rows(Page),
    Count(u64),
}

impl PagedResult {
    pub fn rows(&self) -> Option<&[Document]> {
        match self {
            PagedResult::Rows(page) => Some(&page.rows),
            PagedResult::Count(_) => None,
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            PagedResult::Count(n) => Some(*n),
            PagedResult::Rows(_) => None,
        }
    }

    pub fn page(&self) -> Option<&Page> {
        match self {
            PagedResult::Rows(page) => Some(page),
            PagedResult::Count(_) => None,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Document>> {
        match self {
            PagedResult::Rows(page) => Some(page.rows),
            PagedResult::Count(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub rows: Vec<Document>,
    /// Absent when the query was not paginated.
    pub info: Option<PageInfo>,
}

impl Page {
    /// Attach the total number of matching rows; no-op without page info.
    pub fn with_total(mut self, total: u64) -> Self {
        if let Some(info) = self.info.as_mut() {
            info.total_available = Some(total);
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub offset: u64,
    pub page_size: u64,
    pub returned_count: usize,
    pub total_available: Option<u64>,
}

impl PageInfo {
    /// 1-based page number containing `offset`.
    pub fn page(&self) -> u64 {
        self.offset / self.page_size + 1
    }

    pub fn total_pages(&self) -> Option<u64> {
        self.total_available
            .map(|total| total.div_ceil(self.page_size))
    }

    /// Whether rows remain past this page. Unknown without a total.
    pub fn has_more(&self) -> Option<bool> {
        self.total_available
            .map(|total| self.offset + (self.returned_count as u64) < total)
    }
}

/// Label fetched rows with pagination metadata.
///
/// Slicing already happened in storage (the compiled query carries the
/// limit clause); this only records what was asked for and what came back.
/// A count passes through as a scalar.
pub fn paginate(
    fetched: Fetched,
    requested_offset: Option<i64>,
    requested_page_size: Option<i64>,
) -> PagedResult {
    let rows = match fetched {
        Fetched::Count(n) => return PagedResult::Count(n),
        Fetched::Rows(rows) => rows,
    };

    // an offset alone slices but does not define pages
    let info = Window::clamp(requested_offset, requested_page_size)
        .filter(Window::is_bounded)
        .map(|window| PageInfo {
            offset: window.offset,
            page_size: window.limit,
            returned_count: rows.len(),
            total_available: None,
        });

    PagedResult::Rows(Page { rows, info })
}
