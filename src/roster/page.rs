//! Sorting and pagination of roster rows for display.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Serialize;

use crate::roster::types::RosterRow;

/// Row ordering for display. The aggregator never depends on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Order in which the API listed the students.
    #[default]
    Api,
    /// By the number at the end of the student id (`U123` before `U1000`).
    StudentId,
    /// By student name, case-insensitively.
    Name,
    /// Highest final grade first; `N/A` last.
    Grade,
}

/// Trailing run of digits in `id`, e.g. `42` for `"U00042"`.
fn numeric_suffix(id: &str) -> Option<u64> {
    let digits = id.len() - id.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    id[id.len() - digits..].parse().ok()
}

fn by_student_id(a: &RosterRow, b: &RosterRow) -> Ordering {
    match (numeric_suffix(&a.student_id), numeric_suffix(&b.student_id)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.student_id.cmp(&b.student_id))
}

/// Stable sort, so equal keys keep API order.
pub fn sort_rows(rows: &mut [RosterRow], key: SortKey) {
    match key {
        SortKey::Api => {}
        SortKey::StudentId => rows.sort_by(by_student_id),
        SortKey::Name => rows.sort_by(|a, b| {
            a.student_name
                .to_lowercase()
                .cmp(&b.student_name.to_lowercase())
                .then_with(|| by_student_id(a, b))
        }),
        SortKey::Grade => rows.sort_by(|a, b| {
            match (a.final_grade.value(), b.final_grade.value()) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }),
    }
}

/// Rows per page. Only the sizes the roster table offers are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSize(usize);

impl PageSize {
    pub const OPTIONS: [usize; 4] = [9, 25, 50, 100];

    pub fn new(size: usize) -> Option<Self> {
        Self::OPTIONS.contains(&size).then_some(Self(size))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(Self::OPTIONS[0])
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let size: usize = s
            .trim()
            .parse()
            .map_err(|e| format!("'{s}' is not a page size: {e}"))?;
        Self::new(size).ok_or_else(|| format!("page size must be one of {:?}", Self::OPTIONS))
    }
}

/// One page of rows. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<'a> {
    pub page: usize,
    pub page_size: PageSize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub rows: &'a [RosterRow],
}

/// Slices out page `page` (1-based, clamped into range).
///
/// An empty roster still has one (empty) page.
pub fn paginate(rows: &[RosterRow], page_size: PageSize, page: usize) -> Page<'_> {
    let size = page_size.get();
    let total_pages = rows.len().div_ceil(size).max(1);
    let page = page.clamp(1, total_pages);
    let start = ((page - 1) * size).min(rows.len());
    let end = (start + size).min(rows.len());

    Page {
        page,
        page_size,
        total_pages,
        total_rows: rows.len(),
        rows: &rows[start..end],
    }
}
