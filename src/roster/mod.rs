//! Roster assembly: fetch a class's assignments and students, grade each
//! student, and hold the result for display.

pub mod builder;
pub mod page;
pub mod types;
pub mod view;

pub use builder::{RosterBuilder, await_all};
pub use page::{Page, PageSize, SortKey, paginate, sort_rows};
pub use types::{ClassInfo, FetchFailure, Roster, RosterRow, UNKNOWN};
pub use view::RosterView;
