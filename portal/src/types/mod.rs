pub mod entity;
pub mod learner;
pub mod page;
pub mod table;

pub use entity::TimeBoundedEntity;
pub use learner::RegisteredLearner;
pub use page::{PageOptions, PageResult, SortKey, DESCENDING_MARKER};
pub use table::{SortBy, TableState};
