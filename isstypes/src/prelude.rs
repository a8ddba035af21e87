pub use crate::elements::{DragTerms, MeanElements};
pub use crate::time::UtcTimestamp;
pub use crate::tle::{Classification, NoradId, TleRecord, UnstructuredTle};
