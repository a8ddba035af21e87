use crate::{
    elements::{DragTerms, MeanElements},
    time::UtcTimestamp,
};
use derive_more::Display;
use serde::Serialize;

pub type NoradId = u32;

/// Unstructured TLE
/// https://en.wikipedia.org/wiki/Two-line_element_set
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize)]
#[display(fmt = "{}\n{}\n{}", satellite_name, line1, line2)]
pub struct UnstructuredTle {
    pub satellite_name: String,
    pub line1: String,
    pub line2: String,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize)]
pub enum Classification {
    #[display(fmt = "U")]
    Unclassified,
    #[display(fmt = "C")]
    Classified,
    #[display(fmt = "S")]
    Secret,
}

/// A validated element set.
///
/// Immutable once parsed; a refresh replaces the whole record.
#[derive(Clone, PartialEq, Debug, Display, Serialize)]
#[display(fmt = "{{name: {}, norad: {}, epoch: {}}}", name, norad_id, epoch)]
pub struct TleRecord {
    pub name: String,
    pub norad_id: NoradId,
    pub classification: Classification,
    pub international_designator: String,
    pub epoch: UtcTimestamp,
    pub drag: DragTerms,
    pub elements: MeanElements,
    pub element_set_number: u32,
    pub revolution_number: u32,

    /// The lines the record was parsed from
    pub raw: UnstructuredTle,
}
