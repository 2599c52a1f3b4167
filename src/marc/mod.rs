//! MARC bibliographic text handling
//!
//! The catalog stores raw MARC field text (e.g. `$a Title / $d Author`)
//! as exported from the departmental holdings spreadsheet. This module
//! splits that text into subfields and normalizes identifiers.

pub mod subfields;

pub use subfields::{clean_isbn, clean_issn, first_subfield, parse_marc_subfields, split_multi};
