//! Structural perception of the game page.
//!
//! Turns a page (URL plus DOM snapshot) into [`PageFacts`]: game mode, game id, the
//! round counter and three layout probes. Reads never fail; see [`reader`].

pub mod errors;
pub mod model;
pub mod page;
pub mod reader;
pub mod selectors;

pub use errors::PerceiverError;
pub use model::PageFacts;
pub use page::ObservedPage;
pub use reader::{read_document, PageReader};
pub use selectors::{PageSelectors, SelectorSet};
