//! Release synthesis: names, result documents, download references and
//! their Newznab XML form.

mod document;
mod download;
mod title;
pub mod xml;

pub use document::{
    categories, ContentKind, DocumentSynthesizer, EntryAttributes, ReleaseCandidate,
    ResultDocument, ResultEntry, SUBTITLE_SIZE_BONUS,
};
pub use download::{DownloadReference, DownloadReferenceError};
pub use title::{
    release_group, sanitize, Numbering, ReleaseTitle, GROUP_CONFIDENT, GROUP_NO_MATCH,
    GROUP_UNCERTAIN,
};
