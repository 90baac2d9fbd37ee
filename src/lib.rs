mod error;
pub mod language;
pub mod provider;
pub mod sweep;
pub mod table;

// re-export
pub use error::{Error, Result};
pub use language::{LanguageTable, LanguageTarget, LANGUAGES};
pub use provider::{DeeplProvider, ProviderError, Translate};
pub use sweep::{
    JobReport, LanguageReport, Progress, ProgressState, TranslationJob, TranslationSweep,
    DEFAULT_DELAY,
};
pub use table::{Cell, Column, ColumnKind, Number, Table};
