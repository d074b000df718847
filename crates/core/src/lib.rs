pub mod config;
pub mod error;
pub mod sink;
pub mod types;
pub mod vocabulary;

pub use crate::config::AppConfig;
pub use error::{FunnelError, FunnelResult};
pub use sink::{DiagnosticsSink, NullSink, RecordingSink, TracingSink};
pub use types::{Row, RowTable};
pub use vocabulary::ActionVocabulary;
