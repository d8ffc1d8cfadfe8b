pub mod detect;
pub mod export;
pub mod parser;
pub mod profile;
pub mod values;

pub use detect::{detect_csv_type, detect_export_kind, read_headers, validate_csv, ExportKind};
pub use export::{MemoryExport, PathExport};
pub use parser::{parse_csv_content, parse_letterboxd_csv, parse_letterboxd_csv_with_timeout, DEFAULT_READ_TIMEOUT};
pub use profile::parse_profile_csv;
