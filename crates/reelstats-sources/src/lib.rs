pub mod canon;
pub mod error;
pub mod letterboxd;
pub mod traits;

pub use canon::{load_canon_dir, load_canon_file, parse_canon_markdown};
pub use error::{CanonListError, SourceError};
pub use letterboxd::{
    detect_csv_type, detect_export_kind, parse_csv_content, parse_letterboxd_csv, parse_letterboxd_csv_with_timeout,
    parse_profile_csv, validate_csv, ExportKind, MemoryExport, PathExport,
};
pub use traits::{read_with_timeout, ExportFile};
