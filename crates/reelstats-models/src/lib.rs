pub mod canon;
pub mod dataset;
pub mod movie;
pub mod parse;
pub mod profile;

pub use canon::{CanonComparison, CanonList, CanonMovie, CanonOverallStats, CanonProgress, MatchStrategy};
pub use dataset::MovieDataset;
pub use movie::{Era, Movie};
pub use parse::{CsvType, ErrorKind, ParseError, ParseResult, ValidationError};
pub use profile::{FavoriteFilm, UserProfile, MAX_FAVORITE_FILMS};
