use reelstats_models::{CanonList, CanonMovie};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::CanonListError;

const TITLE_PREFIX: &str = "List Title:";
const SHORT_TITLE_PREFIX: &str = "List Short Version:";
const URL_PREFIX: &str = "List URL:";

/// Parse a canon list written as markdown:
///
/// ```text
/// List Title: IMDb Top 250
/// List Short Version: IMDb 250
/// List URL: https://letterboxd.com/dave/list/imdb-top-250/
///
/// - The Shawshank Redemption (1994)
/// - The Godfather (1972)
/// ```
///
/// Lines that don't look like `- Title (YYYY)` are ignored.
pub fn parse_canon_markdown(id: &str, content: &str) -> Result<CanonList, CanonListError> {
    let lines: Vec<&str> = content.lines().map(str::trim).collect();
    let metadata = |prefix: &str| {
        lines
            .iter()
            .find_map(|line| line.strip_prefix(prefix))
            .map(|value| value.trim().to_string())
    };

    let (Some(title), Some(short_title), Some(source_url)) =
        (metadata(TITLE_PREFIX), metadata(SHORT_TITLE_PREFIX), metadata(URL_PREFIX))
    else {
        return Err(CanonListError::MissingMetadata(id.to_string()));
    };

    let movies: Vec<CanonMovie> = lines.iter().filter_map(|line| parse_movie_line(line)).collect();
    if movies.is_empty() {
        return Err(CanonListError::NoMovies(id.to_string()));
    }

    debug!(list = %id, movies = movies.len(), "Parsed canon list");
    Ok(CanonList {
        id: id.to_string(),
        title,
        short_title,
        source_url,
        movies,
    })
}

/// `- Title (YYYY)`
fn parse_movie_line(line: &str) -> Option<CanonMovie> {
    let rest = line.strip_prefix("- ")?;
    let rest = rest.strip_suffix(')')?;
    let (title, year) = rest.rsplit_once(" (")?;
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    Some(CanonMovie::new(title, year.parse().ok()?))
}

/// List id from a file stem: lowercase snake case, `list_` prefix when it
/// would start with a digit
pub fn list_id_from_stem(stem: &str) -> String {
    let mut id = String::with_capacity(stem.len());
    let mut pending_sep = false;
    for c in stem.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !id.is_empty() {
                id.push('_');
            }
            pending_sep = false;
            id.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_sep = true;
        }
    }
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert_str(0, "list_");
    }
    id
}

pub async fn load_canon_file(path: &Path) -> Result<CanonList, CanonListError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CanonListError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_canon_markdown(&list_id_from_stem(&stem), &content)
}

/// Load every `*.md` list in a directory, sorted by id. Files that fail to
/// parse are logged and skipped.
pub async fn load_canon_dir(dir: &Path) -> Result<Vec<CanonList>, CanonListError> {
    let io_err = |source| CanonListError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;

    let mut lists = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        match load_canon_file(&path).await {
            Ok(list) => lists.push(list),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping canon list"),
        }
    }

    lists.sort_by(|a, b| a.id.cmp(&b.id));
    info!(dir = %dir.display(), lists = lists.len(), "Loaded canon lists");
    Ok(lists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const IMDB_TOP: &str = "List Title: IMDb Top 250 Narrative Feature Films
List Short Version: IMDb Top 250
List URL: https://letterboxd.com/dave/list/imdb-top-250/

- The Shawshank Redemption (1994)
- The Godfather (1972)
- Se7en (1995)
- Not a movie line
- Spirited Away (2001)
";

    #[test]
    fn test_parse_canon_markdown() {
        let list = parse_canon_markdown("imdb_top_250", IMDB_TOP).unwrap();

        assert_eq!(list.title, "IMDb Top 250 Narrative Feature Films");
        assert_eq!(list.short_title, "IMDb Top 250");
        assert_eq!(list.source_url, "https://letterboxd.com/dave/list/imdb-top-250/");
        assert_eq!(list.total_movies(), 4);
        assert_eq!(list.movies[0], CanonMovie::new("The Shawshank Redemption", 1994));
        assert_eq!(list.movies[2], CanonMovie::new("Se7en", 1995));
    }

    #[test]
    fn test_title_with_parentheses() {
        assert_eq!(
            parse_movie_line("- Birdman or (The Unexpected Virtue of Ignorance) (2014)"),
            Some(CanonMovie::new("Birdman or (The Unexpected Virtue of Ignorance)", 2014))
        );
        assert_eq!(parse_movie_line("- Untitled (TBA)"), None);
    }

    #[test]
    fn test_missing_metadata_rejected() {
        let result = parse_canon_markdown("broken", "- The Godfather (1972)\n");
        assert!(matches!(result, Err(CanonListError::MissingMetadata(_))));
    }

    #[test]
    fn test_no_movies_rejected() {
        let content = "List Title: Empty\nList Short Version: Empty\nList URL: https://example.com\n";
        assert!(matches!(parse_canon_markdown("empty", content), Err(CanonListError::NoMovies(_))));
    }

    #[test]
    fn test_list_id_from_stem() {
        assert_eq!(list_id_from_stem("IMDb Top 250"), "imdb_top_250");
        assert_eq!(list_id_from_stem("sight-and-sound (2022)"), "sight_and_sound_2022");
        assert_eq!(list_id_from_stem("1001 Movies"), "list_1001_movies");
    }

    #[tokio::test]
    async fn test_load_canon_dir_skips_bad_files() {
        let dir = TempDir::new().unwrap();
        let mut good = std::fs::File::create(dir.path().join("IMDb Top 250.md")).unwrap();
        write!(good, "{}", IMDB_TOP).unwrap();
        std::fs::write(dir.path().join("broken.md"), "nothing here").unwrap();
        std::fs::write(dir.path().join("notes.txt"), IMDB_TOP).unwrap();

        let lists = load_canon_dir(dir.path()).await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, "imdb_top_250");
    }
}
