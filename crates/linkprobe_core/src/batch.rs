/// Splits a submitted batch into URL candidates, one per non-blank line.
///
/// Lines are trimmed and kept in submission order. Duplicates are preserved:
/// every occurrence is checked and reported on its own.
pub fn parse_batch(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
