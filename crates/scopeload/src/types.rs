//! Shared result types.

use crate::eventual::Eventual;

/// Outcome of one load: `Ok(url)` when the resource attached, `Err(url)`
/// when the inserter reported failure or the deadline elapsed first. Both
/// sides carry the canonical URL.
pub type LoadResult = Result<String, String>;

/// The eventual outcome tracked for one (scope, canonical URL) pair.
pub type LoadTask = Eventual<LoadResult>;

/// Split settled batch results into (loaded, failed) URL lists, keeping order
/// within each list.
pub fn partition_results(results: &[LoadResult]) -> (Vec<&str>, Vec<&str>) {
    let mut loaded = Vec::new();
    let mut failed = Vec::new();
    for result in results {
        match result {
            Ok(url) => loaded.push(url.as_str()),
            Err(url) => failed.push(url.as_str()),
        }
    }
    (loaded, failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_results() {
        let results = vec![
            Ok("a.css".to_string()),
            Err("b.css".to_string()),
            Ok("c.css".to_string()),
        ];
        let (loaded, failed) = partition_results(&results);
        assert_eq!(loaded, vec!["a.css", "c.css"]);
        assert_eq!(failed, vec!["b.css"]);
    }
}
