use scopeload::{
    partition_results, HttpInserter, HttpInserterConfig, LoadResult, LoaderConfig,
    ResourceLoader, Scope,
};
use serde::Serialize;
use tracing::debug;

use super::args::{Cli, Command, FetchArgs};
use crate::exit_codes;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Fetch(args) => fetch(args).await,
        Command::Config => print_config(),
    }
}

#[derive(Debug, Serialize)]
struct ScopeReport {
    scope: String,
    results: Vec<UrlReport>,
}

#[derive(Debug, Serialize)]
struct UrlReport {
    url: String,
    loaded: bool,
}

impl From<LoadResult> for UrlReport {
    fn from(result: LoadResult) -> Self {
        match result {
            Ok(url) => Self { url, loaded: true },
            Err(url) => Self { url, loaded: false },
        }
    }
}

fn loader_config(args: &FetchArgs) -> LoaderConfig {
    let mut config = LoaderConfig::from_env();
    if let Some(ms) = args.max_load_time_ms {
        config.max_load_time_ms = ms;
    }
    if args.referrer_policy.is_some() {
        config.referrer_policy = args.referrer_policy;
    }
    if args.cross_origin {
        config.cross_origin = true;
    }
    if let Some(suffix) = &args.cache_suffix {
        config.cache_suffix = Some(suffix.clone());
    }
    config
}

fn http_config(args: &FetchArgs) -> HttpInserterConfig {
    let mut config = HttpInserterConfig::from_env();
    if let Some(base_url) = &args.base_url {
        config.base_url = Some(base_url.clone());
    }
    if let Some(referrer) = &args.referrer {
        config.referrer = Some(referrer.clone());
    }
    config
}

/// Scope per distinct name, in first-seen order.
fn scopes_for(names: &[String]) -> Vec<(String, Scope)> {
    if names.is_empty() {
        return vec![("document".to_string(), Scope::DOCUMENT)];
    }
    let mut scopes: Vec<(String, Scope)> = Vec::new();
    for name in names {
        if !scopes.iter().any(|(seen, _)| seen == name) {
            scopes.push((name.clone(), Scope::new()));
        }
    }
    scopes
}

async fn fetch(args: FetchArgs) -> anyhow::Result<i32> {
    let config = loader_config(&args);
    let inserter = match HttpInserter::new(http_config(&args)) {
        Ok(inserter) => inserter,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(e.exit_code());
        }
    };
    debug!(?config, "effective loader config");
    let loader = ResourceLoader::with_config(config, inserter);

    // Start every scope's batch before awaiting any of them.
    let batches: Vec<_> = scopes_for(&args.scopes)
        .into_iter()
        .map(|(name, scope)| (name, loader.load_all(&scope, args.urls.clone())))
        .collect();

    let mut reports = Vec::with_capacity(batches.len());
    let mut failures = 0;
    for (scope, batch) in batches {
        let results = batch.await;
        let (loaded, failed) = partition_results(&results);
        debug!(scope = %scope, loaded = loaded.len(), failed = failed.len(), "batch settled");
        failures += failed.len();

        let results = results.into_iter().map(UrlReport::from).collect();
        reports.push(ScopeReport { scope, results });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        let show_scope = reports.len() > 1;
        for report in &reports {
            for result in &report.results {
                let status = if result.loaded { "ok  " } else { "fail" };
                if show_scope {
                    println!("{} [{}] {}", status, report.scope, result.url);
                } else {
                    println!("{} {}", status, result.url);
                }
            }
        }
    }

    Ok(if failures == 0 {
        exit_codes::SUCCESS
    } else {
        exit_codes::LOAD_FAILED
    })
}

fn print_config() -> anyhow::Result<i32> {
    let mut http = HttpInserterConfig::from_env();
    if http.token.is_some() {
        http.token = Some("<redacted>".to_string());
    }

    let effective = serde_json::json!({
        "loader": LoaderConfig::from_env(),
        "http": http,
    });
    println!("{}", serde_json::to_string_pretty(&effective)?);
    Ok(exit_codes::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_default_to_document() {
        let scopes = scopes_for(&[]);
        assert_eq!(scopes.len(), 1);
        assert_eq!(scopes[0].1, Scope::DOCUMENT);
    }

    #[test]
    fn test_repeated_scope_names_share_a_scope() {
        let names = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let scopes = scopes_for(&names);
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[0].0, "a");
        assert_eq!(scopes[1].0, "b");
        assert_ne!(scopes[0].1, scopes[1].1);
    }

    #[test]
    fn test_url_report_from_result() {
        let ok = UrlReport::from(Ok("a.css".to_string()));
        assert!(ok.loaded);
        let failed = UrlReport::from(Err("b.css".to_string()));
        assert!(!failed.loaded);
        assert_eq!(failed.url, "b.css");
    }
}
