//! Background executor for HSC runs.
//!
//! A runner is spawned by an explicit start request and walks the saved
//! search page by page. Every page re-reads the run row, so a stop request
//! takes effect at the next page boundary. Each start bumps the row's
//! `run_epoch`; a runner holding an older epoch exits instead of writing.

use std::time::Duration;

use dailink_config::HscConfig;
use dailink_database::{
    HscItemStatus, HscRun, HscRunError, HscRunRepository, HscStage, NewHscRunItem,
};
use dailink_unipile::{SearchCategory, SearchItem, SearchQuery, UnipileClient};
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct HscRunner {
    runs: HscRunRepository,
    unipile: UnipileClient,
    config: HscConfig,
}

/// How a runner loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Stopped by a request or by an upstream failure.
    Halted,
}

impl HscRunner {
    pub fn new(runs: HscRunRepository, unipile: UnipileClient, config: HscConfig) -> Self {
        Self {
            runs,
            unipile,
            config,
        }
    }

    pub fn spawn(self, run_id: i64, epoch: i64) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(err) = self.run(run_id, epoch).await {
                error!(run_id, error = %err, "hsc runner aborted");
                if let Err(fail_err) = self.runs.fail(run_id, epoch, &err.to_string()).await {
                    error!(run_id, error = %fail_err, "failed to record hsc runner error");
                }
            }
        })
    }

    pub async fn run(&self, run_id: i64, epoch: i64) -> Result<RunOutcome, HscRunError> {
        let max_pages = i64::from(self.config.max_pages.max(1));

        loop {
            let run = self.runs.find_by_id(run_id).await?;
            if run.stage != HscStage::Running {
                debug!(run = %run.public_id, stage = %run.stage, "hsc run no longer running");
                return Ok(RunOutcome::Halted);
            }
            if run.run_epoch != epoch {
                debug!(run = %run.public_id, epoch, current = run.run_epoch, "hsc run restarted elsewhere");
                return Ok(RunOutcome::Halted);
            }

            let page = match self
                .unipile
                .search(
                    &run.account_id,
                    &search_query(&run),
                    run.cursor.as_deref(),
                    Some(self.config.page_size),
                )
                .await
            {
                Ok(page) => page,
                Err(err) => {
                    warn!(run = %run.public_id, error = %err, "hsc search failed, stopping run");
                    self.runs.fail(run.id, epoch, &err.to_string()).await?;
                    return Ok(RunOutcome::Halted);
                }
            };

            let mut analyzed = 0usize;
            for item in &page.items {
                if self.runs.has_item(run.id, &item.id).await? {
                    continue;
                }
                let new_item = self.analyze(&run, item).await;
                if self.runs.insert_item(run.id, &new_item).await? {
                    analyzed += 1;
                }
            }

            let pages = run.pages_processed + 1;
            let progress = (pages * 100 / max_pages).min(99);
            if !self
                .runs
                .record_page(run.id, epoch, page.cursor.as_deref(), pages, progress)
                .await?
            {
                return Ok(RunOutcome::Halted);
            }
            info!(run = %run.public_id, page = pages, analyzed, progress, "hsc page processed");

            if page.cursor.is_none() || pages >= max_pages {
                if !self.runs.complete(run.id, epoch).await? {
                    return Ok(RunOutcome::Halted);
                }
                info!(run = %run.public_id, pages, "hsc run completed");
                return Ok(RunOutcome::Completed);
            }

            tokio::time::sleep(Duration::from_millis(self.config.page_delay_ms)).await;
        }
    }

    async fn analyze(&self, run: &HscRun, item: &SearchItem) -> NewHscRunItem {
        let fallback_name = item.name.clone().unwrap_or_default();
        match self
            .unipile
            .get_profile(&run.account_id, item.profile_identifier())
            .await
        {
            Ok(profile) => {
                let headline = profile.headline.clone().or_else(|| item.headline.clone());
                let name = profile.display_name();
                NewHscRunItem {
                    linkedin_id: item.id.clone(),
                    public_identifier: profile
                        .public_identifier
                        .clone()
                        .or_else(|| item.public_identifier.clone()),
                    name: if name.is_empty() { fallback_name } else { name },
                    is_champion: is_champion(headline.as_deref(), &run.champion_keywords),
                    headline,
                    status: HscItemStatus::Analyzed,
                    error: None,
                }
            }
            Err(err) => {
                debug!(run = %run.public_id, item = %item.id, error = %err, "profile fetch failed");
                NewHscRunItem {
                    linkedin_id: item.id.clone(),
                    public_identifier: item.public_identifier.clone(),
                    name: fallback_name,
                    headline: item.headline.clone(),
                    is_champion: false,
                    status: HscItemStatus::Error,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

/// True when any keyword occurs in the headline, ignoring case.
pub fn is_champion(headline: Option<&str>, keywords: &[String]) -> bool {
    let Some(headline) = headline else {
        return false;
    };
    let headline = headline.to_lowercase();
    keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .any(|keyword| !keyword.is_empty() && headline.contains(&keyword))
}

pub fn search_query(run: &HscRun) -> SearchQuery {
    match run.search_url.as_deref() {
        Some(url) if !url.trim().is_empty() => SearchQuery::Url(url.trim().to_string()),
        _ => SearchQuery::Classic {
            category: SearchCategory::People,
            keywords: run.keywords.clone(),
            filters: run.filters.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn champion_match_ignores_case() {
        let keywords = vec!["cfo".to_string(), "Head of Finance".to_string()];
        assert!(is_champion(Some("Group CFO at Acme"), &keywords));
        assert!(is_champion(Some("head of finance, EMEA"), &keywords));
        assert!(!is_champion(Some("Software Engineer"), &keywords));
        assert!(!is_champion(None, &keywords));
    }

    #[test]
    fn blank_keywords_never_match() {
        assert!(!is_champion(Some("anything"), &["  ".to_string()]));
        assert!(!is_champion(Some("anything"), &[]));
    }
}
