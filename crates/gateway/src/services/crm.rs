use dailink_database::{
    HscItemStatus, HscRun, HscRunItem, InsertSummary, NewCrmCompany, NewCrmProfile, User,
};
use tracing::info;

use crate::{ApiError, AppState};

const PROFILE_URL_BASE: &str = "https://www.linkedin.com/in/";

/// Trims identifiers and derives `profile_url` from the public identifier
/// when the caller left it out.
pub fn normalize_profile(profile: NewCrmProfile) -> NewCrmProfile {
    let public_identifier = non_blank(profile.public_identifier);
    let profile_url = non_blank(profile.profile_url).or_else(|| {
        public_identifier
            .as_deref()
            .map(|identifier| format!("{PROFILE_URL_BASE}{identifier}/"))
    });

    NewCrmProfile {
        linkedin_id: profile.linkedin_id.trim().to_string(),
        name: profile.name.trim().to_string(),
        headline: non_blank(profile.headline),
        public_identifier,
        profile_url,
    }
}

pub fn normalize_company(company: NewCrmCompany) -> NewCrmCompany {
    NewCrmCompany {
        linkedin_id: company.linkedin_id.trim().to_string(),
        name: company.name.trim().to_string(),
        industry: non_blank(company.industry),
        company_url: non_blank(company.company_url),
    }
}

pub fn profile_from_run_item(item: &HscRunItem) -> NewCrmProfile {
    normalize_profile(NewCrmProfile {
        linkedin_id: item.linkedin_id.clone(),
        public_identifier: item.public_identifier.clone(),
        name: item.name.clone(),
        headline: item.headline.clone(),
        profile_url: None,
    })
}

/// Copies the analyzed items of `run` into one of the user's people lists.
pub async fn export_run_items(
    state: &AppState,
    user: &User,
    run: &HscRun,
    list_id: &str,
    champions_only: bool,
) -> Result<InsertSummary, ApiError> {
    let list = state.crm().find_list(user.id, list_id).await?;
    let profiles: Vec<NewCrmProfile> = state
        .hsc_runs()
        .items(run.id, champions_only)
        .await?
        .iter()
        .filter(|item| item.status == HscItemStatus::Analyzed)
        .map(profile_from_run_item)
        .collect();

    if profiles.is_empty() {
        return Ok(InsertSummary::default());
    }

    let summary = state.crm().add_profiles(&list, profiles).await?;
    info!(
        run = %run.public_id,
        list = %list.public_id,
        inserted = summary.inserted,
        skipped = summary.skipped,
        "hsc items exported"
    );
    Ok(summary)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_url_is_derived_from_public_identifier() {
        let profile = normalize_profile(NewCrmProfile {
            linkedin_id: " ACoAAB ".into(),
            public_identifier: Some("jane-doe".into()),
            name: " Jane Doe ".into(),
            headline: Some("  ".into()),
            profile_url: None,
        });

        assert_eq!(profile.linkedin_id, "ACoAAB");
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.headline, None);
        assert_eq!(
            profile.profile_url.as_deref(),
            Some("https://www.linkedin.com/in/jane-doe/")
        );
    }

    #[test]
    fn explicit_profile_url_is_kept() {
        let profile = normalize_profile(NewCrmProfile {
            linkedin_id: "x".into(),
            public_identifier: Some("jane".into()),
            name: "Jane".into(),
            headline: None,
            profile_url: Some("https://example.com/jane".into()),
        });
        assert_eq!(profile.profile_url.as_deref(), Some("https://example.com/jane"));
    }
}
