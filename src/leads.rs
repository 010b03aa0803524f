//! Lead intake: form submission, enrichment, client insert.

use crate::enrichment::{CompanyProfile, CompanyResearch, ResearchRequest};
use crate::error::{Error, Result};
use crate::model::{AiExperience, Client, NewClient, Urgency};
use crate::store::TrainingStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_SECTOR: &str = "tecnologia";
pub const DEFAULT_TEAM_SIZE: u32 = 10;
pub const DEFAULT_OBJECTIVE: &str = "Melhorar processos de vendas";
pub const DEFAULT_BUDGET_RANGE: &str = "10k-20k";

/// What the lead form submits
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadForm {
    #[serde(default)]
    pub company_name: String,

    #[serde(default)]
    pub contact_name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub company_website: Option<String>,
}

impl LeadForm {
    fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("company name", &self.company_name),
            ("contact name", &self.contact_name),
            ("email", &self.email),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();

        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        if !self.email.contains('@') {
            return Err(Error::Validation(format!("invalid email: {}", self.email)));
        }

        Ok(())
    }
}

/// Build the client row from the form and whatever enrichment produced.
///
/// Every attribute falls back to its default on its own, so a partial
/// profile still fills what it can.
pub fn client_from_profile(form: &LeadForm, profile: Option<&CompanyProfile>) -> NewClient {
    NewClient {
        name: form.contact_name.trim().to_string(),
        company: form.company_name.trim().to_string(),
        email: form.email.trim().to_string(),
        sector: non_blank(profile, |p| p.sector.as_ref())
            .unwrap_or_else(|| DEFAULT_SECTOR.to_string()),
        team_size: profile
            .and_then(|p| p.team_size)
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_TEAM_SIZE),
        objective: non_blank(profile, |p| p.objective.as_ref())
            .unwrap_or_else(|| DEFAULT_OBJECTIVE.to_string()),
        budget_range: non_blank(profile, |p| p.budget_range.as_ref())
            .unwrap_or_else(|| DEFAULT_BUDGET_RANGE.to_string()),
        urgency: non_blank(profile, |p| p.urgency.as_ref())
            .and_then(|u| Urgency::parse_lenient(&u))
            .unwrap_or_default(),
        ai_experience: non_blank(profile, |p| p.ai_experience.as_ref())
            .and_then(|x| AiExperience::parse_lenient(&x))
            .unwrap_or_default(),
        insights: non_blank(profile, |p| p.insights.as_ref()),
    }
}

fn non_blank(
    profile: Option<&CompanyProfile>,
    pick: impl Fn(&CompanyProfile) -> Option<&String>,
) -> Option<String> {
    profile
        .and_then(pick)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Turns lead form submissions into enriched client rows
pub struct LeadIntake {
    store: Arc<dyn TrainingStore>,
    research: Arc<dyn CompanyResearch>,
}

impl LeadIntake {
    pub fn new(store: Arc<dyn TrainingStore>, research: Arc<dyn CompanyResearch>) -> Self {
        Self { store, research }
    }

    pub async fn submit(&self, form: LeadForm) -> Result<Client> {
        form.validate()?;

        let request = ResearchRequest {
            company_name: form.company_name.trim().to_string(),
            company_website: form.company_website.clone(),
        };

        let profile = match self.research.research(&request).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(
                    "Enrichment failed for {}, using defaults: {}",
                    request.company_name, e
                );
                None
            }
        };

        let client = self
            .store
            .insert_client(client_from_profile(&form, profile.as_ref()))
            .await?;

        info!(
            "Lead {} ({}) saved as client {}",
            client.name, client.company, client.id
        );
        Ok(client)
    }
}
