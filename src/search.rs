// src/search.rs
//! Compound predicate search over the job catalog.

use anyhow::Result;
use chrono::{Duration, Utc};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::jobs::JOB_WITH_PROVIDER_SELECT;
use crate::models::{JobWithProvider, JobWithProviderRow};

/// All fields optional; present fields are AND-combined. `skills` and
/// `filters` are comma-separated lists as they arrive on the query string.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchCriteria {
    pub skills: Option<String>,
    pub experience: Option<i64>,
    pub location: Option<String>,
    pub min_ctc: Option<f64>,
    pub max_ctc: Option<f64>,
    pub notice_period: Option<String>,
    pub filters: Option<String>,
    pub posted_by: Option<i64>,
}

/// Execute a search. Scalar predicates run in SQL; the skill-term test is
/// applied in exactly one place, post-fetch, so SQL and client layers can
/// never disagree. Without `posted_by` only live postings are returned;
/// with it, a provider sees all of their postings. Newest first.
pub async fn search_jobs(
    pool: &SqlitePool,
    criteria: &SearchCriteria,
) -> Result<Vec<JobWithProvider>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(JOB_WITH_PROVIDER_SELECT);
    qb.push(" WHERE 1 = 1");

    if criteria.posted_by.is_none() {
        qb.push(" AND j.available = TRUE");
    }
    if let Some(posted_by) = criteria.posted_by {
        qb.push(" AND j.posted_by = ").push_bind(posted_by);
    }
    if let Some(experience) = criteria.experience {
        qb.push(" AND j.experience_required <= ").push_bind(experience);
    }
    if let Some(location) = &criteria.location {
        qb.push(" AND j.location LIKE ")
            .push_bind(format!("%{location}%"));
    }
    // Both CTC bounds read against the single max_ctc column, matching the
    // reference filter.
    if let Some(min_ctc) = criteria.min_ctc {
        qb.push(" AND j.max_ctc >= ").push_bind(min_ctc);
    }
    if let Some(max_ctc) = criteria.max_ctc {
        qb.push(" AND j.max_ctc <= ").push_bind(max_ctc);
    }
    if let Some(notice) = &criteria.notice_period {
        qb.push(" AND j.notice_period LIKE ")
            .push_bind(format!("%{notice}%"));
    }
    if let Some(filters) = &criteria.filters {
        let flags: Vec<&str> = filters.split(',').map(str::trim).collect();
        if flags.contains(&"viewed") {
            qb.push(" AND j.viewed = TRUE");
        }
        if flags.contains(&"new") {
            qb.push(" AND j.created_at >= ")
                .push_bind(Utc::now() - Duration::days(30));
        }
    }

    qb.push(" ORDER BY j.created_at DESC, j.id DESC");

    let rows: Vec<JobWithProviderRow> = qb.build_query_as().fetch_all(pool).await?;
    let mut jobs: Vec<JobWithProvider> = rows.into_iter().map(JobWithProvider::from).collect();

    if let Some(terms) = &criteria.skills {
        jobs.retain(|job| skills_match(&job.skills, terms));
    }
    Ok(jobs)
}

/// Lowercase and strip all whitespace, so "Arc  Welder" matches "arcwelder".
fn normalize_term(term: &str) -> String {
    term.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// A record matches when every comma-separated term is a normalized
/// substring of at least one skill. An empty term list matches everything.
pub fn skills_match(skills: &[String], raw_terms: &str) -> bool {
    let terms: Vec<String> = raw_terms
        .split(',')
        .map(normalize_term)
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return true;
    }

    let normalized: Vec<String> = skills.iter().map(|s| normalize_term(s)).collect();
    terms
        .iter()
        .all(|term| normalized.iter().any(|skill| skill.contains(term.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::identity::{NewProvider, ProviderRepository};
    use crate::jobs::{JobRepository, NewJob};

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_skills_match_single_term() {
        let job_skills = skills(&["Arc Welder", "Fabricator"]);
        assert!(skills_match(&job_skills, "welder"));
        assert!(skills_match(&job_skills, " WELD "));
        assert!(!skills_match(&job_skills, "plumber"));
    }

    #[test]
    fn test_skills_match_requires_every_term() {
        let job_skills = skills(&["Welder", "Fabricator"]);
        assert!(skills_match(&job_skills, "welder,fabricator"));
        assert!(skills_match(&job_skills, "weld, fab"));
        assert!(!skills_match(&job_skills, "welder,electrician"));
    }

    #[test]
    fn test_skills_match_empty_terms_passes() {
        let job_skills = skills(&["Welder"]);
        assert!(skills_match(&job_skills, ""));
        assert!(skills_match(&job_skills, " , "));
    }

    async fn seed(pool: &SqlitePool) -> (i64, i64) {
        let providers = ProviderRepository::new(pool);
        let p1 = providers
            .create(NewProvider {
                company_name: "Acme Fabrication".to_string(),
                hr_name: "Ravi".to_string(),
                hr_whatsapp_number: Some("+918800774455".to_string()),
                email: None,
            })
            .await
            .unwrap()
            .id;
        let p2 = providers
            .create(NewProvider {
                company_name: "Bolt Works".to_string(),
                hr_name: "Meera".to_string(),
                hr_whatsapp_number: None,
                email: Some("hr@bolt.example".to_string()),
            })
            .await
            .unwrap()
            .id;

        let jobs = JobRepository::new(pool);
        jobs.create(NewJob {
            job_title: "Senior Welder".to_string(),
            skills: skills(&["Arc Welder", "Fabricator"]),
            experience_required: 24,
            location: Some("Pune".to_string()),
            max_ctc: Some(500000.0),
            notice_period: Some("30 days".to_string()),
            posted_by: p1,
            ..Default::default()
        })
        .await
        .unwrap();
        jobs.create(NewJob {
            job_title: "Electrician".to_string(),
            skills: skills(&["Electrician"]),
            experience_required: 6,
            location: Some("Nagpur".to_string()),
            max_ctc: Some(300000.0),
            notice_period: Some("Immediate".to_string()),
            posted_by: p2,
            ..Default::default()
        })
        .await
        .unwrap();
        let paused = jobs
            .create(NewJob {
                job_title: "Paused Role".to_string(),
                skills: skills(&["Fitter"]),
                posted_by: p1,
                ..Default::default()
            })
            .await
            .unwrap();
        jobs.toggle_availability(paused.id).await.unwrap();

        (p1, p2)
    }

    #[tokio::test]
    async fn test_default_search_hides_unavailable() {
        let db = Database::in_memory().await.unwrap();
        seed(db.pool()).await;

        let results = search_jobs(db.pool(), &SearchCriteria::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|j| j.available));
    }

    #[tokio::test]
    async fn test_posted_by_includes_unavailable() {
        let db = Database::in_memory().await.unwrap();
        let (p1, _) = seed(db.pool()).await;

        let results = search_jobs(
            db.pool(),
            &SearchCriteria {
                posted_by: Some(p1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|j| !j.available));
        assert!(results.iter().all(|j| j.posted_by.id == p1));
    }

    #[tokio::test]
    async fn test_scalar_predicates_combine() {
        let db = Database::in_memory().await.unwrap();
        seed(db.pool()).await;

        let results = search_jobs(
            db.pool(),
            &SearchCriteria {
                experience: Some(12),
                location: Some("nag".to_string()),
                min_ctc: Some(250000.0),
                max_ctc: Some(350000.0),
                notice_period: Some("immediate".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job_title, "Electrician");
    }

    #[tokio::test]
    async fn test_comma_terms_are_anded() {
        let db = Database::in_memory().await.unwrap();
        seed(db.pool()).await;

        let both = search_jobs(
            db.pool(),
            &SearchCriteria {
                skills: Some("welder, fabricator".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].job_title, "Senior Welder");

        let miss = search_jobs(
            db.pool(),
            &SearchCriteria {
                skills: Some("welder, electrician".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(miss.is_empty());
    }

    #[tokio::test]
    async fn test_viewed_and_new_filters_select_correctly() {
        let db = Database::in_memory().await.unwrap();
        let (p1, _) = seed(db.pool()).await;
        let jobs = JobRepository::new(db.pool());

        let flagged = jobs
            .create(NewJob {
                job_title: "Flagged Role".to_string(),
                posted_by: p1,
                ..Default::default()
            })
            .await
            .unwrap();
        sqlx::query("UPDATE jobs SET viewed = TRUE WHERE id = ?")
            .bind(flagged.id)
            .execute(db.pool())
            .await
            .unwrap();

        let stale = jobs
            .create(NewJob {
                job_title: "Stale Role".to_string(),
                posted_by: p1,
                ..Default::default()
            })
            .await
            .unwrap();
        sqlx::query("UPDATE jobs SET created_at = ? WHERE id = ?")
            .bind(Utc::now() - Duration::days(40))
            .bind(stale.id)
            .execute(db.pool())
            .await
            .unwrap();

        let viewed = search_jobs(
            db.pool(),
            &SearchCriteria {
                filters: Some("viewed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(viewed.len(), 1);
        assert_eq!(viewed[0].job_title, "Flagged Role");

        let fresh = search_jobs(
            db.pool(),
            &SearchCriteria {
                filters: Some("new".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(fresh.iter().all(|j| j.job_title != "Stale Role"));
        assert!(fresh.iter().any(|j| j.job_title == "Flagged Role"));
    }

    #[tokio::test]
    async fn test_results_carry_provider_fields_newest_first() {
        let db = Database::in_memory().await.unwrap();
        seed(db.pool()).await;

        let results = search_jobs(db.pool(), &SearchCriteria::default())
            .await
            .unwrap();
        assert_eq!(results[0].job_title, "Electrician");
        assert_eq!(
            results[0].posted_by.company_name.as_deref(),
            Some("Bolt Works")
        );
        assert_eq!(results[1].posted_by.hr_name.as_deref(), Some("Ravi"));
    }
}
