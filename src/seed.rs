use tracing::info;

use crate::dto::application_dto::CreateApplicationPayload;
use crate::dto::job_dto::CreateJobPayload;
use crate::dto::user_dto::SignupPayload;
use crate::error::Result;
use crate::models::actor::Actor;
use crate::models::application::{ApplicationStatus, ContractType};
use crate::models::job::JobType;
use crate::models::user::Role;
use crate::AppState;

const ADMIN_EMAIL: &str = "admin@jobtrack.test";

/// Idempotent demo fixtures: an admin, a recruiter with one posted job,
/// and a candidate with a couple of tracked applications. Everything goes
/// through the rule layer so the seeded data honors every invariant.
pub async fn seed_demo_data(state: &AppState) -> Result<()> {
    if state.users.get_by_email(ADMIN_EMAIL).await.is_ok() {
        return Ok(());
    }

    state
        .users
        .signup(signup("Admin User", ADMIN_EMAIL, Role::Admin))
        .await?;

    let recruiter = state
        .users
        .signup(SignupPayload {
            company_name: Some("TechCorp".to_string()),
            company_sector: Some("IT".to_string()),
            ..signup("Demo Recruiter", "recruiter@jobtrack.test", Role::Recruiter)
        })
        .await?;
    let recruiter_actor = Actor::new(recruiter.id.clone(), Role::Recruiter);

    let candidate = state
        .users
        .signup(SignupPayload {
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            ..signup("Demo Candidate", "candidate@jobtrack.test", Role::Candidate)
        })
        .await?;
    let candidate_actor = Actor::new(candidate.id.clone(), Role::Candidate);

    let job = state
        .jobs
        .create(
            &recruiter_actor,
            CreateJobPayload {
                title: "Backend Engineer".to_string(),
                company: "TechCorp".to_string(),
                location: "Lyon".to_string(),
                job_type: JobType::FullTime,
                description: Some("Own the persistence layer of our platform.".to_string()),
                salary: Some("55k-70k".to_string()),
                job_url: None,
                posted_date: None,
                source: Some("direct".to_string()),
                remote: true,
                requirements: vec!["Rust".to_string(), "SQL".to_string()],
            },
        )
        .await?;

    state
        .applications
        .apply_to_job(
            &candidate_actor,
            &job,
            crate::dto::application_dto::ApplyToJobPayload {
                contract_type: ContractType::Permanent,
                application_date: None,
                status: Some(ApplicationStatus::Sent),
                notes: Some("Applied through the demo seed.".to_string()),
                documents: Vec::new(),
            },
        )
        .await?;

    state
        .applications
        .create(
            &candidate_actor,
            CreateApplicationPayload {
                title: "Platform Engineer".to_string(),
                company: "CreativeAgency".to_string(),
                location: "Remote".to_string(),
                job_url: None,
                contract_type: ContractType::Freelance,
                application_date: None,
                status: Some(ApplicationStatus::ToApply),
                notes: None,
                documents: Vec::new(),
            },
        )
        .await?;

    info!("demo data seeded");
    Ok(())
}

fn signup(name: &str, email: &str, role: Role) -> SignupPayload {
    SignupPayload {
        name: name.to_string(),
        email: email.to_string(),
        password: "demo-password".to_string(),
        role,
        phone: None,
        address: None,
        skills: Vec::new(),
        experience: None,
        education: None,
        linkedin_url: None,
        company_name: None,
        company_sector: None,
        company_website: None,
        company_size: None,
    }
}
