use std::sync::Arc;

use jobtrack_core::dto::application_dto::{ApplyToJobPayload, UpdateApplicationPayload};
use jobtrack_core::dto::job_dto::CreateJobPayload;
use jobtrack_core::dto::user_dto::SignupPayload;
use jobtrack_core::error::Error;
use jobtrack_core::models::actor::Actor;
use jobtrack_core::models::application::{ApplicationStatus, ContractType};
use jobtrack_core::models::job::JobType;
use jobtrack_core::models::user::Role;
use jobtrack_core::storage::kv::KvStoreAdapter;
use jobtrack_core::storage::StorageAdapter;
use jobtrack_core::AppState;

async fn app_state() -> (tempfile::TempDir, AppState) {
    let dir = tempfile::tempdir().expect("tempdir");
    let adapter = KvStoreAdapter::new(dir.path());
    adapter.initialize().await.expect("initialize kv store");
    let state = AppState::new(Arc::new(adapter));
    (dir, state)
}

fn signup(email: &str, role: Role) -> SignupPayload {
    SignupPayload {
        name: "Someone".to_string(),
        email: email.to_string(),
        password: "secret-password".to_string(),
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

/// The full candidate/recruiter walk behaves identically on the flat
/// key-value backend, including the invariants the store itself knows
/// nothing about.
#[tokio::test]
async fn rule_layer_runs_unmodified_on_the_kv_backend() {
    let (_dir, state) = app_state().await;

    let recruiter_profile = state
        .users
        .signup(signup("r@example.com", Role::Recruiter))
        .await
        .expect("recruiter signup");
    let recruiter = Actor::new(recruiter_profile.id, Role::Recruiter);
    let candidate_profile = state
        .users
        .signup(signup("c@example.com", Role::Candidate))
        .await
        .expect("candidate signup");
    let candidate = Actor::new(candidate_profile.id, Role::Candidate);

    let job = state
        .jobs
        .create(
            &recruiter,
            CreateJobPayload {
                title: "Backend Engineer".to_string(),
                company: "Acme".to_string(),
                location: "Paris".to_string(),
                job_type: JobType::FullTime,
                description: None,
                salary: None,
                job_url: None,
                posted_date: None,
                source: None,
                remote: true,
                requirements: vec!["Rust".to_string()],
            },
        )
        .await
        .expect("create job");

    let application = state
        .applications
        .apply_to_job(
            &candidate,
            &job,
            ApplyToJobPayload {
                contract_type: ContractType::Permanent,
                application_date: None,
                status: None,
                notes: None,
                documents: Vec::new(),
            },
        )
        .await
        .expect("apply");

    let err = state
        .applications
        .apply_to_job(
            &candidate,
            &job,
            ApplyToJobPayload {
                contract_type: ContractType::Permanent,
                application_date: None,
                status: None,
                notes: None,
                documents: Vec::new(),
            },
        )
        .await
        .expect_err("duplicate");
    assert!(matches!(err, Error::DuplicateApplication));

    let err = state
        .jobs
        .delete(&job.id, &recruiter)
        .await
        .expect_err("guarded delete");
    assert!(matches!(err, Error::HasDependents));

    let updated = state
        .applications
        .update(
            &application.id,
            &recruiter,
            UpdateApplicationPayload::status_only(ApplicationStatus::Interview),
        )
        .await
        .expect("recruiter status change");
    assert_eq!(updated.status, ApplicationStatus::Interview);

    let history = state
        .history
        .list(&application.id, &candidate)
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].new_status, ApplicationStatus::Interview);
}

/// Clobbering a collection file must read as an empty collection, and the
/// next write rebuilds it.
#[tokio::test]
async fn survives_a_corrupt_collection_file() {
    let (dir, state) = app_state().await;

    let profile = state
        .users
        .signup(signup("c@example.com", Role::Candidate))
        .await
        .expect("signup");
    let candidate = Actor::new(profile.id, Role::Candidate);

    std::fs::write(dir.path().join("applications.json"), b"\x00garbage").expect("clobber");

    let listed = state
        .applications
        .list(&candidate)
        .await
        .expect("listing over corrupt file");
    assert!(listed.is_empty());

    let created = state
        .applications
        .create(
            &candidate,
            jobtrack_core::dto::application_dto::CreateApplicationPayload {
                title: "Dev".to_string(),
                company: "Acme".to_string(),
                location: "Paris".to_string(),
                job_url: None,
                contract_type: ContractType::Permanent,
                application_date: None,
                status: None,
                notes: None,
                documents: Vec::new(),
            },
        )
        .await
        .expect("create repairs the collection");

    let listed = state.applications.list(&candidate).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
}
