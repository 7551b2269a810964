use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::application::{Application, ApplicationStatus};
use crate::models::job::Job;
use crate::models::user::{Role, UserProfile};

/// Aggregates derived from a candidate's applications. Pure computation;
/// callers fetch the records through the rule layer first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStats {
    pub total: usize,
    pub by_status: HashMap<ApplicationStatus, usize>,
    pub interviews: usize,
    /// Accepted share of all applications, as a percentage.
    pub success_rate: f64,
    pub evolution: Vec<MonthlyCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// Calendar month of the application date, `YYYY-MM`.
    pub month: String,
    pub count: usize,
}

pub fn application_stats(applications: &[Application]) -> ApplicationStats {
    let total = applications.len();

    let mut by_status: HashMap<ApplicationStatus, usize> = ApplicationStatus::ALL
        .iter()
        .map(|status| (*status, 0))
        .collect();
    for application in applications {
        *by_status.entry(application.status).or_default() += 1;
    }

    // Interviews count the current status only, not historical visits.
    let interviews = by_status
        .get(&ApplicationStatus::Interview)
        .copied()
        .unwrap_or(0);
    let accepted = by_status
        .get(&ApplicationStatus::Accepted)
        .copied()
        .unwrap_or(0);
    let success_rate = if total == 0 {
        0.0
    } else {
        accepted as f64 / total as f64 * 100.0
    };

    let mut buckets: HashMap<String, usize> = HashMap::new();
    for application in applications {
        let month = application.application_date.format("%Y-%m").to_string();
        *buckets.entry(month).or_default() += 1;
    }
    let mut evolution: Vec<MonthlyCount> = buckets
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect();
    evolution.sort_by(|a, b| a.month.cmp(&b.month));

    ApplicationStats {
        total,
        by_status,
        interviews,
        success_rate,
        evolution,
    }
}

/// Dashboard totals for the admin screens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: usize,
    pub total_recruiters: usize,
    pub total_candidates: usize,
    pub total_jobs: usize,
    pub total_applications: usize,
    pub users_by_role: HashMap<Role, usize>,
}

pub fn admin_stats(users: &[UserProfile], jobs: &[Job], applications: &[Application]) -> AdminStats {
    let mut users_by_role: HashMap<Role, usize> =
        [Role::Admin, Role::Recruiter, Role::Candidate]
            .iter()
            .map(|role| (*role, 0))
            .collect();
    for user in users {
        *users_by_role.entry(user.role).or_default() += 1;
    }

    AdminStats {
        total_users: users.len(),
        total_recruiters: users_by_role.get(&Role::Recruiter).copied().unwrap_or(0),
        total_candidates: users_by_role.get(&Role::Candidate).copied().unwrap_or(0),
        total_jobs: jobs.len(),
        total_applications: applications.len(),
        users_by_role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;

    use crate::models::application::ContractType;

    fn application(status: ApplicationStatus, year: i32, month: u32) -> Application {
        let date = Utc.with_ymd_and_hms(year, month, 15, 12, 0, 0).unwrap();
        Application {
            id: format!("a-{}-{}-{:?}", year, month, status),
            title: "Dev".to_string(),
            company: "Acme".to_string(),
            location: "Paris".to_string(),
            job_url: None,
            job_id: None,
            recruiter_id: None,
            contract_type: ContractType::Permanent,
            application_date: date,
            status,
            notes: None,
            documents: Vec::new(),
            user_id: "u1".to_string(),
            last_follow_up: None,
            follow_up_count: 0,
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn empty_input_yields_zeroes_without_division_faults() {
        let stats = application_stats(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.interviews, 0);
        assert!(stats.evolution.is_empty());
        assert_eq!(stats.by_status[&ApplicationStatus::Sent], 0);
    }

    #[test]
    fn counts_statuses_and_success_rate() {
        let applications = vec![
            application(ApplicationStatus::Sent, 2026, 1),
            application(ApplicationStatus::Interview, 2026, 2),
            application(ApplicationStatus::Accepted, 2026, 2),
            application(ApplicationStatus::Refused, 2026, 3),
        ];
        let stats = application_stats(&applications);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.interviews, 1);
        assert_eq!(stats.success_rate, 25.0);
        assert_eq!(stats.by_status[&ApplicationStatus::ToApply], 0);
        assert_eq!(stats.by_status[&ApplicationStatus::Accepted], 1);
    }

    #[test]
    fn evolution_buckets_by_calendar_month_ascending() {
        let applications = vec![
            application(ApplicationStatus::Sent, 2026, 2),
            application(ApplicationStatus::Sent, 2026, 1),
            application(ApplicationStatus::Sent, 2026, 2),
        ];
        let stats = application_stats(&applications);
        assert_eq!(
            stats.evolution,
            vec![
                MonthlyCount {
                    month: "2026-01".to_string(),
                    count: 1
                },
                MonthlyCount {
                    month: "2026-02".to_string(),
                    count: 2
                },
            ]
        );
    }
}
