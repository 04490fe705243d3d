#![allow(missing_docs)]

//! Readiness, security, medical and training reports.

use serde::Serialize;
use time::Date;

use crate::config::StatsConfig;
use crate::query::date;
use crate::query::field::{CLEARANCE_LEVELS, DENTAL_CLASSES, DUTY_STATUSES, MEDICAL_READINESS};
use crate::record::Record;
use crate::stats::distribution::{
    count_by_options, count_equal, count_list_items, count_truthy, field_date, mean,
    one_decimal, percent, sum_numbers, top_n, Distribution,
};

/// Chart colors for medical readiness.
pub const MEDICAL_PALETTE: &[(&str, &str)] = &[
    ("Green", "#22c55e"),
    ("Yellow", "#eab308"),
    ("Red", "#ef4444"),
];

/// Chart colors for clearance levels.
pub const CLEARANCE_PALETTE: &[(&str, &str)] = &[
    ("None", "#94a3b8"),
    ("Confidential", "#3b82f6"),
    ("Secret", "#8b5cf6"),
    ("Top Secret", "#f97316"),
    ("TS/SCI", "#ef4444"),
];

/// Physicals older than this many days are overdue.
pub const PHYSICAL_VALID_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub total: usize,
    pub deployment_eligible_count: usize,
    pub deployment_eligible_percent: u32,
    pub medical_ready_count: usize,
    pub medical_ready_percent: u32,
    pub pt_pass_count: usize,
    pub pt_pass_percent: u32,
    pub avg_pt_score: u32,
    pub avg_years_of_service: String,
    pub by_duty_status: Vec<Distribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityReport {
    pub total: usize,
    /// Members holding any clearance other than `None`.
    pub cleared_count: usize,
    pub cleared_percent: u32,
    /// Expiring between today and today plus the window, inclusive.
    pub expiring_soon: usize,
    pub expired: usize,
    pub window_days: i64,
    pub by_clearance: Vec<Distribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalReport {
    pub total: usize,
    pub ready_count: usize,
    pub ready_percent: u32,
    /// Missing or older than a year.
    pub overdue_physicals: usize,
    pub by_readiness: Vec<Distribution>,
    pub by_dental_class: Vec<Distribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub total: usize,
    pub top_courses: Vec<Distribution>,
    pub avg_courses: String,
    pub certified_count: usize,
}

/// All section reports for one roster slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReports {
    pub readiness: ReadinessReport,
    pub security: SecurityReport,
    pub medical: MedicalReport,
    pub training: TrainingReport,
}

impl SectionReports {
    /// Builds every section over the same records.
    pub fn build<R: Record>(records: &[R], config: &StatsConfig, today: Date) -> Self {
        Self {
            readiness: readiness(records, config),
            security: security(records, config, today),
            medical: medical(records, config, today),
            training: training(records, config),
        }
    }
}

pub fn readiness<R: Record>(records: &[R], config: &StatsConfig) -> ReadinessReport {
    let total = records.len();
    let eligible = count_truthy(records, "deploymentEligible");
    let ready = count_equal(records, "medicalReadiness", &config.ready_medical_status);
    let passing = f64::from(config.pt_passing_score);
    let pt_pass_count = records
        .iter()
        .filter(|r| r.field("ptTestScore").to_number() >= passing)
        .count();
    ReadinessReport {
        total,
        deployment_eligible_count: eligible,
        deployment_eligible_percent: percent(eligible, total),
        medical_ready_count: ready,
        medical_ready_percent: percent(ready, total),
        pt_pass_count,
        pt_pass_percent: percent(pt_pass_count, total),
        avg_pt_score: mean(sum_numbers(records, "ptTestScore"), total).round() as u32,
        avg_years_of_service: one_decimal(mean(sum_numbers(records, "yearsOfService"), total)),
        by_duty_status: count_by_options(records, "dutyStatus", DUTY_STATUSES, &[]),
    }
}

pub fn security<R: Record>(records: &[R], config: &StatsConfig, today: Date) -> SecurityReport {
    let total = records.len();
    let cleared_count = records
        .iter()
        .filter(|r| {
            let level = r.field("clearanceLevel").to_text();
            !level.is_empty() && level != "None"
        })
        .count();
    let horizon = date::shift_days(today, config.clearance_expiry_window_days);
    let (mut expiring_soon, mut expired) = (0, 0);
    for expires in records
        .iter()
        .filter_map(|r| field_date(r, "clearanceExpiration"))
    {
        if expires < today {
            expired += 1;
        } else if expires <= horizon {
            expiring_soon += 1;
        }
    }
    SecurityReport {
        total,
        cleared_count,
        cleared_percent: percent(cleared_count, total),
        expiring_soon,
        expired,
        window_days: config.clearance_expiry_window_days,
        by_clearance: count_by_options(
            records,
            "clearanceLevel",
            CLEARANCE_LEVELS,
            CLEARANCE_PALETTE,
        ),
    }
}

pub fn medical<R: Record>(records: &[R], config: &StatsConfig, today: Date) -> MedicalReport {
    let total = records.len();
    let ready = count_equal(records, "medicalReadiness", &config.ready_medical_status);
    let cutoff = date::shift_days(today, -PHYSICAL_VALID_DAYS);
    let overdue_physicals = records
        .iter()
        .filter(|r| field_date(*r, "lastPhysical").map_or(true, |last| last < cutoff))
        .count();
    MedicalReport {
        total,
        ready_count: ready,
        ready_percent: percent(ready, total),
        overdue_physicals,
        by_readiness: count_by_options(
            records,
            "medicalReadiness",
            MEDICAL_READINESS,
            MEDICAL_PALETTE,
        ),
        by_dental_class: count_by_options(records, "dentalClass", DENTAL_CLASSES, &[]),
    }
}

pub fn training<R: Record>(records: &[R], config: &StatsConfig) -> TrainingReport {
    let total = records.len();
    let courses: usize = records
        .iter()
        .map(|r| r.field("trainingCompleted").as_list().len())
        .sum();
    TrainingReport {
        total,
        top_courses: top_n(count_list_items(records, "trainingCompleted"), config.top_n),
        avg_courses: one_decimal(mean(courses as f64, total)),
        certified_count: records
            .iter()
            .filter(|r| !r.field("certifications").as_list().is_empty())
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    fn roster() -> Vec<serde_json::Value> {
        vec![
            json!({
                "dutyStatus": "Present for Duty", "deploymentEligible": true,
                "medicalReadiness": "Green", "dentalClass": "1", "ptTestScore": 250,
                "yearsOfService": 3, "clearanceLevel": "Secret",
                "clearanceExpiration": "2024-07-01", "lastPhysical": "2024-01-10",
                "trainingCompleted": ["Airborne", "CLS"], "certifications": ["CompTIA"]
            }),
            json!({
                "dutyStatus": "Leave", "deploymentEligible": false,
                "medicalReadiness": "Red", "dentalClass": "3", "ptTestScore": 150,
                "yearsOfService": 12, "clearanceLevel": "None",
                "clearanceExpiration": "2024-01-01", "lastPhysical": "2022-05-01",
                "trainingCompleted": ["CLS"]
            }),
            json!({
                "dutyStatus": "Present for Duty", "deploymentEligible": true,
                "medicalReadiness": "Yellow", "dentalClass": "1", "ptTestScore": 180,
                "yearsOfService": 6, "clearanceLevel": "Top Secret",
                "clearanceExpiration": "2025-06-01",
                "trainingCompleted": []
            }),
        ]
    }

    #[test]
    fn readiness_numbers() {
        let report = readiness(&roster(), &StatsConfig::default());
        assert_eq!(report.pt_pass_count, 2);
        assert_eq!(report.pt_pass_percent, 67);
        assert_eq!(report.avg_pt_score, 193);
        assert_eq!(report.avg_years_of_service, "7.0");
        assert_eq!(report.by_duty_status[0].name, "Present for Duty");
        assert_eq!(report.by_duty_status[0].value, 2);
    }

    #[test]
    fn security_expiry_windows() {
        let today = date!(2024 - 06 - 15);
        let report = security(&roster(), &StatsConfig::default(), today);
        assert_eq!(report.cleared_count, 2);
        assert_eq!(report.expiring_soon, 1);
        assert_eq!(report.expired, 1);
        let names: Vec<_> = report.by_clearance.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["None", "Secret", "Top Secret"]);
    }

    #[test]
    fn medical_colors_and_overdue() {
        let report = medical(&roster(), &StatsConfig::default(), date!(2024 - 06 - 15));
        assert_eq!(report.overdue_physicals, 2, "old and missing physicals");
        assert_eq!(report.by_readiness[0].color, Some("#22c55e"));
        assert_eq!(report.by_readiness[2].color, Some("#ef4444"));
        assert_eq!(report.by_dental_class[0].value, 2);
    }

    #[test]
    fn training_top_courses() {
        let report = training(&roster(), &StatsConfig::default());
        assert_eq!(report.top_courses[0].name, "CLS");
        assert_eq!(report.avg_courses, "1.0");
        assert_eq!(report.certified_count, 1);
    }

    #[test]
    fn empty_slice_is_finite() {
        let reports = SectionReports::build::<serde_json::Value>(
            &[],
            &StatsConfig::default(),
            date!(2024 - 06 - 15),
        );
        assert_eq!(reports.readiness.avg_pt_score, 0);
        assert_eq!(reports.training.avg_courses, "0.0");
        assert!(reports.medical.by_readiness.is_empty());
    }
}
