#![allow(missing_docs)]

//! Personnel domain records consumed by the query engine.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::{QueryError, Result};
use crate::query::date;
use crate::query::value::Value;
use crate::record::Record;

/// One service member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personnel {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: String,
    pub branch: String,
    pub rank: String,
    pub pay_grade: String,
    pub mos: String,
    pub unit_id: String,
    pub unit_name: String,
    pub location: String,
    pub years_of_service: u32,
    pub enlistment_date: String,
    #[serde(default)]
    pub last_promotion_date: Option<String>,
    pub duty_status: String,
    pub clearance_level: String,
    #[serde(default)]
    pub clearance_expiration: Option<String>,
    pub deployment_eligible: bool,
    pub medical_readiness: String,
    pub dental_class: String,
    #[serde(default)]
    pub last_physical: Option<String>,
    pub pt_test_score: u32,
    #[serde(default)]
    pub training_completed: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
}

impl Personnel {
    /// `First Last`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Parsed clearance expiration, if present and well formed.
    pub fn clearance_expires_on(&self) -> Option<Date> {
        self.clearance_expiration.as_deref().and_then(date::parse_date)
    }

    /// Parsed date of the last physical, if present and well formed.
    pub fn last_physical_on(&self) -> Option<Date> {
        self.last_physical.as_deref().and_then(date::parse_date)
    }
}

impl Record for Personnel {
    fn field(&self, key: &str) -> Value {
        match key {
            "id" => Value::from(self.id.as_str()),
            "firstName" => Value::from(self.first_name.as_str()),
            "lastName" => Value::from(self.last_name.as_str()),
            "email" => Value::from(self.email.as_str()),
            "dateOfBirth" => Value::from(self.date_of_birth.as_str()),
            "branch" => Value::from(self.branch.as_str()),
            "rank" => Value::from(self.rank.as_str()),
            "payGrade" => Value::from(self.pay_grade.as_str()),
            "mos" => Value::from(self.mos.as_str()),
            "unitId" => Value::from(self.unit_id.as_str()),
            "unitName" => Value::from(self.unit_name.as_str()),
            "location" => Value::from(self.location.as_str()),
            "yearsOfService" => Value::from(self.years_of_service),
            "enlistmentDate" => Value::from(self.enlistment_date.as_str()),
            "lastPromotionDate" => Value::from(self.last_promotion_date.clone()),
            "dutyStatus" => Value::from(self.duty_status.as_str()),
            "clearanceLevel" => Value::from(self.clearance_level.as_str()),
            "clearanceExpiration" => Value::from(self.clearance_expiration.clone()),
            "deploymentEligible" => Value::Bool(self.deployment_eligible),
            "medicalReadiness" => Value::from(self.medical_readiness.as_str()),
            "dentalClass" => Value::from(self.dental_class.as_str()),
            "lastPhysical" => Value::from(self.last_physical.clone()),
            "ptTestScore" => Value::from(self.pt_test_score),
            "trainingCompleted" => Value::List(self.training_completed.clone()),
            "certifications" => Value::List(self.certifications.clone()),
            _ => Value::Null,
        }
    }
}

/// Level of a unit in the organisation chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Echelon {
    Battalion,
    Company,
    Platoon,
}

/// One node of the organisation chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub echelon: Echelon,
}

/// Unit tree with parent and child lookups.
#[derive(Debug, Clone, Default)]
pub struct UnitHierarchy {
    units: Vec<Unit>,
    index: HashMap<String, usize>,
    children: HashMap<String, Vec<usize>>,
}

impl UnitHierarchy {
    /// Indexes `units`. Units whose parent is unknown become roots.
    pub fn new(units: Vec<Unit>) -> Self {
        let index: HashMap<String, usize> = units
            .iter()
            .enumerate()
            .map(|(slot, unit)| (unit.id.clone(), slot))
            .collect();
        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        for (slot, unit) in units.iter().enumerate() {
            if let Some(parent) = unit.parent_id.as_ref().filter(|p| index.contains_key(*p)) {
                children.entry(parent.clone()).or_default().push(slot);
            }
        }
        Self {
            units,
            index,
            children,
        }
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn get(&self, id: &str) -> Option<&Unit> {
        self.index.get(id).map(|&slot| &self.units[slot])
    }

    /// Units without a known parent, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|unit| {
            unit.parent_id
                .as_ref()
                .map_or(true, |parent| !self.index.contains_key(parent))
        })
    }

    /// Direct children of `id`.
    pub fn children(&self, id: &str) -> impl Iterator<Item = &Unit> {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .map(|&slot| &self.units[slot])
    }

    /// `id` followed by every unit below it, breadth first.
    pub fn descendants(&self, id: &str) -> Result<Vec<&Unit>> {
        let root = self.get(id).ok_or_else(|| QueryError::UnknownUnit {
            unit: id.to_string(),
        })?;
        let mut out = vec![root];
        let mut seen: HashSet<&str> = HashSet::from([root.id.as_str()]);
        let mut cursor = 0;
        while cursor < out.len() {
            let current = out[cursor];
            for child in self.children(&current.id) {
                if seen.insert(child.id.as_str()) {
                    out.push(child);
                }
            }
            cursor += 1;
        }
        Ok(out)
    }

    /// Records whose `unitId` is `id` or any unit below it, in input order.
    pub fn scope<'r, R: Record>(&self, records: &'r [R], id: &str) -> Result<Vec<&'r R>> {
        let ids: HashSet<&str> = self
            .descendants(id)?
            .into_iter()
            .map(|unit| unit.id.as_str())
            .collect();
        Ok(records
            .iter()
            .filter(|record| ids.contains(record.field("unitId").to_string().as_str()))
            .collect())
    }
}

/// One duty shift on the duty roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyAssignment {
    #[serde(with = "date::iso")]
    pub date: Date,
    pub unit_id: String,
    pub personnel_id: String,
    pub duty_type: String,
}
