//! Field registry.
//!
//! The registry is the static catalog of queryable fields. Each descriptor
//! carries the semantic type that drives operator legality and evaluation.
//! Conditions naming a key absent from the registry are treated as
//! always-matching by the evaluator.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::query::operator::{operators_for_type, OperatorInfo};

/// Semantic type of a queryable field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text, compared case-insensitively.
    String,
    /// Numeric value.
    Number,
    /// Flag.
    Boolean,
    /// Calendar date or timestamp.
    Date,
    /// List of text items.
    Array,
    /// Text restricted to a fixed option set.
    Select,
}

impl FieldType {
    /// Every field type, in catalog order.
    pub const ALL: [FieldType; 6] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Array,
        FieldType::Select,
    ];

    /// Lower-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Array => "array",
            FieldType::Select => "select",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry entry describing one queryable field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Record key, e.g. `lastName`.
    pub key: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Grouping shown in the field picker.
    pub category: &'static str,
    /// Semantic type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Legal values for `select` fields; empty otherwise.
    #[serde(skip_serializing_if = "no_options")]
    pub options: &'static [&'static str],
}

impl FieldDescriptor {
    /// Operators legal for this field, in display order.
    pub fn operators(&self) -> &'static [OperatorInfo] {
        operators_for_type(self.field_type)
    }
}

fn no_options(options: &&'static [&'static str]) -> bool {
    options.is_empty()
}

const fn field(
    key: &'static str,
    label: &'static str,
    category: &'static str,
    field_type: FieldType,
) -> FieldDescriptor {
    FieldDescriptor {
        key,
        label,
        category,
        field_type,
        options: &[],
    }
}

const fn select(
    key: &'static str,
    label: &'static str,
    category: &'static str,
    options: &'static [&'static str],
) -> FieldDescriptor {
    FieldDescriptor {
        key,
        label,
        category,
        field_type: FieldType::Select,
        options,
    }
}

/// Branches of service.
pub const BRANCHES: &[&str] = &[
    "Army",
    "Navy",
    "Air Force",
    "Marines",
    "Space Force",
    "Coast Guard",
];

/// Pay grades, enlisted through officer.
pub const PAY_GRADES: &[&str] = &[
    "E-1", "E-2", "E-3", "E-4", "E-5", "E-6", "E-7", "E-8", "E-9", "W-1", "W-2", "W-3", "W-4",
    "W-5", "O-1", "O-2", "O-3", "O-4", "O-5", "O-6",
];

/// Duty statuses. Only `Present for Duty` members are on the duty roster.
pub const DUTY_STATUSES: &[&str] = &["Present for Duty", "Leave", "TDY", "Deployed", "Hospitalized"];

/// Security clearance levels, lowest first.
pub const CLEARANCE_LEVELS: &[&str] = &["None", "Confidential", "Secret", "Top Secret", "TS/SCI"];

/// Medical readiness classifications.
pub const MEDICAL_READINESS: &[&str] = &["Green", "Yellow", "Red"];

/// Dental readiness classes.
pub const DENTAL_CLASSES: &[&str] = &["1", "2", "3", "4"];

static PERSONNEL_FIELDS: [FieldDescriptor; 25] = [
    field("id", "Personnel ID", "Personal", FieldType::String),
    field("firstName", "First Name", "Personal", FieldType::String),
    field("lastName", "Last Name", "Personal", FieldType::String),
    field("email", "Email", "Personal", FieldType::String),
    field("dateOfBirth", "Date of Birth", "Personal", FieldType::Date),
    select("branch", "Branch", "Service", BRANCHES),
    field("rank", "Rank", "Service", FieldType::String),
    select("payGrade", "Pay Grade", "Service", PAY_GRADES),
    field("mos", "MOS", "Service", FieldType::String),
    field("unitId", "Unit ID", "Service", FieldType::String),
    field("unitName", "Unit", "Service", FieldType::String),
    field("location", "Location", "Service", FieldType::String),
    field("yearsOfService", "Years of Service", "Service", FieldType::Number),
    field("enlistmentDate", "Enlistment Date", "Service", FieldType::Date),
    field("lastPromotionDate", "Last Promotion", "Service", FieldType::Date),
    select("dutyStatus", "Duty Status", "Service", DUTY_STATUSES),
    select("clearanceLevel", "Clearance Level", "Security", CLEARANCE_LEVELS),
    field("clearanceExpiration", "Clearance Expiration", "Security", FieldType::Date),
    field("deploymentEligible", "Deployment Eligible", "Readiness", FieldType::Boolean),
    select("medicalReadiness", "Medical Readiness", "Readiness", MEDICAL_READINESS),
    select("dentalClass", "Dental Class", "Readiness", DENTAL_CLASSES),
    field("lastPhysical", "Last Physical", "Readiness", FieldType::Date),
    field("ptTestScore", "PT Test Score", "Readiness", FieldType::Number),
    field("trainingCompleted", "Training Completed", "Training", FieldType::Array),
    field("certifications", "Certifications", "Training", FieldType::Array),
];

/// Lookup table over a fixed set of field descriptors.
#[derive(Debug)]
pub struct FieldRegistry {
    fields: Vec<FieldDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl FieldRegistry {
    /// Builds a registry from descriptors. A later duplicate key replaces the
    /// earlier entry's lookup slot so every key resolves to exactly one
    /// descriptor.
    pub fn new(fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        let mut registry = Self {
            fields: Vec::new(),
            index: HashMap::new(),
        };
        for descriptor in fields {
            match registry.index.get(descriptor.key) {
                Some(&slot) => registry.fields[slot] = descriptor,
                None => {
                    registry
                        .index
                        .insert(descriptor.key, registry.fields.len());
                    registry.fields.push(descriptor);
                }
            }
        }
        registry
    }

    /// Process-wide registry of personnel fields, built on first use.
    pub fn personnel() -> &'static FieldRegistry {
        static REGISTRY: OnceLock<FieldRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| FieldRegistry::new(PERSONNEL_FIELDS.iter().cloned()))
    }

    /// Resolves a field key.
    pub fn get(&self, key: &str) -> Option<&FieldDescriptor> {
        self.index.get(key).map(|&slot| &self.fields[slot])
    }

    /// Returns `true` if the key resolves.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when no fields are registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Descriptors of a given type.
    pub fn of_type(&self, field_type: FieldType) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .filter(move |descriptor| descriptor.field_type == field_type)
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&'static str> {
        let mut seen = Vec::new();
        for descriptor in &self.fields {
            if !seen.contains(&descriptor.category) {
                seen.push(descriptor.category);
            }
        }
        seen
    }
}
