//! Seeded synthetic roster used by the CLI, tests and benchmarks.
//!
//! Output depends only on the seed and the anchor date, so a given
//! `(seed, anchor)` pair always produces the same roster.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use time::Date;

use crate::model::{DutyAssignment, Echelon, Personnel, Unit, UnitHierarchy};
use crate::query::date::{format_iso, shift_days, today_utc};
use crate::query::executor::execute;
use crate::query::field::{BRANCHES, PAY_GRADES};
use crate::stats::fairness::default_eligibility;

const FIRST_NAMES: &[&str] = &[
    "James", "Maria", "Robert", "Aisha", "Michael", "Chen", "David", "Sofia", "Daniel", "Priya",
    "Marcus", "Elena", "Tyrone", "Hannah", "Luis", "Grace", "Andre", "Keiko", "Samuel", "Fatima",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Garcia", "Nguyen", "Williams", "Brown", "Martinez", "Okafor", "Davis",
    "Kowalski", "Rodriguez", "Patel", "Miller", "Thompson", "Reyes", "Kim", "Jackson", "O'Brien",
];

const RANKS: &[&str] = &[
    "Private",
    "Private Second Class",
    "Private First Class",
    "Specialist",
    "Sergeant",
    "Staff Sergeant",
    "Sergeant First Class",
    "Master Sergeant",
    "Sergeant Major",
    "Warrant Officer 1",
    "Chief Warrant Officer 2",
    "Chief Warrant Officer 3",
    "Chief Warrant Officer 4",
    "Chief Warrant Officer 5",
    "Second Lieutenant",
    "First Lieutenant",
    "Captain",
    "Major",
    "Lieutenant Colonel",
    "Colonel",
];

// relative frequency per pay grade, aligned with PAY_GRADES
const GRADE_WEIGHTS: &[u32] = &[
    4, 6, 10, 16, 14, 10, 6, 3, 1, 1, 1, 1, 1, 1, 3, 3, 4, 2, 1, 1,
];

const MOS_CODES: &[&str] = &["11B", "25B", "68W", "92Y", "35F", "88M", "12B", "31B", "42A"];

const LOCATIONS: &[&str] = &[
    "Fort Liberty, NC",
    "Fort Cavazos, TX",
    "Joint Base Lewis-McChord, WA",
    "Fort Campbell, KY",
];

const DUTY_STATUS_WEIGHTS: &[(&str, u32)] = &[
    ("Present for Duty", 75),
    ("Leave", 8),
    ("TDY", 7),
    ("Deployed", 7),
    ("Hospitalized", 3),
];

const CLEARANCE_WEIGHTS: &[(&str, u32)] = &[
    ("None", 20),
    ("Confidential", 15),
    ("Secret", 45),
    ("Top Secret", 15),
    ("TS/SCI", 5),
];

const MEDICAL_WEIGHTS: &[(&str, u32)] = &[("Green", 70), ("Yellow", 20), ("Red", 10)];

const DENTAL_WEIGHTS: &[(&str, u32)] = &[("1", 60), ("2", 30), ("3", 8), ("4", 2)];

const COURSES: &[&str] = &[
    "Basic Leader Course",
    "Combat Lifesaver",
    "Airborne School",
    "Air Assault",
    "Ranger School",
    "Advanced Leader Course",
    "Sapper Leader Course",
    "Pathfinder",
    "SERE Level C",
    "Master Resilience Trainer",
];

const CERTIFICATIONS: &[&str] = &[
    "CompTIA Security+",
    "EMT-B",
    "CDL Class A",
    "PMP",
    "Hazmat Handler",
];

const DUTY_TYPES: &[&str] = &["Staff Duty", "Charge of Quarters", "Barracks Runner"];

const COMPANIES: &[(&str, &str)] = &[
    ("a", "Alpha Company"),
    ("b", "Bravo Company"),
    ("c", "Charlie Company"),
    ("hhc", "Headquarters Company"),
];

const PLATOONS_PER_COMPANY: usize = 3;

/// Deterministic roster generator.
pub struct RosterGenerator {
    rng: ChaCha8Rng,
    anchor: Date,
    units: UnitHierarchy,
}

impl RosterGenerator {
    /// Generator anchored at today's date.
    pub fn new(seed: u64) -> Self {
        Self::with_anchor(seed, today_utc())
    }

    /// Generator whose relative dates count back from `anchor`.
    pub fn with_anchor(seed: u64, anchor: Date) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            anchor,
            units: build_units(),
        }
    }

    /// Battalion, its companies, and their platoons.
    pub fn generate_units(&self) -> UnitHierarchy {
        self.units.clone()
    }

    /// `count` members spread over the platoons and the headquarters company.
    pub fn generate_personnel(&mut self, count: usize) -> Vec<Personnel> {
        let postings: Vec<Unit> = self
            .units
            .units()
            .iter()
            .filter(|unit| unit.echelon == Echelon::Platoon || unit.id.ends_with("hhc"))
            .cloned()
            .collect();
        (0..count)
            .map(|index| {
                let unit = &postings[index % postings.len().max(1)];
                self.person(index, unit)
            })
            .collect()
    }

    fn person(&mut self, index: usize, unit: &Unit) -> Personnel {
        let first = pick(&mut self.rng, FIRST_NAMES);
        // mostly army, with attached members from the other services
        let branch = if self.rng.gen_bool(0.7) {
            BRANCHES[0]
        } else {
            pick(&mut self.rng, BRANCHES)
        };
        let last = pick(&mut self.rng, LAST_NAMES);
        let grade = weighted_index(&mut self.rng, GRADE_WEIGHTS);
        let years_of_service: u32 = match PAY_GRADES[grade].as_bytes()[0] {
            b'E' => (grade as u32 * 2).min(20) + self.rng.gen_range(0..3),
            b'W' => 6 + (grade as u32 - 9) * 3 + self.rng.gen_range(0..3),
            _ => (grade as u32 - 14) * 4 + self.rng.gen_range(0..3),
        };
        let anchor = self.anchor;
        let days_ago = |rng: &mut ChaCha8Rng, low: i64, high: i64| {
            format_iso(shift_days(anchor, -rng.gen_range(low..high)))
        };

        let medical = weighted(&mut self.rng, MEDICAL_WEIGHTS);
        let clearance = weighted(&mut self.rng, CLEARANCE_WEIGHTS);
        let clearance_expiration = (clearance != "None").then(|| {
            format_iso(shift_days(anchor, self.rng.gen_range(-180..1800)))
        });
        let age_years = 18 + i64::from(years_of_service) + self.rng.gen_range(0..6);
        let training_count = self.rng.gen_range(0..5);
        let mut training_completed: Vec<String> = COURSES
            .choose_multiple(&mut self.rng, training_count)
            .map(|course| course.to_string())
            .collect();
        training_completed.sort();
        let certification_count = if self.rng.gen_bool(0.3) { 1 } else { 0 };

        Personnel {
            id: format!("P{:05}", index + 1),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!(
                "{}.{}{}@army.mil",
                first.to_lowercase(),
                last.to_lowercase().replace('\'', ""),
                index + 1
            ),
            date_of_birth: days_ago(&mut self.rng, age_years * 365, age_years * 365 + 365),
            branch: branch.to_string(),
            rank: RANKS[grade].to_string(),
            pay_grade: PAY_GRADES[grade].to_string(),
            mos: pick(&mut self.rng, MOS_CODES).to_string(),
            unit_id: unit.id.clone(),
            unit_name: unit.name.clone(),
            location: pick(&mut self.rng, LOCATIONS).to_string(),
            years_of_service,
            enlistment_date: days_ago(
                &mut self.rng,
                i64::from(years_of_service) * 365,
                i64::from(years_of_service) * 365 + 365,
            ),
            last_promotion_date: self
                .rng
                .gen_bool(0.8)
                .then(|| days_ago(&mut self.rng, 30, 1000)),
            duty_status: weighted(&mut self.rng, DUTY_STATUS_WEIGHTS).to_string(),
            clearance_level: clearance.to_string(),
            clearance_expiration,
            deployment_eligible: medical != "Red" && self.rng.gen_bool(0.85),
            medical_readiness: medical.to_string(),
            dental_class: weighted(&mut self.rng, DENTAL_WEIGHTS).to_string(),
            last_physical: self
                .rng
                .gen_bool(0.95)
                .then(|| days_ago(&mut self.rng, 0, 500)),
            pt_test_score: self.rng.gen_range(120..=300),
            training_completed,
            certifications: CERTIFICATIONS
                .choose_multiple(&mut self.rng, certification_count)
                .map(|cert| cert.to_string())
                .collect(),
        }
    }

    /// One duty per unit per day from `start`, rotating through each unit's
    /// members who are present for duty. Units with nobody present get no
    /// assignments.
    pub fn generate_duty_roster(
        &self,
        personnel: &[Personnel],
        start: Date,
        days: u32,
    ) -> Vec<DutyAssignment> {
        let eligible = default_eligibility();
        let mut by_unit: BTreeMap<&str, Vec<&Personnel>> = BTreeMap::new();
        for person in execute(personnel, Some(&eligible)) {
            by_unit.entry(person.unit_id.as_str()).or_default().push(person);
        }
        let mut roster = Vec::with_capacity(by_unit.len() * days as usize);
        for day in 0..days {
            let date = shift_days(start, i64::from(day));
            for (unit_id, members) in &by_unit {
                let member = members[day as usize % members.len()];
                roster.push(DutyAssignment {
                    date,
                    unit_id: (*unit_id).to_string(),
                    personnel_id: member.id.clone(),
                    duty_type: DUTY_TYPES[day as usize % DUTY_TYPES.len()].to_string(),
                });
            }
        }
        roster
    }
}

fn build_units() -> UnitHierarchy {
    let battalion = Unit {
        id: "bn".to_string(),
        name: "1st Battalion, 75th Infantry".to_string(),
        parent_id: None,
        echelon: Echelon::Battalion,
    };
    let mut units = vec![battalion];
    for &(code, name) in COMPANIES {
        let company_id = format!("bn-{code}");
        units.push(Unit {
            id: company_id.clone(),
            name: name.to_string(),
            parent_id: Some("bn".to_string()),
            echelon: Echelon::Company,
        });
        if code == "hhc" {
            continue;
        }
        for platoon in 1..=PLATOONS_PER_COMPANY {
            units.push(Unit {
                id: format!("{company_id}-{platoon}"),
                name: format!("{} Platoon, {name}", ordinal(platoon)),
                parent_id: Some(company_id.clone()),
                echelon: Echelon::Platoon,
            });
        }
    }
    UnitHierarchy::new(units)
}

fn ordinal(n: usize) -> String {
    match n {
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        n => format!("{n}th"),
    }
}

fn pick<'a>(rng: &mut ChaCha8Rng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn weighted_index(rng: &mut ChaCha8Rng, weights: &[u32]) -> usize {
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return 0;
    }
    let mut roll = rng.gen_range(0..total);
    for (index, &weight) in weights.iter().enumerate() {
        if roll < weight {
            return index;
        }
        roll -= weight;
    }
    weights.len() - 1
}

fn weighted(rng: &mut ChaCha8Rng, choices: &[(&'static str, u32)]) -> &'static str {
    let weights: Vec<u32> = choices.iter().map(|&(_, weight)| weight).collect();
    choices
        .get(weighted_index(rng, &weights))
        .map_or("", |&(choice, _)| choice)
}
