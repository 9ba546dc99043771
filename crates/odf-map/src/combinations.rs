//! General and divisional combinations.

use std::collections::BTreeMap;

use odf_model::OrganObject;
use tracing::debug;

use crate::emit::Draft;
use crate::foreign::Fields;
use crate::plan::{Controlled, Plan, name_or};

const GENERAL: &str = "1";
const DIVISIONAL: &str = "2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Member {
    Stop { manual: u32, local: u32 },
    Tremulant(u32),
    Switch(u32),
}

/// `n` for engaged members, `-n` for members the combination turns off.
fn signed(value: u32, engaged: bool) -> String {
    if engaged {
        value.to_string()
    } else {
        format!("-{value}")
    }
}

fn members(plan: &Plan<'_>, elements: &[&OrganObject]) -> Vec<(Member, bool)> {
    let mut members = Vec::new();
    for element in elements {
        let switch = element.link("ControlledSwitchID").unwrap_or(0);
        let engaged = element.flag("CapturedSwitchIsEngaged").unwrap_or(true);
        match plan.switch_targets.get(&switch) {
            Some(targets) => members.extend(targets.iter().map(|target| {
                let member = match *target {
                    Controlled::Stop { manual, local } => Member::Stop { manual, local },
                    Controlled::Tremulant(id) => Member::Tremulant(id),
                };
                (member, engaged)
            })),
            None => match plan.ids.get("Switch", switch) {
                Some(id) => members.push((Member::Switch(id), engaged)),
                None => debug!(switch, "combination element controls an unconverted switch"),
            },
        }
    }
    members
}

/// General and divisional drafts, in that order.
pub(crate) fn combinations(plan: &mut Plan<'_>) -> (Vec<Draft>, Vec<Draft>) {
    let foreign = plan.foreign;
    let mut elements: BTreeMap<u32, Vec<&OrganObject>> = BTreeMap::new();
    for element in foreign.objects("CombinationElement") {
        if let Some(combination) = element.link("CombinationID") {
            elements.entry(combination).or_default().push(element);
        }
    }

    let mut generals = Vec::new();
    let mut divisionals = Vec::new();
    for combination in foreign.objects("Combination") {
        let label = format!("Combination {}", combination.number());
        let members = members(
            plan,
            elements.get(&combination.number()).map_or(&[][..], Vec::as_slice),
        );
        match combination.code("CombinationTypeCode").unwrap_or_default() {
            GENERAL => {
                let id = plan.ids.assign("General", combination.number());
                generals.push(general(id, combination.text("Name"), &members));
            }
            DIVISIONAL => {
                let division = combination.link("DivisionID").unwrap_or(0);
                let Some(manual) = plan.division_manual.get(&division).copied() else {
                    plan.skip(label, format!("division {division} is not played from any keyboard"));
                    continue;
                };
                let id = plan.ids.assign("Divisional", combination.number());
                if let Some(layout) = plan.manuals.get_mut(&manual) {
                    layout.divisionals.push(id);
                }
                divisionals.push(divisional(id, manual, combination.text("Name"), &members));
            }
            other => plan.skip(label, format!("combination type {other} is not converted")),
        }
    }
    (generals, divisionals)
}

fn general(id: u32, name: Option<&str>, members: &[(Member, bool)]) -> Draft {
    let mut stops = Vec::new();
    let mut tremulants = Vec::new();
    let mut switches = Vec::new();
    for &(member, engaged) in members {
        match member {
            Member::Stop { manual, local } => stops.push((manual, signed(local, engaged))),
            Member::Tremulant(id) => tremulants.push(signed(id, engaged)),
            Member::Switch(id) => switches.push(signed(id, engaged)),
        }
    }

    let mut draft = Draft::indexed("General", id);
    draft
        .set("Name", name_or(name, "General", id))
        .set("NumberOfCouplers", 0)
        .set("NumberOfStops", stops.len());
    for (n, (manual, number)) in stops.iter().enumerate() {
        draft
            .set(format!("StopNumber{:03}", n + 1), number)
            .set(format!("StopManual{:03}", n + 1), manual);
    }
    draft
        .list("NumberOfTremulants", "TremulantNumber", &tremulants)
        .list("NumberOfSwitches", "SwitchNumber", &switches);
    draft
}

/// Only stops of the divisional's own manual are kept.
fn divisional(id: u32, manual: u32, name: Option<&str>, members: &[(Member, bool)]) -> Draft {
    let stops: Vec<String> = members
        .iter()
        .filter_map(|&(member, engaged)| match member {
            Member::Stop { manual: m, local } if m == manual => Some(signed(local, engaged)),
            _ => None,
        })
        .collect();

    let mut draft = Draft::indexed("Divisional", id);
    draft
        .set("Name", name_or(name, "Divisional", id))
        .set("NumberOfCouplers", 0)
        .list("NumberOfStops", "Stop", &stops)
        .set("NumberOfTremulants", 0);
    draft
}
