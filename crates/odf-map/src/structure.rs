//! Keyboards, wind, enclosures, tremulants and switches.

use std::collections::BTreeMap;

use crate::emit::Draft;
use crate::foreign::Fields;
use crate::plan::{Controlled, ManualPlan, Plan, name_or};

const DEFAULT_KEYS: i64 = 61;
const DEFAULT_FIRST_NOTE: i64 = 36;
const MAX_ACCESSIBLE_KEYS: i64 = 85;
const MAX_LOGICAL_KEYS: i64 = 192;
const MAX_MIDI_NOTE: i64 = 127;
/// Foreign id standing in for the windchest group created when the
/// descriptor declares no wind compartments.
const MAIN_WINDCHEST: u32 = 0;

pub(crate) fn keyboards(plan: &mut Plan<'_>) {
    let foreign = plan.foreign;
    for keyboard in foreign.objects("Keyboard") {
        let manual = plan.ids.assign("Manual", keyboard.number());
        if let Some(division) = keyboard.link("Hint_PrimaryAssociatedDivisionID") {
            plan.division_manual.entry(division).or_insert(manual);
        }
        plan.manuals.insert(
            manual,
            ManualPlan {
                name: name_or(keyboard.text("Name"), "Manual", manual),
                keys: keyboard
                    .integer("KeyGen_NumberOfKeys")
                    .unwrap_or(DEFAULT_KEYS)
                    .clamp(1, MAX_LOGICAL_KEYS),
                first_note: keyboard
                    .integer("KeyGen_MIDINoteNumberOfFirstKey")
                    .unwrap_or(DEFAULT_FIRST_NOTE)
                    .clamp(0, MAX_MIDI_NOTE),
                ..ManualPlan::default()
            },
        );
    }
}

pub(crate) fn manual_drafts(plan: &Plan<'_>) -> Vec<Draft> {
    plan.manuals
        .iter()
        .map(|(&id, manual)| {
            let mut draft = Draft::indexed("Manual", id);
            draft
                .set("Name", &manual.name)
                .set("NumberOfLogicalKeys", manual.keys)
                .set("FirstAccessibleKeyLogicalKeyNumber", 1)
                .set("FirstAccessibleKeyMIDINoteNumber", manual.first_note)
                .set("NumberOfAccessibleKeys", manual.keys.min(MAX_ACCESSIBLE_KEYS))
                .list("NumberOfStops", "Stop", &manual.stops);
            if !manual.divisionals.is_empty() {
                draft.list("NumberOfDivisionals", "Divisional", &manual.divisionals);
            }
            if !manual.switches.is_empty() {
                draft.list("NumberOfSwitches", "Switch", &manual.switches);
            }
            draft
        })
        .collect()
}

/// Numbers the windchest groups; there is always at least one.
pub(crate) fn windchest_ids(plan: &mut Plan<'_>) {
    let foreign = plan.foreign;
    for compartment in foreign.objects("WindCompartment") {
        plan.ids.assign("WindchestGroup", compartment.number());
    }
    if plan.ids.count("WindchestGroup") == 0 {
        plan.ids.assign("WindchestGroup", MAIN_WINDCHEST);
    }
}

pub(crate) fn enclosures(plan: &mut Plan<'_>) -> Vec<Draft> {
    let mut drafts = Vec::new();
    let foreign = plan.foreign;
    for enclosure in foreign.objects("Enclosure") {
        let id = plan.ids.assign("Enclosure", enclosure.number());
        let mut draft = Draft::indexed("Enclosure", id);
        draft
            .set("Name", name_or(enclosure.text("Name"), "Enclosure", id))
            .set_opt(
                "AmpMinimumLevel",
                enclosure
                    .real("MinAmplitudeLevelPercent")
                    .map(|level| level.round().clamp(0.0, 100.0) as i64),
            );
        drafts.push(draft);
    }
    drafts
}

/// Tremulant drafts plus, per generated windchest group, the tremulants
/// acting on it.
pub(crate) fn tremulants(plan: &mut Plan<'_>) -> (Vec<Draft>, BTreeMap<u32, Vec<u32>>) {
    let mut drafts = Vec::new();
    let mut by_windchest: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    let mut everywhere = Vec::new();

    let foreign = plan.foreign;
    for tremulant in foreign.objects("Tremulant") {
        let id = plan.ids.assign("Tremulant", tremulant.number());
        let mut draft = Draft::indexed("Tremulant", id);
        draft
            .set("Name", name_or(tremulant.text("Name"), "Tremulant", id))
            .set("TremulantType", "Synth")
            .set("Period", rounded(tremulant.real("PeriodMilliseconds"), 160.0, 32.0, 44100.0))
            .set("StartRate", rounded(tremulant.real("StartRatePercent"), 8.0, 1.0, 100.0))
            .set("StopRate", rounded(tremulant.real("StopRatePercent"), 8.0, 1.0, 100.0))
            .set("AmpModDepth", rounded(tremulant.real("AmpModDepthPercent"), 18.0, 1.0, 100.0));

        let switch = tremulant.link("ControllingSwitchID");
        if let Some((foreign, generated)) =
            switch.and_then(|s| plan.ids.get("Switch", s).map(|g| (s, g)))
        {
            draft.set("Function", "And").set("SwitchCount", 1).set("Switch001", generated);
            plan.switch_targets
                .entry(foreign)
                .or_default()
                .push(Controlled::Tremulant(id));
        }

        match tremulant
            .link("AffectedWindCompartmentID")
            .and_then(|c| plan.ids.get("WindchestGroup", c))
        {
            Some(windchest) => by_windchest.entry(windchest).or_default().push(id),
            None => everywhere.push(id),
        }
        drafts.push(draft);
    }

    for (_, windchest) in plan.ids.pairs("WindchestGroup") {
        let list = by_windchest.entry(windchest).or_default();
        list.extend(&everywhere);
        list.sort_unstable();
    }
    (drafts, by_windchest)
}

fn rounded(value: Option<f64>, default: f64, min: f64, max: f64) -> i64 {
    value.unwrap_or(default).round().clamp(min, max) as i64
}

pub(crate) fn windchests(plan: &Plan<'_>, tremulants: &BTreeMap<u32, Vec<u32>>) -> Vec<Draft> {
    plan.ids
        .pairs("WindchestGroup")
        .into_iter()
        .map(|(foreign, id)| {
            let compartment = plan.foreign.get("WindCompartment", foreign);
            let name = match compartment {
                Some(compartment) => name_or(compartment.text("Name"), "Windchest", id),
                None => "Main".to_string(),
            };
            let enclosures: Vec<u32> = compartment
                .and_then(|c| c.link("EnclosureID"))
                .and_then(|e| plan.ids.get("Enclosure", e))
                .into_iter()
                .collect();
            let mut draft = Draft::indexed("WindchestGroup", id);
            draft
                .set("Name", name)
                .list("NumberOfEnclosures", "Enclosure", &enclosures)
                .list(
                    "NumberOfTremulants",
                    "Tremulant",
                    tremulants.get(&id).map_or(&[][..], Vec::as_slice),
                );
            draft
        })
        .collect()
}

pub(crate) fn switches(plan: &mut Plan<'_>) -> Vec<Draft> {
    let mut drafts = Vec::new();
    let foreign = plan.foreign;
    for switch in foreign.objects("Switch") {
        let id = plan.ids.assign("Switch", switch.number());
        let mut draft = Draft::indexed("Switch", id);
        draft
            .set("Name", name_or(switch.text("Name"), "Switch", id))
            .set_opt(
                "DefaultToEngaged",
                switch.flag("Default_EngagedIfNotLinked").map(yes_no),
            )
            .set_opt(
                "DefaultInputOutputSwitchAsgnCode",
                switch.code("DefaultInputOutputSwitchAsgnCode"),
            );
        drafts.push(draft);
    }
    drafts
}

/// Switches driving neither a stop nor a tremulant go on the first manual
/// so they stay reachable from the console.
pub(crate) fn attach_free_switches(plan: &mut Plan<'_>) {
    let free: Vec<u32> = plan
        .ids
        .pairs("Switch")
        .into_iter()
        .filter(|(foreign, _)| !plan.switch_targets.contains_key(foreign))
        .map(|(_, id)| id)
        .collect();
    if let Some(manual) = plan.manuals.values_mut().next() {
        manual.switches = free;
    }
}

pub(crate) fn yes_no(value: bool) -> &'static str {
    if value { "Y" } else { "N" }
}
