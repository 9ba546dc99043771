//! Ranks and their pipes, sample paths and tuning.

use std::collections::BTreeMap;

use odf_model::OrganObject;
use tracing::debug;

use crate::emit::Draft;
use crate::foreign::{Fields, ForeignOrgan};
use crate::pitch::{MAX_OFFSET_CENTS, SamplePitch, format_real, offset_cents};
use crate::plan::{Plan, RankPlan, name_or};

const MAX_PIPES: i64 = 192;
const PACKAGE_DIR: &str = "OrganInstallationPackages";

type Grouped<'f> = BTreeMap<u32, Vec<&'f OrganObject>>;

/// Foreign pipe tables grouped by their owner.
struct PipeTables<'f> {
    pipes_by_rank: Grouped<'f>,
    layers_by_pipe: Grouped<'f>,
    attacks_by_layer: Grouped<'f>,
    releases_by_layer: Grouped<'f>,
}

fn group_by<'f>(objects: Vec<&'f OrganObject>, link: &str) -> Grouped<'f> {
    let mut grouped: Grouped<'f> = BTreeMap::new();
    for object in objects {
        if let Some(owner) = object.link(link) {
            grouped.entry(owner).or_default().push(object);
        }
    }
    grouped
}

impl<'f> PipeTables<'f> {
    fn new(foreign: &'f ForeignOrgan) -> Self {
        Self {
            pipes_by_rank: group_by(foreign.objects("Pipe_SoundEngine01"), "RankID"),
            layers_by_pipe: group_by(foreign.objects("Pipe_SoundEngine01_Layer"), "PipeID"),
            attacks_by_layer: group_by(foreign.objects("Pipe_SoundEngine01_AttackSample"), "LayerID"),
            releases_by_layer: group_by(foreign.objects("Pipe_SoundEngine01_ReleaseSample"), "LayerID"),
        }
    }

    fn get<'a>(grouped: &'a Grouped<'f>, owner: u32) -> &'a [&'f OrganObject] {
        grouped.get(&owner).map_or(&[][..], Vec::as_slice)
    }
}

#[derive(Debug, Clone)]
struct PipeSamples {
    note: i64,
    attacks: Vec<String>,
    releases: Vec<String>,
    gain: Option<f64>,
    tuning: f64,
    harmonic: Option<f64>,
    windchest: Option<u32>,
}

pub(crate) fn ranks(plan: &mut Plan<'_>) -> Vec<Draft> {
    let foreign = plan.foreign;
    let tables = PipeTables::new(foreign);
    let mut drafts = Vec::new();

    for rank in foreign.objects("Rank") {
        let harmonic = rank.real("HarmonicNumber").unwrap_or(8.0);
        let mut pipes: BTreeMap<i64, PipeSamples> = BTreeMap::new();
        for pipe in PipeTables::get(&tables.pipes_by_rank, rank.number()) {
            let label = format!("Pipe {}", pipe.number());
            match pipe_samples(plan, &tables, pipe, harmonic) {
                Ok(samples) if pipes.contains_key(&samples.note) => {
                    plan.skip(label, format!("note {} already has a pipe in rank {}", samples.note, rank.number()));
                }
                Ok(samples) => {
                    pipes.insert(samples.note, samples);
                }
                Err(reason) => plan.skip(label, reason),
            }
        }

        let Some(&first_note) = pipes.keys().next() else {
            plan.skip(format!("Rank {}", rank.number()), "no pipe could be converted".to_string());
            continue;
        };
        let beyond: Vec<i64> = pipes.range(first_note + MAX_PIPES..).map(|(&note, _)| note).collect();
        if !beyond.is_empty() {
            plan.skip(
                format!("Rank {}", rank.number()),
                format!("{} pipes above note {} exceed {MAX_PIPES} logical pipes", beyond.len(), first_note + MAX_PIPES - 1),
            );
            for note in beyond {
                pipes.remove(&note);
            }
        }
        let last_note = pipes.keys().next_back().copied().unwrap_or(first_note);
        let pipe_count = last_note - first_note + 1;

        let id = plan.ids.assign("Rank", rank.number());
        let windchest = rank
            .link("WindCompartmentID")
            .and_then(|c| plan.ids.get("WindchestGroup", c))
            .or_else(|| pipes.values().find_map(|pipe| pipe.windchest))
            .unwrap_or(1);

        let mut draft = Draft::indexed("Rank", id);
        draft
            .set("Name", name_or(rank.text("Name"), "Rank", id))
            .set("FirstMidiNoteNumber", first_note)
            .set("WindchestGroup", windchest)
            .set("Percussive", "N")
            .set_opt("AmplitudeLevel", rank.real("AmplitudeLevelPercent").map(format_real))
            .set_opt("HarmonicNumber", (harmonic != 8.0).then(|| format_real(harmonic)))
            .set("NumberOfLogicalPipes", pipe_count);
        for n in 1..=pipe_count {
            let key = format!("Pipe{n:03}");
            match pipes.get(&(first_note + n - 1)) {
                Some(pipe) => write_pipe(&mut draft, &key, pipe, windchest),
                None => {
                    draft.set(key, "EMPTY");
                }
            }
        }
        debug!(rank = id, pipes = pipes.len(), pipe_count, "converted rank");
        plan.ranks.insert(id, RankPlan { first_note, pipe_count });
        drafts.push(draft);
    }
    drafts
}

fn write_pipe(draft: &mut Draft, key: &str, pipe: &PipeSamples, rank_windchest: u32) {
    let (first, extra) = match pipe.attacks.split_first() {
        Some(split) => split,
        None => return,
    };
    draft
        .set(key, first)
        .set_opt(&format!("{key}Gain"), pipe.gain.map(format_real))
        .set_opt(&format!("{key}PitchTuning"), (pipe.tuning != 0.0).then(|| format_real(pipe.tuning)))
        .set_opt(&format!("{key}HarmonicNumber"), pipe.harmonic.map(format_real))
        .set_opt(
            &format!("{key}WindchestGroup"),
            pipe.windchest.filter(|&w| w != rank_windchest),
        );
    if !pipe.releases.is_empty() {
        draft.set(format!("{key}LoadRelease"), "N");
    }
    if !extra.is_empty() {
        draft.list(&format!("{key}AttackCount"), &format!("{key}Attack"), extra);
    }
    if !pipe.releases.is_empty() {
        draft.list(&format!("{key}ReleaseCount"), &format!("{key}Release"), &pipe.releases);
    }
}

fn pipe_samples(
    plan: &Plan<'_>,
    tables: &PipeTables<'_>,
    pipe: &OrganObject,
    rank_harmonic: f64,
) -> Result<PipeSamples, String> {
    let note = pipe
        .integer("NormalMIDINoteNumber")
        .ok_or_else(|| "has no MIDI note".to_string())?;
    let layer = PipeTables::get(&tables.layers_by_pipe, pipe.number())
        .first()
        .ok_or_else(|| "has no layer".to_string())?;

    let attack_samples = samples_of(plan.foreign, PipeTables::get(&tables.attacks_by_layer, layer.number()))?;
    let release_samples = samples_of(plan.foreign, PipeTables::get(&tables.releases_by_layer, layer.number()))?;
    let Some(sample) = attack_samples.first() else {
        return Err("has no attack sample".to_string());
    };
    let attacks = attack_samples.iter().map(|s| sample_path(s)).collect::<Result<Vec<_>, _>>()?;
    let releases = release_samples.iter().map(|s| sample_path(s)).collect::<Result<Vec<_>, _>>()?;

    let method = sample
        .code("Pitch_SpecificationMethodCode")
        .or_else(|| pipe.code("Pitch_SpecificationMethodCode"))
        .unwrap_or("1");
    let pitch = match method {
        "2" => SamplePitch::Frequency(
            sample
                .real("Pitch_ExactSamplePitch")
                .filter(|&frequency| frequency.is_finite() && frequency > 0.0)
                .ok_or_else(|| format!("sample {} gives no exact pitch", sample.number()))?,
        ),
        "3" => SamplePitch::Harmonic(
            pipe.real("Pitch_RankBasePitch64ftHarmonicNum")
                .unwrap_or(rank_harmonic),
        ),
        _ => SamplePitch::Note(sample.integer("Pitch_NormalMIDINoteNumber").unwrap_or(note)),
    };
    let tuning = offset_cents(note, pitch, rank_harmonic);
    if !tuning.is_finite() {
        return Err("pitch offset cannot be computed".to_string());
    }
    if tuning.abs() > MAX_OFFSET_CENTS {
        return Err(format!(
            "pitch offset of {} cents is more than an octave",
            format_real(tuning)
        ));
    }

    Ok(PipeSamples {
        note,
        attacks,
        releases,
        gain: layer.real("AmpLvl_LevelAdjustDecibels").filter(|&gain| gain != 0.0),
        tuning,
        harmonic: match pitch {
            SamplePitch::Harmonic(h) if h != rank_harmonic => Some(h),
            _ => None,
        },
        windchest: pipe
            .link("WindSupply_SourceWindCompartmentID")
            .and_then(|c| plan.ids.get("WindchestGroup", c)),
    })
}

fn samples_of<'f>(foreign: &'f ForeignOrgan, links: &[&OrganObject]) -> Result<Vec<&'f OrganObject>, String> {
    links
        .iter()
        .map(|link| {
            let id = link.link("SampleID").unwrap_or(0);
            foreign
                .get("Sample", id)
                .ok_or_else(|| format!("sample {id} is missing"))
        })
        .collect()
}

/// Path of a sample relative to the organ directory, `\`-separated.
fn sample_path(sample: &OrganObject) -> Result<String, String> {
    let file = sample
        .text("SampleFilename")
        .ok_or_else(|| format!("sample {} has no file name", sample.number()))?;
    let lower = file.to_ascii_lowercase();
    if !(lower.ends_with(".wav") || lower.ends_with(".wv")) {
        return Err(format!("sample file {file} is not a .wav or .wv file"));
    }
    let file = file.replace('/', "\\");
    Ok(match sample.integer("InstallationPackageID") {
        Some(package) => format!("{PACKAGE_DIR}\\{package:06}\\{file}"),
        None => file,
    })
}
