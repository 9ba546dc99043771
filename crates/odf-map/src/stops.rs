//! Stops and the key ranges their ranks cover.

use std::collections::BTreeMap;

use odf_model::OrganObject;
use tracing::debug;

use crate::emit::Draft;
use crate::foreign::Fields;
use crate::plan::{Controlled, ManualPlan, Plan, RankPlan, name_or};

/// Highest key a stop rank may start at.
const MAX_FIRST_ACCESSIBLE_KEY: i64 = 128;

/// Where a rank sits under the keys of a stop, in GrandOrgue numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RankSpan {
    first_pipe: i64,
    pipe_count: i64,
    first_key: i64,
}

/// Maps the division input nodes of a stop-rank row onto keys of `manual`
/// and pipes of `rank`. Nodes below the first key or the first pipe are
/// dropped; `None` when nothing remains or the span starts beyond the
/// highest key a stop rank can address.
fn rank_span(row: &OrganObject, manual: &ManualPlan, rank: RankPlan) -> Option<RankSpan> {
    let shift = row.integer("MIDINoteNumIncrementFromDivisionToRank").unwrap_or(0);
    let mut node = row
        .integer("MIDINoteNumOfFirstMappedDivisionInputNode")
        .unwrap_or(manual.first_note);
    let mut nodes = row
        .integer("NumberOfMappedDivisionInputNodes")
        .unwrap_or(manual.keys);

    let lowest = manual.first_note.max(rank.first_note - shift);
    if node < lowest {
        nodes -= lowest - node;
        node = lowest;
    }
    let first_key = node - manual.first_note + 1;
    let first_pipe = node + shift - rank.first_note + 1;
    let pipe_count = nodes
        .min(rank.pipe_count - first_pipe + 1)
        .min(manual.keys - first_key + 1);
    (pipe_count > 0 && first_key <= MAX_FIRST_ACCESSIBLE_KEY).then_some(RankSpan {
        first_pipe,
        pipe_count,
        first_key,
    })
}

pub(crate) fn stops(plan: &mut Plan<'_>) -> Vec<Draft> {
    let foreign = plan.foreign;
    let mut rows: BTreeMap<u32, Vec<&OrganObject>> = BTreeMap::new();
    for row in foreign.objects("StopRank") {
        if let Some(stop) = row.link("StopID") {
            rows.entry(stop).or_default().push(row);
        }
    }

    let mut drafts = Vec::new();
    for stop in foreign.objects("Stop") {
        let label = format!("Stop {}", stop.number());
        let division = stop.link("DivisionID").unwrap_or(0);
        let Some(manual) = plan.division_manual.get(&division).copied() else {
            plan.skip(label, format!("division {division} is not played from any keyboard"));
            continue;
        };
        let foreign_switch = stop.link("ControllingSwitchID").unwrap_or(0);
        let Some(switch) = plan.ids.get("Switch", foreign_switch) else {
            plan.skip(label, format!("controlling switch {foreign_switch} was not converted"));
            continue;
        };
        let Some(layout) = plan.manuals.get(&manual).cloned() else {
            continue;
        };

        let mut ranks = Vec::new();
        let mut outside = Vec::new();
        for row in rows.get(&stop.number()).map_or(&[][..], Vec::as_slice) {
            let foreign_rank = row.link("RankID").unwrap_or(0);
            let Some(rank) = plan.ids.get("Rank", foreign_rank) else {
                debug!(stop = stop.number(), rank = foreign_rank, "rank was not converted");
                continue;
            };
            let Some(&rank_plan) = plan.ranks.get(&rank) else {
                continue;
            };
            match rank_span(row, &layout, rank_plan) {
                Some(span) => ranks.push((rank, span)),
                None => outside.push(foreign_rank),
            }
        }
        for foreign_rank in outside {
            plan.skip(
                label.clone(),
                format!("rank {foreign_rank} has no pipes under the keys of the stop"),
            );
        }
        if ranks.is_empty() {
            plan.skip(label, "no rank could be converted".to_string());
            continue;
        }

        let id = plan.ids.assign("Stop", stop.number());
        let local = match plan.manuals.get_mut(&manual) {
            Some(entry) => {
                entry.stops.push(id);
                entry.stops.len() as u32
            }
            None => continue,
        };
        plan.switch_targets
            .entry(foreign_switch)
            .or_default()
            .push(Controlled::Stop { manual, local });

        let mut draft = Draft::indexed("Stop", id);
        draft
            .set("Name", name_or(stop.text("Name"), "Stop", id))
            .set("Function", "And")
            .set("SwitchCount", 1)
            .set("Switch001", switch)
            .set("NumberOfRanks", ranks.len())
            .set("FirstAccessiblePipeLogicalKeyNumber", 1)
            .set("NumberOfAccessiblePipes", layout.keys);
        for (n, (rank, span)) in ranks.iter().enumerate() {
            let key = format!("Rank{:03}", n + 1);
            draft
                .set(key.clone(), rank)
                .set(format!("{key}FirstPipeNumber"), span.first_pipe)
                .set(format!("{key}PipeCount"), span.pipe_count)
                .set(format!("{key}FirstAccessibleKeyNumber"), span.first_key);
        }
        drafts.push(draft);
    }
    drafts
}

#[cfg(test)]
mod tests {
    use odf_ingest::make_entry;
    use odf_model::{BodyLine, ObjectId, SectionName};
    use odf_standards::SchemaRegistry;

    use super::*;

    fn row(values: &[(&str, &str)]) -> OrganObject {
        let set = SchemaRegistry::bundled().expect("registry").hauptwerk();
        let schema = set.schema_for("StopRank").expect("StopRank");
        let mut object = OrganObject::new(SectionName::new("StopRank", ObjectId::indexed(1)));
        for (key, value) in values {
            object.push_line(BodyLine::Attribute(make_entry(schema, set, key, value)));
        }
        object
    }

    fn manual() -> ManualPlan {
        ManualPlan {
            keys: 61,
            first_note: 36,
            ..ManualPlan::default()
        }
    }

    #[test]
    fn full_compass_rank() {
        let rank = RankPlan { first_note: 36, pipe_count: 61 };
        let span = rank_span(&row(&[]), &manual(), rank);
        assert_eq!(
            span,
            Some(RankSpan { first_pipe: 1, pipe_count: 61, first_key: 1 })
        );
    }

    #[test]
    fn octave_rank_runs_out_of_pipes() {
        let rank = RankPlan { first_note: 36, pipe_count: 61 };
        let span = rank_span(
            &row(&[("MIDINoteNumIncrementFromDivisionToRank", "12")]),
            &manual(),
            rank,
        );
        assert_eq!(
            span,
            Some(RankSpan { first_pipe: 13, pipe_count: 49, first_key: 1 })
        );
    }

    #[test]
    fn treble_rank_starts_mid_keyboard() {
        let rank = RankPlan { first_note: 60, pipe_count: 37 };
        let span = rank_span(
            &row(&[
                ("MIDINoteNumOfFirstMappedDivisionInputNode", "36"),
                ("NumberOfMappedDivisionInputNodes", "61"),
            ]),
            &manual(),
            rank,
        );
        assert_eq!(
            span,
            Some(RankSpan { first_pipe: 1, pipe_count: 37, first_key: 25 })
        );
    }

    #[test]
    fn spans_cannot_start_beyond_key_128() {
        let wide = ManualPlan {
            keys: 192,
            first_note: 0,
            ..ManualPlan::default()
        };
        let high = RankPlan { first_note: 150, pipe_count: 12 };
        assert_eq!(rank_span(&row(&[]), &wide, high), None);

        let reachable = RankPlan { first_note: 127, pipe_count: 12 };
        assert_eq!(
            rank_span(&row(&[]), &wide, reachable),
            Some(RankSpan { first_pipe: 1, pipe_count: 12, first_key: 128 })
        );
    }

    #[test]
    fn rank_above_the_keyboard_has_no_span() {
        let rank = RankPlan { first_note: 100, pipe_count: 12 };
        assert_eq!(rank_span(&row(&[]), &manual(), rank), None);
    }
}
