//! Hauptwerk descriptor to organ definition conversion.

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use odf_ingest::decode;
use odf_model::{
    BodyLine, Diagnostic, Document, LineEnding, ObjectId, TextEncoding, TextLine,
};
use odf_standards::{SchemaRegistry, SchemaSet};
use tracing::{info, info_span};

use crate::combinations::combinations;
use crate::emit::Draft;
use crate::error::ConvertError;
use crate::foreign::{Fields, ForeignOrgan};
use crate::ids::IdMap;
use crate::options::ConversionOptions;
use crate::plan::Plan;
use crate::ranks::ranks;
use crate::stops::stops;
use crate::structure::{
    attach_free_switches, enclosures, keyboards, manual_drafts, switches, tremulants,
    windchest_ids, windchests,
};
use crate::xml::read_records;

/// A generated document and what was left behind on the way.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub document: Document,
    /// `ConversionSkipped` warnings, in the order objects were considered.
    pub diagnostics: Vec<Diagnostic>,
    /// Foreign identifiers to generated section indices.
    pub ids: IdMap,
}

/// Converts descriptors into organ definitions typed by the bundled sets.
#[derive(Debug, Clone)]
pub struct Converter<'a> {
    odf: &'a SchemaSet,
    hauptwerk: &'a SchemaSet,
    options: ConversionOptions,
}

impl<'a> Converter<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self::from_sets(registry.odf(), registry.hauptwerk())
    }

    pub fn from_sets(odf: &'a SchemaSet, hauptwerk: &'a SchemaSet) -> Self {
        Self {
            odf,
            hauptwerk,
            options: ConversionOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    pub fn convert_str(&self, xml: &str) -> Result<Conversion, ConvertError> {
        let span = info_span!("convert_descriptor");
        let _guard = span.enter();
        let start = Instant::now();

        let records = read_records(xml)?;
        let record_count = records.len();
        let (foreign, diagnostics) = ForeignOrgan::build(records, self.hauptwerk);
        let conversion = self.generate(&foreign, diagnostics)?;

        info!(
            records = record_count,
            objects = conversion.document.object_count(),
            skipped = conversion.diagnostics.len(),
            duration_ms = start.elapsed().as_millis(),
            "converted descriptor"
        );
        Ok(conversion)
    }

    /// Reads a descriptor file; UTF-8 with or without BOM, else Latin-1.
    pub fn convert_file(&self, path: &Path) -> Result<Conversion, ConvertError> {
        let bytes = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
        let (text, _) = decode(&bytes);
        if self.options.source_name.is_some() {
            return self.convert_str(&text);
        }
        let mut options = self.options.clone();
        options.source_name = path.file_name().map(|name| name.to_string_lossy().into_owned());
        self.clone().with_options(options).convert_str(&text)
    }

    fn generate(
        &self,
        foreign: &ForeignOrgan,
        diagnostics: Vec<Diagnostic>,
    ) -> Result<Conversion, ConvertError> {
        let mut plan = Plan::new(foreign, diagnostics);

        keyboards(&mut plan);
        windchest_ids(&mut plan);
        let enclosure_drafts = enclosures(&mut plan);
        let switch_drafts = switches(&mut plan);
        let (tremulant_drafts, tremulants_by_windchest) = tremulants(&mut plan);
        let rank_drafts = ranks(&mut plan);
        let stop_drafts = stops(&mut plan);
        let (general_drafts, divisional_drafts) = combinations(&mut plan);
        attach_free_switches(&mut plan);
        let windchest_drafts = windchests(&plan, &tremulants_by_windchest);
        let manual_drafts = manual_drafts(&plan);

        let mut document = Document::new(TextEncoding::Utf8 { bom: true }, LineEnding::CrLf);
        for line in self.header_comment() {
            document.push_preamble_line(BodyLine::Comment(TextLine::new(line, LineEnding::CrLf)));
        }
        document.push_preamble_line(BodyLine::Blank(TextLine::new("", LineEnding::CrLf)));

        let drafts = [self.organ(&plan), panel(&plan)]
            .into_iter()
            .chain(manual_drafts)
            .chain(windchest_drafts)
            .chain(enclosure_drafts)
            .chain(tremulant_drafts)
            .chain(switch_drafts)
            .chain(rank_drafts)
            .chain(stop_drafts)
            .chain(general_drafts)
            .chain(divisional_drafts);
        for draft in drafts {
            document.push_object(draft.realise(self.odf)?);
        }

        Ok(Conversion {
            document,
            diagnostics: plan.diagnostics,
            ids: plan.ids,
        })
    }

    fn header_comment(&self) -> Vec<String> {
        let timestamp = self.options.timestamp.unwrap_or_else(Utc::now);
        let mut lines = vec![
            "; GrandOrgue organ definition converted from a Hauptwerk sample set".to_string(),
        ];
        if let Some(source) = &self.options.source_name {
            lines.push(format!("; Source: {source}"));
        }
        lines.push(format!(
            "; Converted by odfedit {} on {}",
            env!("CARGO_PKG_VERSION"),
            timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        lines
    }

    fn organ(&self, plan: &Plan<'_>) -> Draft {
        let general = plan.foreign.singleton("_General");
        let text = |name: &str| general.and_then(|g| g.text(name));
        let name = self
            .options
            .organ_name
            .clone()
            .or_else(|| text("Identification_Name").map(str::to_string))
            .unwrap_or_else(|| "Converted organ".to_string());

        let mut draft = Draft::new("Organ", ObjectId::SINGLETON);
        draft
            .set("ChurchName", name)
            .set("ChurchAddress", text("OrganInfo_Location").unwrap_or_default())
            .set_opt("OrganBuilder", text("OrganInfo_Builders"))
            .set_opt("OrganBuildDate", text("OrganInfo_BuildDate"))
            .set_opt("OrganComments", text("OrganInfo_Comments"))
            .set("HasPedals", "N")
            .set("NumberOfDivisionalCouplers", 0)
            .set("NumberOfEnclosures", plan.ids.count("Enclosure"))
            .set("NumberOfGenerals", plan.ids.count("General"))
            .set("NumberOfManuals", plan.ids.count("Manual"))
            .set("NumberOfPanels", 0)
            .set("NumberOfRanks", plan.ids.count("Rank"))
            .set("NumberOfReversiblePistons", 0)
            .set("NumberOfSwitches", plan.ids.count("Switch"))
            .set("NumberOfTremulants", plan.ids.count("Tremulant"))
            .set("NumberOfWindchestGroups", plan.ids.count("WindchestGroup"));
        draft
    }
}

/// The main panel, with GrandOrgue's default display metrics.
fn panel(plan: &Plan<'_>) -> Draft {
    let name = plan
        .foreign
        .singleton("_General")
        .and_then(|general| general.text("Identification_Name"))
        .unwrap_or("Main panel");
    let mut draft = Draft::indexed("Panel", 0);
    draft.set("Name", name).set("NumberOfGUIElements", 0);
    draft
}

/// Converts descriptor text with the bundled schema sets.
pub fn convert_str(
    xml: &str,
    registry: &SchemaRegistry,
    options: ConversionOptions,
) -> Result<Conversion, ConvertError> {
    Converter::new(registry).with_options(options).convert_str(xml)
}

pub fn convert_file(
    path: &Path,
    registry: &SchemaRegistry,
    options: ConversionOptions,
) -> Result<Conversion, ConvertError> {
    Converter::new(registry).with_options(options).convert_file(path)
}
