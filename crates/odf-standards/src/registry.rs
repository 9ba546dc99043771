#![deny(unsafe_code)]

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use serde::Serialize;
use tracing::{debug, info};

use crate::enums::EnumTable;
use crate::error::StandardsError;
use crate::hash::sha256_hex;
use crate::loader::load_schema_set;
use crate::manifest::{Manifest, ManifestFile, Pins};
use crate::schema::ObjectSchema;
use crate::set::SchemaSet;

const MANIFEST_SCHEMA: &str = "odfedit.standards-manifest";

const ROLE_ODF_OBJECTS: &str = "odf_objects";
const ROLE_ODF_ENUMS: &str = "odf_enums";
const ROLE_HAUPTWERK_OBJECTS: &str = "hauptwerk_objects";
const ROLE_HAUPTWERK_ENUMS: &str = "hauptwerk_enums";

const REQUIRED_ROLES: &[&str] = &[
    ROLE_ODF_OBJECTS,
    ROLE_ODF_ENUMS,
    ROLE_HAUPTWERK_OBJECTS,
    ROLE_HAUPTWERK_ENUMS,
];

const ALLOWED_KINDS: &[&str] = &["csv", "toml"];

const BUNDLED_MANIFEST: &str = include_str!("../../../standards/manifest.toml");

/// Schema files compiled into the binary, keyed by manifest path.
const BUNDLED_FILES: &[(&str, &str)] = &[
    (
        "odf/objects.toml",
        include_str!("../../../standards/odf/objects.toml"),
    ),
    ("odf/enums.csv", include_str!("../../../standards/odf/enums.csv")),
    (
        "hauptwerk/objects.toml",
        include_str!("../../../standards/hauptwerk/objects.toml"),
    ),
    (
        "hauptwerk/enums.csv",
        include_str!("../../../standards/hauptwerk/enums.csv"),
    ),
];

static BUNDLED: OnceLock<SchemaRegistry> = OnceLock::new();

#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub standards_dir: Option<PathBuf>,
    pub pins: Pins,
    pub file_count: usize,
    pub odf_type_count: usize,
    pub odf_table_count: usize,
    pub hauptwerk_type_count: usize,
    pub hauptwerk_table_count: usize,
}

/// Process-wide, read-only schema registry: the organ definition format plus
/// the foreign descriptor format read by the converter.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    manifest: Manifest,
    odf: SchemaSet,
    hauptwerk: SchemaSet,
}

impl SchemaRegistry {
    /// The registry built from the compiled-in schema files, loaded on first
    /// use.
    pub fn bundled() -> Result<&'static SchemaRegistry, StandardsError> {
        if let Some(registry) = BUNDLED.get() {
            return Ok(registry);
        }
        let (registry, summary) = Self::load_bundled()?;
        info!(
            odf_types = summary.odf_type_count,
            hauptwerk_types = summary.hauptwerk_type_count,
            "loaded bundled schema registry"
        );
        Ok(BUNDLED.get_or_init(|| registry))
    }

    /// Builds a fresh registry from the compiled-in files, checking each
    /// against its manifest pin.
    pub fn load_bundled() -> Result<(Self, LoadSummary), StandardsError> {
        let manifest_path = PathBuf::from("standards/manifest.toml");
        let manifest: Manifest =
            toml::from_str(BUNDLED_MANIFEST).map_err(|e| StandardsError::Toml {
                path: manifest_path,
                source: e,
            })?;
        validate_header(&manifest)?;
        let files = collect_roles(&manifest)?;

        let read = |role: &str| -> Result<(PathBuf, String), StandardsError> {
            let file = find_role(&files, role)?;
            let contents = BUNDLED_FILES
                .iter()
                .find(|(path, _)| *path == file.path)
                .map(|(_, contents)| *contents)
                .ok_or_else(|| StandardsError::MissingFile {
                    path: PathBuf::from(&file.path),
                })?;
            check_sha(Path::new(&file.path), file, contents.as_bytes())?;
            Ok((PathBuf::from("standards").join(&file.path), contents.to_string()))
        };

        Self::build(manifest, None, read)
    }

    /// Loads an alternative schema directory. Every file listed in its
    /// `manifest.toml` must match its SHA-256 pin, and no unlisted file may
    /// be present.
    pub fn verify_and_load(standards_dir: &Path) -> Result<(Self, LoadSummary), StandardsError> {
        let manifest_path = standards_dir.join("manifest.toml");
        let contents = std::fs::read_to_string(&manifest_path)
            .map_err(|e| StandardsError::io(&manifest_path, e))?;
        let manifest: Manifest = toml::from_str(&contents).map_err(|e| StandardsError::Toml {
            path: manifest_path.clone(),
            source: e,
        })?;

        validate_header(&manifest)?;
        let files = collect_roles(&manifest)?;
        check_no_unexpected_files(&manifest, standards_dir)?;

        let read = |role: &str| -> Result<(PathBuf, String), StandardsError> {
            let file = find_role(&files, role)?;
            let full_path = standards_dir.join(&file.path);
            let bytes = std::fs::read(&full_path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StandardsError::MissingFile {
                        path: full_path.clone(),
                    }
                } else {
                    StandardsError::io(full_path.clone(), e)
                }
            })?;
            check_sha(&full_path, file, &bytes)?;
            let text = String::from_utf8(bytes).map_err(|e| {
                StandardsError::schema(&full_path, format!("not valid UTF-8: {e}"))
            })?;
            Ok((full_path, text))
        };

        Self::build(manifest, Some(standards_dir.to_path_buf()), read)
    }

    fn build(
        manifest: Manifest,
        standards_dir: Option<PathBuf>,
        read: impl Fn(&str) -> Result<(PathBuf, String), StandardsError>,
    ) -> Result<(Self, LoadSummary), StandardsError> {
        let (odf_objects_path, odf_objects) = read(ROLE_ODF_OBJECTS)?;
        let (odf_enums_path, odf_enums) = read(ROLE_ODF_ENUMS)?;
        let odf = load_schema_set(
            &odf_objects_path,
            &odf_objects,
            &odf_enums_path,
            &odf_enums,
            None,
        )?;

        let (hw_objects_path, hw_objects) = read(ROLE_HAUPTWERK_OBJECTS)?;
        let (hw_enums_path, hw_enums) = read(ROLE_HAUPTWERK_ENUMS)?;
        let hauptwerk = load_schema_set(
            &hw_objects_path,
            &hw_objects,
            &hw_enums_path,
            &hw_enums,
            Some(&odf),
        )?;

        let summary = LoadSummary {
            standards_dir,
            pins: manifest.pins.clone(),
            file_count: manifest.files.len(),
            odf_type_count: odf.type_count(),
            odf_table_count: odf.enum_count(),
            hauptwerk_type_count: hauptwerk.type_count(),
            hauptwerk_table_count: hauptwerk.enum_count(),
        };
        debug!(?summary, "schema registry built");

        Ok((
            Self {
                manifest,
                odf,
                hauptwerk,
            },
            summary,
        ))
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Schemas of the organ definition format.
    pub fn odf(&self) -> &SchemaSet {
        &self.odf
    }

    /// Schemas of the foreign sample-set descriptor.
    pub fn hauptwerk(&self) -> &SchemaSet {
        &self.hauptwerk
    }

    pub fn schema_for(&self, type_name: &str) -> Result<&ObjectSchema, StandardsError> {
        self.odf.schema_for(type_name)
    }

    /// Enumeration table by name; organ definition tables take precedence.
    pub fn enum_table(&self, name: &str) -> Option<&EnumTable> {
        self.odf
            .enum_table(name)
            .or_else(|| self.hauptwerk.enum_table(name))
    }
}

fn validate_header(manifest: &Manifest) -> Result<(), StandardsError> {
    if manifest.manifest.schema != MANIFEST_SCHEMA {
        return Err(StandardsError::InvalidManifest {
            message: format!("unsupported schema: {}", manifest.manifest.schema),
        });
    }
    if manifest.manifest.schema_version != 1 {
        return Err(StandardsError::InvalidManifest {
            message: format!(
                "unsupported schema_version: {}",
                manifest.manifest.schema_version
            ),
        });
    }
    Ok(())
}

fn collect_roles(manifest: &Manifest) -> Result<Vec<ManifestFile>, StandardsError> {
    let mut roles: BTreeSet<&str> = BTreeSet::new();
    for file in &manifest.files {
        if !roles.insert(file.role.as_str()) {
            return Err(StandardsError::DuplicateRole {
                role: file.role.clone(),
            });
        }
        if !ALLOWED_KINDS.contains(&file.kind.as_str()) {
            return Err(StandardsError::InvalidManifest {
                message: format!("unsupported kind '{}' for {}", file.kind, file.path),
            });
        }
        validate_sha(&file.sha256, &file.path)?;
        validate_path(&file.path)?;
    }

    for role in REQUIRED_ROLES {
        if !roles.contains(role) {
            return Err(StandardsError::MissingRole {
                role: role.to_string(),
            });
        }
    }

    let mut files = manifest.files.clone();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn find_role<'a>(files: &'a [ManifestFile], role: &str) -> Result<&'a ManifestFile, StandardsError> {
    files
        .iter()
        .find(|f| f.role == role)
        .ok_or_else(|| StandardsError::MissingRole {
            role: role.to_string(),
        })
}

fn check_sha(path: &Path, file: &ManifestFile, bytes: &[u8]) -> Result<(), StandardsError> {
    let actual = sha256_hex(bytes);
    let expected = file.sha256.to_ascii_lowercase();
    if actual != expected {
        return Err(StandardsError::Sha256Mismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn validate_sha(sha: &str, path: &str) -> Result<(), StandardsError> {
    if sha.len() != 64 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(StandardsError::InvalidSha256 {
            path: PathBuf::from(path),
            message: "sha256 must be 64 hex characters".to_string(),
        });
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<PathBuf, StandardsError> {
    if path.contains('\\') {
        return Err(StandardsError::InvalidPath {
            path: PathBuf::from(path),
            message: "manifest path must use '/' separators".to_string(),
        });
    }

    let p = PathBuf::from(path);
    if p.is_absolute() {
        return Err(StandardsError::InvalidPath {
            path: p,
            message: "manifest path must be relative".to_string(),
        });
    }

    if p.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(StandardsError::InvalidPath {
            path: p,
            message: "manifest path must not traverse out of standards/".to_string(),
        });
    }

    Ok(normalize_path(&p))
}

fn check_no_unexpected_files(manifest: &Manifest, standards_dir: &Path) -> Result<(), StandardsError> {
    let listed = manifest
        .files
        .iter()
        .map(|file| validate_path(&file.path))
        .collect::<Result<BTreeSet<PathBuf>, _>>()?;

    for path in list_files_under(standards_dir)? {
        if path == Path::new("manifest.toml") {
            continue;
        }
        if !listed.contains(&normalize_path(&path)) {
            return Err(StandardsError::UnexpectedFile {
                path: standards_dir.join(path),
            });
        }
    }
    Ok(())
}

fn list_files_under(root: &Path) -> Result<BTreeSet<PathBuf>, StandardsError> {
    let mut stack = vec![root.to_path_buf()];
    let mut files = BTreeSet::new();

    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir).map_err(|e| StandardsError::io(&dir, e))? {
            let entry = entry.map_err(|e| StandardsError::io(&dir, e))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                let rel = path
                    .strip_prefix(root)
                    .map_err(|e| StandardsError::InvalidPath {
                        path: path.clone(),
                        message: format!("failed to relativize path: {e}"),
                    })?
                    .to_path_buf();
                files.insert(rel);
            }
        }
    }

    Ok(files)
}

fn normalize_path(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in p.components() {
        match c {
            Component::CurDir => {}
            _ => out.push(c.as_os_str()),
        }
    }
    out
}
