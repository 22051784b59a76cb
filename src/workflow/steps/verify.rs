//! Verify step: re-check a backup against its recorded manifest.
//!
//! Every file recorded at backup time must still exist with its recorded
//! size, and no unrecorded files may have appeared. On top of the manifest
//! comparison, the step resolves the on-disk paths of core catalog
//! relations for the server's configured version and requires them to be
//! present, catching a backup whose tree layout no longer matches the
//! engine's naming rules.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::bus::{node, ParameterBus, Value};
use crate::error::{Error, Result};
use crate::relpath::{relation_path, ForkNumber, RelFileLocator, GLOBALTABLESPACE_OID};
use crate::workflow::steps::{read_manifest, select_backup, MANIFEST_FILE};
use crate::workflow::{OperationContext, StepKind, WorkflowStep};

/// pg_database, the shared catalog every data directory carries.
const PG_DATABASE_OID: u32 = 1262;
/// pg_class, present in every database.
const PG_CLASS_OID: u32 = 1259;

pub struct VerifyStep {
    selected: Option<Selection>,
}

struct Selection {
    label: String,
    root: PathBuf,
    data: PathBuf,
}

impl VerifyStep {
    pub fn create() -> Self {
        Self { selected: None }
    }
}

impl WorkflowStep for VerifyStep {
    fn kind(&self) -> StepKind {
        StepKind::Verify
    }

    /// Resolves the backup to verify and requires its manifest to exist.
    fn setup(
        &mut self,
        ctx: &OperationContext,
        input: &ParameterBus,
        output: &mut ParameterBus,
    ) -> Result<()> {
        let identifier = input
            .require(node::IDENTIFIER)?
            .as_str()
            .ok_or_else(|| Error::InvalidArgument("identifier must be a string".into()))?
            .to_owned();

        let backup_root = ctx.server.backup_root(ctx.base_dir);
        let label = select_backup(&backup_root, &identifier)?;
        let root = backup_root.join(&label);
        let data = root.join("data");

        if !root.join(MANIFEST_FILE).is_file() {
            return Err(Error::InvalidArgument(format!(
                "backup has no manifest: {label}"
            )));
        }

        output.append(node::LABEL, Value::String(label.clone()))?;
        output.append(node::BACKUP_ROOT, Value::Path(root.clone()))?;
        output.append(node::BACKUP_DATA, Value::Path(data.clone()))?;

        self.selected = Some(Selection { label, root, data });
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &OperationContext,
        _input: &ParameterBus,
        _output: &mut ParameterBus,
    ) -> Result<()> {
        let selection = self
            .selected
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("verify executed before setup".into()))?;

        let manifest = read_manifest(&selection.root)?;
        let mut actual = scan_files(&selection.data)?;

        for entry in &manifest {
            match actual.remove(&entry.path) {
                None => {
                    return Err(Error::Verification(format!(
                        "missing file: {}",
                        entry.path
                    )));
                }
                Some(size) if size != entry.size => {
                    return Err(Error::Verification(format!(
                        "size mismatch for {}: recorded {}, found {size}",
                        entry.path, entry.size
                    )));
                }
                Some(_) => {}
            }
        }
        if let Some(extra) = actual.keys().next() {
            return Err(Error::Verification(format!("unrecorded file: {extra}")));
        }

        check_catalog_layout(&selection.data, ctx.server.target_version()?)?;

        debug!(
            "verify complete: {}/{} ({} files)",
            ctx.server.name,
            selection.label,
            manifest.len()
        );
        Ok(())
    }
}

fn scan_files(data: &Path) -> Result<BTreeMap<String, u64>> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(data) {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(data)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let size = entry
            .metadata()
            .map_err(|e| std::io::Error::other(e.to_string()))?
            .len();
        files.insert(relative.to_string_lossy().into_owned(), size);
    }
    Ok(files)
}

/// Require the core catalog relations at the paths the engine's naming
/// rules place them for `version`: pg_database in the global tablespace
/// and pg_class inside every database directory.
fn check_catalog_layout(data: &Path, version: u32) -> Result<()> {
    let shared = RelFileLocator {
        dbnode: 0,
        spcnode: GLOBALTABLESPACE_OID,
        relnode: PG_DATABASE_OID,
        backend: None,
        fork: ForkNumber::Main,
    };
    require_relation(data, &relation_path(&shared, version)?)?;

    let base = data.join("base");
    if !base.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(&base)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let Some(dbnode) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u32>().ok())
        else {
            continue;
        };
        let rel = RelFileLocator::permanent(dbnode, PG_CLASS_OID, ForkNumber::Main);
        require_relation(data, &relation_path(&rel, version)?)?;
    }
    Ok(())
}

/// The relation file may carry a `.gz` suffix when the backup was
/// compressed in place.
fn require_relation(data: &Path, relative: &str) -> Result<()> {
    let plain = data.join(relative);
    let compressed = data.join(format!("{relative}.gz"));
    if plain.is_file() || compressed.is_file() {
        return Ok(());
    }
    Err(Error::Verification(format!(
        "catalog relation missing: {relative}"
    )))
}
