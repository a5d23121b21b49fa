//! Standard operations every service exposes: `get_version` always, and
//! `get_gui_files` when the service is gui-capable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::Compression;
use flate2::write::GzEncoder;
use sy_domain::{Error, Result};
use sy_protocol::Payload;

use crate::operation::{Operation, operation_fn};

pub const GET_VERSION: &str = "get_version";
pub const GET_GUI_FILES: &str = "get_gui_files";

pub(crate) const GET_VERSION_DOC: &str = "\
Get the service version.
Returns: str
";

pub(crate) const GET_GUI_FILES_DOC: &str = "\
Bundle the service's GUI asset directory and return it as binary.
Returns: bytes
";

pub fn version_operation(version: String) -> Arc<dyn Operation> {
    operation_fn(move |_args| {
        let version = version.clone();
        async move { Ok(Payload::Text(version)) }
    })
}

pub fn gui_files_operation(dir: PathBuf) -> Arc<dyn Operation> {
    operation_fn(move |_args| {
        let dir = dir.clone();
        async move {
            let bytes = bundle_dir(&dir)
                .map_err(|e| Error::Handler(format!("gui bundle: {e}")))?;
            Ok(Payload::Binary(bytes))
        }
    })
}

/// tar.gz the asset directory into memory.
pub fn bundle_dir(dir: &Path) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut archive = tar::Builder::new(encoder);
    archive.append_dir_all(".", dir)?;
    let encoder = archive.into_inner()?;
    Ok(encoder.finish()?)
}
