// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dataset sorting pass: discover label maps, count, route image bundles.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::classify::{classify, Classification, ClassifierOptions};
use crate::error::Result;
use crate::label::count_label_file;

/// Timestamp format used in output folder names
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Counts printed at the end of a sorting pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortReport {
    pub defect: usize,
    pub fault_free: usize,
    /// Never incremented; kept so reports line up with older runs
    pub background: usize,
    pub ambiguous: usize,
}

impl SortReport {
    /// `[defect, faultfree, background, ambiguous]`
    pub fn as_array(&self) -> [usize; 4] {
        [self.defect, self.fault_free, self.background, self.ambiguous]
    }
}

/// Bucket folders of one sorting pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFolders {
    pub root: PathBuf,
    pub defect: PathBuf,
    pub fault_free: PathBuf,
}

/// Create `<prefix><timestamp>/{defect,faultfree}` under `root`.
///
/// Folders that already exist are reused.
pub fn create_output_folders<Tz: TimeZone>(
    root: impl AsRef<Path>,
    prefix: &str,
    now: &DateTime<Tz>,
) -> Result<OutputFolders>
where
    Tz::Offset: std::fmt::Display,
{
    let out = root
        .as_ref()
        .join(format!("{}{}", prefix, now.format(TIMESTAMP_FORMAT)));
    let folders = OutputFolders {
        defect: out.join("defect"),
        fault_free: out.join("faultfree"),
        root: out,
    };
    for dir in [&folders.defect, &folders.fault_free] {
        match fs::create_dir_all(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => {
                warn!(path = %dir.display(), "Output folder already exists");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(folders)
}

/// All label maps below `root`, sorted by path.
///
/// Directories whose name starts with the sorted-output prefix are not
/// entered, so a re-run never picks up its own earlier output.
pub fn discover_label_files(
    root: impl AsRef<Path>,
    options: &ClassifierOptions,
) -> Result<Vec<PathBuf>> {
    let prefix = options.sorted_prefix.as_str();
    let mut found = Vec::new();
    let walker = WalkDir::new(root.as_ref())
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !(entry.file_type().is_dir()
                    && !prefix.is_empty()
                    && entry.file_name().to_string_lossy().starts_with(prefix))
        });
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry
                .file_name()
                .to_string_lossy()
                .ends_with(options.label_suffix.as_str())
        {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Files belonging to the same image as `label`, with their name suffixes.
///
/// `7.segmap.png` groups every sibling named `7.*`, e.g. `7.colors.png`;
/// the returned suffixes are `colors.png`, `segmap.png`. Sorted by name.
pub fn label_bundle(label: &Path, label_suffix: &str) -> Result<Vec<(PathBuf, String)>> {
    let name = label
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(label_suffix).unwrap_or(&name);

    // A bare `segmap.png` has no stem to group by
    if stem.is_empty() || !stem.ends_with('.') {
        return Ok(vec![(label.to_path_buf(), label_suffix.to_string())]);
    }

    let dir = label.parent().unwrap_or_else(|| Path::new("."));
    let mut bundle = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if let Some(suffix) = file_name.strip_prefix(stem) {
            if !suffix.is_empty() {
                bundle.push((entry.path(), suffix.to_string()));
            }
        }
    }
    bundle.sort();
    Ok(bundle)
}

/// Sort every image below `root` into a fresh timestamped output folder.
///
/// Label maps are decoded and counted in parallel; routing runs in discovery
/// order so bucket numbering is deterministic. Files are copied, never moved.
/// Ambiguous images are only tallied.
pub fn sort_dataset<Tz: TimeZone>(
    root: impl AsRef<Path>,
    options: &ClassifierOptions,
    now: DateTime<Tz>,
) -> Result<SortReport>
where
    Tz::Offset: std::fmt::Display,
{
    let root = root.as_ref();
    let labels = discover_label_files(root, options)?;
    let out = create_output_folders(root, &options.sorted_prefix, &now)?;
    info!(
        labels = labels.len(),
        output = %out.root.display(),
        "Sorting dataset"
    );

    let counts = labels
        .par_iter()
        .map(|path| count_label_file(path))
        .collect::<Result<Vec<_>>>()?;

    let mut report = SortReport::default();
    for (label, counts) in labels.iter().zip(counts) {
        let class = classify(&counts, options.threshold);
        debug!(
            path = %label.display(),
            defect = counts.defect,
            casing = counts.casing,
            background = counts.background,
            ?class,
            "Classified label map"
        );

        let (dir, index) = match class {
            Classification::Defect => (&out.defect, &mut report.defect),
            Classification::FaultFree => (&out.fault_free, &mut report.fault_free),
            Classification::Ambiguous => {
                report.ambiguous += 1;
                continue;
            }
        };
        for (file, suffix) in label_bundle(label, &options.label_suffix)? {
            fs::copy(&file, dir.join(format!("{}.{}", index, suffix)))?;
        }
        *index += 1;
    }

    info!(
        defect = report.defect,
        fault_free = report.fault_free,
        ambiguous = report.ambiguous,
        "Dataset sorted"
    );
    Ok(report)
}
