//! Clip pools available to a build.
//!
//! A resource directory has one subdirectory per resource id (justice surnames, the advocate
//! pools, and `misc` for filler footage), each containing clip files. Pools are ordered
//! longest clip first.

use crate::build::Error;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Resource id of the shared filler pool.
pub const MISC_RESOURCE: &str = "misc";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub path: PathBuf,
    pub duration: f64,
}

/// A trait for finding the length of a clip file.
pub trait ClipProbe {
    fn duration(&self, path: &Path) -> Result<f64, Error>;
}

/// Probes clip lengths by running `ffprobe`.
pub struct FfprobeProbe {
    pub binary: String,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        FfprobeProbe {
            binary: "ffprobe".to_string(),
        }
    }
}

impl ClipProbe for FfprobeProbe {
    fn duration(&self, path: &Path) -> Result<f64, Error> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .map_err(|e| Error::ProbeError(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(Error::ProbeError(format!(
                "{} failed on `{}`: {}",
                self.binary,
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout.trim().parse::<f64>().map_err(|e| {
            Error::ProbeError(format!(
                "unexpected duration `{}` for `{}`: {}",
                stdout.trim(),
                path.display(),
                e
            ))
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct Catalog {
    pools: BTreeMap<String, Vec<Clip>>,
}

impl Catalog {
    /// Create a catalog from unsorted pools.
    ///
    /// Clips without a positive duration are dropped. The sort is stable, so equal-length clips
    /// keep their given order.
    pub fn new(pools: BTreeMap<String, Vec<Clip>>) -> Catalog {
        let pools = pools
            .into_iter()
            .map(|(resource, clips)| {
                let mut clips: Vec<Clip> = clips
                    .into_iter()
                    .filter(|clip| {
                        if clip.duration > 0.0 {
                            true
                        } else {
                            warn!(
                                "Dropping clip `{}` with duration {}",
                                clip.path.display(),
                                clip.duration
                            );
                            false
                        }
                    })
                    .collect();
                clips.sort_by(|a, b| b.duration.total_cmp(&a.duration));
                (resource, clips)
            })
            .collect();
        Catalog { pools }
    }

    /// Load every subdirectory of `base` as a pool, probing each file for its duration.
    pub fn load_dir(base: &Path, probe: &dyn ClipProbe) -> Result<Catalog, Error> {
        let base_str = base
            .to_str()
            .ok_or_else(|| Error::IOError(format!("non-UTF-8 path `{}`", base.display())))?;
        let pattern = format!("{}/*/*", glob::Pattern::escape(base_str));
        let entries = glob::glob(&pattern)
            .map_err(|e| Error::IOError(format!("bad resource pattern `{}`: {}", pattern, e)))?;

        let mut pools: BTreeMap<String, Vec<Clip>> = BTreeMap::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::IOError(e.to_string()))?;
            if !path.is_file() {
                continue;
            }
            let resource = match path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
            {
                Some(resource) => resource.to_string(),
                None => continue,
            };

            let duration = probe.duration(&path)?;
            trace!("{}: `{}` is {:.3}s", resource, path.display(), duration);
            pools.entry(resource).or_default().push(Clip { path, duration });
        }

        let catalog = Catalog::new(pools);
        for (resource, clips) in catalog.resources() {
            debug!("Loaded {} clips for `{}`", clips.len(), resource);
        }
        Ok(catalog)
    }

    /// Load a JSON manifest of `{resource_id: [{path, duration}]}`.
    ///
    /// Relative clip paths are resolved against the manifest's directory.
    pub fn from_manifest(path: &Path) -> Result<Catalog, Error> {
        let body = std::fs::read_to_string(path)
            .map_err(|e| Error::IOError(format!("failed to read `{}`: {}", path.display(), e)))?;
        let mut pools: BTreeMap<String, Vec<Clip>> = serde_json::from_str(&body)
            .map_err(|e| Error::ParseError(format!("manifest `{}`: {}", path.display(), e)))?;

        if let Some(dir) = path.parent() {
            for clip in pools.values_mut().flatten() {
                if clip.path.is_relative() {
                    clip.path = dir.join(&clip.path);
                }
            }
        }
        Ok(Catalog::new(pools))
    }

    /// Clips for a resource, longest first.
    pub fn pool(&self, resource: &str) -> Result<&[Clip], Error> {
        match self.pools.get(resource) {
            Some(clips) if clips.is_empty() => Err(Error::EmptyPool(resource.to_string())),
            Some(clips) => Ok(clips),
            None => Err(Error::ResourceNotFound(resource.to_string())),
        }
    }

    pub fn misc(&self) -> Result<&[Clip], Error> {
        self.pool(MISC_RESOURCE)
    }

    pub fn has_resource(&self, resource: &str) -> bool {
        self.pools.get(resource).is_some_and(|c| !c.is_empty())
    }

    pub fn resources(&self) -> impl Iterator<Item = (&str, &[Clip])> {
        self.pools.iter().map(|(r, c)| (r.as_str(), c.as_slice()))
    }
}
