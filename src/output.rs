use std::collections::{BTreeMap, BTreeSet};
use std::fs::{DirBuilder, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::payload::IconRecord;
use crate::providers::ProviderTable;

#[cfg(unix)]
const DIR_MODE: u32 = 0o750;
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Records keyed by provider display name, in collection order.
pub fn group_by_provider(records: &[IconRecord]) -> BTreeMap<&str, Vec<&IconRecord>> {
    let mut groups: BTreeMap<&str, Vec<&IconRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.provider.as_str()).or_default().push(record);
    }
    groups
}

pub fn create_dir(path: &Path) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder
        .create(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))
}

/// One directory per category code, whether or not any record lands there.
pub fn create_category_dirs(output_dir: &Path, categories: &BTreeSet<String>) -> Result<()> {
    for category in categories {
        create_dir(&output_dir.join(category.to_lowercase()))?;
    }
    Ok(())
}

/// Pretty-printed JSON, owner read/write only.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let file = open_restricted(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .with_context(|| format!("Failed to encode {}", path.display()))?;
    writer.write_all(b"\n")?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn open_restricted(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    options.open(path)
}

/// Write `<dir>/<key>/<key>.json` for every provider group. Stops at the
/// first failure; files already written stay on disk.
pub fn write_provider_files(
    output_dir: &Path,
    groups: &BTreeMap<&str, Vec<&IconRecord>>,
    providers: &ProviderTable,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(groups.len());
    for (provider, records) in groups {
        let key = providers.key(provider);
        let dir = output_dir.join(&key);
        create_dir(&dir)?;
        let path = dir.join(format!("{}.json", key));
        write_json(&path, records)?;
        info!("{}: {} icons", provider, records.len());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::PendingIcon;
    use crate::enrich::EnrichmentResult;
    use crate::heuristics::Heuristics;
    use crate::payload::Assembler;

    fn records() -> Vec<IconRecord> {
        let a = Assembler::new("https://example.test", ProviderTable::default(), Heuristics::default());
        [("AWS", "ec2"), ("GCP", "gcs"), ("AWS", "s3"), ("KUBERNETES", "pod")]
            .iter()
            .map(|(code, title)| {
                let icon = PendingIcon {
                    category: code.to_string(),
                    title: title.to_string(),
                    link: format!("{}%2F{}.svg", code.to_lowercase(), title),
                    display_name: title.to_string(),
                };
                a.build(&icon, &EnrichmentResult::default(), String::new(), "2026-01-01T00:00:00Z")
            })
            .collect()
    }

    #[test]
    fn grouping_keeps_order() {
        let recs = records();
        let groups = group_by_provider(&recs);
        assert_eq!(groups.len(), 3);
        let aws: Vec<&str> = groups["Amazon Web Services"].iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(aws, vec!["aws-ec2", "aws-s3"]);
        assert_eq!(groups["Kubernetes"].len(), 1);
    }

    #[test]
    fn provider_files_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let recs = records();
        let groups = group_by_provider(&recs);
        let written = write_provider_files(tmp.path(), &groups, &ProviderTable::default()).unwrap();

        assert_eq!(written.len(), 3);
        assert!(tmp.path().join("aws/aws.json").exists());
        assert!(tmp.path().join("gcp/gcp.json").exists());
        assert!(tmp.path().join("kubernetes/kubernetes.json").exists());

        let raw = std::fs::read_to_string(tmp.path().join("aws/aws.json")).unwrap();
        let back: Vec<IconRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.len(), 2);
        assert!(raw.starts_with("[\n  {\n    \"id\""), "not 2-space pretty: {}", &raw[..20]);
    }

    #[test]
    fn no_html_escaping() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.json");
        write_json(&path, &vec!["<a href=\"x\">&</a>"]).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("<a href=\\\"x\\\">&</a>"));
    }

    #[test]
    fn overwrites_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.json");
        write_json(&path, &vec!["a much longer first payload"]).unwrap();
        write_json(&path, &vec!["b"]).unwrap();
        let back: Vec<String> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec!["b"]);
    }

    #[cfg(unix)]
    #[test]
    fn restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.json");
        write_json(&path, &Vec::<String>::new()).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn category_dirs_created() {
        let tmp = tempfile::tempdir().unwrap();
        let categories: BTreeSet<String> = ["AWS", "TECH"].iter().map(|s| s.to_string()).collect();
        create_category_dirs(tmp.path(), &categories).unwrap();
        assert!(tmp.path().join("aws").is_dir());
        assert!(tmp.path().join("tech").is_dir());
    }

    #[test]
    fn write_into_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing").join("out.json");
        assert!(write_json(&path, &Vec::<String>::new()).is_err());
    }
}
