//! Range bound inference: filling in a missing start or end from the file.
//!
//! Every call rescans the file; finding the end is a full pass. The inferred
//! end is exclusive, one past the last base of the last record, so a slice
//! ending there still contains that record.

use crate::formats::{self, Reference, contig_name};
use crate::types::{Bound, DataKind, FileRecord};
use crate::{Error, Result};
use std::path::Path;

/// Fails unless `file` holds `kind` records.
pub fn check_kind(file: &FileRecord, kind: DataKind) -> Result<()> {
    if file.format.kind() != kind {
        return Err(Error::UnsupportedFormat(format!(
            "{} is a {} file, not a {} file",
            file.id, file.format, kind
        )));
    }
    Ok(())
}

/// 0-based start of the first record (`Start`) or exclusive end of the last
/// record (`End`) of the file at `path`, restricted to `contig` when one is
/// given. Files without matching records yield 0.
pub fn infer_bound(
    bound: Bound,
    file: &FileRecord,
    path: &Path,
    kind: DataKind,
    contig: Option<&str>,
    reference: &Reference,
) -> Result<u64> {
    check_kind(file, kind)?;

    let contig = contig.map(|c| contig_name(file.format, c));
    let position = formats::read_bound(file.format, path, contig.as_deref(), bound, reference)?;
    tracing::debug!("inferred {:?} of {} as {}", bound, file.id, position);
    Ok(position)
}

/// Fill in whichever of `start`/`end` is missing. Blocking.
pub fn complete_range(
    file: &FileRecord,
    path: &Path,
    kind: DataKind,
    contig: Option<&str>,
    start: Option<u64>,
    end: Option<u64>,
    reference: &Reference,
) -> Result<(u64, u64)> {
    let start = match start {
        Some(start) => start,
        None => infer_bound(Bound::Start, file, path, kind, contig, reference)?,
    };
    let end = match end {
        Some(end) => end,
        None => infer_bound(Bound::End, file, path, kind, contig, reference)?,
    };
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::vcf::tests::write_sample;
    use crate::types::Format;

    fn vcf_record() -> FileRecord {
        FileRecord {
            id: "sample".to_string(),
            extension: ".vcf".to_string(),
            format: Format::Vcf,
            storage_locator: "sample.vcf".to_string(),
        }
    }

    #[test]
    fn test_infer_start_and_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());
        let file = vcf_record();

        let reference = Reference::default();
        let start =
            infer_bound(Bound::Start, &file, &path, DataKind::Variant, None, &reference).unwrap();
        let end =
            infer_bound(Bound::End, &file, &path, DataKind::Variant, None, &reference).unwrap();
        assert_eq!((start, end), (100, 901));
    }

    #[test]
    fn test_infer_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());
        let file = vcf_record();

        let reference = Reference::default();
        let infer = || {
            infer_bound(Bound::End, &file, &path, DataKind::Variant, Some("1"), &reference)
                .unwrap()
        };
        let first = infer();
        assert_eq!(infer(), first);
        assert_eq!(first, 2601);
    }

    #[test]
    fn test_kind_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());

        let result = infer_bound(
            Bound::Start,
            &vcf_record(),
            &path,
            DataKind::Read,
            None,
            &Reference::default(),
        );
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
        assert!(check_kind(&vcf_record(), DataKind::Variant).is_ok());
    }

    #[test]
    fn test_complete_range_keeps_given_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());
        let file = vcf_record();

        let range = complete_range(
            &file,
            &path,
            DataKind::Variant,
            Some("1"),
            Some(500),
            None,
            &Reference::default(),
        )
        .unwrap();
        assert_eq!(range, (500, 2601));
    }
}
