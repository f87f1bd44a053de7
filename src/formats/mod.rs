//! Format-specific record access using noodles.
//!
//! Every format module exposes the same two operations:
//!
//! - `bound` - 0-based start of the first record or exclusive end of the
//!   last record, optionally restricted to one contig
//! - `slice` - copy the header and the records starting inside a region into
//!   a new file of the same format
//!
//! # Supported Formats
//!
//! - [`vcf`] - VCF, plain or BGZF-compressed (`.tbi`/`.csi` used when present)
//! - [`bcf`] - BCF (`.csi` used when present)
//! - [`bam`] - BAM (`.bai` used when present)
//! - [`cram`] - CRAM (always scanned, decoded against a [`Reference`])
//!
//! Coordinates here are 0-based with exclusive ends; noodles positions are
//! 1-based and inclusive.
//!
//! A record belongs to the region holding its start position, so adjacent
//! regions `[a, b)` and `[b, c)` never return the same record.

pub mod bam;
pub mod bcf;
pub mod cram;
pub mod vcf;

use crate::types::{Bound, Format};
use crate::{Error, Result};
use noodles::core::{Position, Region};
use noodles::fasta;
use std::io;
use std::path::{Path, PathBuf};

/// Reference sequences for CRAM decoding. Empty unless a FASTA is configured.
pub type Reference = fasta::Repository;

/// Open the indexed FASTA at `path`, or an empty reference without one.
pub fn load_reference(path: Option<&Path>) -> Result<Reference> {
    let Some(path) = path else {
        return Ok(Reference::default());
    };
    let reader = fasta::io::indexed_reader::Builder::default().build_from_path(path)?;
    tracing::info!("using reference sequences from {}", path.display());
    Ok(Reference::new(fasta::repository::adapters::IndexedReader::new(
        reader,
    )))
}

/// Records to copy into a slice. Without a contig the position bounds apply
/// on every reference sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceRegion {
    pub contig: Option<String>,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl SliceRegion {
    /// Whether a record starting at `start` falls inside the region.
    pub fn includes(&self, start: u64) -> bool {
        start >= self.start.unwrap_or(0) && self.end.is_none_or(|end| start < end)
    }

    /// Whether to copy a record with the given span. Records without a span
    /// (unplaced, or on another contig) are only kept for whole-file copies.
    pub fn selects(&self, span: Option<(u64, u64)>) -> bool {
        match span {
            Some((start, _)) => self.includes(start),
            None => self.is_whole_file(),
        }
    }

    pub fn is_whole_file(&self) -> bool {
        self.contig.is_none() && self.start.is_none() && self.end.is_none()
    }

    /// True when no record can overlap, e.g. an empty `[0, 0)` request.
    pub fn is_empty(&self) -> bool {
        self.end.is_some_and(|end| end <= self.start.unwrap_or(0))
    }

    /// Region for an indexed query on `contig`. The query may return records
    /// starting before the region; callers filter with [`Self::selects`].
    fn to_region(&self, contig: &str) -> Result<Region> {
        let start = self
            .start
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| Error::BadRequest("start is out of range".to_string()))?;
        let start = to_position(start)?;
        let region = match self.end {
            Some(end) => Region::new(contig, start..=to_position(end)?),
            None => Region::new(contig, start..),
        };
        Ok(region)
    }
}

fn to_position(n: u64) -> Result<Position> {
    usize::try_from(n)
        .ok()
        .and_then(|n| Position::try_from(n).ok())
        .ok_or_else(|| Error::BadRequest(format!("invalid position: {}", n)))
}

/// Start of the first span (`Start`) or end of the last span (`End`),
/// skipping `None` items. 0 when there are no spans.
pub(crate) fn pick_bound<I>(spans: I, bound: Bound) -> Result<u64>
where
    I: Iterator<Item = Result<Option<(u64, u64)>>>,
{
    let mut found = 0;
    for span in spans {
        let Some((start, end)) = span? else {
            continue;
        };
        match bound {
            Bound::Start => return Ok(start),
            Bound::End => found = end,
        }
    }
    Ok(found)
}

/// Contig and 0-based span of a variant, or `None` if it is filtered out.
pub(crate) fn variant_span<R>(
    record: &R,
    header: &noodles::vcf::Header,
    contig: Option<&str>,
) -> io::Result<Option<(u64, u64)>>
where
    R: noodles::vcf::variant::Record,
{
    if let Some(contig) = contig {
        if record.reference_sequence_name(header)? != contig {
            return Ok(None);
        }
    }

    let Some(start) = record.variant_start().transpose()? else {
        return Ok(None);
    };
    let end = record.variant_end(header)?;

    Ok(Some((start.get() as u64 - 1, end.get() as u64)))
}

/// 0-based span of an alignment on `reference_id`, or `None` if unplaced
/// or on another reference.
pub(crate) fn alignment_span<R>(
    record: &R,
    header: &noodles::sam::Header,
    reference_id: Option<usize>,
) -> io::Result<Option<(u64, u64)>>
where
    R: noodles::sam::alignment::Record,
{
    if let Some(id) = reference_id {
        match record.reference_sequence_id(header).transpose()? {
            Some(record_id) if record_id == id => {}
            _ => return Ok(None),
        }
    }

    let Some(start) = record.alignment_start().transpose()? else {
        return Ok(None);
    };
    let end = record.alignment_end().transpose()?.unwrap_or(start);

    Ok(Some((start.get() as u64 - 1, end.get() as u64)))
}

/// Index of `contig` in a SAM header.
pub(crate) enum ReferenceFilter {
    All,
    Only(usize),
    Missing,
}

impl ReferenceFilter {
    pub(crate) fn new(header: &noodles::sam::Header, contig: Option<&str>) -> Self {
        match contig {
            None => ReferenceFilter::All,
            Some(name) => header
                .reference_sequences()
                .get_index_of(name.as_bytes())
                .map_or(ReferenceFilter::Missing, ReferenceFilter::Only),
        }
    }

    pub(crate) fn id(&self) -> Option<usize> {
        match self {
            ReferenceFilter::Only(id) => Some(*id),
            ReferenceFilter::All | ReferenceFilter::Missing => None,
        }
    }
}

/// First existing sibling index, checking `<file>.<ext>` for each extension.
pub(crate) fn find_index(path: &Path, extensions: &[&str]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| PathBuf::from(format!("{}.{}", path.display(), ext)))
        .find(|candidate| candidate.exists())
}

/// Name of `contig` as stored in files of `format`.
///
/// Alignment files name their references `chr<N>` while requests and
/// variant files use the bare name.
pub fn contig_name(format: Format, contig: &str) -> String {
    if format.is_reads() {
        format!("chr{}", contig)
    } else {
        contig.to_string()
    }
}

/// Inferred bound of `path`: the 0-based start of its first record or the
/// exclusive end of its last record.
pub fn read_bound(
    format: Format,
    path: &Path,
    contig: Option<&str>,
    bound: Bound,
    reference: &Reference,
) -> Result<u64> {
    match format {
        Format::Vcf => vcf::bound(path, contig, bound),
        Format::Bcf => bcf::bound(path, contig, bound),
        Format::Bam => bam::bound(path, contig, bound),
        Format::Cram => cram::bound(path, contig, bound, reference),
    }
}

/// Copy the header and the records of `src` selected by `region` into `dst`.
/// Returns the number of records written.
pub fn write_slice(
    format: Format,
    src: &Path,
    dst: &Path,
    region: &SliceRegion,
    reference: &Reference,
) -> Result<u64> {
    let written = match format {
        Format::Vcf => vcf::slice(src, dst, region)?,
        Format::Bcf => bcf::slice(src, dst, region)?,
        Format::Bam => bam::slice(src, dst, region)?,
        Format::Cram => cram::slice(src, dst, region, reference)?,
    };
    tracing::debug!("wrote {} {} records from {}", written, format, src.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(start: Option<u64>, end: Option<u64>) -> SliceRegion {
        SliceRegion {
            contig: Some("1".to_string()),
            start,
            end,
        }
    }

    #[test]
    fn test_includes_start_position() {
        let r = region(Some(100), Some(200));
        assert!(r.includes(100));
        assert!(r.includes(199));
        assert!(!r.includes(200));
        assert!(!r.includes(99));
        assert!(region(None, None).includes(0));
        assert!(region(Some(10), None).includes(1_000_000));
    }

    #[test]
    fn test_adjacent_regions_partition_records() {
        let starts = [0, 99, 100, 150, 199, 200, 250];
        let left = region(Some(0), Some(100));
        let middle = region(Some(100), Some(200));
        let right = region(Some(200), Some(251));
        for start in starts {
            let hits = [&left, &middle, &right]
                .iter()
                .filter(|r| r.includes(start))
                .count();
            assert_eq!(hits, 1, "record at {} selected {} times", start, hits);
        }
    }

    #[test]
    fn test_selects_unplaced_only_for_whole_file() {
        assert!(SliceRegion::default().selects(None));
        assert!(!region(None, None).selects(None));
        let positional = SliceRegion {
            contig: None,
            start: Some(0),
            end: Some(10),
        };
        assert!(!positional.selects(None));
        assert!(positional.selects(Some((5, 500))));
    }

    #[test]
    fn test_is_empty() {
        assert!(region(Some(0), Some(0)).is_empty());
        assert!(!region(Some(0), Some(1)).is_empty());
        assert!(!region(None, None).is_empty());
    }

    #[test]
    fn test_pick_bound() {
        let spans = || vec![Ok(None), Ok(Some((5, 6))), Ok(None), Ok(Some((9, 19))), Ok(None)];
        assert_eq!(pick_bound(spans().into_iter(), Bound::Start).unwrap(), 5);
        assert_eq!(pick_bound(spans().into_iter(), Bound::End).unwrap(), 19);
        assert_eq!(pick_bound(std::iter::empty(), Bound::End).unwrap(), 0);
    }

    #[test]
    fn test_contig_name() {
        assert_eq!(contig_name(Format::Bam, "21"), "chr21");
        assert_eq!(contig_name(Format::Cram, "X"), "chrX");
        assert_eq!(contig_name(Format::Vcf, "21"), "21");
    }

    #[test]
    fn test_to_region() {
        let region = region(Some(0), Some(500)).to_region("chr1").unwrap();
        assert_eq!(region.to_string(), "chr1:1-500");
    }

    #[test]
    fn test_load_reference_without_path_is_empty() {
        assert!(load_reference(None).unwrap().is_empty());
    }

    #[test]
    fn test_load_reference_requires_fai() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.fa");
        std::fs::write(&path, ">chr1\nACGT\n").unwrap();
        assert!(matches!(load_reference(Some(&path)), Err(Error::Io(_))));

        std::fs::write(dir.path().join("ref.fa.fai"), "chr1\t4\t6\t4\t5\n").unwrap();
        let reference = load_reference(Some(&path)).unwrap();
        let sequence = reference.get(b"chr1").unwrap().unwrap();
        assert_eq!(sequence.as_ref(), b"ACGT");
    }

    #[test]
    fn test_to_region_rejects_overflowing_start() {
        let result = region(Some(u64::MAX), Some(u64::MAX)).to_region("chr1");
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }
}
