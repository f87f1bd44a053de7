use super::{Reference, ReferenceFilter, SliceRegion, alignment_span, pick_bound};
use crate::Result;
use crate::types::Bound;
use noodles::cram;
use noodles::sam::alignment::io::Write as _;
use std::path::Path;

// CRAM containers are decoded record by record; the .crai index is not consulted.
// Mapped records need their reference sequence in `reference`.

fn open(path: &Path, reference: &Reference) -> Result<cram::io::Reader<std::fs::File>> {
    let reader = cram::io::reader::Builder::default()
        .set_reference_sequence_repository(reference.clone())
        .build_from_path(path)?;
    Ok(reader)
}

pub fn bound(path: &Path, contig: Option<&str>, bound: Bound, reference: &Reference) -> Result<u64> {
    let mut reader = open(path, reference)?;
    let header = reader.read_header()?;

    let filter = ReferenceFilter::new(&header, contig);
    if let ReferenceFilter::Missing = filter {
        return Ok(0);
    }

    let spans = reader.records(&header).map(|result| -> Result<Option<(u64, u64)>> {
        let record = result?;
        Ok(alignment_span(&record, &header, filter.id())?)
    });

    pick_bound(spans, bound)
}

pub fn slice(src: &Path, dst: &Path, region: &SliceRegion, reference: &Reference) -> Result<u64> {
    let mut reader = open(src, reference)?;
    let header = reader.read_header()?;

    let mut writer = cram::io::writer::Builder::default()
        .set_reference_sequence_repository(reference.clone())
        .build_from_path(dst)?;
    writer.write_alignment_header(&header)?;

    let mut written = 0;
    let filter = ReferenceFilter::new(&header, region.contig.as_deref());

    if !matches!(filter, ReferenceFilter::Missing) {
        for result in reader.records(&header) {
            let record = result?;
            if region.selects(alignment_span(&record, &header, filter.id())?) {
                writer.write_alignment_record(&header, &record)?;
                written += 1;
            }
        }
    }

    writer.finish(&header)?;
    Ok(written)
}
