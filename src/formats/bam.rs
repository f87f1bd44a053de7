use super::{ReferenceFilter, SliceRegion, alignment_span, find_index, pick_bound};
use crate::Result;
use crate::types::Bound;
use noodles::bam;
use noodles::sam::alignment::io::Write as _;
use std::fs::File;
use std::path::Path;

const INDEX_EXTENSIONS: &[&str] = &["bai"];

pub fn bound(path: &Path, contig: Option<&str>, bound: Bound) -> Result<u64> {
    // bam::io::Reader::new wraps the file in BGZF internally - don't double-wrap
    let mut reader = File::open(path).map(bam::io::Reader::new)?;
    let header = reader.read_header()?;

    let filter = ReferenceFilter::new(&header, contig);
    if let ReferenceFilter::Missing = filter {
        return Ok(0);
    }

    let spans = reader.records().map(|result| -> Result<Option<(u64, u64)>> {
        let record = result?;
        Ok(alignment_span(&record, &header, filter.id())?)
    });

    pick_bound(spans, bound)
}

pub fn slice(src: &Path, dst: &Path, region: &SliceRegion) -> Result<u64> {
    let mut writer = File::create(dst).map(bam::io::Writer::new)?;
    let mut written = 0;

    let header = match region.contig.as_deref() {
        Some(contig) if find_index(src, INDEX_EXTENSIONS).is_some() => {
            let mut reader = bam::io::indexed_reader::Builder::default().build_from_path(src)?;
            let header = reader.read_header()?;
            writer.write_alignment_header(&header)?;

            let filter = ReferenceFilter::new(&header, Some(contig));
            if filter.id().is_some() && !region.is_empty() {
                let query = reader.query(&header, &region.to_region(contig)?)?;
                for result in query {
                    let record = result?;
                    if region.selects(alignment_span(&record, &header, filter.id())?) {
                        writer.write_alignment_record(&header, &record)?;
                        written += 1;
                    }
                }
            }
            header
        }
        contig => {
            let mut reader = File::open(src).map(bam::io::Reader::new)?;
            let header = reader.read_header()?;
            writer.write_alignment_header(&header)?;

            let filter = ReferenceFilter::new(&header, contig);
            if !matches!(filter, ReferenceFilter::Missing) {
                for result in reader.records() {
                    let record = result?;
                    if region.selects(alignment_span(&record, &header, filter.id())?) {
                        writer.write_alignment_record(&header, &record)?;
                        written += 1;
                    }
                }
            }
            header
        }
    };

    writer.finish(&header)?;
    Ok(written)
}
