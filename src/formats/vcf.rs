use super::{SliceRegion, find_index, pick_bound, variant_span};
use crate::Result;
use crate::types::Bound;
use noodles::vcf;
use noodles::vcf::variant::io::Write as _;
use std::io::Write as _;
use std::path::Path;

const INDEX_EXTENSIONS: &[&str] = &["tbi", "csi"];

/// Scan the file for the start of its first record or the end of its last.
pub fn bound(path: &Path, contig: Option<&str>, bound: Bound) -> Result<u64> {
    let mut reader = vcf::io::reader::Builder::default().build_from_path(path)?;
    let header = reader.read_header()?;

    let spans = reader.records().map(|result| -> Result<Option<(u64, u64)>> {
        let record = result?;
        Ok(variant_span(&record, &header, contig)?)
    });

    pick_bound(spans, bound)
}

/// Copy the records starting inside `region` into a new VCF at `dst`.
///
/// Compression follows the extension of `dst` (`.vcf.gz` is BGZF).
pub fn slice(src: &Path, dst: &Path, region: &SliceRegion) -> Result<u64> {
    let mut writer = vcf::io::writer::Builder::default().build_from_path(dst)?;
    let mut written = 0;

    match region.contig.as_deref() {
        Some(contig) if find_index(src, INDEX_EXTENSIONS).is_some() => {
            let mut reader = vcf::io::indexed_reader::Builder::default().build_from_path(src)?;
            let header = reader.read_header()?;
            writer.write_variant_header(&header)?;

            if !region.is_empty() && header.contigs().contains_key(contig) {
                let query = reader.query(&header, &region.to_region(contig)?)?;
                for result in query {
                    let record = result?;
                    if region.selects(variant_span(&record, &header, Some(contig))?) {
                        writer.write_variant_record(&header, &record)?;
                        written += 1;
                    }
                }
            }
        }
        contig => {
            let mut reader = vcf::io::reader::Builder::default().build_from_path(src)?;
            let header = reader.read_header()?;
            writer.write_variant_header(&header)?;

            for result in reader.records() {
                let record = result?;
                if region.selects(variant_span(&record, &header, contig)?) {
                    writer.write_variant_record(&header, &record)?;
                    written += 1;
                }
            }
        }
    }

    writer.get_mut().flush()?;
    Ok(written)
}
