use super::{SliceRegion, find_index, pick_bound, variant_span};
use crate::Result;
use crate::types::Bound;
use noodles::bcf;
use noodles::vcf::variant::io::Write as _;
use std::fs::File;
use std::path::Path;

const INDEX_EXTENSIONS: &[&str] = &["csi"];

pub fn bound(path: &Path, contig: Option<&str>, bound: Bound) -> Result<u64> {
    let mut reader = File::open(path).map(bcf::io::Reader::new)?;
    let header = reader.read_header()?;

    let spans = reader.records().map(|result| -> Result<Option<(u64, u64)>> {
        let record = result?;
        Ok(variant_span(&record, &header, contig)?)
    });

    pick_bound(spans, bound)
}

pub fn slice(src: &Path, dst: &Path, region: &SliceRegion) -> Result<u64> {
    let mut writer = File::create(dst).map(bcf::io::Writer::new)?;
    let mut written = 0;

    match region.contig.as_deref() {
        Some(contig) if find_index(src, INDEX_EXTENSIONS).is_some() => {
            let mut reader = bcf::io::indexed_reader::Builder::default().build_from_path(src)?;
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
            let mut reader = File::open(src).map(bcf::io::Reader::new)?;
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

    writer.try_finish()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::vcf::tests::write_sample;
    use noodles::vcf;
    use std::path::PathBuf;

    fn write_sample_bcf(dir: &Path) -> PathBuf {
        let vcf_path = write_sample(dir);
        let mut reader = vcf::io::reader::Builder::default()
            .build_from_path(&vcf_path)
            .unwrap();
        let header = reader.read_header().unwrap();

        let path = dir.join("sample.bcf");
        let mut writer = File::create(&path).map(bcf::io::Writer::new).unwrap();
        writer.write_variant_header(&header).unwrap();
        for result in reader.records() {
            writer
                .write_variant_record(&header, &result.unwrap())
                .unwrap();
        }
        writer.try_finish().unwrap();
        path
    }

    #[test]
    fn test_bound() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample_bcf(dir.path());

        assert_eq!(bound(&path, None, Bound::Start).unwrap(), 100);
        assert_eq!(bound(&path, Some("1"), Bound::End).unwrap(), 2601);
    }

    #[test]
    fn test_slice_range() {
        let dir = tempfile::tempdir().unwrap();
        let src = write_sample_bcf(dir.path());
        let dst = dir.path().join("out.bcf");
        let region = SliceRegion {
            contig: Some("2".to_string()),
            start: Some(0),
            end: Some(100),
        };

        assert_eq!(slice(&src, &dst, &region).unwrap(), 1);
        assert_eq!(bound(&dst, None, Bound::Start).unwrap(), 50);
        assert_eq!(bound(&dst, None, Bound::End).unwrap(), 51);
    }
}
