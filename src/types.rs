use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// htsget response envelope
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HtsgetResponse {
    pub htsget: HtsgetResponseBody,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HtsgetResponseBody {
    pub format: Format,
    pub urls: Vec<UrlEntry>,
}

/// A ticket: one URL the client dereferences for a piece of the slice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlEntry {
    pub url: String,
}

/// Data formats served by this service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Format {
    Vcf,
    Bcf,
    Bam,
    Cram,
}

impl Format {
    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Bam => "application/vnd.ga4gh.bam",
            Format::Cram => "application/vnd.ga4gh.cram",
            Format::Vcf => "application/vnd.ga4gh.vcf",
            Format::Bcf => "application/vnd.ga4gh.bcf",
        }
    }

    pub fn index_extension(&self) -> &'static str {
        match self {
            Format::Bam => "bai",
            Format::Cram => "crai",
            Format::Vcf => "tbi",
            Format::Bcf => "csi",
        }
    }

    pub fn kind(&self) -> DataKind {
        match self {
            Format::Bam | Format::Cram => DataKind::Read,
            Format::Vcf | Format::Bcf => DataKind::Variant,
        }
    }

    pub fn is_reads(&self) -> bool {
        self.kind() == DataKind::Read
    }

    pub fn is_variants(&self) -> bool {
        self.kind() == DataKind::Variant
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Format::Vcf => "VCF",
            Format::Bcf => "BCF",
            Format::Bam => "BAM",
            Format::Cram => "CRAM",
        };
        f.write_str(s)
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "VCF" => Ok(Format::Vcf),
            "BCF" => Ok(Format::Bcf),
            "BAM" => Ok(Format::Bam),
            "CRAM" => Ok(Format::Cram),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Which public operation a request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Read,
    Variant,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Read => f.write_str("read"),
            DataKind::Variant => f.write_str("variant"),
        }
    }
}

impl FromStr for DataKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(DataKind::Read),
            "variant" => Ok(DataKind::Variant),
            _ => Err(Error::UnsupportedArgument(format!(
                "kind must be 'read' or 'variant', got '{}'",
                s
            ))),
        }
    }
}

/// End of a range whose coordinate is inferred from the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

impl FromStr for Bound {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "start" => Ok(Bound::Start),
            "end" => Ok(Bound::End),
            _ => Err(Error::UnsupportedArgument(format!(
                "position must be 'start' or 'end', got '{}'",
                s
            ))),
        }
    }
}

/// A resolved genomic file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: String,
    /// File extension including the leading dot (e.g. `.vcf.gz`)
    pub extension: String,
    pub format: Format,
    /// File name under the local files directory
    pub storage_locator: String,
}

impl FileRecord {
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.storage_locator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(FileRecord),
    NotFound,
}

/// Contig and coordinates of a request, after boundary parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinateRange {
    pub contig: Option<String>,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl CoordinateRange {
    pub fn new(contig: Option<String>, start: Option<u64>, end: Option<u64>) -> Self {
        Self {
            contig: normalize_contig(contig),
            start,
            end,
        }
    }

    /// Rejects ranges whose end lies before their start.
    pub fn validate(&self) -> Result<()> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end < start => Err(Error::BadRequest(format!(
                "End index cannot be less than start index (start={}, end={})",
                start, end
            ))),
            _ => Ok(()),
        }
    }
}

/// Query strings carry absent contigs as "None" or an empty value.
fn normalize_contig(contig: Option<String>) -> Option<String> {
    contig.filter(|c| !c.is_empty() && c != "None")
}

/// Query parameters for ticket requests
#[derive(Debug, Deserialize, Default)]
pub struct TicketQuery {
    pub reference_name: Option<String>,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl TicketQuery {
    pub fn into_range(self) -> CoordinateRange {
        CoordinateRange::new(self.reference_name, self.start, self.end)
    }
}

/// Query parameters of the data URLs handed out in tickets
#[derive(Debug, Deserialize)]
pub struct DataQuery {
    pub id: String,
    pub reference_name: Option<String>,
    /// Accepted for compatibility; the resolved format is used instead.
    pub format: Option<String>,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl DataQuery {
    pub fn range(&self) -> CoordinateRange {
        CoordinateRange::new(self.reference_name.clone(), self.start, self.end)
    }
}

/// Service info response (GA4GH service-info spec)
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub id: String,
    pub name: String,
    pub r#type: ServiceType,
    pub description: Option<String>,
    pub version: String,
    pub htsget: HtsgetCapabilities,
}

#[derive(Debug, Serialize)]
pub struct ServiceType {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct HtsgetCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    pub formats: Vec<Format>,
    #[serde(rename = "fieldsParameterEffective")]
    pub fields_parameter_effective: bool,
    #[serde(rename = "tagsParametersEffective")]
    pub tags_parameters_effective: bool,
}
