use crate::types::{Format, HtsgetCapabilities, ServiceInfo, ServiceType};
use axum::Json;

fn info(datatype: Option<&str>, formats: &[Format]) -> ServiceInfo {
    ServiceInfo {
        id: "org.ga4gh.htsget-tickets".to_string(),
        name: "htsget-tickets".to_string(),
        r#type: ServiceType {
            group: "org.ga4gh".to_string(),
            artifact: "htsget".to_string(),
            version: "1.3.0".to_string(),
        },
        description: Some(
            "htsget ticket server slicing variant and alignment files".to_string(),
        ),
        version: env!("CARGO_PKG_VERSION").to_string(),
        htsget: HtsgetCapabilities {
            datatype: datatype.map(str::to_string),
            formats: formats.to_vec(),
            fields_parameter_effective: false,
            tags_parameters_effective: false,
        },
    }
}

/// Service-wide info; each endpoint reports its own datatype.
pub async fn service_info() -> Json<ServiceInfo> {
    Json(info(None, &[Format::Bam, Format::Cram, Format::Vcf, Format::Bcf]))
}

pub async fn reads_service_info() -> Json<ServiceInfo> {
    Json(info(Some("reads"), &[Format::Bam, Format::Cram]))
}

pub async fn variants_service_info() -> Json<ServiceInfo> {
    Json(info(Some("variants"), &[Format::Vcf, Format::Bcf]))
}
