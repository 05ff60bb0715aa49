pub mod fallback;
pub mod fragments;
pub mod locators;
pub mod readiness;
pub mod structured;

use tracing::{info, warn};

use crate::browser::PageBackend;
use crate::config::ExtractConfig;
use crate::record::CompanyRecord;
use fallback::FallbackFields;
use readiness::Readiness;
use structured::StructuredFields;

/// How the record for one identifier came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub record: CompanyRecord,
    pub readiness: Readiness,
    pub fallback_used: bool,
}

impl Extraction {
    /// Navigation itself failed; the record is all sentinels.
    pub fn load_failed(&self) -> bool {
        self.readiness == Readiness::NotLoaded
    }
}

/// Load → wait → structured pass → optional fallback pass → record.
pub async fn process_identifier<B: PageBackend>(
    page: &mut B,
    config: &ExtractConfig,
    identifier: &str,
) -> Extraction {
    let url = config.office_url(identifier);

    if let Err(e) = page.navigate(&url).await {
        warn!("Failed to load {}: {}", url, e);
        return Extraction {
            record: CompanyRecord::unresolved(identifier, &url),
            readiness: Readiness::NotLoaded,
            fallback_used: false,
        };
    }

    let readiness = readiness::await_ready(page, &url, config.readiness_timeout).await;
    let structured = structured::extract(page).await;

    // Bulk policy: one missing trigger field replaces all six eligible
    // fields, including ones the structured pass did find. A per-field
    // patch would be more conservative.
    let fallback = if structured.missing_trigger_field() {
        warn!("{}: structured lookup incomplete, using text patterns", identifier);
        Some(run_fallback(page, identifier).await)
    } else {
        None
    };
    let fallback_used = fallback.is_some();

    Extraction {
        record: assemble(identifier, &url, structured, fallback),
        readiness,
        fallback_used,
    }
}

async fn run_fallback<B: PageBackend>(page: &mut B, identifier: &str) -> FallbackFields {
    match page.page_source().await {
        Ok(markup) => fallback::extract(&markup),
        Err(e) => {
            info!("{}: page source unavailable: {}", identifier, e);
            fallback::extract("")
        }
    }
}

/// Merge both passes. Fields outside the fallback set always come from the
/// structured pass.
pub fn assemble(
    identifier: &str,
    url: &str,
    structured: StructuredFields,
    fallback: Option<FallbackFields>,
) -> CompanyRecord {
    let StructuredFields {
        legal_name,
        status,
        formatted_identifier,
        operation_period,
        trade_name,
        address,
        legal_nature,
        capital_social,
        email,
        phone,
    } = structured;

    let (address, capital_social, email, phone, formatted_identifier, operation_period) =
        match fallback {
            Some(f) => (
                f.address,
                f.capital_social,
                f.email,
                f.phone,
                f.formatted_identifier,
                f.operation_period,
            ),
            None => (
                address,
                capital_social,
                email,
                phone,
                formatted_identifier,
                operation_period,
            ),
        };

    CompanyRecord {
        identifier: identifier.to_string(),
        formatted_identifier: formatted_identifier.into_value(),
        legal_name: legal_name.into_value(),
        status: status.into_value(),
        operation_period: operation_period.into_value(),
        trade_name: trade_name.into_value(),
        address: address.into_value(),
        legal_nature: legal_nature.into_value(),
        capital_social: capital_social.into_value(),
        email: email.into_value(),
        phone: phone.into_value(),
        source_url: url.to_string(),
    }
}

// ── Tests ──
