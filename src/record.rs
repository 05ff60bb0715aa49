use serde::Serialize;

/// Placeholder written for every field the extractors could not resolve.
pub const NOT_FOUND: &str = "not found";

pub const HEADER: [&str; 11] = [
    "Identifier",
    "Name",
    "Status",
    "Operation Period",
    "Trade Name",
    "Address",
    "Legal Nature",
    "Capital",
    "Email",
    "Phone",
    "URL",
];

/// One output row per registry identifier. Every field is always present;
/// unresolved ones hold [`NOT_FOUND`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    /// Raw registry key used to build the URL. Not a sheet column, but kept
    /// in JSON output so records stay keyed.
    pub identifier: String,
    pub formatted_identifier: String,
    pub legal_name: String,
    pub status: String,
    pub operation_period: String,
    pub trade_name: String,
    pub address: String,
    pub legal_nature: String,
    pub capital_social: String,
    pub email: String,
    pub phone: String,
    pub source_url: String,
}

impl CompanyRecord {
    /// Record for a page that never produced anything usable.
    pub fn unresolved(identifier: &str, source_url: &str) -> Self {
        let nf = || NOT_FOUND.to_string();
        CompanyRecord {
            identifier: identifier.to_string(),
            formatted_identifier: nf(),
            legal_name: nf(),
            status: nf(),
            operation_period: nf(),
            trade_name: nf(),
            address: nf(),
            legal_nature: nf(),
            capital_social: nf(),
            email: nf(),
            phone: nf(),
            source_url: source_url.to_string(),
        }
    }

    /// Columns in [`HEADER`] order.
    pub fn to_row(&self) -> [&str; 11] {
        [
            self.formatted_identifier.as_str(),
            self.legal_name.as_str(),
            self.status.as_str(),
            self.operation_period.as_str(),
            self.trade_name.as_str(),
            self.address.as_str(),
            self.legal_nature.as_str(),
            self.capital_social.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
            self.source_url.as_str(),
        ]
    }

    pub fn unresolved_count(&self) -> usize {
        self.to_row().iter().filter(|v| **v == NOT_FOUND).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_record_is_all_sentinel_except_url() {
        let r = CompanyRecord::unresolved("47703730000112", "https://cnpja.com/office/47703730000112");
        let row = r.to_row();
        assert_eq!(row.len(), HEADER.len());
        assert!(row[..10].iter().all(|v| *v == NOT_FOUND));
        assert_eq!(row[10], "https://cnpja.com/office/47703730000112");
        assert_eq!(r.unresolved_count(), 10);
    }

    #[test]
    fn row_follows_header_order() {
        let mut r = CompanyRecord::unresolved("1", "u");
        r.formatted_identifier = "cnpj".into();
        r.operation_period = "period".into();
        r.phone = "phone".into();
        let row = r.to_row();
        assert_eq!(row[HEADER.iter().position(|h| *h == "Identifier").unwrap()], "cnpj");
        assert_eq!(row[HEADER.iter().position(|h| *h == "Operation Period").unwrap()], "period");
        assert_eq!(row[HEADER.iter().position(|h| *h == "Phone").unwrap()], "phone");
    }

    #[test]
    fn json_keeps_the_raw_identifier() {
        let mut r = CompanyRecord::unresolved("47703730000112", "u");
        r.formatted_identifier = "47.703.730/0001-12".into();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["identifier"], "47703730000112");
        assert_eq!(json["formattedIdentifier"], "47.703.730/0001-12");
    }
}
