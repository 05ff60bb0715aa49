use tracing::debug;

use super::locators::{Field, FIELD_LOCATORS};
use crate::browser::PageBackend;
use crate::record::NOT_FOUND;

/// Outcome of one field lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(String),
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_value(self) -> String {
        match self {
            Lookup::Found(v) => v,
            Lookup::NotFound => NOT_FOUND.to_string(),
        }
    }
}

/// Values from the element-targeted pass, one per located field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredFields {
    pub legal_name: Lookup,
    pub status: Lookup,
    pub formatted_identifier: Lookup,
    pub operation_period: Lookup,
    pub trade_name: Lookup,
    pub address: Lookup,
    pub legal_nature: Lookup,
    pub capital_social: Lookup,
    pub email: Lookup,
    pub phone: Lookup,
}

impl StructuredFields {
    fn empty() -> Self {
        StructuredFields {
            legal_name: Lookup::NotFound,
            status: Lookup::NotFound,
            formatted_identifier: Lookup::NotFound,
            operation_period: Lookup::NotFound,
            trade_name: Lookup::NotFound,
            address: Lookup::NotFound,
            legal_nature: Lookup::NotFound,
            capital_social: Lookup::NotFound,
            email: Lookup::NotFound,
            phone: Lookup::NotFound,
        }
    }

    fn slot(&mut self, field: Field) -> &mut Lookup {
        match field {
            Field::LegalName => &mut self.legal_name,
            Field::Status => &mut self.status,
            Field::FormattedIdentifier => &mut self.formatted_identifier,
            Field::OperationPeriod => &mut self.operation_period,
            Field::TradeName => &mut self.trade_name,
            Field::Address => &mut self.address,
            Field::LegalNature => &mut self.legal_nature,
            Field::CapitalSocial => &mut self.capital_social,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
        }
    }

    /// Trigger fields for the fallback pass: any of these missing means the
    /// page is probably a layout variant the locators don't cover.
    pub fn missing_trigger_field(&self) -> bool {
        [&self.address, &self.capital_social, &self.email, &self.phone]
            .iter()
            .any(|l| !l.is_found())
    }
}

/// Look up one field. Errors and empty text both resolve to `NotFound`.
pub async fn lookup<B: PageBackend>(page: &mut B, field: Field) -> Lookup {
    let Some(entry) = FIELD_LOCATORS.iter().find(|l| l.field == field) else {
        return Lookup::NotFound;
    };
    match page.find_text(&entry.locator).await {
        Ok(Some(text)) if !text.trim().is_empty() => Lookup::Found(text.trim().to_string()),
        Ok(_) => {
            debug!("{:?}: nothing at {}", field, entry.locator.xpath());
            Lookup::NotFound
        }
        Err(e) => {
            debug!("{:?}: lookup failed: {}", field, e);
            Lookup::NotFound
        }
    }
}

pub async fn extract<B: PageBackend>(page: &mut B) -> StructuredFields {
    let mut fields = StructuredFields::empty();
    for entry in FIELD_LOCATORS {
        *fields.slot(entry.field) = lookup(page, entry.field).await;
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{Locator, Snapshot};
    use anyhow::{anyhow, Result};
    use std::time::Duration;

    /// Backend whose every lookup errors.
    struct Broken;

    impl PageBackend for Broken {
        async fn navigate(&mut self, _url: &str) -> Result<()> {
            Ok(())
        }
        async fn wait_until_visible(&mut self, _l: &Locator, _t: Duration) -> Result<()> {
            Err(anyhow!("gone"))
        }
        async fn find_text(&mut self, _l: &Locator) -> Result<Option<String>> {
            Err(anyhow!("stale element reference"))
        }
        async fn page_source(&mut self) -> Result<String> {
            Err(anyhow!("gone"))
        }
    }

    #[tokio::test]
    async fn failing_lookups_become_sentinel() {
        let fields = extract(&mut Broken).await;
        assert_eq!(fields, StructuredFields::empty());
        assert!(fields.missing_trigger_field());
        assert_eq!(fields.phone.into_value(), "not found");
    }

    #[tokio::test]
    async fn blank_element_is_not_found() {
        let mut page = Snapshot::single(
            r#"<button id="bits-161"><div><div>   </div></div></button>
               <button id="bits-157"><div><div> a@b.com </div></div></button>"#,
        );
        page.navigate("u").await.unwrap();
        assert_eq!(lookup(&mut page, Field::Phone).await, Lookup::NotFound);
        assert_eq!(
            lookup(&mut page, Field::Email).await,
            Lookup::Found("a@b.com".into())
        );
    }

    #[tokio::test]
    async fn one_missing_field_does_not_affect_others() {
        let mut page = Snapshot::single(
            r#"<h1 data-toc-observe-for="n">Acme</h1>
               <button id="bits-150"><div><div>Sociedade Limitada</div></div></button>"#,
        );
        page.navigate("u").await.unwrap();
        let fields = extract(&mut page).await;
        assert_eq!(fields.legal_name, Lookup::Found("Acme".into()));
        assert_eq!(fields.legal_nature, Lookup::Found("Sociedade Limitada".into()));
        assert_eq!(fields.status, Lookup::NotFound);
        assert!(fields.missing_trigger_field());
    }
}
