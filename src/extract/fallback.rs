use std::sync::LazyLock;

use regex::Regex;

use super::fragments;
use super::locators::Field;
use super::structured::Lookup;

/// Matcher for one fallback-eligible field, applied fragment by fragment.
pub struct TextPattern {
    pub field: Field,
    pub regex: Regex,
}

// Postal code at the end, phone, email, BRL amount, CNPJ, date range.
static PATTERNS: LazyLock<Vec<TextPattern>> = LazyLock::new(|| {
    let p = |field, re: &str| TextPattern {
        field,
        regex: Regex::new(re).unwrap(),
    };
    vec![
        p(Field::Address, r"\d{5}-\d{3}$"),
        p(Field::CapitalSocial, r"R\$\s?[\d.,]+"),
        p(Field::Email, r"\b[\w.-]+@[\w.-]+\.\w{2,}\b"),
        p(Field::Phone, r"\(?\d{2}\)?\s?\d{4,5}-\d{4}"),
        p(Field::FormattedIdentifier, r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}"),
        p(
            Field::OperationPeriod,
            r"(?i)\d{2}/\d{2}/\d{4}\s*-\s*(\d{2}/\d{2}/\d{4}|present)",
        ),
    ]
});

/// The six fields the pattern pass recomputes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackFields {
    pub address: Lookup,
    pub capital_social: Lookup,
    pub email: Lookup,
    pub phone: Lookup,
    pub formatted_identifier: Lookup,
    pub operation_period: Lookup,
}

/// First fragment matching `field`'s pattern, whole.
pub fn first_match(fragments: &[String], field: Field) -> Lookup {
    let Some(pattern) = PATTERNS.iter().find(|p| p.field == field) else {
        return Lookup::NotFound;
    };
    fragments
        .iter()
        .find(|f| pattern.regex.is_match(f))
        .map(|f| Lookup::Found(f.clone()))
        .unwrap_or(Lookup::NotFound)
}

pub fn extract_from_fragments(fragments: &[String]) -> FallbackFields {
    FallbackFields {
        address: first_match(fragments, Field::Address),
        capital_social: first_match(fragments, Field::CapitalSocial),
        email: first_match(fragments, Field::Email),
        phone: first_match(fragments, Field::Phone),
        formatted_identifier: first_match(fragments, Field::FormattedIdentifier),
        operation_period: first_match(fragments, Field::OperationPeriod),
    }
}

pub fn extract(markup: &str) -> FallbackFields {
    extract_from_fragments(&fragments::flatten(markup))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn found(s: &str) -> Lookup {
        Lookup::Found(s.to_string())
    }

    #[test]
    fn address_needs_postal_code_suffix() {
        let f = frags(&["CEP 01310-100 São Paulo", "Av. Paulista, 1000, São Paulo, SP, 01310-100"]);
        assert_eq!(
            first_match(&f, Field::Address),
            found("Av. Paulista, 1000, São Paulo, SP, 01310-100")
        );
    }

    #[test]
    fn phone_shapes() {
        for s in ["(11) 4002-8922", "11 94002-8922", "1140028922 ou (21)3333-4444"] {
            let f = frags(&["Telefone", s]);
            assert_eq!(first_match(&f, Field::Phone), found(s), "{s}");
        }
        assert_eq!(first_match(&frags(&["01310-100"]), Field::Phone), Lookup::NotFound);
    }

    #[test]
    fn email_capital_and_identifier() {
        let f = frags(&[
            "Capital Social",
            "R$ 1.500.000,00",
            "contato@acme.com.br",
            "47.703.730/0001-12",
        ]);
        assert_eq!(first_match(&f, Field::CapitalSocial), found("R$ 1.500.000,00"));
        assert_eq!(first_match(&f, Field::Email), found("contato@acme.com.br"));
        assert_eq!(
            first_match(&f, Field::FormattedIdentifier),
            found("47.703.730/0001-12")
        );
    }

    #[test]
    fn operation_period_range_or_open_ended() {
        let closed = frags(&["01/02/2003 - 04/05/2006"]);
        assert_eq!(first_match(&closed, Field::OperationPeriod), found("01/02/2003 - 04/05/2006"));

        for s in ["12/08/2022 - Presente", "12/08/2022-PRESENT", "12/08/2022 - present"] {
            assert_eq!(first_match(&frags(&[s]), Field::OperationPeriod), found(s), "{s}");
        }
        assert_eq!(
            first_match(&frags(&["12/08/2022"]), Field::OperationPeriod),
            Lookup::NotFound
        );
    }

    #[test]
    fn first_fragment_in_order_wins() {
        let f = frags(&["(11) 1111-1111", "(22) 2222-2222"]);
        assert_eq!(first_match(&f, Field::Phone), found("(11) 1111-1111"));
    }

    #[test]
    fn no_match_is_sentinel_for_all_six() {
        let out = extract_from_fragments(&frags(&["nothing", "here"]));
        assert_eq!(out.address, Lookup::NotFound);
        assert_eq!(out.capital_social, Lookup::NotFound);
        assert_eq!(out.email, Lookup::NotFound);
        assert_eq!(out.phone, Lookup::NotFound);
        assert_eq!(out.formatted_identifier, Lookup::NotFound);
        assert_eq!(out.operation_period, Lookup::NotFound);
    }

    #[test]
    fn fields_without_pattern_never_match() {
        assert_eq!(first_match(&frags(&["Acme"]), Field::LegalName), Lookup::NotFound);
    }
}
