use crate::browser::Locator;

/// Primary content marker; also holds the legal name.
pub const READY_MARKER: Locator = Locator::Marker("data-toc-observe-for");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    LegalName,
    Status,
    FormattedIdentifier,
    OperationPeriod,
    TradeName,
    Address,
    LegalNature,
    CapitalSocial,
    Email,
    Phone,
}

pub struct FieldLocator {
    pub field: Field,
    pub locator: Locator,
}

// Control ids are generated by the page's component library and shift
// between releases; the fallback pass exists for when they do.
pub const FIELD_LOCATORS: &[FieldLocator] = &[
    FieldLocator {
        field: Field::LegalName,
        locator: READY_MARKER,
    },
    FieldLocator {
        field: Field::Status,
        locator: Locator::Classes {
            tag: "div",
            all: &["text-sm"],
            any: &["text-green-600", "text-rose-400", "text-red-600"],
        },
    },
    FieldLocator {
        field: Field::FormattedIdentifier,
        locator: Locator::AfterLabel {
            term: "dt",
            label: "CNPJ",
            value: "dd",
        },
    },
    FieldLocator {
        field: Field::OperationPeriod,
        locator: Locator::AfterLabel {
            term: "dt",
            label: "Período de Operação",
            value: "dd",
        },
    },
    FieldLocator {
        field: Field::TradeName,
        locator: Locator::Control("bits-154"),
    },
    FieldLocator {
        field: Field::Address,
        locator: Locator::Control("bits-143"),
    },
    FieldLocator {
        field: Field::LegalNature,
        locator: Locator::Control("bits-150"),
    },
    FieldLocator {
        field: Field::CapitalSocial,
        locator: Locator::Control("bits-152"),
    },
    FieldLocator {
        field: Field::Email,
        locator: Locator::Control("bits-157"),
    },
    FieldLocator {
        field: Field::Phone,
        locator: Locator::Control("bits-161"),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn one_locator_per_field() {
        let fields: HashSet<Field> = FIELD_LOCATORS.iter().map(|l| l.field).collect();
        assert_eq!(fields.len(), FIELD_LOCATORS.len());
        assert_eq!(fields.len(), 10);
    }
}
