//! Per-bank statement layout classifiers.
//!
//! Each supported bank gets one module implementing
//! [`tagger_core::RowClassifier`] for its statement layout. The engine
//! obtains the right implementation through [`classifier_for`] and never
//! names a concrete bank type.

mod banamex;
mod bbva;
mod db;
mod hsbc;
mod monex;
mod santander;

pub use banamex::BanamexClassifier;
pub use bbva::BbvaClassifier;
pub use db::DbClassifier;
pub use hsbc::HsbcClassifier;
pub use monex::MonexClassifier;
pub use santander::SantanderClassifier;

use tagger_core::{Bank, RowClassifier};

/// Classifier registry, keyed on the bank layout.
pub fn classifier_for(bank: Bank) -> Box<dyn RowClassifier> {
    match bank {
        Bank::Bbva => Box::new(BbvaClassifier),
        Bank::Banamex => Box::new(BanamexClassifier),
        Bank::Santander => Box::new(SantanderClassifier),
        Bank::Hsbc => Box::new(HsbcClassifier),
        Bank::Monex => Box::new(MonexClassifier),
        Bank::Db => Box::new(DbClassifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_bank() {
        for bank in Bank::ALL {
            let classifier = classifier_for(bank);
            assert_eq!(classifier.bank(), bank);
            assert_eq!(classifier.profile().bank, bank);
        }
    }
}
