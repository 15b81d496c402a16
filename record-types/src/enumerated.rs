//! Closed enumerations of the record model

use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed enumeration whose variants can be listed.
pub trait Enumerated: Copy + PartialEq + fmt::Debug + Sized + 'static {
    /// Every variant, in declaration order
    fn variants() -> &'static [Self];
}

macro_rules! enumerated {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            /// Wire code of the variant
            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }

        impl Enumerated for $name {
            fn variants() -> &'static [Self] {
                &[$(Self::$variant),+]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

enumerated! {
    /// Kind of a document (what the container is used for)
    DocumentCategory {
        Document => "document",
        Message => "message",
        Transaction => "transaction",
        Batch => "batch",
        Searchset => "searchset",
        Collection => "collection",
    }
}

enumerated! {
    IdentifierUse {
        Usual => "usual",
        Official => "official",
        Temp => "temp",
        Secondary => "secondary",
        Old => "old",
    }
}

enumerated! {
    NameUse {
        Usual => "usual",
        Official => "official",
        Nickname => "nickname",
        Maiden => "maiden",
        Old => "old",
    }
}

enumerated! {
    AddressUse {
        Home => "home",
        Work => "work",
        Temp => "temp",
        Old => "old",
        Billing => "billing",
    }
}

enumerated! {
    Gender {
        Male => "male",
        Female => "female",
        Other => "other",
        Unknown => "unknown",
    }
}

enumerated! {
    CompositionStatus {
        Preliminary => "preliminary",
        Final => "final",
        Amended => "amended",
        EnteredInError => "entered-in-error",
    }
}

enumerated! {
    CoverageStatus {
        Active => "active",
        Cancelled => "cancelled",
        Draft => "draft",
        EnteredInError => "entered-in-error",
    }
}

enumerated! {
    RequestStatus {
        Active => "active",
        OnHold => "on-hold",
        Cancelled => "cancelled",
        Completed => "completed",
        Draft => "draft",
    }
}

enumerated! {
    /// Unit of a timing period
    UnitOfTime {
        Second => "s",
        Minute => "min",
        Hour => "h",
        Day => "d",
        Week => "wk",
        Month => "mo",
        Year => "a",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_are_complete() {
        assert_eq!(DocumentCategory::variants().len(), 6);
        assert_eq!(UnitOfTime::variants().len(), 7);
        assert!(Gender::variants().contains(&Gender::Unknown));
    }

    #[test]
    fn test_wire_codes() {
        assert_eq!(RequestStatus::OnHold.code(), "on-hold");
        assert_eq!(
            serde_json::to_string(&CompositionStatus::EnteredInError).unwrap(),
            "\"entered-in-error\""
        );
        let unit: UnitOfTime = serde_json::from_str("\"wk\"").unwrap();
        assert_eq!(unit, UnitOfTime::Week);
    }
}
