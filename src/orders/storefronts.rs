//! Amazon storefront domains with currency and order-page conventions.

use crate::orders::amount::NumberFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported Amazon storefronts with their domains and currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Storefront {
    #[default]
    Us,
    Uk,
    De,
    Fr,
    Es,
    It,
    Ca,
    Au,
    Jp,
    In,
    Br,
    Mx,
    Nl,
    Se,
    Pl,
}

impl Storefront {
    /// Returns the Amazon domain for this storefront.
    pub fn domain(&self) -> &'static str {
        match self {
            Storefront::Us => "amazon.com",
            Storefront::Uk => "amazon.co.uk",
            Storefront::De => "amazon.de",
            Storefront::Fr => "amazon.fr",
            Storefront::Es => "amazon.es",
            Storefront::It => "amazon.it",
            Storefront::Ca => "amazon.ca",
            Storefront::Au => "amazon.com.au",
            Storefront::Jp => "amazon.co.jp",
            Storefront::In => "amazon.in",
            Storefront::Br => "amazon.com.br",
            Storefront::Mx => "amazon.com.mx",
            Storefront::Nl => "amazon.nl",
            Storefront::Se => "amazon.se",
            Storefront::Pl => "amazon.pl",
        }
    }

    /// Returns the base URL for this storefront.
    pub fn base_url(&self) -> String {
        format!("https://www.{}", self.domain())
    }

    /// Returns the currency code for this storefront.
    pub fn currency(&self) -> &'static str {
        match self {
            Storefront::Us => "USD",
            Storefront::Uk => "GBP",
            Storefront::De | Storefront::Fr | Storefront::Es | Storefront::It | Storefront::Nl => {
                "EUR"
            }
            Storefront::Ca => "CAD",
            Storefront::Au => "AUD",
            Storefront::Jp => "JPY",
            Storefront::In => "INR",
            Storefront::Br => "BRL",
            Storefront::Mx => "MXN",
            Storefront::Se => "SEK",
            Storefront::Pl => "PLN",
        }
    }

    /// Returns the currency symbol rendered on order pages.
    pub fn symbol(&self) -> &'static str {
        match self {
            Storefront::Us => "$",
            Storefront::Uk => "£",
            Storefront::De | Storefront::Fr | Storefront::Es | Storefront::It | Storefront::Nl => {
                "€"
            }
            Storefront::Ca => "CA$",
            Storefront::Au => "A$",
            Storefront::Jp => "¥",
            Storefront::In => "₹",
            Storefront::Br => "R$",
            Storefront::Mx => "MX$",
            Storefront::Se => "kr",
            Storefront::Pl => "zł",
        }
    }

    /// Returns the numeric formatting convention for this storefront.
    pub fn number_format(&self) -> NumberFormat {
        match self {
            Storefront::De
            | Storefront::Fr
            | Storefront::Es
            | Storefront::It
            | Storefront::Nl
            | Storefront::Se
            | Storefront::Pl
            | Storefront::Br => NumberFormat::Eu,
            Storefront::Jp => NumberFormat::Jp,
            _ => NumberFormat::Us,
        }
    }

    /// Returns the localized "order total" label words for this storefront,
    /// matched case-insensitively against order-header line items.
    pub fn total_labels(&self) -> &'static [&'static str] {
        match self {
            Storefront::Us
            | Storefront::Uk
            | Storefront::Ca
            | Storefront::Au
            | Storefront::In
            | Storefront::Fr
            | Storefront::Es
            | Storefront::Mx
            | Storefront::Br => &["total"],
            Storefront::De => &["summe", "gesamt", "total"],
            Storefront::It => &["totale", "total"],
            Storefront::Jp => &["合計", "total"],
            Storefront::Nl => &["totaal", "total"],
            Storefront::Se => &["totalt", "summa"],
            Storefront::Pl => &["suma", "razem", "total"],
        }
    }

    /// Returns the Accept-Language header value for this storefront.
    pub fn accept_language(&self) -> &'static str {
        match self {
            Storefront::Us | Storefront::Ca | Storefront::Au => "en-US,en;q=0.9",
            Storefront::Uk => "en-GB,en;q=0.9",
            Storefront::De => "de-DE,de;q=0.9,en;q=0.8",
            Storefront::Fr => "fr-FR,fr;q=0.9,en;q=0.8",
            Storefront::Es | Storefront::Mx => "es-ES,es;q=0.9,en;q=0.8",
            Storefront::It => "it-IT,it;q=0.9,en;q=0.8",
            Storefront::Jp => "ja-JP,ja;q=0.9,en;q=0.8",
            Storefront::In => "en-IN,en;q=0.9,hi;q=0.8",
            Storefront::Br => "pt-BR,pt;q=0.9,en;q=0.8",
            Storefront::Nl => "nl-NL,nl;q=0.9,en;q=0.8",
            Storefront::Se => "sv-SE,sv;q=0.9,en;q=0.8",
            Storefront::Pl => "pl-PL,pl;q=0.9,en;q=0.8",
        }
    }

    /// Resolves a page hostname to its storefront, if recognized.
    pub fn from_host(host: &str) -> Option<Storefront> {
        let host = host.trim().trim_start_matches("www.").to_lowercase();
        Storefront::all().iter().copied().find(|s| s.domain() == host)
    }

    /// Returns all supported storefronts.
    pub fn all() -> &'static [Storefront] {
        &[
            Storefront::Us,
            Storefront::Uk,
            Storefront::De,
            Storefront::Fr,
            Storefront::Es,
            Storefront::It,
            Storefront::Ca,
            Storefront::Au,
            Storefront::Jp,
            Storefront::In,
            Storefront::Br,
            Storefront::Mx,
            Storefront::Nl,
            Storefront::Se,
            Storefront::Pl,
        ]
    }
}

impl fmt::Display for Storefront {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Storefront::Us => "us",
            Storefront::Uk => "uk",
            Storefront::De => "de",
            Storefront::Fr => "fr",
            Storefront::Es => "es",
            Storefront::It => "it",
            Storefront::Ca => "ca",
            Storefront::Au => "au",
            Storefront::Jp => "jp",
            Storefront::In => "in",
            Storefront::Br => "br",
            Storefront::Mx => "mx",
            Storefront::Nl => "nl",
            Storefront::Se => "se",
            Storefront::Pl => "pl",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for Storefront {
    type Err = StorefrontParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "us" | "usa" | "amazon.com" => Ok(Storefront::Us),
            "uk" | "gb" | "amazon.co.uk" => Ok(Storefront::Uk),
            "de" | "amazon.de" => Ok(Storefront::De),
            "fr" | "amazon.fr" => Ok(Storefront::Fr),
            "es" | "amazon.es" => Ok(Storefront::Es),
            "it" | "amazon.it" => Ok(Storefront::It),
            "ca" | "amazon.ca" => Ok(Storefront::Ca),
            "au" | "amazon.com.au" => Ok(Storefront::Au),
            "jp" | "amazon.co.jp" => Ok(Storefront::Jp),
            "in" | "amazon.in" => Ok(Storefront::In),
            "br" | "amazon.com.br" => Ok(Storefront::Br),
            "mx" | "amazon.com.mx" => Ok(Storefront::Mx),
            "nl" | "amazon.nl" => Ok(Storefront::Nl),
            "se" | "amazon.se" => Ok(Storefront::Se),
            "pl" | "amazon.pl" => Ok(Storefront::Pl),
            _ => Err(StorefrontParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorefrontParseError(String);

impl fmt::Display for StorefrontParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown storefront '{}'. Valid storefronts: us, uk, de, fr, es, it, ca, au, jp, in, br, mx, nl, se, pl",
            self.0
        )
    }
}

impl std::error::Error for StorefrontParseError {}
