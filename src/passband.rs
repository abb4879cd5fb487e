//! # Photometric filters
//!
//! A [`Passband`] identifies the photometric filter an image was taken through. It is built
//! from its string form (`"Johnson I"`, `"SDSS r"`, `"V"`, `"H-alpha 6563"`) and converts back
//! to an equivalent string, which is what the XML documents store.
//!
//! ## Ordering
//! -----------------
//! Passbands sort by photometric system (Johnson, Cousins, Gunn, SDSS, Strömgren, then custom
//! filters), then by the effective wavelength of the letter within the system, then by name.
//! This is the canonical order in which annuli documents list their bands.
use std::{cmp::Ordering, fmt, str::FromStr, sync::LazyLock};

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lemon_errors::LemonError;

static SYSTEM_AND_LETTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(johnson|cousins|gunn|sdss|str[oö]mgren)\s+(\S+)$")
        .expect("passband regex is valid")
});

/// Photometric systems with a known set of letters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PhotometricSystem {
    Johnson,
    Cousins,
    Gunn,
    Sdss,
    Stromgren,
    Custom,
}

impl PhotometricSystem {
    fn name(&self) -> &'static str {
        match self {
            PhotometricSystem::Johnson => "Johnson",
            PhotometricSystem::Cousins => "Cousins",
            PhotometricSystem::Gunn => "Gunn",
            PhotometricSystem::Sdss => "SDSS",
            PhotometricSystem::Stromgren => "Strömgren",
            PhotometricSystem::Custom => "",
        }
    }

    /// Letters of the system, sorted by increasing effective wavelength
    fn letters(&self) -> &'static [&'static str] {
        match self {
            PhotometricSystem::Johnson => &["U", "B", "V", "R", "I", "J", "H", "K", "L", "M", "N"],
            PhotometricSystem::Cousins => &["R", "I"],
            PhotometricSystem::Gunn => &["u", "v", "g", "r", "i", "z"],
            PhotometricSystem::Sdss => &["u", "g", "r", "i", "z"],
            PhotometricSystem::Stromgren => &["u", "v", "b", "y"],
            PhotometricSystem::Custom => &[],
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "johnson" => Some(PhotometricSystem::Johnson),
            "cousins" => Some(PhotometricSystem::Cousins),
            "gunn" => Some(PhotometricSystem::Gunn),
            "sdss" => Some(PhotometricSystem::Sdss),
            "stromgren" | "strömgren" => Some(PhotometricSystem::Stromgren),
            _ => None,
        }
    }

    /// Match `letter` against the letters of the system, case-insensitively when that is
    /// unambiguous, returning its canonical spelling and wavelength rank.
    fn canonical_letter(&self, letter: &str) -> Option<(&'static str, usize)> {
        let letters = self.letters();
        letters
            .iter()
            .position(|l| *l == letter)
            .or_else(|| letters.iter().position(|l| l.eq_ignore_ascii_case(letter)))
            .map(|rank| (letters[rank], rank))
    }
}

/// A photometric filter identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Passband {
    system: PhotometricSystem,
    letter: String,
    rank: usize,
}

impl Passband {
    pub fn system(&self) -> PhotometricSystem {
        self.system
    }

    /// The letter of the filter within its system, or the full name of a custom filter
    pub fn letter(&self) -> &str {
        &self.letter
    }

    /// The string form stored in the XML documents
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl FromStr for Passband {
    type Err = LemonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().join(" ");
        if normalized.is_empty() {
            return Err(LemonError::InvalidPassband(s.to_string()));
        }

        if let Some(caps) = SYSTEM_AND_LETTER.captures(&normalized) {
            let system = PhotometricSystem::from_token(&caps[1])
                .ok_or_else(|| LemonError::InvalidPassband(s.to_string()))?;
            return match system.canonical_letter(&caps[2]) {
                Some((letter, rank)) => Ok(Passband {
                    system,
                    letter: letter.to_string(),
                    rank,
                }),
                None => Err(LemonError::InvalidPassband(s.to_string())),
            };
        }

        // A bare letter is read as Johnson, the default system
        if let Some(rank) = PhotometricSystem::Johnson
            .letters()
            .iter()
            .position(|l| *l == normalized)
        {
            return Ok(Passband {
                system: PhotometricSystem::Johnson,
                letter: normalized,
                rank,
            });
        }

        Ok(Passband {
            system: PhotometricSystem::Custom,
            letter: normalized,
            rank: 0,
        })
    }
}

impl TryFrom<String> for Passband {
    type Error = LemonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Passband> for String {
    fn from(value: Passband) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Passband {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.system {
            PhotometricSystem::Custom => write!(f, "{}", self.letter),
            system => write!(f, "{} {}", system.name(), self.letter),
        }
    }
}

impl Ord for Passband {
    fn cmp(&self, other: &Self) -> Ordering {
        self.system
            .cmp(&other.system)
            .then(self.rank.cmp(&other.rank))
            .then_with(|| self.letter.cmp(&other.letter))
    }
}

impl PartialOrd for Passband {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod passband_test {
    use super::*;

    fn pb(s: &str) -> Passband {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(pb("Johnson I").to_string(), "Johnson I");
        assert_eq!(pb("  johnson   v ").to_string(), "Johnson V");
        assert_eq!(pb("V").to_string(), "Johnson V");
        assert_eq!(pb("SDSS r").to_string(), "SDSS r");
        assert_eq!(pb("Stromgren y").to_string(), "Strömgren y");
        assert_eq!(pb("H-alpha  6563").to_string(), "H-alpha 6563");
        assert_eq!(pb("H-alpha 6563").system(), PhotometricSystem::Custom);
    }

    #[test]
    fn test_string_form_is_stable() {
        for name in ["Johnson I", "Cousins R", "Gunn z", "SDSS u", "Strömgren b", "OIII"] {
            assert_eq!(pb(&pb(name).to_string()), pb(name));
        }
    }

    #[test]
    fn test_invalid_passbands() {
        assert_eq!(
            "   ".parse::<Passband>(),
            Err(LemonError::InvalidPassband("   ".into()))
        );
        assert!("Johnson Q".parse::<Passband>().is_err());
        assert!("SDSS x".parse::<Passband>().is_err());
    }

    #[test]
    fn test_natural_ordering() {
        let mut filters = vec![
            pb("OIII"),
            pb("Cousins I"),
            pb("Johnson I"),
            pb("SDSS g"),
            pb("Johnson B"),
            pb("Cousins R"),
            pb("Johnson V"),
        ];
        filters.sort();
        let names: Vec<String> = filters.iter().map(Passband::name).collect();
        assert_eq!(
            names,
            vec![
                "Johnson B",
                "Johnson V",
                "Johnson I",
                "Cousins R",
                "Cousins I",
                "SDSS g",
                "OIII"
            ]
        );
    }
}
