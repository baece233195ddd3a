//! Command vocabulary.
//!
//! PAR files name commands and event attributes in the language of the
//! installation. Internally everything uses the Finnish keywords of the
//! simulator; a [`SymbolTable`] translates between the two.

use std::fmt;
use std::str::FromStr;

use hashbrown::HashMap;

use crate::error::ParError;

macro_rules! keywords {
    ($($variant:ident => $key:literal),* $(,)?) => {
        /// Canonical command and attribute keywords.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($variant,)*
        }

        impl Keyword {
            pub const ALL: &'static [Keyword] = &[$(Keyword::$variant,)*];

            /// Canonical key
            pub fn key(self) -> &'static str {
                match self {
                    $(Keyword::$variant => $key,)*
                }
            }

            pub fn from_key(key: &str) -> Option<Self> {
                match key {
                    $($key => Some(Keyword::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

keywords! {
    Years => "VUODET",
    Output => "TULOSTUS",
    Control => "SIMULOINNIN_OHJAUS",
    Event => "TAPAHTUMA",
    EventDefaults => "TAPAHTUMA_OLETUSARVOT",
    Include => "LUE",
    EventYears => "TAPAHTUMAVUODET",
    Branching => "HAARAUTUMINEN",
    Probability => "TODENNAKOISYYS",
    Condition => "METSIKKOEHDOT",
    MinIntervals => "LYHIMMAT_TOTEUTUSVALIT",
    ComparableEvents => "VASTAAVAT_TAPAHTUMAT",
    FeasiblePredecessors => "SALLITUT_EDELTAJAT",
    RoutineCall => "TAPAHTUMAKUTSU",
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Keyword {
    type Err = ParError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Keyword::from_key(s).ok_or_else(|| ParError::invalid("symbol", format!("unknown keyword '{s}'")))
    }
}

/// Translation between textual names and canonical keywords.
pub trait SymbolTable {
    /// Keyword for a name as written in a file
    fn lookup(&self, name: &str) -> Option<Keyword>;

    /// Name to write for a keyword
    fn name(&self, keyword: Keyword) -> &str;
}

/// Hash-map backed [`SymbolTable`].
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    keywords: HashMap<String, Keyword>,
    names: HashMap<Keyword, String>,
}

impl Vocabulary {
    /// Empty table; every keyword is written by its key
    pub fn new() -> Self {
        Self::default()
    }

    /// The simulator's own vocabulary
    pub fn finnish() -> Self {
        let mut vocab = Self::new();
        for &kw in Keyword::ALL {
            vocab.insert(kw.key(), kw);
        }
        vocab
    }

    /// Add a name for `keyword`. The most recently added name is the one
    /// written out.
    pub fn insert(&mut self, name: impl Into<String>, keyword: Keyword) {
        let name = name.into();
        self.keywords.insert(name.clone(), keyword);
        self.names.insert(keyword, name);
    }

    pub fn with_alias(mut self, name: impl Into<String>, keyword: Keyword) -> Self {
        self.insert(name, keyword);
        self
    }
}

impl SymbolTable for Vocabulary {
    fn lookup(&self, name: &str) -> Option<Keyword> {
        self.keywords.get(name).copied()
    }

    fn name(&self, keyword: Keyword) -> &str {
        self.names.get(&keyword).map_or(keyword.key(), String::as_str)
    }
}
