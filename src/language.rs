// SPDX-License-Identifier: MIT
//!
//! Target language names and their provider codes
//!

/// Supported target language
#[derive(Debug)]
pub struct Language {
    /// Provider code, also used as output file suffix
    pub code: &'static str,
    /// Display name
    pub name: &'static str,
    /// Other accepted spellings, lower case
    pub aliases: &'static [&'static str],
}

/// Built-in language table
#[rustfmt::skip]
pub static LANGUAGES: &[Language] = &[
    Language { code: "ar", name: "Arabic", aliases: &[] },
    Language { code: "bg", name: "Bulgarian", aliases: &["bulgaria"] },
    Language { code: "cs", name: "Czech", aliases: &["czechia", "czech republic"] },
    Language { code: "da", name: "Danish", aliases: &["denmark", "dansk"] },
    Language { code: "de", name: "German", aliases: &["germany", "deutsch"] },
    Language { code: "el", name: "Greek", aliases: &["greece"] },
    Language { code: "en", name: "English", aliases: &["england", "american", "british"] },
    Language { code: "es", name: "Spanish", aliases: &["spain", "espanol", "español", "castilian"] },
    Language { code: "et", name: "Estonian", aliases: &["estonia"] },
    Language { code: "fi", name: "Finnish", aliases: &["finland", "suomi"] },
    Language { code: "fr", name: "French", aliases: &["france", "francais", "français"] },
    Language { code: "hu", name: "Hungarian", aliases: &["hungary", "magyar"] },
    Language { code: "id", name: "Indonesian", aliases: &["indonesia", "bahasa"] },
    Language { code: "it", name: "Italian", aliases: &["italy", "italiano"] },
    Language { code: "ja", name: "Japanese", aliases: &["japan", "nihongo", "日本語"] },
    Language { code: "ko", name: "Korean", aliases: &["korea", "한국어"] },
    Language { code: "lt", name: "Lithuanian", aliases: &["lithuania"] },
    Language { code: "lv", name: "Latvian", aliases: &["latvia"] },
    Language { code: "nb", name: "Norwegian", aliases: &["norway", "bokmal", "bokmål"] },
    Language { code: "nl", name: "Dutch", aliases: &["netherlands", "holland", "nederlands"] },
    Language { code: "pl", name: "Polish", aliases: &["poland", "polski"] },
    Language { code: "pt", name: "Portuguese", aliases: &["portugal", "portugues", "português"] },
    Language { code: "pt-br", name: "Brazilian Portuguese", aliases: &["brazil", "brazilian"] },
    Language { code: "ro", name: "Romanian", aliases: &["romania"] },
    Language { code: "ru", name: "Russian", aliases: &["russia"] },
    Language { code: "sk", name: "Slovak", aliases: &["slovakia"] },
    Language { code: "sl", name: "Slovenian", aliases: &["slovenia", "slovene"] },
    Language { code: "sv", name: "Swedish", aliases: &["sweden", "svenska"] },
    Language { code: "tr", name: "Turkish", aliases: &["turkey", "turkiye", "türkçe"] },
    Language { code: "uk", name: "Ukrainian", aliases: &["ukraine"] },
    Language { code: "zh", name: "Chinese", aliases: &["china", "mandarin", "中文"] },
];

impl Language {
    fn matches(&self, key: &str) -> bool {
        self.code == key
            || self.name.to_lowercase() == key
            || self.aliases.iter().any(|a| *a == key)
    }

    pub fn target(&'static self) -> LanguageTarget {
        LanguageTarget {
            name: self.name,
            code: self.code,
        }
    }
}

/// Resolved target language
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LanguageTarget {
    pub name: &'static str,
    pub code: &'static str,
}

impl std::fmt::Display for LanguageTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Result of resolving user supplied names
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Accepted targets, request order, one per code
    pub targets: Vec<LanguageTarget>,
    /// Names not found in the table
    pub unknown: Vec<String>,
}

/// Read-only name → code lookup
#[derive(Clone, Copy, Debug)]
pub struct LanguageTable {
    languages: &'static [Language],
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::new(LANGUAGES)
    }
}

impl LanguageTable {
    pub const fn new(languages: &'static [Language]) -> Self {
        Self { languages }
    }

    pub fn languages(&self) -> &'static [Language] {
        self.languages
    }

    /// Case-insensitive lookup by code, name or alias
    pub fn lookup(&self, name: &str) -> Option<LanguageTarget> {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        let languages: &'static [Language] = self.languages;
        languages
            .iter()
            .find(|l| l.matches(&key))
            .map(Language::target)
    }

    /// Resolve requested names, dropping unknown ones with a warning
    ///
    /// Names resolving to an already accepted code are skipped.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Resolution {
        let mut resolution = Resolution::default();
        for name in names {
            let name = name.as_ref();
            match self.lookup(name) {
                Some(target) => {
                    if resolution.targets.iter().any(|t| t.code == target.code) {
                        log::info!("Language {:?} duplicates {}, skipped", name, target.code);
                    } else {
                        resolution.targets.push(target);
                    }
                }
                None => {
                    log::warn!("Unknown language {:?}, skipped", name);
                    resolution.unknown.push(name.to_string());
                }
            }
        }
        resolution
    }
}
