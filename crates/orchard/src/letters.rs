//! Letter data: the fruit on the tree and what each one holds.

use chrono::NaiveDate;
use glam::Vec3;
use procgen::hex_rgb;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Which bough a letter hangs from. Selects the fruit palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    Memories,
    Admiration,
    Gratitude,
    Dreams,
    Unsaid,
}

/// Colours for one branch, as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub base: u32,
    pub gradient: u32,
    pub highlight: u32,
    pub blush: u32,
    pub stem: u32,
    pub stem_highlight: u32,
    pub wax_coat: u32,
    /// Glow behind the envelope and letter seal.
    pub glow: u32,
    /// Envelope lining.
    pub inner: u32,
}

const STEM: u32 = 0x4a3020;
const STEM_HIGHLIGHT: u32 = 0x6b4a35;

const MEMORIES: Palette = Palette {
    base: 0xc92a2a,
    gradient: 0x8b1a1a,
    highlight: 0xff6b6b,
    blush: 0xe03131,
    stem: STEM,
    stem_highlight: STEM_HIGHLIGHT,
    wax_coat: 0xffcccc,
    glow: 0xff6b6b,
    inner: 0xffcccc,
};

const ADMIRATION: Palette = Palette {
    base: 0xe67700,
    gradient: 0xd9480f,
    highlight: 0xffc078,
    blush: 0xfd7e14,
    stem: STEM,
    stem_highlight: STEM_HIGHLIGHT,
    wax_coat: 0xffe4cc,
    glow: 0xffc078,
    inner: 0xffe4cc,
};

const GRATITUDE: Palette = Palette {
    base: 0xd4a000,
    gradient: 0xb8860b,
    highlight: 0xffe066,
    blush: 0xfcc419,
    stem: STEM,
    stem_highlight: STEM_HIGHLIGHT,
    wax_coat: 0xfff8cc,
    glow: 0xffe066,
    inner: 0xfff8cc,
};

const DREAMS: Palette = Palette {
    base: 0x37b24d,
    gradient: 0x2f9e44,
    highlight: 0x8ce99a,
    blush: 0x40c057,
    stem: STEM,
    stem_highlight: STEM_HIGHLIGHT,
    wax_coat: 0xccffcc,
    glow: 0x8ce99a,
    inner: 0xccffcc,
};

const UNSAID: Palette = Palette {
    base: 0xbe4bdb,
    gradient: 0x9c36b5,
    highlight: 0xe599f7,
    blush: 0xcc5de8,
    stem: STEM,
    stem_highlight: STEM_HIGHLIGHT,
    wax_coat: 0xf0ccff,
    glow: 0xe599f7,
    inner: 0xf0ccff,
};

/// Body colour of fruit that cannot be opened yet.
pub const LOCKED_COLOR: u32 = 0x4a5568;
/// Sheen and glow colour of locked fruit.
pub const LOCKED_SHEEN: u32 = 0x666666;
pub const STEM_LEAF_COLOR: u32 = 0x3d7a1e;

impl Branch {
    pub const ALL: [Branch; 5] = [
        Branch::Memories,
        Branch::Admiration,
        Branch::Gratitude,
        Branch::Dreams,
        Branch::Unsaid,
    ];

    pub fn palette(self) -> &'static Palette {
        match self {
            Branch::Memories => &MEMORIES,
            Branch::Admiration => &ADMIRATION,
            Branch::Gratitude => &GRATITUDE,
            Branch::Dreams => &DREAMS,
            Branch::Unsaid => &UNSAID,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Branch::Memories => "memories",
            Branch::Admiration => "admiration",
            Branch::Gratitude => "gratitude",
            Branch::Dreams => "dreams",
            Branch::Unsaid => "unsaid",
        }
    }
}

/// One letter, as authored in the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    pub id: String,
    pub branch: Branch,
    pub position: [f32; 3],
    pub unlock_date: NaiveDate,
    pub unlocked: bool,
    pub title: String,
    /// Display date written on the letter; free text.
    #[serde(default)]
    pub date: String,
    pub message: String,
    #[serde(default)]
    pub audio_file: Option<String>,
}

impl Letter {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn palette(&self) -> &'static Palette {
        self.branch.palette()
    }

    /// Message split on blank lines, each paragraph trimmed; empty paragraphs dropped.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.message
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Stable value in [0, 1) from the id's character codes.
    pub fn variation(&self) -> f32 {
        let sum: u32 = self.id.chars().map(|c| c as u32).sum();
        (sum % 100) as f32 / 100.0
    }

    /// Waxy roughness of the fruit body, varied per letter.
    pub fn roughness(&self) -> f32 {
        0.28 + self.variation() * 0.08
    }

    /// Body colour: the branch base when `unlocked`, slate otherwise.
    pub fn body_color(&self, unlocked: bool) -> Vec3 {
        hex_rgb(if unlocked { self.palette().base } else { LOCKED_COLOR })
    }

    /// Glow and sheen colour.
    pub fn glow_color(&self, unlocked: bool) -> Vec3 {
        hex_rgb(if unlocked { self.palette().highlight } else { LOCKED_SHEEN })
    }
}

#[derive(Debug, Error)]
pub enum LetterDataError {
    #[error("could not read letters from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed letter data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate letter id `{0}`")]
    DuplicateId(String),
    #[error("letter `{0}` has a non-finite position")]
    BadPosition(String),
}

#[derive(Deserialize)]
struct LetterFile {
    letters: Vec<Letter>,
}

/// Ordered, validated letters.
#[derive(Debug, Clone, Default)]
pub struct LetterSet {
    letters: Vec<Arc<Letter>>,
}

impl LetterSet {
    pub fn from_json(json: &str) -> Result<Self, LetterDataError> {
        let file: LetterFile = serde_json::from_str(json)?;
        Self::new(file.letters)
    }

    pub fn load(path: &Path) -> Result<Self, LetterDataError> {
        let json = std::fs::read_to_string(path).map_err(|source| LetterDataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let set = Self::from_json(&json)?;
        log::info!("Loaded {} letters from {}", set.len(), path.display());
        Ok(set)
    }

    pub fn new(letters: Vec<Letter>) -> Result<Self, LetterDataError> {
        let mut seen = HashSet::new();
        for letter in &letters {
            if !seen.insert(letter.id.as_str()) {
                return Err(LetterDataError::DuplicateId(letter.id.clone()));
            }
            if !letter.position.iter().all(|c| c.is_finite()) {
                return Err(LetterDataError::BadPosition(letter.id.clone()));
            }
        }
        Ok(Self {
            letters: letters.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Letter>> {
        self.letters.iter().find(|l| l.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Letter>> {
        self.letters.iter()
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn letter(id: &str, unlocked: bool, unlock_date: &str) -> Letter {
        Letter {
            id: id.to_string(),
            branch: Branch::Memories,
            position: [0.5, 4.0, 0.2],
            unlock_date: NaiveDate::parse_from_str(unlock_date, "%Y-%m-%d").unwrap(),
            unlocked,
            title: format!("Letter {}", id),
            date: String::new(),
            message: "First.\n\nSecond line\nstill second.\n\n".to_string(),
            audio_file: Some(format!("{}.mp3", id)),
        }
    }

    const SAMPLE: &str = r#"{
        "letters": [
            {
                "id": "first-spring",
                "branch": "memories",
                "position": [1.2, 4.1, 0.4],
                "unlockDate": "2024-01-01",
                "unlocked": true,
                "title": "The first spring",
                "date": "March 2023",
                "message": "Hello.\n\nGoodbye.",
                "audioFile": "first-spring.mp3"
            },
            {
                "id": "someday",
                "branch": "dreams",
                "position": [-0.8, 4.6, -1.0],
                "unlockDate": "2031-06-01",
                "unlocked": false,
                "title": "Someday",
                "message": "Not yet."
            }
        ]
    }"#;

    #[test]
    fn parses_camel_case_dataset() {
        let set = LetterSet::from_json(SAMPLE).unwrap();
        assert_eq!(set.len(), 2);
        let first = set.get("first-spring").unwrap();
        assert_eq!(first.branch, Branch::Memories);
        assert_eq!(first.unlock_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(first.audio_file.as_deref(), Some("first-spring.mp3"));
        let second = set.get("someday").unwrap();
        assert_eq!(second.audio_file, None);
        assert_eq!(second.date, "");
    }

    #[test]
    fn bundled_dataset_is_valid() {
        let set = LetterSet::from_json(include_str!("../../../data/letters.json")).unwrap();
        assert!(!set.is_empty());
        assert!(set.iter().any(|l| !l.unlocked));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = LetterSet::new(vec![letter("a", true, "2024-01-01"), letter("a", true, "2024-01-02")]).unwrap_err();
        assert!(matches!(err, LetterDataError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn rejects_malformed_dates() {
        let json = SAMPLE.replace("2024-01-01", "2024-13-45");
        assert!(matches!(LetterSet::from_json(&json), Err(LetterDataError::Parse(_))));
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let l = letter("p", true, "2024-01-01");
        assert_eq!(l.paragraphs(), vec!["First.", "Second line\nstill second."]);
    }

    #[test]
    fn variation_is_stable_and_bounded() {
        let l = letter("ab", true, "2024-01-01");
        // 'a' + 'b' = 195
        assert!((l.variation() - 0.95).abs() < 1e-6);
        assert!(l.roughness() > 0.28 && l.roughness() < 0.36 + 1e-6);
    }

    #[test]
    fn locked_fruit_is_slate() {
        let l = letter("x", true, "2024-01-01");
        assert_eq!(l.body_color(false), hex_rgb(LOCKED_COLOR));
        assert_eq!(l.body_color(true), hex_rgb(0xc92a2a));
        assert!(Branch::ALL.iter().all(|b| b.palette().stem == STEM));
    }
}
