//! Pet asset folders: personality script, sprite frames and mood sound effects.
//!
//! Layout of one pet folder:
//!
//! ```text
//! assets/pets/<Name>/
//!     personality.json
//!     frames.txt          ASCII frames separated by lines containing only `---`
//!     sounds/<mood>.mp3   optional effects, named by `Mood::sound_stem`
//! ```
//!
//! Every file is optional; missing pieces fall back to built-in defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::mood::Mood;
use crate::personality::PersonalityScript;

pub const PERSONALITY_FILE: &str = "personality.json";
pub const FRAMES_FILE: &str = "frames.txt";
pub const SOUNDS_DIR: &str = "sounds";
const FRAME_SEPARATOR: &str = "---";
const SOUND_EXTENSIONS: [&str; 3] = ["mp3", "wav", "ogg"];

const BUILTIN_FRAMES: [&[&str]; 4] = [
    &["  ___  ", " / _ \\ ", "| o o |", "| | | |", "| |_| |", " \\___/ "],
    &["  ___  ", " / _ \\ ", "| - - |", "| | | |", "| |_| |", " \\___/ "],
    &["  ___  ", " / _ \\ ", "| o o |", "| |~| |", "| |_| |", " \\___/ "],
    &["  ___  ", " / _ \\ ", "|  o o|", "| | | |", "| |_| |", " \\___/ "],
];

/// Animation frames as rows of text. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    frames: Vec<Vec<String>>,
}

impl Sprite {
    pub fn builtin() -> Self {
        Self {
            frames: BUILTIN_FRAMES
                .iter()
                .map(|rows| rows.iter().map(|r| (*r).to_owned()).collect())
                .collect(),
        }
    }

    /// Parse `---`-separated frames; `None` if no frame has content.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut frames = Vec::new();
        let mut current: Vec<String> = Vec::new();
        for line in raw.lines() {
            if line.trim() == FRAME_SEPARATOR {
                if current.iter().any(|l| !l.trim().is_empty()) {
                    frames.push(std::mem::take(&mut current));
                }
                current.clear();
            } else {
                current.push(line.trim_end().to_owned());
            }
        }
        if current.iter().any(|l| !l.trim().is_empty()) {
            frames.push(current);
        }
        (!frames.is_empty()).then_some(Self { frames })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Rows of frame `index` (wrapped modulo the frame count).
    pub fn frame(&self, index: usize) -> &[String] {
        &self.frames[index % self.frames.len()]
    }

    /// Bounding box over all frames, in cells.
    pub fn size(&self) -> (u16, u16) {
        let width = self
            .frames
            .iter()
            .flat_map(|f| f.iter())
            .map(|row| row.chars().count())
            .max()
            .unwrap_or(1);
        let height = self.frames.iter().map(Vec::len).max().unwrap_or(1);
        (width.max(1) as u16, height.max(1) as u16)
    }
}

/// Everything loaded from one pet folder.
#[derive(Debug, Clone)]
pub struct PetAssets {
    pub folder: PathBuf,
    pub script: PersonalityScript,
    pub sprite: Sprite,
    sounds: HashMap<String, PathBuf>,
}

impl PetAssets {
    /// Load a pet from its folder, or from any file inside it.
    pub fn load(pet_path: &Path) -> Self {
        let folder = pet_folder(pet_path);
        let script = PersonalityScript::load_or_default(&folder.join(PERSONALITY_FILE));
        let sprite = load_sprite(&folder.join(FRAMES_FILE));
        let sounds = scan_sounds(&folder.join(SOUNDS_DIR));
        tracing::info!(
            folder = %folder.display(),
            frames = sprite.frame_count(),
            sounds = sounds.len(),
            "pet assets loaded"
        );
        Self { folder, script, sprite, sounds }
    }

    /// Effect clip for a mood, if the pet ships one.
    pub fn sound_for(&self, mood: &Mood) -> Option<&Path> {
        self.sounds.get(&mood.sound_stem()).map(PathBuf::as_path)
    }
}

/// A path naming a file (older configs stored the sprite file) maps
/// to its parent folder.
pub fn pet_folder(pet_path: &Path) -> PathBuf {
    if pet_path.is_dir() || pet_path.extension().is_none() {
        return pet_path.to_path_buf();
    }
    pet_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| pet_path.to_path_buf())
}

fn load_sprite(path: &Path) -> Sprite {
    match std::fs::read_to_string(path) {
        Ok(raw) => Sprite::parse(&raw).unwrap_or_else(|| {
            tracing::warn!(path = %path.display(), "frames file has no frames, using built-in sprite");
            Sprite::builtin()
        }),
        Err(_) => Sprite::builtin(),
    }
}

fn scan_sounds(dir: &Path) -> HashMap<String, PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return HashMap::new();
    };
    entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| SOUND_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .filter_map(|p| {
            let stem = p.file_stem()?.to_str()?.to_ascii_lowercase();
            Some((stem, p))
        })
        .collect()
}

/// Pet folders under `root`, sorted by name.
pub fn discover_pets(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        tracing::warn!(root = %root.display(), "pets folder unreadable");
        return Vec::new();
    };
    let mut pets: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    pets.sort();
    pets
}

/// The pet after `current` in `root`, wrapping around.
pub fn next_pet(root: &Path, current: &Path) -> Option<PathBuf> {
    let pets = discover_pets(root);
    if pets.is_empty() {
        return None;
    }
    let current = pet_folder(current);
    let next = pets
        .iter()
        .position(|p| *p == current)
        .map(|i| (i + 1) % pets.len())
        .unwrap_or(0);
    Some(pets[next].clone())
}
