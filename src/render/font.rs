/// Font selection and loading.
/// Resolves a family/slant/weight request to a font file in the system font
/// directories and loads it with rusttype.
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::render::error::FontError;

const FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];
const MAX_SCAN_DEPTH: usize = 8;

/// Monospace families tried for "Courier", in order of preference.
/// Entries are normalized (lowercase, no spaces, dashes or underscores).
const MONOSPACE_CANDIDATES: [&str; 10] = [
    "couriernew",
    "courier",
    "cour",
    "nimbusmonops",
    "nimbusmono",
    "liberationmono",
    "dejavusansmono",
    "freemono",
    "notosansmono",
    "ubuntumono",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontSlant {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl std::str::FromStr for FontSlant {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" | "roman" => Ok(FontSlant::Normal),
            "italic" => Ok(FontSlant::Italic),
            "oblique" => Ok(FontSlant::Oblique),
            _ => Err(format!("Unknown font slant: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl std::str::FromStr for FontWeight {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" | "regular" => Ok(FontWeight::Normal),
            "bold" => Ok(FontWeight::Bold),
            _ => Err(format!("Unknown font weight: {s}")),
        }
    }
}

/// Requested face. `path` skips the family lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub slant: FontSlant,
    pub weight: FontWeight,
    pub path: Option<PathBuf>,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Courier".to_string(),
            size: 16.0,
            slant: FontSlant::Normal,
            weight: FontWeight::Normal,
            path: None,
        }
    }
}

impl FontSpec {
    fn candidates(&self) -> Vec<String> {
        let family = normalize(&self.family);
        let mut out = Vec::new();
        if !matches!(
            family.as_str(),
            "courier" | "couriernew" | "monospace" | "mono"
        ) {
            out.push(family);
        }
        out.extend(MONOSPACE_CANDIDATES.iter().map(|c| c.to_string()));
        out
    }

    fn matches_style(&self, stem: &str) -> bool {
        let bold = stem.contains("bold");
        let slanted = stem.contains("italic") || stem.contains("oblique");
        let want_bold = self.weight == FontWeight::Bold;
        let want_slanted = self.slant != FontSlant::Normal;
        bold == want_bold && slanted == want_slanted
    }
}

/// Scans font directories for files matching a `FontSpec`.
pub struct FontLocator {
    dirs: Vec<PathBuf>,
}

impl FontLocator {
    /// The platform's usual font directories.
    pub fn system() -> Self {
        let mut dirs = vec![
            PathBuf::from("/usr/share/fonts"),
            PathBuf::from("/usr/local/share/fonts"),
        ];
        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);
            dirs.push(home.join(".local/share/fonts"));
            dirs.push(home.join(".fonts"));
        }
        dirs.push(PathBuf::from("/Library/Fonts"));
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
        Self { dirs }
    }

    #[cfg(test)]
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Pick the best font file for `spec`.
    pub fn find(&self, spec: &FontSpec) -> Result<PathBuf, FontError> {
        let mut files = Vec::new();
        for dir in &self.dirs {
            collect_font_files(dir, 0, &mut files);
        }
        files.sort();
        debug!("Scanned {} font files", files.len());

        let stems: Vec<(String, &PathBuf)> = files
            .iter()
            .filter_map(|p| Some((normalize(p.file_stem()?.to_str()?), p)))
            .collect();

        for candidate in spec.candidates() {
            let group: Vec<&(String, &PathBuf)> = stems
                .iter()
                .filter(|(stem, _)| stem.starts_with(&candidate))
                .collect();
            if let Some(path) = pick_styled(spec, &group) {
                return Ok(path);
            }
        }

        // Last resort: anything that calls itself monospaced.
        let group: Vec<&(String, &PathBuf)> =
            stems.iter().filter(|(stem, _)| stem.contains("mono")).collect();
        pick_styled(spec, &group).ok_or_else(|| FontError::NotFound {
            family: spec.family.clone(),
        })
    }
}

/// Within one family group: the requested style, then the regular face,
/// then anything. Shorter names win ties ("DejaVuSansMono" over
/// "DejaVuSansMono-ExtraLight").
fn pick_styled(spec: &FontSpec, group: &[&(String, &PathBuf)]) -> Option<PathBuf> {
    let regular = FontSpec::default();
    shortest_where(group, |stem| spec.matches_style(stem))
        .or_else(|| shortest_where(group, |stem| regular.matches_style(stem)))
        .or_else(|| shortest_where(group, |_| true))
}

fn shortest_where(
    group: &[&(String, &PathBuf)],
    pred: impl Fn(&str) -> bool,
) -> Option<PathBuf> {
    group
        .iter()
        .filter(|(stem, _)| pred(stem))
        .min_by_key(|(stem, _)| stem.len())
        .map(|(_, path)| (*path).clone())
}

fn collect_font_files(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_font_files(&path, depth + 1, out);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FONT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        {
            out.push(path);
        }
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// A loaded font face.
pub struct FontFace {
    font: rusttype::Font<'static>,
    path: PathBuf,
}

impl FontFace {
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let font = rusttype::Font::try_from_vec(data).ok_or_else(|| FontError::Invalid {
            path: path.to_path_buf(),
        })?;
        Ok(Self {
            font,
            path: path.to_path_buf(),
        })
    }

    /// Load the explicit path if one is set, otherwise look the family up.
    pub fn resolve(spec: &FontSpec, locator: &FontLocator) -> Result<Self, FontError> {
        match &spec.path {
            Some(path) => Self::load(path),
            None => Self::load(&locator.find(spec)?),
        }
    }

    pub fn font(&self) -> &rusttype::Font<'static> {
        &self.font
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// rusttype scales so that ascent - descent spans the given height;
    /// convert an em size into that height.
    pub fn scale_for_em(&self, em_size: f32) -> rusttype::Scale {
        let units_per_em = self.font.units_per_em() as f32;
        let vm = self.font.v_metrics_unscaled();
        let span = vm.ascent - vm.descent;
        if units_per_em <= 0.0 || span <= 0.0 {
            return rusttype::Scale::uniform(em_size);
        }
        rusttype::Scale::uniform(em_size * span / units_per_em)
    }
}

/// Set to make glyph tests fail instead of skip on hosts without a font.
#[cfg(test)]
pub(crate) const REQUIRE_FONT_ENV: &str = "CUSTOM_CLOCK_REQUIRE_FONT";

/// A real monospace font from the host, for tests that need glyphs.
#[cfg(test)]
pub(crate) fn test_face() -> Option<FontFace> {
    match FontFace::resolve(&FontSpec::default(), &FontLocator::system()) {
        Ok(face) => Some(face),
        Err(e) if std::env::var_os(REQUIRE_FONT_ENV).is_some() => {
            panic!("{REQUIRE_FONT_ENV} is set but no monospace font resolved: {e}")
        }
        Err(e) => {
            eprintln!("{e}, skipping glyph test (set {REQUIRE_FONT_ENV} to fail instead)");
            None
        }
    }
}
