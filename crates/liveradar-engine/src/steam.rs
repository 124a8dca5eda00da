//! Locating the game's recording directory inside a Steam install.
//!
//! Detection looks at a fixed list of likely Steam roots, and for each
//! root at both the root itself and every library listed in its
//! `steamapps/libraryfolders.vdf`. The first `game/csgo` directory that
//! exists wins.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Path from a Steam library root to the directory recordings land in.
const GAME_SUBDIR: [&str; 5] = [
    "steamapps",
    "common",
    "Counter-Strike Global Offensive",
    "game",
    "csgo",
];

/// Default install locations checked on every platform.
const FIXED_ROOTS: [&str; 5] = [
    "C:/Program Files (x86)/Steam",
    "D:/Steam",
    "E:/Steam",
    "C:/SteamLibrary",
    "D:/SteamLibrary",
];

/// Find the game directory, if Steam and the game are installed.
pub fn detect_game_dir() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from);
    detect_game_dir_in(&steam_roots(home.as_deref()))
}

/// Candidate Steam roots, home-relative ones first.
pub fn steam_roots(home: Option<&Path>) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(home) = home {
        roots.push(home.join(".steam").join("steam"));
        roots.push(home.join(".local").join("share").join("Steam"));
        roots.push(
            home.join("Library")
                .join("Application Support")
                .join("Steam"),
        );
    }
    roots.extend(FIXED_ROOTS.iter().map(PathBuf::from));
    roots
}

/// Search `roots` and their libraries for the game directory.
pub fn detect_game_dir_in(roots: &[PathBuf]) -> Option<PathBuf> {
    for root in roots {
        if let Some(dir) = game_dir(root) {
            return Some(dir);
        }
        let vdf = root.join("steamapps").join("libraryfolders.vdf");
        let Ok(contents) = std::fs::read_to_string(&vdf) else {
            continue;
        };
        debug!(path = %vdf.display(), "Reading Steam library list");
        if let Some(dir) = parse_library_folders(&contents)
            .iter()
            .find_map(|lib| game_dir(lib))
        {
            return Some(dir);
        }
    }
    None
}

fn game_dir(library: &Path) -> Option<PathBuf> {
    let dir = GAME_SUBDIR
        .iter()
        .fold(library.to_path_buf(), |path, part| path.join(part));
    dir.is_dir().then_some(dir)
}

/// Library paths listed in a `libraryfolders.vdf` file.
///
/// Only `"path"` entries are read; the rest of the key/value tree is
/// ignored. Escaped and plain backslashes become forward slashes.
pub fn parse_library_folders(contents: &str) -> Vec<PathBuf> {
    contents
        .lines()
        .filter_map(|line| {
            let mut fields = line.trim().split('"').skip(1).step_by(2);
            match (fields.next(), fields.next()) {
                (Some("path"), Some(value)) => Some(PathBuf::from(
                    value.replace("\\\\", "/").replace('\\', "/"),
                )),
                _ => None,
            }
        })
        .collect()
}
