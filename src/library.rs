//! Read-only library catalog.
//!
//! Mirrors a local directory subtree as an ordered, serializable hierarchy.
//! The tree is rebuilt on every request; nothing here caches or writes.
//! A branch that cannot be read degrades to an empty subtree instead of
//! failing the whole request.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One entry of the library tree. `path` is always the slash-separated
/// relative path from the library root, regardless of the host separator.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LibraryNode {
    Dir {
        name: String,
        path: String,
        children: Vec<LibraryNode>,
    },
    File {
        name: String,
        path: String,
        size: u64,
        modified: DateTime<Utc>,
        url: String,
    },
}

impl LibraryNode {
    pub fn name(&self) -> &str {
        match self {
            LibraryNode::Dir { name, .. } | LibraryNode::File { name, .. } => name,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            LibraryNode::Dir { .. } => 0,
            LibraryNode::File { .. } => 1,
        }
    }
}

/// Recursively builds the tree rooted at `dir`.
///
/// Hidden entries (names starting with `.`) are skipped. Directories sort
/// before files; within a type, names compare under Vietnamese collation.
/// File URLs are `base_url + "/" + relative_path`.
///
/// An unlistable directory is logged and contributes an empty subtree; an
/// entry whose metadata cannot be read is logged and skipped. Errors never
/// escape this function.
pub fn build_tree(dir: &Path, base_url: &str, relative: &str) -> Vec<LibraryNode> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("cannot list library directory {}: {}", dir.display(), err);
            return Vec::new();
        }
    };

    let mut nodes = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("skipping unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        let rel_path = if relative.is_empty() {
            name.clone()
        } else {
            format!("{relative}/{name}")
        };

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                log::warn!("cannot stat library entry {}: {}", rel_path, err);
                continue;
            }
        };

        if metadata.is_dir() {
            let children = build_tree(&entry.path(), base_url, &rel_path);
            nodes.push(LibraryNode::Dir {
                name,
                path: rel_path,
                children,
            });
        } else {
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            nodes.push(LibraryNode::File {
                name,
                url: format!("{base_url}/{rel_path}"),
                path: rel_path,
                size: metadata.len(),
                modified: DateTime::<Utc>::from(modified),
            });
        }
    }

    nodes.sort_by(compare_nodes);
    nodes
}

fn compare_nodes(a: &LibraryNode, b: &LibraryNode) -> Ordering {
    a.type_rank()
        .cmp(&b.type_rank())
        .then_with(|| vietnamese_cmp(a.name(), b.name()))
}

/// Compares two names under an explicit Vietnamese collation table.
///
/// Primary weights follow the Vietnamese alphabet, with ă â đ ê ô ơ ư in
/// alphabet position rather than at their raw code points. Tone marks are
/// secondary weights in the traditional ngang, huyền, hỏi, ngã, sắc, nặng
/// order, so diacritic variants collate adjacent to their base letter.
pub fn vietnamese_cmp(a: &str, b: &str) -> Ordering {
    let (pa, sa) = collation_key(a);
    let (pb, sb) = collation_key(b);
    pa.cmp(&pb).then_with(|| sa.cmp(&sb)).then_with(|| a.cmp(b))
}

fn collation_key(s: &str) -> (Vec<u32>, Vec<u8>) {
    let mut primaries = Vec::with_capacity(s.len());
    let mut secondaries = Vec::with_capacity(s.len());
    for ch in s.chars() {
        let lowered = ch.to_lowercase().next().unwrap_or(ch);
        let (primary, secondary) = letter_weights(lowered);
        primaries.push(primary);
        secondaries.push(secondary);
    }
    (primaries, secondaries)
}

// Tabled weights sit above the whole code-point range so untabled
// characters (punctuation, symbols) keep a low primary weight and sort
// before digits and letters, as the system locale would order them.
const ALPHABET_BASE: u32 = 0x11_0000;

fn letter_weights(ch: char) -> (u32, u8) {
    match tabled_weights(ch) {
        Some((primary, secondary)) => (ALPHABET_BASE + primary, secondary),
        None => (ch as u32, 0),
    }
}

fn tabled_weights(ch: char) -> Option<(u32, u8)> {
    let weights = match ch {
        '0'..='9' => (ch as u32 - '0' as u32, 0),

        'a' => (10, 0),
        'à' => (10, 1),
        'ả' => (10, 2),
        'ã' => (10, 3),
        'á' => (10, 4),
        'ạ' => (10, 5),
        'ă' => (11, 0),
        'ằ' => (11, 1),
        'ẳ' => (11, 2),
        'ẵ' => (11, 3),
        'ắ' => (11, 4),
        'ặ' => (11, 5),
        'â' => (12, 0),
        'ầ' => (12, 1),
        'ẩ' => (12, 2),
        'ẫ' => (12, 3),
        'ấ' => (12, 4),
        'ậ' => (12, 5),
        'b' => (13, 0),
        'c' => (14, 0),
        'd' => (15, 0),
        'đ' => (16, 0),
        'e' => (17, 0),
        'è' => (17, 1),
        'ẻ' => (17, 2),
        'ẽ' => (17, 3),
        'é' => (17, 4),
        'ẹ' => (17, 5),
        'ê' => (18, 0),
        'ề' => (18, 1),
        'ể' => (18, 2),
        'ễ' => (18, 3),
        'ế' => (18, 4),
        'ệ' => (18, 5),
        'f' => (19, 0),
        'g' => (20, 0),
        'h' => (21, 0),
        'i' => (22, 0),
        'ì' => (22, 1),
        'ỉ' => (22, 2),
        'ĩ' => (22, 3),
        'í' => (22, 4),
        'ị' => (22, 5),
        'j' => (23, 0),
        'k' => (24, 0),
        'l' => (25, 0),
        'm' => (26, 0),
        'n' => (27, 0),
        'o' => (28, 0),
        'ò' => (28, 1),
        'ỏ' => (28, 2),
        'õ' => (28, 3),
        'ó' => (28, 4),
        'ọ' => (28, 5),
        'ô' => (29, 0),
        'ồ' => (29, 1),
        'ổ' => (29, 2),
        'ỗ' => (29, 3),
        'ố' => (29, 4),
        'ộ' => (29, 5),
        'ơ' => (30, 0),
        'ờ' => (30, 1),
        'ở' => (30, 2),
        'ỡ' => (30, 3),
        'ớ' => (30, 4),
        'ợ' => (30, 5),
        'p' => (31, 0),
        'q' => (32, 0),
        'r' => (33, 0),
        's' => (34, 0),
        't' => (35, 0),
        'u' => (36, 0),
        'ù' => (36, 1),
        'ủ' => (36, 2),
        'ũ' => (36, 3),
        'ú' => (36, 4),
        'ụ' => (36, 5),
        'ư' => (37, 0),
        'ừ' => (37, 1),
        'ử' => (37, 2),
        'ữ' => (37, 3),
        'ứ' => (37, 4),
        'ự' => (37, 5),
        'v' => (38, 0),
        'w' => (39, 0),
        'x' => (40, 0),
        'y' => (41, 0),
        'ỳ' => (41, 1),
        'ỷ' => (41, 2),
        'ỹ' => (41, 3),
        'ý' => (41, 4),
        'ỵ' => (41, 5),
        'z' => (42, 0),

        _ => return None,
    };
    Some(weights)
}
