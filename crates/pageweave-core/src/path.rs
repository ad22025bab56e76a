//! Sandboxed path resolution.
//!
//! Maps a `(current_dir, requested)` pair — both logical, `/`-separated
//! paths relative to the document root — to a canonical path confined to
//! that root. Resolution is purely lexical: it never touches the
//! filesystem, so a forbidden path is rejected even when nothing exists
//! at that location yet.

/// Resolves `requested` against `current_dir`, rejecting any attempt to
/// climb above the document root. Returns the resolved path's components
/// joined with `/`, with no leading or trailing slash — the session's file
/// identifier and the suffix joined onto the real document root for reads.
pub fn resolve(current_dir: &str, requested: &str) -> Result<String, String> {
    let base = if requested.starts_with('/') { "" } else { current_dir };

    let mut stack: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(requested.split('/')) {
        match segment {
            "" | "." => continue,
            ".." => {
                if stack.pop().is_none() {
                    return Err(requested.to_string());
                }
            }
            seg => stack.push(seg),
        }
    }
    Ok(stack.join("/"))
}

/// The logical directory containing `rel_path`, used as the `current_dir`
/// for resolving relative references made from inside that file.
pub fn dirname(rel_path: &str) -> &str {
    match rel_path.rfind('/') {
        Some(idx) => &rel_path[..idx],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_path_against_current_dir() {
        assert_eq!(resolve("components", "card.html").unwrap(), "components/card.html");
    }

    #[test]
    fn absolute_path_is_re_rooted_ignoring_current_dir() {
        assert_eq!(resolve("components/nested", "/layout.html").unwrap(), "layout.html");
    }

    #[test]
    fn parent_segment_climbs_within_current_dir() {
        assert_eq!(resolve("components/nested", "../card.html").unwrap(), "components/card.html");
    }

    #[test]
    fn escaping_the_root_is_rejected() {
        assert!(resolve("", "../etc/passwd").is_err());
        assert!(resolve("components", "../../etc/passwd").is_err());
    }

    #[test]
    fn dirname_of_top_level_file_is_empty() {
        assert_eq!(dirname("index.html"), "");
        assert_eq!(dirname("components/card.html"), "components");
    }
}
