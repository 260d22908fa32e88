//! Path display helpers

use std::path::{Component, Path};

/// Render `path` relative to `root` with `/` separators on every platform.
///
/// Falls back to the platform display of `path` when it is not under `root`.
pub fn normalize_path(root: &Path, path: &Path) -> String {
    let Ok(relative) = path.strip_prefix(root) else {
        return path.display().to_string();
    };
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::normalize_path;
    use std::path::Path;

    #[test]
    fn strips_root_and_joins_with_slash() {
        let root = Path::new("/work/app");
        let file = root.join("ui").join("flow").join("Donate.kt");
        assert_eq!(normalize_path(root, &file), "ui/flow/Donate.kt");
    }

    #[test]
    fn file_directly_under_root() {
        let root = Path::new("/work/app");
        assert_eq!(normalize_path(root, &root.join("a.kt")), "a.kt");
    }

    #[test]
    fn path_outside_root_keeps_its_display_form() {
        let root = Path::new("/work/app");
        let outside = Path::new("/srv/lib/Util.kt");
        assert_eq!(normalize_path(root, outside), outside.display().to_string());
        assert!(!normalize_path(root, outside).starts_with("//"));
    }
}
