use url::Url;

use crate::{FileType, Handle};

/// Name of the top-level repository config object.
pub const CONFIG_NAME: &str = "config";

/// Subdirectory holding objects of the given type. Config lives at the root.
pub fn type_dir(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Config => "",
        FileType::Data => "data",
        FileType::Snapshot => "snapshots",
        FileType::Index => "index",
        FileType::Lock => "locks",
        FileType::Key => "keys",
    }
}

/// Join path segments, collapsing empty components and duplicate slashes.
fn join_segments(segments: &[&str]) -> String {
    let parts: Vec<&str> = segments
        .iter()
        .flat_map(|s| s.split('/'))
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();
    format!("/{}", parts.join("/"))
}

/// Full URL of the object named by `h` below `base`.
pub fn resource_url(base: &Url, h: &Handle) -> String {
    let name = match h.file_type {
        FileType::Config => CONFIG_NAME,
        _ => h.name.as_str(),
    };
    let mut url = base.clone();
    url.set_path(&join_segments(&[base.path(), type_dir(h.file_type), name]));
    url.to_string()
}

/// URL of the collection holding all objects of `file_type`, always with a
/// trailing slash.
pub fn collection_url(base: &Url, file_type: FileType) -> String {
    let mut url = base.clone();
    let mut path = join_segments(&[base.path(), type_dir(file_type)]);
    if !path.ends_with('/') {
        path.push('/');
    }
    url.set_path(&path);
    url.to_string()
}
