//! Mapping between URL paths and focused sections.

use crate::config::SectionDescriptor;

/// Index of the section addressed by `path` (`/about`, `/projects/`, ...).
/// Anything else, including `/`, selects the overview.
pub fn section_for_path(sections: &[SectionDescriptor], path: &str) -> Option<usize> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    sections.iter().position(|section| section.id == trimmed)
}

/// Path the host should show for a view; `None` is the overview.
pub fn path_for_view(sections: &[SectionDescriptor], view: Option<usize>) -> String {
    match view.and_then(|index| sections.get(index)) {
        Some(section) => format!("/{}", section.id),
        None => "/".to_string(),
    }
}
