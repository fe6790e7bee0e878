/// Slugs longer than this are cut, same as the CMS slug field.
pub(crate) const SLUG_MAX_LEN: usize = 96;

pub(crate) fn slugify(source: &str) -> String {
    let mut slug = String::with_capacity(source.len());
    let mut pending_dash = false;
    for ch in source.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    if slug.chars().count() > SLUG_MAX_LEN {
        slug = slug.chars().take(SLUG_MAX_LEN).collect();
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}
