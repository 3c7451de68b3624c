//! Slug generation for categories and tags

/// Derive a URL slug from a display name.
///
/// ASCII letters and digits are lowercased, non-ASCII characters are kept,
/// every other character becomes a hyphen, runs of hyphens collapse to one,
/// and hyphens at either end are dropped.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() || !c.is_ascii() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Trim a category or tag name and derive its slug.
///
/// Fails when the name is blank or has nothing to build a slug from.
pub fn name_and_slug(name: &str) -> Result<(String, String), &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Name cannot be empty");
    }
    let slug = generate_slug(name);
    if slug.is_empty() {
        return Err("Name must contain at least one letter or digit");
    }
    Ok((name.to_string(), slug))
}
