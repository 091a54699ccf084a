//! Plugin site URLs and the names of their cache files.
//!
//! A site may carry a `%<prefix>` template. When downloading, it is replaced
//! by `prefix` followed by the comma-separated names of the enabled plugins
//! so the server can tailor the list; for display and cache naming it is
//! dropped.
use url::Url;

const TEMPLATE_START: &str = "%<";

fn template_range(site: &str) -> Option<(usize, usize)> {
    let start = site.find(TEMPLATE_START)?;
    let end = site.rfind('>')?;
    (end > start).then_some((start, end))
}

/// Site URL with any `%<...>` template removed
pub fn display_site(site: &str) -> String {
    match template_range(site) {
        Some((start, end)) => format!("{}{}", &site[..start], &site[end + 1..]),
        None => site.to_string(),
    }
}

/// Site URL with the template filled in for `plugins`
pub fn expand_site(site: &str, plugins: &[String]) -> String {
    match template_range(site) {
        Some((start, end)) => {
            let fill = if plugins.is_empty() {
                String::new()
            } else {
                format!("{}{}", &site[start + TEMPLATE_START.len()..end], plugins.join(","))
            };
            format!("{}{}{}", &site[..start], fill, &site[end + 1..])
        }
        None => site.to_string(),
    }
}

/// File name of the local cache for `site`.
///
/// `https://example.org:8080/list` becomes `site-example.org-8080-_list.txt`.
pub fn cache_file_name(site: &str) -> String {
    let Ok(url) = Url::parse(&display_site(site)) else {
        return "site-unknown.txt".to_string();
    };
    let mut name = String::from("site-");
    name.push_str(url.host_str().unwrap_or_default());
    name.push('-');
    if let Some(port) = url.port() {
        name.push_str(&port.to_string());
        name.push('-');
    }
    name.extend(url.path().chars().map(|c| if c.is_alphanumeric() { c } else { '_' }));
    name.push_str(".txt");
    name
}

/// Whether `file_name` looks like a site cache (`[<digits>-]site*.txt`)
pub fn is_site_cache_file(file_name: &str) -> bool {
    let rest = match file_name.split_once('-') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) => rest,
        _ => file_name,
    };
    rest.starts_with("site") && rest.ends_with(".txt")
}
