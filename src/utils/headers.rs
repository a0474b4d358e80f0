use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::str::FromStr;

/// Builds the extra request headers from `name = value` pairs.
/// Pairs that are not valid HTTP headers are skipped.
pub fn build_header_map<'a, I>(pairs: I) -> HeaderMap
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut headers = HeaderMap::new();

    for (name, value) in pairs {
        let key = name.trim().to_lowercase();
        let header_name = match HeaderName::from_str(&key) {
            Ok(header_name) => header_name,
            Err(_) => {
                log::warn!("Skipping invalid header name '{}'", name);
                continue;
            }
        };

        match HeaderValue::from_str(value.trim()) {
            Ok(mut header_value) => {
                if header_name == reqwest::header::COOKIE
                    || header_name == reqwest::header::AUTHORIZATION
                {
                    header_value.set_sensitive(true);
                }
                headers.insert(header_name, header_value);
            }
            Err(_) => log::warn!("Skipping header '{}' with invalid value", key),
        }
    }

    headers
}
