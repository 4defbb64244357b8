use url::Url;

/// Appends percent-encoded path segments to `base`.
///
/// A trailing slash on the base is tolerated, so `.../api/jobs/` and
/// `.../api/jobs` resolve to the same endpoint.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, String> {
    let mut url = Url::parse(base).map_err(|err| format!("{base}: {err}"))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| format!("{base}: cannot be a base url"))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}
