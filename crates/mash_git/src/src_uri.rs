//! Conversion of git remote URLs into BitBake `SRC_URI` values.
use url::Url;

/// Parse a git remote into a URL. scp-like remotes (`git@host:path`) are read
/// as `ssh://` and local paths as `file://`.
pub fn parse_remote(remote: &str) -> Option<Url> {
    if !remote.contains("://") {
        // a single letter before the colon is a windows drive
        if let Some((host, path)) = remote.split_once(':')
            && host.len() > 1
            && !host.contains(['/', '\\'])
        {
            let path = path.trim_start_matches('/');
            return Url::parse(&format!("ssh://{host}/{path}")).ok();
        }

        let path = std::path::Path::new(remote);
        if path.is_absolute() {
            return Url::from_file_path(path).ok();
        }
    }

    Url::parse(remote).ok()
}

/// Format a remote as a BitBake git fetcher URI, e.g.
/// `git://github.com/ros2/demos.git;${ROS_BRANCH};protocol=https`.
pub fn format_src_uri(remote: &str) -> Option<String> {
    let url = parse_remote(remote)?;

    let mut netloc = String::new();
    if !url.username().is_empty() {
        netloc.push_str(url.username());
        if let Some(password) = url.password() {
            netloc.push(':');
            netloc.push_str(password);
        }
        netloc.push('@');
    }
    netloc.push_str(url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        netloc.push_str(&format!(":{port}"));
    }

    Some(format!(
        "git://{netloc}{};${{ROS_BRANCH}};protocol={}",
        url.path(),
        url.scheme()
    ))
}
