use std::collections::BTreeSet;

const REMOTE_PREFIX: &str = "origin/";

/// Pick the branch to build from all branches containing a detached `HEAD`.
///
/// A branch named after the distro wins, then `main`, then `master`, then
/// the first branch in alphabetical order.
pub fn select_branch<S: AsRef<str>>(candidates: &[S], distro: &str) -> Option<String> {
    let candidates: BTreeSet<&str> = candidates.iter().map(AsRef::as_ref).collect();
    let has = |name: &str| {
        candidates.contains(name) || candidates.contains(format!("{REMOTE_PREFIX}{name}").as_str())
    };

    [distro, "main", "master"]
        .into_iter()
        .filter(|name| !name.is_empty())
        .find(|name| has(name))
        .map(str::to_string)
        .or_else(|| {
            candidates.first().map(|branch| {
                branch
                    .strip_prefix(REMOTE_PREFIX)
                    .unwrap_or(branch)
                    .to_string()
            })
        })
}

/// Turn the output of `git branch --all --format=%(refname)` into branch
/// names, `origin/main` for remote branches.
pub(crate) fn parse_refnames(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.ends_with("/HEAD"))
        .filter_map(|line| {
            line.strip_prefix("refs/heads/")
                .or_else(|| line.strip_prefix("refs/remotes/"))
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["origin/jazzy", "main", "origin/main"], "jazzy", Some("jazzy"))]
    #[case(&["jazzy", "master"], "jazzy", Some("jazzy"))]
    #[case(&["origin/main", "origin/master"], "jazzy", Some("main"))]
    #[case(&["origin/master", "feature"], "jazzy", Some("master"))]
    #[case(&["origin/zeta", "origin/alpha"], "jazzy", Some("alpha"))]
    #[case(&["upstream/alpha", "origin/beta"], "jazzy", Some("upstream/alpha"))]
    #[case(&[], "jazzy", None)]
    fn test_select_branch(
        #[case] candidates: &[&str],
        #[case] distro: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(select_branch(candidates, distro).as_deref(), expected);
    }

    #[test]
    fn test_parse_refnames() {
        let output = "HEAD\nrefs/heads/main\nrefs/remotes/origin/HEAD\nrefs/remotes/origin/jazzy\n";
        assert_eq!(parse_refnames(output), vec!["main", "origin/jazzy"]);
    }
}
