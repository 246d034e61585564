use anyhow::Error;

pub(crate) fn format(err: &Error) -> String {
    let mut out = format!("Error: {err:#}");
    let hints = suggestions(err);
    if !hints.is_empty() {
        out.push_str("\n\nHints:\n");
        for hint in hints {
            out.push_str("- ");
            out.push_str(&hint);
            out.push('\n');
        }
    }
    out
}

fn suggestions(err: &Error) -> Vec<String> {
    let chain: Vec<String> = err.chain().map(|e| e.to_string()).collect();
    let haystack = chain.join(" | ").to_ascii_lowercase();
    let mut out: Vec<String> = Vec::new();

    if haystack.contains("git is not available on path") {
        push_hint(&mut out, "Install git and verify it with `git --version`.");
    }

    if haystack.contains("p4 is not available on path") {
        push_hint(&mut out, "Install the Perforce command-line client and check `p4 -V`.");
    }

    if haystack.contains("not inside a git repository") {
        push_hint(&mut out, "Point `--repo` at a git working tree.");
    }

    if haystack.contains("not found") || haystack.contains("no such file or directory") {
        push_hint(&mut out, "Verify the input path exists and is readable.");
    }

    if haystack.contains("invalid config") {
        push_hint(&mut out, "Check `buildsense.toml` syntax and key names.");
    }

    if haystack.contains("send failed") || haystack.contains("send rejected") {
        push_hint(
            &mut out,
            "Retry with `--retry-attempts`, or pass `--fail-on-error false` to keep going.",
        );
    }

    out
}

fn push_hint(out: &mut Vec<String>, hint: &str) {
    if !out.iter().any(|h| h == hint) {
        out.push(hint.to_string());
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::{format, suggestions};

    #[test]
    fn suggests_for_missing_git() {
        let hints = suggestions(&anyhow!("git is not available on PATH"));
        assert!(hints.iter().any(|h| h.contains("git --version")));
    }

    #[test]
    fn suggests_for_missing_path() {
        let hints = suggestions(&anyhow!("Report path not found: nope"));
        assert!(hints.iter().any(|h| h.contains("input path exists")));
    }

    #[test]
    fn hints_are_not_repeated() {
        let err = anyhow!("No such file or directory").context("Report path not found: x");
        let hints = suggestions(&err);
        assert_eq!(hints.len(), 1);
    }

    #[test]
    fn format_includes_chain_and_hints() {
        let err = anyhow!("send rejected: offline").context("send failed after 1 attempt(s)");
        let rendered = format(&err);
        assert!(rendered.starts_with("Error: send failed after 1 attempt(s): send rejected"));
        assert!(rendered.contains("Hints:"));
    }

    #[test]
    fn plain_error_has_no_hints_section() {
        assert_eq!(format(&anyhow!("boom")), "Error: boom");
    }
}
