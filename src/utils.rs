use anyhow::Result;

/// Validates a branch name pulled from `git branch --all` output before it is
/// interpolated into any further `git` subprocess invocation.
pub fn validate_branch_name(branch_name: &str) -> Result<()> {
    if branch_name.is_empty() {
        anyhow::bail!("Branch name cannot be empty");
    }

    if branch_name.contains("..") {
        anyhow::bail!("Branch name cannot contain '..'");
    }

    if branch_name.starts_with('/') || branch_name.ends_with('/') {
        anyhow::bail!("Branch name cannot start or end with '/'");
    }

    if branch_name.contains(';')
        || branch_name.contains('&')
        || branch_name.contains('|')
        || branch_name.contains('$')
        || branch_name.contains('`')
        || branch_name.contains('<')
        || branch_name.contains('>')
    {
        anyhow::bail!("Branch name contains unsafe characters");
    }

    if branch_name.contains('\0')
        || branch_name.chars().any(|c| {
            c.is_control()
                || matches!(
                    c,
                    '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' | '\u{2028}' | '\u{2029}'
                )
        })
    {
        anyhow::bail!("Branch name contains control or problematic Unicode characters");
    }

    if branch_name.chars().any(|c| c.is_whitespace()) {
        anyhow::bail!("Branch name cannot contain whitespace");
    }

    if branch_name.starts_with(".git")
        || branch_name.contains("/.git")
        || branch_name.starts_with("refs/")
        || branch_name == "HEAD"
    {
        anyhow::bail!("Branch name contains Git-specific patterns");
    }

    if branch_name.starts_with('.') {
        anyhow::bail!("Branch name cannot start with '.'");
    }

    if branch_name.len() > 255 {
        anyhow::bail!("Branch name too long (max 255 characters)");
    }

    Ok(())
}
