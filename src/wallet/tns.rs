//! `tnsnames.ora` lookup and wallet-directory injection.
//!
//! The thick Oracle client reads the wallet location from the connect
//! descriptor, so an alias such as `mydb_high` is expanded from the
//! wallet's own `tnsnames.ora` and pointed at the extracted directory.

use std::path::Path;

/// Find the descriptor for `alias` in the text of a `tnsnames.ora` file.
///
/// Alias matching is case-insensitive; comment lines are skipped. Entries
/// whose value is not a parenthesised descriptor (`IFILE = ...`) are
/// passed over, as is an unbalanced one.
pub fn find_descriptor(tnsnames: &str, alias: &str) -> Option<String> {
    let cleaned: String = tnsnames
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    let mut rest = cleaned.as_str();
    while let Some(eq) = rest.find('=') {
        let names = rest[..eq].trim();
        let after = rest[eq + 1..].trim_start();
        if !after.starts_with('(') {
            rest = after.split_once('\n').map_or("", |(_, next)| next);
            continue;
        }
        let Some(len) = balanced_len(after) else {
            rest = after.split_once('\n').map_or("", |(_, next)| next);
            continue;
        };
        if names
            .split(',')
            .any(|name| name.trim().eq_ignore_ascii_case(alias))
        {
            return Some(after[..len].split_whitespace().collect::<Vec<_>>().join(""));
        }
        rest = &after[len..];
    }
    None
}

/// Length of the leading balanced parenthesised expression.
fn balanced_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Point a connect descriptor at `wallet_dir`.
///
/// An existing `(SECURITY=...)` clause gains `MY_WALLET_DIRECTORY`;
/// otherwise a new clause is appended inside the outer DESCRIPTION.
pub fn inject_wallet_directory(descriptor: &str, wallet_dir: &Path) -> String {
    let clause = format!("(MY_WALLET_DIRECTORY={})", wallet_dir.display());
    let upper = descriptor.to_ascii_uppercase();
    if let Some(pos) = upper.find("(SECURITY=") {
        let insert_at = pos + "(SECURITY=".len();
        return format!("{}{}{}", &descriptor[..insert_at], clause, &descriptor[insert_at..]);
    }
    match descriptor.rfind(')') {
        Some(end) => format!("{}(SECURITY={}){}", &descriptor[..end], clause, &descriptor[end..]),
        None => descriptor.to_string(),
    }
}

/// Build the connect string the Oracle client should receive.
///
/// * full descriptors get the wallet directory injected
/// * aliases found in `<wallet_dir>/tnsnames.ora` are expanded then injected
/// * easy-connect strings get a `wallet_location` parameter
/// * anything else is passed through untouched
pub fn connect_string(dsn: &str, wallet_dir: Option<&Path>) -> String {
    let Some(dir) = wallet_dir else {
        return dsn.to_string();
    };
    let trimmed = dsn.trim();
    if trimmed.starts_with('(') {
        return inject_wallet_directory(trimmed, dir);
    }
    if let Ok(tns) = std::fs::read_to_string(dir.join("tnsnames.ora")) {
        if let Some(descriptor) = find_descriptor(&tns, trimmed) {
            return inject_wallet_directory(&descriptor, dir);
        }
    }
    if trimmed.contains('/') || trimmed.contains(':') {
        let sep = if trimmed.contains('?') { '&' } else { '?' };
        return format!("{trimmed}{sep}wallet_location={}", dir.display());
    }
    trimmed.to_string()
}
