//! Best-effort path normalization: environment variables, then `~`, then
//! absolutization. Not a validator — malformed input comes back as a path
//! without complaint.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

/// Expands `$VAR`/`${VAR}` references and a leading `~`, then resolves the
/// result against the current working directory. The path does not have to
/// exist. Unresolved variable references are left as literal text.
pub fn sanitize(input: &str) -> PathBuf {
    let expanded = expand_env_vars(input);
    let expanded = expand_home(&expanded);
    absolutize(Path::new(&expanded))
}

fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                let name: String = chars.by_ref().take_while(|c| *c != '}').collect();
                match std::env::var(&name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => {
                        out.push_str("${");
                        out.push_str(&name);
                        out.push('}');
                    }
                }
            }
            Some(c) if c.is_alphanumeric() || *c == '_' => {
                let mut name = String::new();
                while let Some(c) = chars.peek() {
                    if c.is_alphanumeric() || *c == '_' {
                        name.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match std::env::var(&name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => {
                        out.push('$');
                        out.push_str(&name);
                    }
                }
            }
            _ => out.push('$'),
        }
    }

    out
}

fn expand_home(input: &str) -> String {
    let Some(base) = BaseDirs::new() else {
        return input.to_string();
    };
    if input == "~" {
        return base.home_dir().to_string_lossy().into_owned();
    }
    if let Some(rest) = input.strip_prefix("~/") {
        return base.home_dir().join(rest).to_string_lossy().into_owned();
    }
    input.to_string()
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
