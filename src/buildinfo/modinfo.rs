//! Module information text embedded by the Go linker.

use anyhow::{Context, Result, bail};

use super::{BuildInfo, Module};

const START_SENTINEL: [u8; 16] = [
    0x30, 0x77, 0xaf, 0x0c, 0x92, 0x74, 0x08, 0x02, 0x41, 0xe1, 0xc1, 0x07, 0xe6, 0xd6, 0x18, 0xe6,
];
const END_SENTINEL: [u8; 16] = [
    0xf9, 0x32, 0x43, 0x31, 0x86, 0x18, 0x20, 0x72, 0x00, 0x82, 0x42, 0x10, 0x41, 0x16, 0xd8, 0xf2,
];

/// Strip the binary sentinels wrapping the text, when present.
///
/// Must run on raw bytes: the sentinels are not valid UTF-8.
pub(super) fn unframe(raw: &[u8]) -> &[u8] {
    let len = raw.len();
    if len >= 33 && raw[len - 17] == b'\n' {
        &raw[16..len - 16]
    } else {
        raw
    }
}

/// Wrap module text the way the linker does.
#[cfg(test)]
pub(super) fn frame(text: &str) -> Vec<u8> {
    let mut out = START_SENTINEL.to_vec();
    out.extend_from_slice(text.as_bytes());
    out.extend_from_slice(&END_SENTINEL);
    out
}

/// Parse the tab-separated module listing.
///
/// Recognised lines: `go`, `path`, `mod`, `dep`, `=>` (replacement of the
/// preceding module) and `build key=value`.
pub(super) fn parse(text: &str) -> Result<BuildInfo> {
    let mut info = BuildInfo::default();
    // Which module a `=>` line replaces: None = main, Some(i) = deps[i].
    let mut last: Option<Option<usize>> = None;

    for (n, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let lineno = n + 1;
        let (key, rest) = line
            .split_once('\t')
            .with_context(|| format!("Malformed module info line {}: {:?}", lineno, line))?;

        match key {
            "go" => info.go_version = rest.to_string(),
            "path" => info.path = rest.to_string(),
            "mod" => {
                info.main = module(rest).with_context(|| format!("Invalid mod line {}", lineno))?;
                last = Some(None);
            }
            "dep" => {
                info.deps
                    .push(module(rest).with_context(|| format!("Invalid dep line {}", lineno))?);
                last = Some(Some(info.deps.len() - 1));
            }
            "=>" => {
                let replacement =
                    replacement(rest).with_context(|| format!("Invalid => line {}", lineno))?;
                let target = match last.take() {
                    Some(None) => &mut info.main,
                    Some(Some(i)) => &mut info.deps[i],
                    None => bail!("Replacement without a module on line {}", lineno),
                };
                if target.replace.is_some() {
                    bail!("Module replaced twice on line {}", lineno);
                }
                target.replace = Some(Box::new(replacement));
            }
            "build" => {
                let (k, v) = rest
                    .split_once('=')
                    .with_context(|| format!("Invalid build line {}: {:?}", lineno, rest))?;
                info.settings.push((unquote(k), unquote(v)));
            }
            other => bail!("Unexpected module info key {:?} on line {}", other, lineno),
        }
    }

    Ok(info)
}

fn module(rest: &str) -> Result<Module> {
    let fields: Vec<&str> = rest.split('\t').collect();
    match fields.as_slice() {
        [path, version] => Ok(Module::new(*path, *version, "")),
        [path, version, sum] => Ok(Module::new(*path, *version, *sum)),
        _ => bail!("Expected path, version and optional sum, got {:?}", rest),
    }
}

fn replacement(rest: &str) -> Result<Module> {
    let fields: Vec<&str> = rest.split('\t').collect();
    match fields.as_slice() {
        [path] => Ok(Module::new(*path, "", "")),
        [path, version] => Ok(Module::new(*path, *version, "")),
        [path, version, sum] => Ok(Module::new(*path, *version, *sum)),
        _ => bail!("Expected a replacement module, got {:?}", rest),
    }
}

/// Undo Go string quoting used for build keys and values with spaces.
fn unquote(s: &str) -> String {
    let Some(inner) = s.strip_prefix('"').and_then(|s| s.strip_suffix('"')) else {
        return s.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
