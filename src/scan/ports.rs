//! Port declarations from build files
//!
//! Extracts `EXPOSE` directives from Dockerfiles and resolves the effective
//! port list used by manifest synthesis. Parsing is best-effort: an
//! unreadable or malformed build file yields an empty declared-port list,
//! never an error.

use std::path::Path;
use tracing::{debug, warn};

/// Fallback ports used when a build file declares none.
///
/// Favors producing a working-but-imprecise Service over failing the
/// pipeline.
pub const DEFAULT_PORTS: [u16; 3] = [80, 3000, 8080];

/// Reads a build file and returns the ports its `EXPOSE` directives declare.
pub fn declared_ports(build_file: &Path) -> Vec<u16> {
    match std::fs::read_to_string(build_file) {
        Ok(content) => {
            let ports = parse_expose_directives(&content);
            debug!(
                file = %build_file.display(),
                ports = ?ports,
                "Extracted port declarations"
            );
            ports
        }
        Err(err) => {
            warn!(
                file = %build_file.display(),
                error = %err,
                "Could not read build file, treating as no declared ports"
            );
            Vec::new()
        }
    }
}

/// Parses `EXPOSE` directives out of build file content.
///
/// A line whose first token is `EXPOSE` (Dockerfile instructions are
/// case-insensitive) contributes every following whitespace-separated token
/// that parses as a non-zero port. Tokens with protocol suffixes like
/// `8080/tcp` are ignored; only plain integer ports count.
pub fn parse_expose_directives(content: &str) -> Vec<u16> {
    let mut ports = Vec::new();
    for line in content.lines() {
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else { continue };
        if !first.eq_ignore_ascii_case("EXPOSE") {
            continue;
        }
        for token in tokens {
            if let Ok(port) = token.parse::<u16>() {
                if port > 0 {
                    ports.push(port);
                }
            }
        }
    }
    ports
}

/// Resolves the effective port list for one build file.
///
/// Non-empty declarations are returned verbatim (order preserved, duplicates
/// allowed); an empty declaration falls back to [`DEFAULT_PORTS`].
pub fn resolve_ports(declared: &[u16]) -> Vec<u16> {
    if declared.is_empty() {
        DEFAULT_PORTS.to_vec()
    } else {
        declared.to_vec()
    }
}

/// Deduplicated union of declared ports across all build files, in
/// first-seen order. Informational only; per-file effective lists are never
/// deduplicated.
pub fn exposed_port_summary<'a, I>(per_file: I) -> Vec<u16>
where
    I: IntoIterator<Item = &'a [u16]>,
{
    let mut seen = Vec::new();
    for ports in per_file {
        for &port in ports {
            if !seen.contains(&port) {
                seen.push(port);
            }
        }
    }
    seen
}
