// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Names derived from a pipeline name

const PIPELINE_SUFFIX: &str = "Pipeline";

/// The name without its `Pipeline` suffix
fn stem(name: &str) -> &str {
    match name.strip_suffix(PIPELINE_SUFFIX) {
        Some(stem) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Words of the stem, split on case changes and separators
fn words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = stem(name).chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | ' ') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();
        let boundary = c.is_uppercase()
            && prev.is_some_and(|p| {
                p.is_lowercase()
                    || p.is_ascii_digit()
                    || (p.is_uppercase() && next.is_some_and(char::is_lowercase))
            });

        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Workflow title: `FlutterBuildPipeline` → `Flutter Build`
pub fn workflow_title(name: &str) -> String {
    words(name).join(" ")
}

/// Job id: `FlutterBuildPipeline` → `flutter_build`
pub fn job_id(name: &str) -> String {
    words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Workflow file stem: `FlutterBuildPipeline` → `flutter-build`
pub fn file_stem(name: &str) -> String {
    words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
