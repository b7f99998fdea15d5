//! Comment grammars by file extension.
//!
//! The table order is significant: when two grammars claim the same
//! extension, the earlier one wins.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

/// Comment syntax for one language.
#[derive(Debug, PartialEq, Eq)]
pub struct LanguageGrammar {
    pub name: &'static str,
    /// Lower-case extensions without the leading dot
    pub extensions: &'static [&'static str],
    pub single_line_prefixes: &'static [&'static str],
    /// `(start, end)` delimiter pairs
    pub multi_line_delimiters: &'static [(&'static str, &'static str)],
    pub shebang_hints: &'static [&'static str],
}

const C_BLOCK: &[(&str, &str)] = &[("/*", "*/")];
const SLASH: &[&str] = &["//"];
const HASH: &[&str] = &["#"];

static LANGUAGES: &[LanguageGrammar] = &[
    LanguageGrammar {
        name: "Go",
        extensions: &["go"],
        single_line_prefixes: SLASH,
        multi_line_delimiters: C_BLOCK,
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "JavaScript",
        extensions: &["js", "jsx", "mjs"],
        single_line_prefixes: SLASH,
        multi_line_delimiters: C_BLOCK,
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "TypeScript",
        extensions: &["ts", "tsx"],
        single_line_prefixes: SLASH,
        multi_line_delimiters: C_BLOCK,
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "Python",
        extensions: &["py"],
        single_line_prefixes: HASH,
        multi_line_delimiters: &[("\"\"\"", "\"\"\"")],
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "Java",
        extensions: &["java"],
        single_line_prefixes: SLASH,
        multi_line_delimiters: C_BLOCK,
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "C",
        extensions: &["c", "h"],
        single_line_prefixes: SLASH,
        multi_line_delimiters: C_BLOCK,
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "C++",
        extensions: &["cpp", "cc", "cxx", "hpp"],
        single_line_prefixes: SLASH,
        multi_line_delimiters: C_BLOCK,
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "Rust",
        extensions: &["rs"],
        single_line_prefixes: SLASH,
        multi_line_delimiters: C_BLOCK,
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "Ruby",
        extensions: &["rb"],
        single_line_prefixes: HASH,
        multi_line_delimiters: &[("=begin", "=end")],
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "Shell",
        extensions: &["sh", "bash", "zsh"],
        single_line_prefixes: HASH,
        multi_line_delimiters: &[],
        shebang_hints: &["#!/bin/sh", "#!/bin/bash", "#!/usr/bin/env"],
    },
    LanguageGrammar {
        name: "SQL",
        extensions: &["sql"],
        single_line_prefixes: &["--"],
        multi_line_delimiters: C_BLOCK,
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "YAML",
        extensions: &["yaml", "yml"],
        single_line_prefixes: HASH,
        multi_line_delimiters: &[],
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "PHP",
        extensions: &["php"],
        single_line_prefixes: &["//", "#"],
        multi_line_delimiters: C_BLOCK,
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "CSS",
        extensions: &["css", "scss", "sass", "less"],
        single_line_prefixes: &[],
        multi_line_delimiters: C_BLOCK,
        shebang_hints: &[],
    },
    LanguageGrammar {
        name: "HTML",
        extensions: &["html", "htm"],
        single_line_prefixes: &[],
        multi_line_delimiters: &[("<!--", "-->")],
        shebang_hints: &[],
    },
];

/// Extension -> index of the first grammar claiming it.
static BY_EXTENSION: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (idx, lang) in LANGUAGES.iter().enumerate() {
        for ext in lang.extensions {
            map.entry(*ext).or_insert(idx);
        }
    }
    map
});

/// All grammars in registry order.
pub fn all() -> &'static [LanguageGrammar] {
    LANGUAGES
}

/// Look up a grammar by file extension, with or without the leading dot.
pub fn lookup(extension: &str) -> Option<&'static LanguageGrammar> {
    let ext = extension.strip_prefix('.').unwrap_or(extension);
    if ext.is_empty() {
        return None;
    }
    BY_EXTENSION
        .get(ext.to_lowercase().as_str())
        .map(|&idx| &LANGUAGES[idx])
}

/// Resolve the grammar for a file from its extension, falling back to
/// shebang hints on the first line for files without a known extension.
pub fn detect(path: &Path, first_line: &str) -> Option<&'static LanguageGrammar> {
    if let Some(lang) = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(lookup)
    {
        return Some(lang);
    }

    let first_line = first_line.trim_start();
    if !first_line.starts_with("#!") {
        return None;
    }
    LANGUAGES.iter().find(|lang| {
        lang.shebang_hints
            .iter()
            .any(|hint| first_line.starts_with(hint))
    })
}

impl LanguageGrammar {
    /// Whether this grammar can express any comment at all.
    pub fn has_comments(&self) -> bool {
        !self.single_line_prefixes.is_empty() || !self.multi_line_delimiters.is_empty()
    }
}
