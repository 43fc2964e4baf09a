use regex::Regex;
use std::sync::LazyLock;

use crate::domain::value_objects::CodeLanguage;

/// Blocks shorter than this (after trimming) are never reported as code.
pub const MIN_CODE_CHARS: usize = 30;

static FENCED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+-]*)[^\n]*\n(.*?)```").expect("fence pattern")
});

static DDS_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^[ \t]*(?:\d{1,5}[ \t]*)?A[ \t]+\S[^\n]*(?:\n|$)){2,}")
        .expect("dds pattern")
});

static RPG_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)(?:^(?:",
        r"[ \t]*(?:\d{1,5}[ \t]*)?[HFDICOP][ \t]{2,}\S[^\n]*",
        r"|[ \t]*(?i:\*\*free|/free|/end-free|ctl-opt|dcl-(?:s|ds|c|f|pr|pi|proc|subf|parm)",
        r"|end-(?:proc|ds|pr|pi)|begsr|endsr|exsr|chain|setll|setgt|reade|readp|monitor",
        r"|on-error|endmon|callp|evalr?)\b[^\n]*",
        r"|[^\n]*;[ \t]*\r?",
        r")(?:\n|$)){2,}"
    ))
    .expect("rpg pattern")
});

static RPG_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^[ \t]*(?:\d{1,5}[ \t]*)?[HFDICOP][ \t]{2,}\S",
        r"|(?i:\*\*free|\bctl-opt\b|\bdcl-(?:s|ds|c|f|pr|pi|proc)\b|\bbegsr\b|\bendsr\b",
        r"|\bexsr\b|\bchain\b|\bsetll\b|\breade\b|\bendmon\b|\bcallp\b)"
    ))
    .expect("rpg marker pattern")
});

static SQL_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\b(?:SELECT\b[^;]*?\bFROM|INSERT\s+INTO|UPDATE\s+[\w./]+\s+SET|DELETE\s+FROM",
        r"|CREATE\s+(?:OR\s+REPLACE\s+)?(?:TABLE|VIEW|INDEX|PROCEDURE|FUNCTION|TRIGGER))\b[^;]*;"
    ))
    .expect("sql pattern")
});

static CL_PROGRAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^[ \t]*PGM\b.*?^[ \t]*ENDPGM\b[^\n]*").expect("cl program pattern")
});

static CL_COMMANDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)(?:^[ \t]*(?:[A-Z][A-Z0-9_]*:[ \t]*)?",
        r"(?:DCLF?|CHGVAR|CALLPRC|CALL|MONMSG|SNDPGMMSG|SNDMSG|RCVMSG|OVRDBF|DLTOVR|RTVJOBA",
        r"|RTVSYSVAL|CHKOBJ|CRTPF|CRTLF|CPYF|CLRPFM|ADDLIBLE|RMVLIBLE|SBMJOB|IF|ELSE|DO|ENDDO",
        r"|GOTO|RETURN|PGM|ENDPGM)\b[^\n]*(?:\n|$)){2,}"
    ))
    .expect("cl command pattern")
});

static INDENTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^(?: {4,}|\t)[ \t]*\S[^\n]*(?:\n|$)){2,}").expect("indent pattern")
});

static FIXED_SPEC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(?:\d{1,5}[ \t]*)?[HFDICOPA][ \t]{2,}\S").expect("rpg fixed-form line pattern")
});

static DDS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(?:\d{1,5}[ \t]*)?A[ \t]{2,}\S").expect("dds line pattern")
});

static CODE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i:\b(?:dcl-s|dcl-ds|dcl-proc|ctl-opt|begsr|endsr|exsr|chain|setll|monitor|endmon|callp)\b)",
        r"|\b(?:SFLSIZ|SFLPAG|SFLCTL|SFLDSP|DSPATR|COLHDG|DSPSIZ|INDARA|CF\d\d|CA\d\d|SELECT|FROM",
        r"|WHERE|INSERT|UPDATE|DELETE|CREATE|JOIN|VALUES|PGM|ENDPGM|DCL|CHGVAR|MONMSG|CALL)\b"
    ))
    .expect("keyword pattern")
});

static SQL_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:SELECT|INSERT|UPDATE|DELETE|CREATE|FROM|WHERE|JOIN)\b").expect("sql keywords")
});

static CL_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:PGM|ENDPGM|DCL|CHGVAR|MONMSG|SNDPGMMSG|OVRDBF)\b").expect("cl keywords")
});

/// A code region found in page text. Offsets are byte offsets into that text.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub language: CodeLanguage,
    pub content: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternKind {
    Fenced,
    Dds,
    Rpg,
    Sql,
    ClProgram,
    ClCommands,
    Indented,
}

impl PatternKind {
    fn language(self) -> CodeLanguage {
        match self {
            PatternKind::Dds => CodeLanguage::Dds,
            PatternKind::Rpg => CodeLanguage::Rpg,
            PatternKind::Sql => CodeLanguage::Sql,
            PatternKind::ClProgram | PatternKind::ClCommands => CodeLanguage::Cl,
            PatternKind::Fenced | PatternKind::Indented => CodeLanguage::Generic,
        }
    }
}

// Order matters: it breaks ties between equally long matches.
static PATTERNS: [(PatternKind, &LazyLock<Regex>); 7] = [
    (PatternKind::Fenced, &FENCED),
    (PatternKind::Dds, &DDS_BLOCK),
    (PatternKind::Rpg, &RPG_BLOCK),
    (PatternKind::Sql, &SQL_STATEMENT),
    (PatternKind::ClProgram, &CL_PROGRAM),
    (PatternKind::ClCommands, &CL_COMMANDS),
    (PatternKind::Indented, &INDENTED),
];

#[derive(Debug)]
struct Candidate {
    block: CodeBlock,
    order: usize,
    generic: bool,
}

impl Candidate {
    fn len(&self) -> usize {
        self.block.end - self.block.start
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodeDetector;

impl CodeDetector {
    pub fn new() -> Self {
        Self
    }

    /// Non-overlapping code blocks in `text`, ordered by position.
    pub fn detect(&self, text: &str) -> Vec<CodeBlock> {
        let mut candidates = Vec::new();

        for (order, (kind, pattern)) in PATTERNS.iter().enumerate() {
            for captures in pattern.captures_iter(text) {
                let Some(whole) = captures.get(0) else {
                    continue;
                };

                let (content, language, end) = match kind {
                    PatternKind::Fenced => {
                        let tag = captures.get(1).map_or("", |m| m.as_str());
                        let body = captures
                            .get(2)
                            .map_or("", |m| m.as_str())
                            .trim_end_matches(['\r', '\n']);
                        let language =
                            CodeLanguage::from_fence_tag(tag).unwrap_or_else(|| guess_language(body));
                        (body, language, whole.end())
                    }
                    other => {
                        let body = whole.as_str().trim_end_matches(['\r', '\n']);
                        (body, other.language(), whole.start() + body.len())
                    }
                };

                let accepted = match kind {
                    PatternKind::Fenced => content.trim().chars().count() >= MIN_CODE_CHARS,
                    PatternKind::Rpg => RPG_MARKER.is_match(content) && looks_like_code(content),
                    _ => looks_like_code(content),
                };
                if !accepted {
                    continue;
                }

                candidates.push(Candidate {
                    block: CodeBlock {
                        language,
                        content: content.to_string(),
                        start: whole.start(),
                        end,
                    },
                    order,
                    generic: *kind == PatternKind::Indented,
                });
            }
        }

        select_non_overlapping(candidates)
    }
}

/// Longest match wins; language-specific matches are placed before bare
/// indentation matches, so a generic block never hides a tagged one.
fn select_non_overlapping(mut candidates: Vec<Candidate>) -> Vec<CodeBlock> {
    candidates.sort_by(|a, b| {
        a.generic
            .cmp(&b.generic)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.order.cmp(&b.order))
            .then_with(|| a.block.start.cmp(&b.block.start))
    });

    let mut chosen: Vec<CodeBlock> = Vec::new();
    for candidate in candidates {
        let overlaps = chosen
            .iter()
            .any(|kept| candidate.block.start < kept.end && kept.start < candidate.block.end);
        if !overlaps {
            chosen.push(candidate.block);
        }
    }

    chosen.sort_by_key(|block| block.start);
    chosen
}

/// Heuristic check that a region is source code rather than prose.
pub fn looks_like_code(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_CODE_CHARS {
        return false;
    }

    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.is_empty() {
        return false;
    }
    let line_count = lines.len() as f32;

    let mut score = 0i32;

    let spec_lines = lines.iter().filter(|l| FIXED_SPEC_LINE.is_match(l)).count();
    if spec_lines as f32 / line_count >= 0.5 {
        score += 2;
    }

    let semicolon_lines = lines
        .iter()
        .filter(|l| l.trim_end().ends_with(';'))
        .count();
    if semicolon_lines as f32 / line_count >= 0.3 {
        score += 1;
    }

    let open = trimmed.matches('(').count();
    let close = trimmed.matches(')').count();
    if open.min(close) as f32 / line_count >= 0.5 {
        score += 1;
    }

    if lines.len() >= 2
        && lines
            .iter()
            .all(|l| l.starts_with('\t') || l.starts_with("  "))
    {
        score += 1;
    }

    if CODE_KEYWORDS.is_match(trimmed) {
        score += 1;
    }

    let sentence_lines = lines
        .iter()
        .filter(|l| l.trim_end().ends_with('.') && l.split_whitespace().count() > 6)
        .count();
    if sentence_lines as f32 / line_count >= 0.5 {
        score -= 2;
    }

    score >= 2
}

/// Language for an untagged fenced block.
fn guess_language(body: &str) -> CodeLanguage {
    let lines: Vec<&str> = body.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return CodeLanguage::Generic;
    }

    let dds_lines = lines.iter().filter(|l| DDS_LINE.is_match(l)).count();
    if dds_lines * 2 >= lines.len() {
        CodeLanguage::Dds
    } else if RPG_MARKER.is_match(body) {
        CodeLanguage::Rpg
    } else if CL_KEYWORDS.is_match(body) {
        CodeLanguage::Cl
    } else if SQL_KEYWORDS.is_match(body) {
        CodeLanguage::Sql
    } else {
        CodeLanguage::Generic
    }
}
