use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    Hook,
    Introduction,
    MainContent,
    CallToAction,
    Outro,
}

impl SectionName {
    /// Canonical order of a script.
    pub const ALL: [SectionName; 5] = [
        SectionName::Hook,
        SectionName::Introduction,
        SectionName::MainContent,
        SectionName::CallToAction,
        SectionName::Outro,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SectionName::Hook => "HOOK",
            SectionName::Introduction => "INTRODUCTION",
            SectionName::MainContent => "MAIN CONTENT",
            SectionName::CallToAction => "CALL TO ACTION",
            SectionName::Outro => "OUTRO",
        }
    }

    fn from_marker_label(label: &str) -> Option<Self> {
        let squashed: String = label
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match squashed.as_str() {
            "hook" => Some(SectionName::Hook),
            "introduction" | "intro" => Some(SectionName::Introduction),
            "maincontent" | "mainbody" | "body" => Some(SectionName::MainContent),
            "calltoaction" | "cta" => Some(SectionName::CallToAction),
            "outro" => Some(SectionName::Outro),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            SectionName::Hook => 0,
            SectionName::Introduction => 1,
            SectionName::MainContent => 2,
            SectionName::CallToAction => 3,
            SectionName::Outro => 4,
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: SectionName,
    pub text: String,
    #[serde(default)]
    pub timing_estimate: Option<String>,
}

impl Section {
    fn empty(name: SectionName) -> Self {
        Self {
            name,
            text: String::new(),
            timing_estimate: None,
        }
    }
}

/// One generated variation, ready to be written out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub topic: String,
    pub generated_at: DateTime<Utc>,
    pub variation: u32,
    pub full_script: String,
    pub sections: Vec<Section>,
}

impl Script {
    pub fn from_completion(topic: &str, raw: &str, variation: u32) -> Self {
        Self::with_timestamp(topic, raw, variation, Utc::now())
    }

    pub fn with_timestamp(
        topic: &str,
        raw: &str,
        variation: u32,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            topic: topic.to_string(),
            generated_at,
            variation,
            full_script: raw.to_string(),
            sections: parse_sections(raw),
        }
    }

    pub fn section(&self, name: SectionName) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// False when no marker was recognised in the completion at all.
    pub fn has_section_text(&self) -> bool {
        self.sections.iter().any(|s| !s.text.is_empty())
    }
}

// A label at the start of a line, after any mix of quote, heading, bullet,
// numbering, bold/italic or bracket decoration, a `Section N:` prefix, or a
// bracketed `m:ss-m:ss` range.
fn marker_regex() -> Result<&'static Regex, regex::Error> {
    static MARKER_RE: OnceCell<Regex> = OnceCell::new();
    MARKER_RE.get_or_try_init(|| {
        Regex::new(
            r"(?mi)^[ \t]*(?:(?:>|#{1,6}|[-+][ \t]|\d{1,2}[.)]|[*_]{1,3}|[\[(][ \t]*(?P<pre_time>\d{1,2}:\d{2}[ \t]*[-–—][ \t]*\d{1,2}:\d{2})[ \t]*[\])]|[\[(]|(?:section|part)[ \t]*\d{1,2}[ \t]*[:.\-–—])[ \t]*)*(?P<label>hook|introduction|intro|main[ \t_-]*content|main[ \t_-]*body|body|call[ \t_-]*to[ \t_-]*action|cta|outro)\b(?P<tail>[^\n]*)$",
        )
    })
}

// Closing decoration, an optional (note) or [note], and an optional separator
// that may follow a label on its heading line.
fn heading_tail_regex() -> Result<&'static Regex, regex::Error> {
    static TAIL_RE: OnceCell<Regex> = OnceCell::new();
    TAIL_RE.get_or_try_init(|| {
        Regex::new(
            r"^(?P<close>[*_\])]+)?[ \t]*[*_\])]*[ \t]*(?:\((?P<paren>[^)\n]*)\)|\[(?P<bracket>[^\]\n]*)\])?[ \t]*[*_\])]*[ \t]*(?P<sep>[:\-–—][ \t]*[*_]*)?[ \t]*",
        )
    })
}

fn time_expr_regex() -> Result<&'static Regex, regex::Error> {
    static TIME_RE: OnceCell<Regex> = OnceCell::new();
    TIME_RE.get_or_try_init(|| {
        Regex::new(
            r"(?i)\d+(?::\d{2})?[ \t]*(?:[-–—]|to)[ \t]*\d+(?::\d{2})?(?:[ \t]*(?:seconds?|secs?|minutes?|mins?|s|m)\b)?|\d+(?::\d{2})?[ \t]*(?:seconds?|secs?|minutes?|mins?)\b|\d{1,2}:\d{2}",
        )
    })
}

fn timing_line_regex() -> Result<&'static Regex, regex::Error> {
    static TIMING_RE: OnceCell<Regex> = OnceCell::new();
    TIMING_RE.get_or_try_init(|| {
        Regex::new(
            r"(?mi)^[ \t\[(*_>-]*(?:estimated[ \t]+)?(?:timing|time|duration)[ \t]*[*_]*[ \t]*[:\-–—][ \t]*[*_]*[ \t]*(?P<value>[^\]\)\n*]+)",
        )
    })
}

fn time_range_regex() -> Result<&'static Regex, regex::Error> {
    static RANGE_RE: OnceCell<Regex> = OnceCell::new();
    RANGE_RE.get_or_try_init(|| Regex::new(r"\d{1,2}:\d{2}[ \t]*[-–—][ \t]*\d{1,2}:\d{2}"))
}

struct Marker {
    name: SectionName,
    line_start: usize,
    content_start: usize,
    note: Option<String>,
}

fn find_markers(raw: &str) -> Result<Vec<Marker>, regex::Error> {
    let marker_re = marker_regex()?;
    let tail_re = heading_tail_regex()?;

    let mut seen = [false; 5];
    let mut markers = Vec::new();

    for caps in marker_re.captures_iter(raw) {
        let (Some(whole), Some(label), Some(tail)) = (caps.get(0), caps.name("label"), caps.name("tail")) else {
            continue;
        };
        let Some(name) = SectionName::from_marker_label(label.as_str()) else {
            continue;
        };
        if seen[name.index()] {
            continue;
        }

        let Some(head) = tail_re.captures(tail.as_str()) else {
            continue;
        };
        let head_len = head.get(0).map(|m| m.end()).unwrap_or(0);
        let rest = tail.as_str()[head_len..].trim();
        let has_sep = head.name("sep").is_some();
        let closed = head.name("close").is_some();

        // A label followed by prose is a sentence, not a heading, unless the
        // label's own bold or bracket closes first.
        if !has_sep && !closed && !rest.is_empty() {
            continue;
        }

        let note = head
            .name("paren")
            .or_else(|| head.name("bracket"))
            .or_else(|| caps.name("pre_time"))
            .map(|m| m.as_str().trim().to_string())
            .filter(|n| !n.is_empty());

        seen[name.index()] = true;
        markers.push(Marker {
            name,
            line_start: whole.start(),
            content_start: tail.start() + head_len,
            note,
        });
    }

    Ok(markers)
}

/// Splits a raw completion into the five canonical sections.
///
/// Never fails: a section whose marker cannot be found comes back with empty
/// text, and text before the first marker is dropped.
pub fn parse_sections(raw: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = SectionName::ALL.iter().map(|n| Section::empty(*n)).collect();

    let markers = match find_markers(raw) {
        Ok(markers) => markers,
        Err(e) => {
            warn!("section marker pattern failed to compile: {e}");
            return sections;
        }
    };

    for (i, marker) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map(|next| next.line_start).unwrap_or(raw.len());
        let text = raw[marker.content_start..end].trim();

        let section = &mut sections[marker.name.index()];
        section.text = text.to_string();
        section.timing_estimate = marker
            .note
            .as_deref()
            .and_then(timing_from_note)
            .or_else(|| timing_from_body(text));
    }

    let missing: Vec<&str> = sections
        .iter()
        .filter(|s| s.text.is_empty())
        .map(|s| s.name.label())
        .collect();
    if !missing.is_empty() {
        debug!("sections without text: {}", missing.join(", "));
    }

    sections
}

fn timing_from_note(note: &str) -> Option<String> {
    let re = time_expr_regex().ok()?;
    re.find(note).map(|m| m.as_str().trim().to_string())
}

fn timing_from_body(text: &str) -> Option<String> {
    if let Ok(re) = timing_line_regex() {
        if let Some(value) = re.captures(text).and_then(|c| c.name("value")) {
            let value = value.as_str().trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    let re = time_range_regex().ok()?;
    re.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "\
Title: How to Start a YouTube Channel in 2024

**HOOK** (0:00 - 0:15)
Did you know 500 hours of video hit YouTube every minute?

**INTRODUCTION** (0:15 - 0:45)
Hey everyone, welcome back to the channel!

**MAIN CONTENT**
Step 1: pick a niche.
[Show examples on screen]
Step 2: get a decent microphone.

**CALL TO ACTION**
Smash that subscribe button.
Timing: 20 seconds

**OUTRO**
See you in the next one.
";

    fn text_of(sections: &[Section], name: SectionName) -> &str {
        &sections[name.index()].text
    }

    #[test]
    fn all_markers_present_yield_canonical_sections() {
        let sections = parse_sections(FULL);
        let names: Vec<SectionName> = sections.iter().map(|s| s.name).collect();
        assert_eq!(names, SectionName::ALL.to_vec());

        assert_eq!(
            text_of(&sections, SectionName::Hook),
            "Did you know 500 hours of video hit YouTube every minute?"
        );
        assert_eq!(
            text_of(&sections, SectionName::Introduction),
            "Hey everyone, welcome back to the channel!"
        );
        assert_eq!(
            text_of(&sections, SectionName::MainContent),
            "Step 1: pick a niche.\n[Show examples on screen]\nStep 2: get a decent microphone."
        );
        assert_eq!(
            text_of(&sections, SectionName::CallToAction),
            "Smash that subscribe button.\nTiming: 20 seconds"
        );
        assert_eq!(text_of(&sections, SectionName::Outro), "See you in the next one.");
    }

    #[test]
    fn missing_marker_leaves_section_empty() {
        let raw = FULL.replace("**CALL TO ACTION**\n", "");
        let sections = parse_sections(&raw);

        assert_eq!(sections.len(), 5);
        assert_eq!(text_of(&sections, SectionName::CallToAction), "");
        assert_eq!(
            text_of(&sections, SectionName::MainContent),
            "Step 1: pick a niche.\n[Show examples on screen]\nStep 2: get a decent microphone.\n\nSmash that subscribe button.\nTiming: 20 seconds"
        );
        assert_eq!(text_of(&sections, SectionName::Outro), "See you in the next one.");
    }

    #[test]
    fn inline_markers_and_mixed_case_are_recognised() {
        let raw = "hook: Stop scrolling!\nIntro: I'm Sam.\n## Main Content: Section one\nMore detail.\n- CTA: Like and subscribe.\nOutro - Bye!";
        let sections = parse_sections(raw);

        assert_eq!(text_of(&sections, SectionName::Hook), "Stop scrolling!");
        assert_eq!(text_of(&sections, SectionName::Introduction), "I'm Sam.");
        assert_eq!(text_of(&sections, SectionName::MainContent), "Section one\nMore detail.");
        assert_eq!(text_of(&sections, SectionName::CallToAction), "Like and subscribe.");
        assert_eq!(text_of(&sections, SectionName::Outro), "Bye!");
    }

    #[test]
    fn numbered_and_heading_markers_are_recognised() {
        let raw = "1. **Hook (First 15 seconds)**:\nA\n\n### 2. Introduction\nB\n\n3) Main Body\nC\n\n4. **Call-to-Action**\nD\n\n5. Outro\nE";
        let sections = parse_sections(raw);
        let texts: Vec<&str> = sections.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn bracketed_bold_and_prefixed_headings_are_recognised() {
        let texts = |raw: &str| -> Vec<String> {
            parse_sections(raw).into_iter().map(|s| s.text).collect()
        };
        let expected = vec!["A", "B", "C", "D", "E"];

        assert_eq!(
            texts("**[HOOK]**\nA\n**[INTRODUCTION]**\nB\n**[MAIN CONTENT]**\nC\n**[CALL TO ACTION]**\nD\n**[OUTRO]**\nE"),
            expected
        );
        assert_eq!(
            texts("**HOOK** A\n**INTRODUCTION** B\n**MAIN CONTENT** C\n**CALL TO ACTION** D\n**OUTRO** E"),
            expected
        );
        assert_eq!(
            texts("**Section 1: Hook**\nA\n**Section 2: Introduction**\nB\n**Section 3: Main Content**\nC\n**Section 4: Call to Action**\nD\n**Section 5: Outro**\nE"),
            expected
        );

        let timed = "### [0:00-0:15] HOOK\nA\n### [0:15-0:45] INTRODUCTION\nB\n### MAIN CONTENT\nC\n### CALL TO ACTION\nD\n### OUTRO\nE";
        assert_eq!(texts(timed), expected);
        let sections = parse_sections(timed);
        assert_eq!(
            sections[SectionName::Introduction.index()].timing_estimate.as_deref(),
            Some("0:15-0:45")
        );
    }

    #[test]
    fn bold_sub_heading_inside_main_content_is_not_a_marker() {
        let raw = "**HOOK**\nHi\n**MAIN CONTENT**\n**Body Language Tips**\nStand tall.\n[Intro music fades]\n**OUTRO**\nBye";
        let sections = parse_sections(raw);
        assert_eq!(
            text_of(&sections, SectionName::MainContent),
            "**Body Language Tips**\nStand tall.\n[Intro music fades]"
        );
        assert_eq!(text_of(&sections, SectionName::Introduction), "");
    }

    #[test]
    fn prose_mentioning_a_label_is_not_a_marker() {
        let raw = "HOOK\nThe hook matters.\nIntroduction to editing is covered later.\nBody language counts too.\nOUTRO\nBye.";
        let sections = parse_sections(raw);

        assert_eq!(
            text_of(&sections, SectionName::Hook),
            "The hook matters.\nIntroduction to editing is covered later.\nBody language counts too."
        );
        assert_eq!(text_of(&sections, SectionName::Introduction), "");
        assert_eq!(text_of(&sections, SectionName::MainContent), "");
        assert_eq!(text_of(&sections, SectionName::Outro), "Bye.");
    }

    #[test]
    fn repeated_label_only_counts_once() {
        let raw = "Hook:\nfirst\nOutro:\nbye\nHook:\nagain";
        let sections = parse_sections(raw);
        assert_eq!(text_of(&sections, SectionName::Hook), "first");
        assert_eq!(text_of(&sections, SectionName::Outro), "bye\nHook:\nagain");
    }

    #[test]
    fn unstructured_text_degrades_to_empty_sections() {
        let sections = parse_sections("Sorry, I can't help with that.");
        assert_eq!(sections.len(), 5);
        assert!(sections.iter().all(|s| s.text.is_empty() && s.timing_estimate.is_none()));
        assert!(parse_sections("").iter().all(|s| s.text.is_empty()));
    }

    #[test]
    fn timing_comes_from_heading_note_or_body() {
        let sections = parse_sections(FULL);
        assert_eq!(
            sections[SectionName::Hook.index()].timing_estimate.as_deref(),
            Some("0:00 - 0:15")
        );
        assert_eq!(
            sections[SectionName::CallToAction.index()].timing_estimate.as_deref(),
            Some("20 seconds")
        );
        assert_eq!(sections[SectionName::MainContent.index()].timing_estimate, None);

        let raw = "**HOOK** (First 15 seconds - grab attention)\nHi\n**OUTRO**\n[Estimated time: 30s]\nBye";
        let sections = parse_sections(raw);
        assert_eq!(
            sections[SectionName::Hook.index()].timing_estimate.as_deref(),
            Some("15 seconds")
        );
        assert_eq!(
            sections[SectionName::Outro.index()].timing_estimate.as_deref(),
            Some("30s")
        );
    }

    #[test]
    fn script_keeps_raw_text_and_json_round_trips() {
        let script = Script::from_completion("Channel tips", FULL, 2);
        assert_eq!(script.full_script, FULL);
        assert_eq!(script.variation, 2);
        assert!(script.has_section_text());
        assert_eq!(
            script.section(SectionName::Outro).map(|s| s.text.as_str()),
            Some("See you in the next one.")
        );

        let json = serde_json::to_string_pretty(&script).unwrap();
        assert!(json.contains("\"main_content\""));
        assert!(json.contains("\"timing_estimate\": null"));
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }
}
