//! Tolerant tokenizer for the inline text-area markup vocabulary.
//!
//! Recognized tags (case-insensitive): `emphasis`, `strong`, `code`,
//! `commentary`, `sup`, `sub`, `a href="..."`, `strikethrough`, `inverted`
//! and `br`. Anything else that looks like a tag stays literal text, and the
//! tokenizer never fails.

use std::borrow::Cow;

/// Opening inline tag with its payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InlineTag {
    Emphasis,
    Strong,
    Code,
    Commentary,
    Superscript,
    Subscript,
    Anchor { href: String },
    Strikethrough,
    Inverted,
}

/// Payload-free tag identity used to match closing tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagKind {
    Emphasis,
    Strong,
    Code,
    Commentary,
    Superscript,
    Subscript,
    Anchor,
    Strikethrough,
    Inverted,
}

impl InlineTag {
    pub fn kind(&self) -> TagKind {
        match self {
            Self::Emphasis => TagKind::Emphasis,
            Self::Strong => TagKind::Strong,
            Self::Code => TagKind::Code,
            Self::Commentary => TagKind::Commentary,
            Self::Superscript => TagKind::Superscript,
            Self::Subscript => TagKind::Subscript,
            Self::Anchor { .. } => TagKind::Anchor,
            Self::Strikethrough => TagKind::Strikethrough,
            Self::Inverted => TagKind::Inverted,
        }
    }

    /// Reference id of an anchor: the part of `href` after `#`.
    pub fn reference_id(&self) -> Option<&str> {
        match self {
            Self::Anchor { href } => Some(
                href.split_once('#')
                    .map_or(href.as_str(), |(_, id)| id),
            ),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagEvent {
    Open(InlineTag),
    Close(TagKind),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Tag(TagEvent),
}

/// Whitespace-delimited chunk of visible text with the tag boundaries that
/// fall inside or directly around it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Word {
    pub segments: Vec<Segment>,
    /// Whitespace followed this word in the source.
    pub trailing_space: bool,
    /// A `<br>` preceded this word; it must start a new line.
    pub breaks_line: bool,
}

impl Word {
    /// Visible text with tags stripped.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if let Segment::Text(text) = segment {
                out.push_str(text);
            }
        }
        out
    }

    pub fn has_text(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Text(text) if !text.is_empty()))
    }

    fn char_count(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => text.chars().count(),
                Segment::Tag(_) => 0,
            })
            .sum()
    }
}

enum ParsedTag {
    Event(TagEvent),
    LineBreak,
}

#[derive(Default)]
struct Tokenizer {
    words: Vec<Word>,
    current: Word,
    text: String,
}

impl Tokenizer {
    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.text);
        let text = match quick_xml::escape::unescape(&raw) {
            Ok(Cow::Owned(unescaped)) => unescaped,
            Ok(Cow::Borrowed(_)) | Err(_) => raw,
        };
        self.current.segments.push(Segment::Text(text));
    }

    /// Close the current word at a whitespace run or a forced break.
    ///
    /// A chunk holding only tags is kept as the prefix of the next word.
    fn end_word(&mut self, trailing_space: bool) {
        self.flush_text();
        if self.current.has_text() {
            let mut word = std::mem::take(&mut self.current);
            word.trailing_space = trailing_space;
            self.words.push(word);
        }
    }

    fn push_tag(&mut self, tag: ParsedTag) {
        match tag {
            ParsedTag::Event(event) => {
                self.flush_text();
                self.current.segments.push(Segment::Tag(event));
            }
            ParsedTag::LineBreak => {
                self.end_word(false);
                self.current.breaks_line = true;
            }
        }
    }

    fn finish(mut self) -> Vec<Word> {
        self.flush_text();
        if self.current.has_text() {
            self.words.push(self.current);
        } else if let Some(last) = self.words.last_mut() {
            // Trailing tag-only chunk: closing tags belong to the last word.
            last.segments.append(&mut self.current.segments);
        }
        self.words
    }
}

/// Split markup into words, keeping tag boundaries attached.
pub fn tokenize(markup: &str) -> Vec<Word> {
    let mut tokenizer = Tokenizer::default();
    let mut rest = markup;
    let mut in_space = false;

    while let Some(ch) = rest.chars().next() {
        if ch.is_whitespace() {
            if !in_space {
                tokenizer.end_word(true);
                in_space = true;
            }
            rest = &rest[ch.len_utf8()..];
            continue;
        }
        in_space = false;

        if ch == '<' {
            if let Some((tag, consumed)) = parse_tag_at(rest) {
                tokenizer.push_tag(tag);
                rest = &rest[consumed..];
                continue;
            }
        }
        tokenizer.text.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    tokenizer.finish()
}

/// Parse a tag starting at `input[0] == '<'`, returning it and its byte length.
fn parse_tag_at(input: &str) -> Option<(ParsedTag, usize)> {
    let body_end = input[1..].find(|c: char| c == '<' || c == '>')? + 1;
    if !input[body_end..].starts_with('>') {
        return None;
    }
    let tag = parse_tag_body(&input[1..body_end])?;
    Some((tag, body_end + 1))
}

fn parse_tag_body(body: &str) -> Option<ParsedTag> {
    let body = body.trim();
    let (closing, body) = match body.strip_prefix('/') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, body),
    };
    let body = body.strip_suffix('/').map_or(body, str::trim_end);
    let (name, attrs) = match body.find(char::is_whitespace) {
        Some(idx) => (&body[..idx], body[idx..].trim()),
        None => (body, ""),
    };
    if name.is_empty() {
        return None;
    }

    let kind = match name.to_ascii_lowercase().as_str() {
        "br" => return Some(ParsedTag::LineBreak),
        "emphasis" => TagKind::Emphasis,
        "strong" => TagKind::Strong,
        "code" => TagKind::Code,
        "commentary" => TagKind::Commentary,
        "sup" => TagKind::Superscript,
        "sub" => TagKind::Subscript,
        "a" => TagKind::Anchor,
        "strikethrough" => TagKind::Strikethrough,
        "inverted" => TagKind::Inverted,
        _ => return None,
    };
    if closing {
        return Some(ParsedTag::Event(TagEvent::Close(kind)));
    }

    let tag = match kind {
        TagKind::Emphasis => InlineTag::Emphasis,
        TagKind::Strong => InlineTag::Strong,
        TagKind::Code => InlineTag::Code,
        TagKind::Commentary => InlineTag::Commentary,
        TagKind::Superscript => InlineTag::Superscript,
        TagKind::Subscript => InlineTag::Subscript,
        TagKind::Anchor => InlineTag::Anchor {
            href: attribute_value(attrs, "href").unwrap_or_default(),
        },
        TagKind::Strikethrough => InlineTag::Strikethrough,
        TagKind::Inverted => InlineTag::Inverted,
    };
    Some(ParsedTag::Event(TagEvent::Open(tag)))
}

fn attribute_value(attrs: &str, name: &str) -> Option<String> {
    let lower = attrs.to_ascii_lowercase();
    let mut search_from = 0;
    while let Some(found) = lower[search_from..].find(name) {
        let start = search_from + found;
        search_from = start + name.len();
        let boundary_ok = lower[..start]
            .chars()
            .next_back()
            .is_none_or(char::is_whitespace);
        if !boundary_ok {
            continue;
        }
        let after = attrs[search_from..].trim_start();
        let Some(value) = after.strip_prefix('=') else {
            continue;
        };
        let value = value.trim_start();
        let quote = value.chars().next()?;
        if quote == '"' || quote == '\'' {
            let inner = &value[1..];
            let end = inner.find(quote)?;
            return Some(inner[..end].to_string());
        }
        let end = value.find(char::is_whitespace).unwrap_or(value.len());
        return Some(value[..end].to_string());
    }
    None
}

/// Visible characters of a tokenized text, counting one space between words.
pub fn visible_char_count(words: &[Word]) -> usize {
    let chars: usize = words.iter().map(Word::char_count).sum();
    chars + words.len().saturating_sub(1)
}

/// Markup with every recognized tag removed and whitespace collapsed.
pub fn strip_markup(markup: &str) -> String {
    let words = tokenize(markup);
    let mut out = String::new();
    for (idx, word) in words.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        out.push_str(&word.text());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(words: &[Word]) -> Vec<String> {
        words.iter().map(Word::text).collect()
    }

    #[test]
    fn plain_text_splits_on_whitespace_runs() {
        let words = tokenize("  Hello   world\n again ");
        assert_eq!(texts(&words), vec!["Hello", "world", "again"]);
        assert!(words[0].trailing_space);
        assert!(words[2].trailing_space);
        assert!(!words[1].breaks_line);
    }

    #[test]
    fn tags_attach_to_adjacent_words() {
        let words = tokenize("<strong>Hello</strong> world");
        assert_eq!(words.len(), 2);
        assert_eq!(
            words[0].segments,
            vec![
                Segment::Tag(TagEvent::Open(InlineTag::Strong)),
                Segment::Text("Hello".to_string()),
                Segment::Tag(TagEvent::Close(TagKind::Strong)),
            ]
        );
        assert_eq!(words[1].segments, vec![Segment::Text("world".to_string())]);
    }

    #[test]
    fn tag_only_chunks_prefix_the_next_word() {
        let words = tokenize("say <emphasis> loud</emphasis> now");
        assert_eq!(texts(&words), vec!["say", "loud", "now"]);
        assert_eq!(
            words[1].segments[0],
            Segment::Tag(TagEvent::Open(InlineTag::Emphasis))
        );
    }

    #[test]
    fn trailing_tag_only_chunk_joins_the_last_word() {
        let words = tokenize("<sup>end </sup>");
        assert_eq!(words.len(), 1);
        assert_eq!(
            words[0].segments.last(),
            Some(&Segment::Tag(TagEvent::Close(TagKind::Superscript)))
        );
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        let words = tokenize("<STRONG>a</Strong> <Sub>2</SUB>");
        assert_eq!(
            words[0].segments[0],
            Segment::Tag(TagEvent::Open(InlineTag::Strong))
        );
        assert_eq!(
            words[1].segments[2],
            Segment::Tag(TagEvent::Close(TagKind::Subscript))
        );
    }

    #[test]
    fn line_breaks_mark_the_following_word() {
        let words = tokenize("one<br>two <BR/> three <br>");
        assert_eq!(texts(&words), vec!["one", "two", "three"]);
        assert!(!words[0].trailing_space);
        assert!(words[1].breaks_line);
        assert!(words[2].breaks_line);
        assert!(!words[0].breaks_line);
    }

    #[test]
    fn anchors_keep_href_and_reference_id() {
        let words = tokenize(r##"see<a href="#note1">1</a> and <a href='#n2'>2</a>"##);
        let Segment::Tag(TagEvent::Open(anchor)) = &words[0].segments[1] else {
            panic!("expected anchor open, got {:?}", words[0].segments);
        };
        assert_eq!(
            anchor,
            &InlineTag::Anchor {
                href: "#note1".to_string()
            }
        );
        assert_eq!(anchor.reference_id(), Some("note1"));
        let Segment::Tag(TagEvent::Open(second)) = &words[2].segments[0] else {
            panic!("expected anchor open");
        };
        assert_eq!(second.reference_id(), Some("n2"));
    }

    #[test]
    fn unknown_and_malformed_tags_stay_text() {
        let words = tokenize("a <blink>b</blink> 1 < 2 <strong");
        assert_eq!(
            texts(&words),
            vec!["a", "<blink>b</blink>", "1", "<", "2", "<strong"]
        );
    }

    #[test]
    fn entities_are_unescaped_and_bad_entities_kept() {
        let words = tokenize("Tom &amp; Jerry &#33; &bogus;");
        assert_eq!(texts(&words), vec!["Tom", "&", "Jerry", "!", "&bogus;"]);
    }

    #[test]
    fn visible_count_ignores_tags_and_counts_single_spaces() {
        let words = tokenize("<strong>Hello</strong>   world");
        assert_eq!(visible_char_count(&words), 11);
        assert_eq!(visible_char_count(&[]), 0);
        assert_eq!(strip_markup("<emphasis>Hi</emphasis> <br>there"), "Hi there");
    }
}
