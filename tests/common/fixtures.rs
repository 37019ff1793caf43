use std::path::{Path, PathBuf};

/// Representative text-area markup, including the malformed shapes real
/// comic books ship with.
pub const MARKUP_FIXTURES: &[(&str, &str)] = &[
    ("plain", "Hello world"),
    ("empty", ""),
    ("whitespace", "   \t\n  "),
    ("strong", "<strong>Hello</strong> world"),
    ("nested", "<emphasis>Did you <strong>really</strong> say that?</emphasis>"),
    ("chemistry", "Just add H<sub>2</sub>O and E=mc<sup>2</sup>."),
    ("anchor", "See the note<a href=\"#note1\">1</a> below."),
    ("bare-anchor", "<a href=\"note2\">*</a> Translator's note."),
    ("strike", "I <strikethrough>never</strikethrough> always lie."),
    ("inverted", "<inverted>BOOM</inverted> went the door."),
    ("commentary", "<commentary>Meanwhile, across town...</commentary>"),
    ("code", "Type <code>rm -rf /</code> and pray."),
    ("line-breaks", "First line<br/>second line<br>third"),
    ("entities", "Tom &amp; Jerry &lt;3 &quot;cheese&quot;"),
    ("typographic", "\u{201C}Wait\u{2026}\u{201D} she said \u{2014} too late."),
    ("unclosed", "<strong>Never closed and <emphasis>nested"),
    ("stray-close", "Stray </strong> close </emphasis> tags"),
    ("unknown-tag", "A <blink>blinking</blink> <font color=\"red\">tag</font>"),
    ("broken-bracket", "a < b and c > d <strong"),
    ("uppercase", "<STRONG>LOUD</STRONG> <Emphasis>noises</Emphasis>"),
    ("tag-only", "<strong></strong><emphasis></emphasis>"),
    ("long", "Whereas the party of the first part agrees to the terms set out below, \
              the party of the second part shall comply with every clause herein, \
              without exception, until the end of days."),
];

/// Optional page descriptions: JSON arrays of text areas.
pub fn discover_optional_corpus() -> Vec<PathBuf> {
    let mut out = Vec::new();
    for root in ["tests/fixtures/areas", "tests/datasets/pages"] {
        let root_path = Path::new(root);
        let Ok(entries) = std::fs::read_dir(root_path) else {
            continue;
        };
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            {
                out.push(path);
            }
        }
    }
    out.sort();
    out.dedup();
    out
}
