//! Element rule table.
//!
//! Static, read-only knowledge about HTML elements, keyed by lower-cased name.
//! The balancer queries it; nothing mutates it, so it is shared freely across
//! concurrent parses.
//!
//! Implied-ancestor policy (the only elements that ever cause synthesis):
//!
//! | element                              | parents                     | scope    |
//! |--------------------------------------|-----------------------------|----------|
//! | `head`, `body`, `frameset`           | `html`                      | anywhere |
//! | head content (`title`, `meta`, ...)  | `head`, `body`              | anywhere |
//! | flow and phrasing content            | `body`                      | anywhere |
//! | `thead`, `tbody`, `tfoot`, `caption`, `colgroup` | `table`         | direct   |
//! | `tr`                                 | `tbody`, `thead`, `tfoot`   | direct   |
//! | `td`, `th`                           | `tr`                        | direct   |
//! | `col`                                | `colgroup`                  | direct   |
//! | `frame`                              | `frameset`                  | anywhere |
//!
//! The first listed parent is the one synthesized. Elements not in the table
//! (custom elements included) accept any parent and close nothing.

use std::borrow::Cow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentKind {
    /// Content is scanned for markup.
    Normal,
    /// Content is literal up to the matching end tag.
    RawText,
    /// Like `RawText`, but character references are decoded.
    EscapableRawText,
}

/// Where a valid parent must sit on the open-element stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParentScope {
    /// Any open element may be a valid parent.
    Anywhere,
    /// Only the current (top) element counts.
    Direct,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementRule {
    pub name: &'static str,
    pub void: bool,
    pub content: ContentKind,
    /// Open elements this element's start tag force-closes.
    pub closes: &'static [&'static str],
    /// Valid parents; empty means any parent.
    pub parents: &'static [&'static str],
    pub scope: ParentScope,
}

impl ElementRule {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            void: false,
            content: ContentKind::Normal,
            closes: &[],
            parents: &[],
            scope: ParentScope::Anywhere,
        }
    }

    const fn body(name: &'static str, closes: &'static [&'static str]) -> Self {
        Self {
            closes,
            parents: BODY,
            ..Self::new(name)
        }
    }

    const fn void_in(name: &'static str, parents: &'static [&'static str]) -> Self {
        Self {
            void: true,
            parents,
            ..Self::new(name)
        }
    }

    const fn void_in_body(name: &'static str) -> Self {
        Self {
            closes: IN_BODY,
            ..Self::void_in(name, BODY)
        }
    }

    const fn head(name: &'static str, content: ContentKind) -> Self {
        Self {
            content,
            parents: HEAD_OR_BODY,
            ..Self::new(name)
        }
    }

    const fn table_part(
        name: &'static str,
        closes: &'static [&'static str],
        parents: &'static [&'static str],
    ) -> Self {
        Self {
            closes,
            parents,
            scope: ParentScope::Direct,
            ..Self::new(name)
        }
    }

    pub fn is_void(&self) -> bool {
        self.void
    }

    pub fn is_raw_text(&self) -> bool {
        self.content != ContentKind::Normal
    }

    pub fn closes_on_open(&self, open: &str) -> bool {
        self.closes.iter().any(|n| n.eq_ignore_ascii_case(open))
    }

    pub fn accepts_any_parent(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_valid_parent(&self, parent: &str) -> bool {
        self.accepts_any_parent() || self.parents.iter().any(|n| n.eq_ignore_ascii_case(parent))
    }

    /// The ancestor synthesized when no valid parent is open.
    pub fn preferred_parent(&self) -> Option<&'static str> {
        self.parents.first().copied()
    }
}

const BODY: &[&str] = &["body"];
const HEAD_OR_BODY: &[&str] = &["head", "body"];
const HTML: &[&str] = &["html"];
const TABLE: &[&str] = &["table"];
const TABLE_SECTIONS: &[&str] = &["tbody", "thead", "tfoot"];

const IN_BODY: &[&str] = &["head"];
const CLOSES_P: &[&str] = &["p", "head"];
const CLOSES_HEADING: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "head"];
const CLOSES_LI: &[&str] = &["li", "p", "head"];
const CLOSES_DEFINITION: &[&str] = &["dd", "dt", "p", "head"];
const CLOSES_SECTION: &[&str] = &[
    "caption", "colgroup", "thead", "tbody", "tfoot", "tr", "td", "th",
];
const CLOSES_ROW: &[&str] = &["tr", "td", "th", "caption", "colgroup"];
const CLOSES_CELL: &[&str] = &["td", "th"];

/// Permissive rule for names the table does not know.
pub const UNKNOWN: ElementRule = ElementRule::new("");

/// Elements whose content is not scanned for markup, by default.
pub const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
    "script",
    "style",
    "textarea",
    "title",
    "xmp",
];

static HTML_RULE: ElementRule = ElementRule::new("html");
static HEAD_RULE: ElementRule = ElementRule {
    parents: HTML,
    ..ElementRule::new("head")
};
static BODY_RULE: ElementRule = ElementRule {
    closes: IN_BODY,
    parents: HTML,
    ..ElementRule::new("body")
};
static FRAMESET_RULE: ElementRule = ElementRule {
    closes: IN_BODY,
    parents: HTML,
    ..ElementRule::new("frameset")
};
static FRAME_RULE: ElementRule = ElementRule::void_in("frame", &["frameset"]);
static NOFRAMES_RULE: ElementRule = ElementRule {
    content: ContentKind::RawText,
    ..ElementRule::new("noframes")
};

static TITLE_RULE: ElementRule = ElementRule::head("title", ContentKind::EscapableRawText);
static STYLE_RULE: ElementRule = ElementRule::head("style", ContentKind::RawText);
static SCRIPT_RULE: ElementRule = ElementRule::head("script", ContentKind::RawText);
static NOSCRIPT_RULE: ElementRule = ElementRule::head("noscript", ContentKind::Normal);
static TEMPLATE_RULE: ElementRule = ElementRule::head("template", ContentKind::Normal);
static BASE_RULE: ElementRule = ElementRule::void_in("base", HEAD_OR_BODY);
static BASEFONT_RULE: ElementRule = ElementRule::void_in("basefont", HEAD_OR_BODY);
static BGSOUND_RULE: ElementRule = ElementRule::void_in("bgsound", HEAD_OR_BODY);
static LINK_RULE: ElementRule = ElementRule::void_in("link", HEAD_OR_BODY);
static META_RULE: ElementRule = ElementRule::void_in("meta", HEAD_OR_BODY);

static AREA_RULE: ElementRule = ElementRule::void_in_body("area");
static BR_RULE: ElementRule = ElementRule::void_in_body("br");
static EMBED_RULE: ElementRule = ElementRule::void_in_body("embed");
static HR_RULE: ElementRule = ElementRule {
    closes: CLOSES_P,
    ..ElementRule::void_in_body("hr")
};
static IMG_RULE: ElementRule = ElementRule::void_in_body("img");
static INPUT_RULE: ElementRule = ElementRule::void_in_body("input");
static KEYGEN_RULE: ElementRule = ElementRule::void_in_body("keygen");
static PARAM_RULE: ElementRule = ElementRule::void_in_body("param");
static SOURCE_RULE: ElementRule = ElementRule::void_in_body("source");
static TRACK_RULE: ElementRule = ElementRule::void_in_body("track");
static WBR_RULE: ElementRule = ElementRule::void_in_body("wbr");

static TEXTAREA_RULE: ElementRule = ElementRule {
    content: ContentKind::EscapableRawText,
    ..ElementRule::body("textarea", IN_BODY)
};
static XMP_RULE: ElementRule = ElementRule {
    content: ContentKind::RawText,
    ..ElementRule::body("xmp", CLOSES_P)
};
static IFRAME_RULE: ElementRule = ElementRule {
    content: ContentKind::RawText,
    ..ElementRule::body("iframe", IN_BODY)
};
static NOEMBED_RULE: ElementRule = ElementRule {
    content: ContentKind::RawText,
    ..ElementRule::body("noembed", IN_BODY)
};
static PLAINTEXT_RULE: ElementRule = ElementRule {
    content: ContentKind::RawText,
    ..ElementRule::body("plaintext", CLOSES_P)
};

static P_RULE: ElementRule = ElementRule::body("p", CLOSES_P);
static DIV_RULE: ElementRule = ElementRule::body("div", CLOSES_P);
static ADDRESS_RULE: ElementRule = ElementRule::body("address", CLOSES_P);
static ARTICLE_RULE: ElementRule = ElementRule::body("article", CLOSES_P);
static ASIDE_RULE: ElementRule = ElementRule::body("aside", CLOSES_P);
static BLOCKQUOTE_RULE: ElementRule = ElementRule::body("blockquote", CLOSES_P);
static CENTER_RULE: ElementRule = ElementRule::body("center", CLOSES_P);
static DETAILS_RULE: ElementRule = ElementRule::body("details", CLOSES_P);
static DIALOG_RULE: ElementRule = ElementRule::body("dialog", CLOSES_P);
static DIR_RULE: ElementRule = ElementRule::body("dir", CLOSES_P);
static DL_RULE: ElementRule = ElementRule::body("dl", CLOSES_P);
static FIELDSET_RULE: ElementRule = ElementRule::body("fieldset", CLOSES_P);
static FIGCAPTION_RULE: ElementRule = ElementRule::body("figcaption", CLOSES_P);
static FIGURE_RULE: ElementRule = ElementRule::body("figure", CLOSES_P);
static FOOTER_RULE: ElementRule = ElementRule::body("footer", CLOSES_P);
static FORM_RULE: ElementRule = ElementRule::body("form", CLOSES_P);
static HEADER_RULE: ElementRule = ElementRule::body("header", CLOSES_P);
static HGROUP_RULE: ElementRule = ElementRule::body("hgroup", CLOSES_P);
static MAIN_RULE: ElementRule = ElementRule::body("main", CLOSES_P);
static MENU_RULE: ElementRule = ElementRule::body("menu", CLOSES_P);
static NAV_RULE: ElementRule = ElementRule::body("nav", CLOSES_P);
static OL_RULE: ElementRule = ElementRule::body("ol", CLOSES_P);
static PRE_RULE: ElementRule = ElementRule::body("pre", CLOSES_P);
static LISTING_RULE: ElementRule = ElementRule::body("listing", CLOSES_P);
static SECTION_RULE: ElementRule = ElementRule::body("section", CLOSES_P);
static SUMMARY_RULE: ElementRule = ElementRule::body("summary", CLOSES_P);
static UL_RULE: ElementRule = ElementRule::body("ul", CLOSES_P);
static TABLE_RULE: ElementRule = ElementRule::body("table", CLOSES_P);
static H1_RULE: ElementRule = ElementRule::body("h1", CLOSES_HEADING);
static H2_RULE: ElementRule = ElementRule::body("h2", CLOSES_HEADING);
static H3_RULE: ElementRule = ElementRule::body("h3", CLOSES_HEADING);
static H4_RULE: ElementRule = ElementRule::body("h4", CLOSES_HEADING);
static H5_RULE: ElementRule = ElementRule::body("h5", CLOSES_HEADING);
static H6_RULE: ElementRule = ElementRule::body("h6", CLOSES_HEADING);
static LI_RULE: ElementRule = ElementRule::body("li", CLOSES_LI);
static DD_RULE: ElementRule = ElementRule::body("dd", CLOSES_DEFINITION);
static DT_RULE: ElementRule = ElementRule::body("dt", CLOSES_DEFINITION);

static A_RULE: ElementRule = ElementRule::body("a", &["a", "head"]);
static BUTTON_RULE: ElementRule = ElementRule::body("button", &["button", "head"]);
static NOBR_RULE: ElementRule = ElementRule::body("nobr", &["nobr", "head"]);
static OPTION_RULE: ElementRule = ElementRule::body("option", &["option", "head"]);
static OPTGROUP_RULE: ElementRule = ElementRule::body("optgroup", &["option", "optgroup", "head"]);
static RP_RULE: ElementRule = ElementRule::body("rp", &["rp", "rt"]);
static RT_RULE: ElementRule = ElementRule::body("rt", &["rp", "rt"]);

static ABBR_RULE: ElementRule = ElementRule::body("abbr", IN_BODY);
static B_RULE: ElementRule = ElementRule::body("b", IN_BODY);
static BIG_RULE: ElementRule = ElementRule::body("big", IN_BODY);
static CITE_RULE: ElementRule = ElementRule::body("cite", IN_BODY);
static CODE_RULE: ElementRule = ElementRule::body("code", IN_BODY);
static DEL_RULE: ElementRule = ElementRule::body("del", IN_BODY);
static DFN_RULE: ElementRule = ElementRule::body("dfn", IN_BODY);
static EM_RULE: ElementRule = ElementRule::body("em", IN_BODY);
static FONT_RULE: ElementRule = ElementRule::body("font", IN_BODY);
static I_RULE: ElementRule = ElementRule::body("i", IN_BODY);
static INS_RULE: ElementRule = ElementRule::body("ins", IN_BODY);
static KBD_RULE: ElementRule = ElementRule::body("kbd", IN_BODY);
static LABEL_RULE: ElementRule = ElementRule::body("label", IN_BODY);
static LEGEND_RULE: ElementRule = ElementRule::body("legend", IN_BODY);
static MAP_RULE: ElementRule = ElementRule::body("map", IN_BODY);
static MARK_RULE: ElementRule = ElementRule::body("mark", IN_BODY);
static OBJECT_RULE: ElementRule = ElementRule::body("object", IN_BODY);
static Q_RULE: ElementRule = ElementRule::body("q", IN_BODY);
static S_RULE: ElementRule = ElementRule::body("s", IN_BODY);
static SAMP_RULE: ElementRule = ElementRule::body("samp", IN_BODY);
static SELECT_RULE: ElementRule = ElementRule::body("select", IN_BODY);
static SMALL_RULE: ElementRule = ElementRule::body("small", IN_BODY);
static SPAN_RULE: ElementRule = ElementRule::body("span", IN_BODY);
static STRIKE_RULE: ElementRule = ElementRule::body("strike", IN_BODY);
static STRONG_RULE: ElementRule = ElementRule::body("strong", IN_BODY);
static SUB_RULE: ElementRule = ElementRule::body("sub", IN_BODY);
static SUP_RULE: ElementRule = ElementRule::body("sup", IN_BODY);
static TT_RULE: ElementRule = ElementRule::body("tt", IN_BODY);
static U_RULE: ElementRule = ElementRule::body("u", IN_BODY);
static VAR_RULE: ElementRule = ElementRule::body("var", IN_BODY);

static CAPTION_RULE: ElementRule = ElementRule::table_part("caption", &["caption", "colgroup"], TABLE);
static COLGROUP_RULE: ElementRule =
    ElementRule::table_part("colgroup", &["colgroup", "caption"], TABLE);
static COL_RULE: ElementRule = ElementRule {
    void: true,
    ..ElementRule::table_part("col", &[], &["colgroup"])
};
static THEAD_RULE: ElementRule = ElementRule::table_part("thead", CLOSES_SECTION, TABLE);
static TBODY_RULE: ElementRule = ElementRule::table_part("tbody", CLOSES_SECTION, TABLE);
static TFOOT_RULE: ElementRule = ElementRule::table_part("tfoot", CLOSES_SECTION, TABLE);
static TR_RULE: ElementRule = ElementRule::table_part("tr", CLOSES_ROW, TABLE_SECTIONS);
static TD_RULE: ElementRule = ElementRule::table_part("td", CLOSES_CELL, &["tr"]);
static TH_RULE: ElementRule = ElementRule::table_part("th", CLOSES_CELL, &["tr"]);

fn rule_for_lowercase(name: &str) -> Option<&'static ElementRule> {
    let rule = match name {
        "html" => &HTML_RULE,
        "head" => &HEAD_RULE,
        "body" => &BODY_RULE,
        "frameset" => &FRAMESET_RULE,
        "frame" => &FRAME_RULE,
        "noframes" => &NOFRAMES_RULE,
        "title" => &TITLE_RULE,
        "style" => &STYLE_RULE,
        "script" => &SCRIPT_RULE,
        "noscript" => &NOSCRIPT_RULE,
        "template" => &TEMPLATE_RULE,
        "base" => &BASE_RULE,
        "basefont" => &BASEFONT_RULE,
        "bgsound" => &BGSOUND_RULE,
        "link" => &LINK_RULE,
        "meta" => &META_RULE,
        "area" => &AREA_RULE,
        "br" => &BR_RULE,
        "embed" => &EMBED_RULE,
        "hr" => &HR_RULE,
        "img" => &IMG_RULE,
        "input" => &INPUT_RULE,
        "keygen" => &KEYGEN_RULE,
        "param" => &PARAM_RULE,
        "source" => &SOURCE_RULE,
        "track" => &TRACK_RULE,
        "wbr" => &WBR_RULE,
        "textarea" => &TEXTAREA_RULE,
        "xmp" => &XMP_RULE,
        "iframe" => &IFRAME_RULE,
        "noembed" => &NOEMBED_RULE,
        "plaintext" => &PLAINTEXT_RULE,
        "p" => &P_RULE,
        "div" => &DIV_RULE,
        "address" => &ADDRESS_RULE,
        "article" => &ARTICLE_RULE,
        "aside" => &ASIDE_RULE,
        "blockquote" => &BLOCKQUOTE_RULE,
        "center" => &CENTER_RULE,
        "details" => &DETAILS_RULE,
        "dialog" => &DIALOG_RULE,
        "dir" => &DIR_RULE,
        "dl" => &DL_RULE,
        "fieldset" => &FIELDSET_RULE,
        "figcaption" => &FIGCAPTION_RULE,
        "figure" => &FIGURE_RULE,
        "footer" => &FOOTER_RULE,
        "form" => &FORM_RULE,
        "header" => &HEADER_RULE,
        "hgroup" => &HGROUP_RULE,
        "main" => &MAIN_RULE,
        "menu" => &MENU_RULE,
        "nav" => &NAV_RULE,
        "ol" => &OL_RULE,
        "pre" => &PRE_RULE,
        "listing" => &LISTING_RULE,
        "section" => &SECTION_RULE,
        "summary" => &SUMMARY_RULE,
        "ul" => &UL_RULE,
        "table" => &TABLE_RULE,
        "h1" => &H1_RULE,
        "h2" => &H2_RULE,
        "h3" => &H3_RULE,
        "h4" => &H4_RULE,
        "h5" => &H5_RULE,
        "h6" => &H6_RULE,
        "li" => &LI_RULE,
        "dd" => &DD_RULE,
        "dt" => &DT_RULE,
        "a" => &A_RULE,
        "button" => &BUTTON_RULE,
        "nobr" => &NOBR_RULE,
        "option" => &OPTION_RULE,
        "optgroup" => &OPTGROUP_RULE,
        "rp" => &RP_RULE,
        "rt" => &RT_RULE,
        "abbr" => &ABBR_RULE,
        "b" => &B_RULE,
        "big" => &BIG_RULE,
        "cite" => &CITE_RULE,
        "code" => &CODE_RULE,
        "del" => &DEL_RULE,
        "dfn" => &DFN_RULE,
        "em" => &EM_RULE,
        "font" => &FONT_RULE,
        "i" => &I_RULE,
        "ins" => &INS_RULE,
        "kbd" => &KBD_RULE,
        "label" => &LABEL_RULE,
        "legend" => &LEGEND_RULE,
        "map" => &MAP_RULE,
        "mark" => &MARK_RULE,
        "object" => &OBJECT_RULE,
        "q" => &Q_RULE,
        "s" => &S_RULE,
        "samp" => &SAMP_RULE,
        "select" => &SELECT_RULE,
        "small" => &SMALL_RULE,
        "span" => &SPAN_RULE,
        "strike" => &STRIKE_RULE,
        "strong" => &STRONG_RULE,
        "sub" => &SUB_RULE,
        "sup" => &SUP_RULE,
        "tt" => &TT_RULE,
        "u" => &U_RULE,
        "var" => &VAR_RULE,
        "caption" => &CAPTION_RULE,
        "colgroup" => &COLGROUP_RULE,
        "col" => &COL_RULE,
        "thead" => &THEAD_RULE,
        "tbody" => &TBODY_RULE,
        "tfoot" => &TFOOT_RULE,
        "tr" => &TR_RULE,
        "td" => &TD_RULE,
        "th" => &TH_RULE,
        _ => return None,
    };
    Some(rule)
}

fn fold(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

/// Looks up `name` (any ASCII case). Unknown names get [`UNKNOWN`].
pub fn lookup(name: &str) -> &'static ElementRule {
    rule_for_lowercase(&fold(name)).unwrap_or(&UNKNOWN)
}

pub fn is_known(name: &str) -> bool {
    rule_for_lowercase(&fold(name)).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("BR").name, "br");
        assert!(lookup("Br").is_void());
        assert!(is_known("TABLE"));
    }

    #[test]
    fn unknown_names_are_permissive() {
        let rule = lookup("my-widget");
        assert!(!is_known("my-widget"));
        assert!(!rule.is_void());
        assert!(!rule.is_raw_text());
        assert!(rule.accepts_any_parent());
        assert!(rule.is_valid_parent("anything"));
        assert!(!rule.closes_on_open("p"));
        assert_eq!(rule.preferred_parent(), None);
    }

    #[test]
    fn raw_text_list_matches_rule_table() {
        for name in RAW_TEXT_ELEMENTS {
            assert!(lookup(name).is_raw_text(), "{name} should be raw text");
        }
        assert_eq!(lookup("title").content, ContentKind::EscapableRawText);
        assert_eq!(lookup("script").content, ContentKind::RawText);
    }

    #[test]
    fn void_elements_in_body_close_head() {
        assert!(lookup("img").closes_on_open("head"));
        assert!(lookup("br").closes_on_open("head"));
        assert!(!lookup("meta").closes_on_open("head"));
        assert!(lookup("hr").closes_on_open("p"));
    }

    #[test]
    fn block_elements_close_paragraphs() {
        for name in ["p", "div", "ul", "table", "h1", "form", "pre"] {
            assert!(lookup(name).closes_on_open("p"), "{name} should close p");
        }
        assert!(!lookup("span").closes_on_open("p"));
    }

    #[test]
    fn table_parts_require_direct_parents() {
        let tr = lookup("tr");
        assert_eq!(tr.scope, ParentScope::Direct);
        assert_eq!(tr.preferred_parent(), Some("tbody"));
        assert!(tr.is_valid_parent("THEAD"));
        assert!(!tr.is_valid_parent("table"));
        assert_eq!(lookup("td").preferred_parent(), Some("tr"));
        assert_eq!(lookup("col").preferred_parent(), Some("colgroup"));
    }

    #[test]
    fn structure_elements_hang_off_html() {
        assert_eq!(lookup("body").preferred_parent(), Some("html"));
        assert_eq!(lookup("head").preferred_parent(), Some("html"));
        assert!(lookup("html").accepts_any_parent());
        assert_eq!(lookup("meta").preferred_parent(), Some("head"));
        assert_eq!(lookup("p").preferred_parent(), Some("body"));
    }
}
