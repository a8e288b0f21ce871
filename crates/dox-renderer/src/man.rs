//! Man page renderer.
//!
//! Walks the same pulldown-cmark event stream as [`MarkdownRenderer`](crate::MarkdownRenderer)
//! but writes roff using the `man` macro package:
//!
//! | Markdown            | roff                              |
//! |---------------------|-----------------------------------|
//! | `#`/`##` heading    | `.SH "HEADING"`                   |
//! | `###`+ heading      | `.SS "Heading"`                   |
//! | paragraph           | `.P`                              |
//! | fenced code         | `.RS 2` `.nf` … `.fi` `.RE`       |
//! | list item           | `.IP \(bu 4` / `.IP 1. 4`         |
//! | blockquote          | `.RS 4` … `.RE`                   |
//! | `*em*` / `**strong**` / `` `code` `` | `\fI…\fR` / `\fB…\fR` / `\fB…\fR` |
//!
//! Raw HTML, including comments, is dropped.

use std::fmt::Write;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::state::CodeBlockState;
use crate::util::heading_level_to_num;

/// Values for the `.TH` header and the NAME section.
#[derive(Clone, Debug)]
pub struct ManHeader {
    /// Page name, usually the file stem (e.g. `npm-access`).
    pub name: String,
    /// Man section number (1-9).
    pub section: u8,
    /// Version shown in the header's footer field.
    pub version: String,
    /// One-line summary for the NAME section.
    pub description: Option<String>,
}

/// Markdown to roff renderer.
pub struct ManRenderer {
    header: ManHeader,
    out: String,
    /// Inline text of the block being built.
    line: String,
    code: CodeBlockState,
    /// Heading level while inside a heading.
    heading: Option<u8>,
    seen_h1: bool,
    /// One entry per open list: next ordinal for ordered lists.
    lists: Vec<Option<u64>>,
    /// Set after `.IP` so the item's first paragraph does not open a new `.P`.
    item_open: bool,
    /// Open links: position in `line` where the link text starts, and the target.
    links: Vec<(usize, String)>,
    in_image: bool,
    in_table: bool,
}

impl ManRenderer {
    /// Create a renderer for one page.
    #[must_use]
    pub fn new(header: ManHeader) -> Self {
        Self {
            header,
            out: String::with_capacity(4096),
            line: String::new(),
            code: CodeBlockState::default(),
            heading: None,
            seen_h1: false,
            lists: Vec::new(),
            item_open: false,
            links: Vec::new(),
            in_image: false,
            in_table: false,
        }
    }

    /// Render a markdown document (front matter already removed) to roff.
    pub fn render_markdown(mut self, markdown: &str) -> String {
        self.write_header();
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        for event in Parser::new_ext(markdown, options) {
            self.process_event(event);
        }
        self.flush_line();
        self.out
    }

    fn write_header(&mut self) {
        let _ = writeln!(
            self.out,
            r#".TH "{}" "{}" "" "{}" """#,
            quote(&self.header.name.to_uppercase()),
            self.header.section,
            quote(&self.header.version)
        );
        self.out.push_str(".SH \"NAME\"\n");
        let name = escape_text(&self.header.name);
        match self.header.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => {
                let _ = writeln!(
                    self.out,
                    "\\fB{name}\\fR - {}",
                    escape_text(description)
                );
            }
            _ => {
                let _ = writeln!(self.out, "\\fB{name}\\fR");
            }
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push_formatted("\\fB", &code),
            Event::SoftBreak => {
                if self.code.is_active() {
                    self.code.push_newline();
                } else {
                    self.line.push('\n');
                }
            }
            Event::HardBreak => {
                self.flush_line();
                self.out.push_str(".br\n");
            }
            Event::Rule => {
                self.flush_line();
                self.out.push_str(".P\n");
            }
            Event::Html(_)
            | Event::InlineHtml(_)
            | Event::TaskListMarker(_)
            | Event::FootnoteReference(_)
            | Event::InlineMath(_)
            | Event::DisplayMath(_) => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.in_table {
                    return;
                }
                self.flush_line();
                if self.item_open {
                    self.item_open = false;
                } else {
                    self.out.push_str(".P\n");
                }
            }
            Tag::Heading { level, .. } => {
                self.flush_line();
                self.heading = Some(heading_level_to_num(level));
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.out.push_str(".RS 4\n");
            }
            Tag::CodeBlock(_) => {
                self.flush_line();
                self.item_open = false;
                self.code.start(None);
            }
            Tag::List(start) => {
                self.flush_line();
                if !self.lists.is_empty() {
                    self.out.push_str(".RS 4\n");
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_line();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}.");
                        *n += 1;
                        marker
                    }
                    _ => "\\(bu".to_owned(),
                };
                let _ = writeln!(self.out, ".IP {marker} 4");
                self.item_open = true;
            }
            Tag::Table(_) => {
                self.flush_line();
                self.out.push_str(".P\n.nf\n");
                self.in_table = true;
            }
            Tag::TableCell => {
                if !self.line.is_empty() {
                    self.line.push_str("  ");
                }
            }
            Tag::Emphasis => self.push_font("\\fI"),
            Tag::Strong => self.push_font("\\fB"),
            Tag::Link { dest_url, .. } => {
                self.links.push((self.line.len(), dest_url.to_string()));
            }
            Tag::Image { .. } => self.in_image = true,
            Tag::TableHead
            | Tag::TableRow
            | Tag::Strikethrough
            | Tag::Superscript
            | Tag::Subscript
            | Tag::FootnoteDefinition(_)
            | Tag::HtmlBlock
            | Tag::MetadataBlock(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Item => {
                if !self.in_table {
                    self.flush_line();
                }
            }
            TagEnd::Heading(_) => self.end_heading(),
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.out.push_str(".RE\n");
            }
            TagEnd::CodeBlock => {
                let (_, content) = self.code.end();
                self.out.push_str(".RS 2\n.nf\n");
                for line in content.lines() {
                    let _ = writeln!(self.out, "{}", escape_line_start(&escape_text(line)));
                }
                self.out.push_str(".fi\n.RE\n");
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.lists.pop();
                self.item_open = false;
                if !self.lists.is_empty() {
                    self.out.push_str(".RE\n");
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => self.flush_line(),
            TagEnd::Table => {
                self.flush_line();
                self.out.push_str(".fi\n");
                self.in_table = false;
            }
            TagEnd::Emphasis | TagEnd::Strong => self.push_font("\\fR"),
            TagEnd::Link => self.end_link(),
            TagEnd::Image => self.in_image = false,
            TagEnd::TableCell
            | TagEnd::Strikethrough
            | TagEnd::Superscript
            | TagEnd::Subscript
            | TagEnd::FootnoteDefinition
            | TagEnd::HtmlBlock
            | TagEnd::MetadataBlock(_)
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else {
            self.line.push_str(&escape_text(text));
        }
    }

    /// Font changes are not emitted inside headings or image alt text.
    fn push_font(&mut self, code: &str) {
        if self.heading.is_none() && !self.in_image {
            self.line.push_str(code);
        }
    }

    fn push_formatted(&mut self, font: &str, text: &str) {
        self.push_font(font);
        self.line.push_str(&escape_text(text));
        self.push_font("\\fR");
    }

    fn end_heading(&mut self) {
        let Some(level) = self.heading.take() else {
            return;
        };
        let text = std::mem::take(&mut self.line);
        let text = text.trim();

        // The first H1 is the page title, already shown in the header
        if level == 1 && !self.seen_h1 {
            self.seen_h1 = true;
            return;
        }

        if level <= 2 {
            let _ = writeln!(self.out, ".SH \"{}\"", quote(&text.to_uppercase()));
        } else {
            let _ = writeln!(self.out, ".SS \"{}\"", quote(text));
        }
    }

    fn end_link(&mut self) {
        let Some((start, url)) = self.links.pop() else {
            return;
        };
        if url.starts_with('#') {
            return;
        }
        let label = self.line.get(start..).unwrap_or_default();
        if label != escape_text(&url) {
            let _ = write!(self.line, " ({})", escape_text(&url));
        }
    }

    /// Write the pending inline text as roff source lines.
    fn flush_line(&mut self) {
        let text = std::mem::take(&mut self.line);
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        for line in text.lines() {
            let line = line.trim_start();
            if !line.is_empty() {
                let _ = writeln!(self.out, "{}", escape_line_start(line));
            }
        }
    }
}

/// Escape roff special characters in running text.
fn escape_text(text: &str) -> String {
    text.replace('\\', "\\e")
}

/// Guard lines that roff would read as requests.
fn escape_line_start(line: &str) -> String {
    if line.starts_with('.') || line.starts_with('\'') {
        format!("\\&{line}")
    } else {
        line.to_owned()
    }
}

/// Escape a value placed inside a double-quoted macro argument.
fn quote(value: &str) -> String {
    escape_text(value).replace('"', "\\(dq")
}
