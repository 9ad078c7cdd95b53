use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use crate::github::Repository;
use crate::sections::{SectionMap, SectionName};

pub const NO_DESCRIPTION: &str = "— no description —";
pub const NO_LANGUAGE: &str = "misc";

/// Delay between consecutive card entrances within one grid
pub const REVEAL_STEP: Duration = Duration::from_millis(120);

const NOTICE_TITLE: &str = "Unable to load repos";
const NOTICE_BODY: &str = "GitHub rate limit or network issue. Try again later.";

/// Escape text for insertion into HTML element content or attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn format_created(created_at: &DateTime<Utc>) -> String {
    created_at.format("%b %-d, %Y").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepoCard {
    pub title: String,
    pub href: String,
    pub body: String,
    pub language: String,
    pub created: String,
    pub reveal_delay: Duration,
}

impl RepoCard {
    /// Card for the repository at `position` in its section's list
    pub fn from_repo(repo: &Repository, position: usize) -> Self {
        Self {
            title: repo.name.clone(),
            href: repo.html_url.clone(),
            body: repo
                .description
                .clone()
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            language: repo
                .language
                .clone()
                .unwrap_or_else(|| NO_LANGUAGE.to_string()),
            created: format_created(&repo.created_at),
            reveal_delay: REVEAL_STEP * position as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Card {
    Repo(RepoCard),
    Notice { title: String, body: String },
}

impl Card {
    /// Shown in place of repositories when loading fails
    pub fn load_failed() -> Self {
        Card::Notice {
            title: NOTICE_TITLE.to_string(),
            body: NOTICE_BODY.to_string(),
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            Card::Repo(card) => format!(
                concat!(
                    "<a class=\"card\" href=\"{href}\" target=\"_blank\" rel=\"noopener\" ",
                    "style=\"animation-delay: {delay}ms\">\n",
                    "  <h3>{title}</h3>\n",
                    "  <p>{body}</p>\n",
                    "  <div class=\"repo-meta\">\n",
                    "    <span class=\"tag\">{language}</span>\n",
                    "    <small class=\"muted\">created {created}</small>\n",
                    "  </div>\n",
                    "</a>"
                ),
                href = escape_html(&card.href),
                delay = card.reveal_delay.as_millis(),
                title = escape_html(&card.title),
                body = escape_html(&card.body),
                language = escape_html(&card.language),
                created = escape_html(&card.created),
            ),
            Card::Notice { title, body } => format!(
                "<div class=\"card\"><h3>{}</h3><p class=\"muted\">{}</p></div>",
                escape_html(title),
                escape_html(body)
            ),
        }
    }
}

/// Rendering capability used by the repository loader.
/// Containers are addressed by id; unknown ids are simply absent.
pub trait RenderTarget {
    fn has_container(&self, id: &str) -> bool;

    /// Number of children in a container, 0 when it does not exist
    fn child_count(&self, id: &str) -> usize;

    fn render_card(&mut self, id: &str, card: Card);
}

#[derive(Debug, Clone)]
pub struct Grid {
    pub section: SectionName,
    pub cards: Vec<Card>,
}

impl Grid {
    pub fn id(&self) -> String {
        self.section.grid_id()
    }

    /// Repository cards only, notices excluded
    pub fn repo_count(&self) -> usize {
        self.cards
            .iter()
            .filter(|card| matches!(card, Card::Repo(_)))
            .count()
    }
}

/// The portfolio page: one grid per configured section
#[derive(Debug, Clone)]
pub struct Page {
    account: String,
    pdf_link: Option<String>,
    grids: Vec<Grid>,
}

impl Page {
    pub fn new(account: &str, sections: &SectionMap) -> Self {
        Self::with_sections(account, sections.iter().map(|s| s.name))
    }

    /// Page holding containers for the given sections only
    pub fn with_sections(account: &str, sections: impl IntoIterator<Item = SectionName>) -> Self {
        Self {
            account: account.to_string(),
            pdf_link: None,
            grids: sections
                .into_iter()
                .map(|section| Grid {
                    section,
                    cards: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn set_pdf_link(&mut self, link: &str) {
        self.pdf_link = Some(link.to_string());
    }

    pub fn grids(&self) -> &[Grid] {
        &self.grids
    }

    pub fn grid(&self, section: SectionName) -> Option<&Grid> {
        self.grids.iter().find(|g| g.section == section)
    }

    fn grid_mut(&mut self, id: &str) -> Option<&mut Grid> {
        self.grids.iter_mut().find(|g| g.id() == id)
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_html())
    }

    /// Serialize the whole page as a standalone HTML document
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let account = escape_html(&self.account);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"dark\">\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n");
        let _ = writeln!(html, "<title>{} · portfolio</title>", account);
        html.push_str(STYLE);
        html.push_str("</head>\n<body>\n<nav>\n");

        for (i, grid) in self.grids.iter().enumerate() {
            let class = if i == 0 { "nav-item active" } else { "nav-item" };
            let _ = writeln!(
                html,
                "  <a class=\"{}\" href=\"#{}\" data-target=\"{}\">{}</a>",
                class,
                grid.section.id(),
                grid.section.id(),
                grid.section.title()
            );
        }
        if let Some(link) = &self.pdf_link {
            let _ = writeln!(
                html,
                "  <a id=\"downloadPdf\" href=\"{}\">Download PDF</a>",
                escape_html(link)
            );
        }
        html.push_str("</nav>\n<main>\n");

        for grid in &self.grids {
            let _ = writeln!(
                html,
                "<section class=\"section\" id=\"{}\">\n<h2>{}</h2>\n<div class=\"grid\" id=\"{}\">",
                grid.section.id(),
                grid.section.title(),
                grid.id()
            );
            for card in &grid.cards {
                html.push_str(&card.to_html());
                html.push('\n');
            }
            html.push_str("</div>\n</section>\n");
        }

        let _ = writeln!(
            html,
            "</main>\n<footer><a href=\"https://github.com/{}\">github.com/{}</a></footer>",
            account, account
        );
        html.push_str("</body>\n</html>\n");
        html
    }
}

impl RenderTarget for Page {
    fn has_container(&self, id: &str) -> bool {
        self.grids.iter().any(|g| g.id() == id)
    }

    fn child_count(&self, id: &str) -> usize {
        self.grids
            .iter()
            .find(|g| g.id() == id)
            .map_or(0, |g| g.cards.len())
    }

    fn render_card(&mut self, id: &str, card: Card) {
        if let Some(grid) = self.grid_mut(id) {
            grid.cards.push(card);
        }
    }
}

const STYLE: &str = r#"<style>
body { margin: 0; font-family: system-ui, sans-serif; background: #0b0b12; color: #e8e8f0; }
nav { display: flex; gap: 1rem; padding: 1rem 2rem; }
nav a { color: inherit; text-decoration: none; opacity: 0.7; }
nav a.active { opacity: 1; border-bottom: 2px solid rgb(141,106,255); }
.section { padding: 1rem 2rem; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 1rem; }
.card { display: block; padding: 1rem; border-radius: 12px; background: #16162a; color: inherit;
        text-decoration: none; animation: reveal 0.4s ease both; }
.repo-meta { display: flex; justify-content: space-between; align-items: center; }
.tag { padding: 0.1rem 0.5rem; border-radius: 6px; background: rgba(58,224,255,0.15); }
.muted { opacity: 0.6; }
@keyframes reveal { from { opacity: 0; transform: translateY(8px); } to { opacity: 1; transform: none; } }
</style>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn repo(description: Option<&str>, language: Option<&str>) -> Repository {
        Repository {
            name: "Desert-Ledger".to_string(),
            html_url: "https://github.com/someone/Desert-Ledger".to_string(),
            description: description.map(str::to_string),
            language: language.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2023, 3, 4, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_escape_html() {
        let escaped = escape_html("<script>alert(\"x\" & 'y')</script>");
        assert_eq!(
            escaped,
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#39;y&#39;)&lt;/script&gt;"
        );
        for c in ['<', '>', '"', '\''] {
            assert!(!escaped.contains(c));
        }
    }

    #[test]
    fn test_card_escapes_description() {
        let card = Card::Repo(RepoCard::from_repo(
            &repo(Some("<script>alert(1)</script>"), Some("JavaScript")),
            0,
        ));
        let html = card.to_html();
        assert!(html.contains("<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_placeholders_for_missing_fields() {
        let card = RepoCard::from_repo(&repo(None, None), 0);
        assert_eq!(card.body, NO_DESCRIPTION);
        assert_eq!(card.language, NO_LANGUAGE);
        assert_eq!(card.created, "Mar 4, 2023");
    }

    #[test]
    fn test_reveal_delay_follows_position() {
        let r = repo(None, None);
        assert_eq!(RepoCard::from_repo(&r, 0).reveal_delay, Duration::ZERO);
        assert_eq!(
            RepoCard::from_repo(&r, 3).reveal_delay,
            Duration::from_millis(360)
        );
    }

    #[test]
    fn test_render_target_addresses_grids_by_id() {
        let mut page = Page::with_sections("someone", [SectionName::Security]);
        assert!(page.has_container("securityGrid"));
        assert!(!page.has_container("capstoneGrid"));

        page.render_card("securityGrid", Card::load_failed());
        page.render_card("capstoneGrid", Card::load_failed());
        assert_eq!(page.child_count("securityGrid"), 1);
        assert_eq!(page.child_count("capstoneGrid"), 0);
    }

    #[test]
    fn test_page_html_has_one_grid_per_section() {
        let mut page = Page::new("someone", &SectionMap::default());
        page.set_pdf_link("./cv.pdf");
        let html = page.to_html();

        for section in SectionMap::default().iter() {
            let id = format!("id=\"{}\"", section.name.grid_id());
            assert_eq!(html.matches(&id).count(), 1, "{}", id);
        }
        assert!(html.contains("class=\"nav-item active\" href=\"#foundation\""));
        assert!(html.contains("id=\"downloadPdf\" href=\"./cv.pdf\""));
    }

    #[test]
    fn test_page_without_pdf_link_has_no_download() {
        let page = Page::new("someone", &SectionMap::default());
        assert!(!page.to_html().contains("downloadPdf"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        let mut page = Page::with_sections("someone", [SectionName::Capstone]);
        page.render_card("capstoneGrid", Card::load_failed());

        page.write_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
        assert!(written.contains("Unable to load repos"));
    }
}
