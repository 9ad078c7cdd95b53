// Repository loader & categorizer
// Fetch once, bind repositories to sections, render one card per match

use crate::github::{FetchOutcome, GitHubClient};
use crate::page::{Card, RenderTarget, RepoCard};
use crate::sections::{RepoIndex, SectionMap, Source};

/// Fetch `account`'s repositories and render every section into `target`.
/// Failures are logged and rendered as notice cards, never returned.
pub async fn load_and_render<T: RenderTarget>(
    client: &GitHubClient,
    account: &str,
    sections: &SectionMap,
    target: &mut T,
) {
    let outcome = client.fetch_repos(account).await;
    render_outcome(&outcome, sections, target);
}

/// Render an already-completed fetch into `target`
pub fn render_outcome<T: RenderTarget>(outcome: &FetchOutcome, sections: &SectionMap, target: &mut T) {
    match outcome {
        Ok(repos) => {
            let index = RepoIndex::new(repos);

            for section in sections.iter() {
                let grid_id = section.name.grid_id();
                if !target.has_container(&grid_id) {
                    log::debug!("no container {}, skipping", grid_id);
                    continue;
                }

                let resolved = index.resolve(section);
                if resolved.source == Source::Fallback {
                    log::info!(
                        "{}: no curated repositories found, showing {} recent",
                        section.name.id(),
                        resolved.repos.len()
                    );
                }

                for (position, repo) in resolved.repos.iter().enumerate() {
                    target.render_card(&grid_id, Card::Repo(RepoCard::from_repo(repo, position)));
                }
            }

            // Only reachable with an empty fetch: the fallback fills every section otherwise
            fill_empty_with_notice(sections, target);
        }
        Err(e) => {
            log::error!("{}", e);
            fill_empty_with_notice(sections, target);
        }
    }
}

/// One notice card into every existing container that has no children
fn fill_empty_with_notice<T: RenderTarget>(sections: &SectionMap, target: &mut T) {
    for section in sections.iter() {
        let grid_id = section.name.grid_id();
        if target.has_container(&grid_id) && target.child_count(&grid_id) == 0 {
            target.render_card(&grid_id, Card::load_failed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{FetchError, Repository};
    use crate::page::Page;
    use crate::sections::{Section, SectionName};
    use chrono::{TimeZone, Utc};
    use reqwest::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::runtime::Runtime;
    use tokio::sync::oneshot;

    fn repo(name: &str) -> Repository {
        Repository {
            name: name.to_string(),
            html_url: format!("https://github.com/someone/{}", name),
            description: Some(format!("about {}", name)),
            language: Some("Rust".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    fn titles(page: &Page, section: SectionName) -> Vec<String> {
        page.grid(section)
            .unwrap()
            .cards
            .iter()
            .map(|card| match card {
                Card::Repo(c) => c.title.clone(),
                Card::Notice { title, .. } => format!("notice: {}", title),
            })
            .collect()
    }

    /// Answer a single HTTP request with `status` and `body`.
    /// Returns the base URL and the request head as received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let _ = tx.send(String::from_utf8_lossy(&request).to_string());

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (base, rx)
    }

    fn map() -> SectionMap {
        SectionMap::new(vec![
            Section::new(SectionName::Security, &["security-scripts", "Neighborhood-watch"]),
            Section::new(SectionName::Blockchain, &["not-on-github"]),
        ])
    }

    #[test]
    fn test_cards_follow_resolved_list_order() {
        let repos: Vec<_> = ["a", "Neighborhood-watch", "b", "security-scripts", "c", "d", "e", "f"]
            .iter()
            .map(|n| repo(n))
            .collect();
        let mut page = Page::new("someone", &map());

        render_outcome(&Ok(repos), &map(), &mut page);

        assert_eq!(
            titles(&page, SectionName::Security),
            vec!["security-scripts", "Neighborhood-watch"]
        );
        assert_eq!(
            titles(&page, SectionName::Blockchain),
            vec!["a", "Neighborhood-watch", "b", "security-scripts", "c", "d"]
        );
    }

    #[test]
    fn test_missing_container_is_skipped() {
        let repos = vec![repo("security-scripts")];
        let mut page = Page::with_sections("someone", [SectionName::Blockchain]);

        render_outcome(&Ok(repos), &map(), &mut page);

        assert_eq!(page.grids().len(), 1);
        assert_eq!(titles(&page, SectionName::Blockchain), vec!["security-scripts"]);
    }

    #[test]
    fn test_empty_fetch_gets_notice_everywhere() {
        let mut page = Page::new("someone", &map());

        render_outcome(&Ok(Vec::new()), &map(), &mut page);

        for grid in page.grids() {
            assert_eq!(grid.cards, vec![Card::load_failed()]);
            assert_eq!(grid.repo_count(), 0);
        }
    }

    #[test]
    fn test_failure_gets_exactly_one_notice_per_empty_section() {
        let mut page = Page::new("someone", &map());

        render_outcome(&Err(FetchError::Status(StatusCode::FORBIDDEN)), &map(), &mut page);

        for grid in page.grids() {
            assert_eq!(grid.cards.len(), 1);
            assert_eq!(grid.cards[0], Card::load_failed());
        }
    }

    #[test]
    fn test_failure_keeps_populated_sections() {
        let mut page = Page::new("someone", &map());
        page.render_card(
            "securityGrid",
            Card::Repo(RepoCard::from_repo(&repo("security-scripts"), 0)),
        );

        render_outcome(&Err(FetchError::Status(StatusCode::BAD_GATEWAY)), &map(), &mut page);

        assert_eq!(titles(&page, SectionName::Security), vec!["security-scripts"]);
        assert_eq!(
            titles(&page, SectionName::Blockchain),
            vec!["notice: Unable to load repos"]
        );
    }

    #[test]
    fn test_malformed_body_renders_notice() {
        let outcome = crate::github::parse_repos("not json");
        let mut page = Page::new("someone", &map());

        render_outcome(&outcome, &map(), &mut page);

        assert_eq!(page.child_count("securityGrid"), 1);
        assert_eq!(page.child_count("blockchainGrid"), 1);
    }

    #[test]
    fn test_repeated_section_renders_one_grid() {
        let sections = SectionMap::from_json_str(
            r#"[{"name": "security", "repos": ["a"]}, {"name": "security", "repos": ["a", "b"]}]"#,
        )
        .unwrap();
        let mut page = Page::new("someone", &sections);

        render_outcome(&Ok(vec![repo("a"), repo("b")]), &sections, &mut page);

        assert_eq!(page.grids().len(), 1);
        assert_eq!(titles(&page, SectionName::Security), vec!["a", "b"]);
        assert_eq!(page.to_html().matches("id=\"securityGrid\"").count(), 1);
    }

    #[test]
    fn test_unreachable_api_renders_notice_per_grid() {
        let rt = Runtime::new().unwrap();
        let sections = SectionMap::default();
        let mut page = Page::new("someone", &sections);
        let client = GitHubClient::new("http://127.0.0.1:1").unwrap();

        let outcome = rt.block_on(client.fetch_repos("someone"));
        assert!(matches!(outcome, Err(FetchError::Transport(_))));

        rt.block_on(load_and_render(&client, "someone", &sections, &mut page));

        assert_eq!(page.grids().len(), sections.len());
        for grid in page.grids() {
            assert_eq!(grid.cards, vec![Card::load_failed()]);
        }
    }

    #[test]
    fn test_error_status_is_a_failure() {
        let rt = Runtime::new().unwrap();

        let outcome = rt.block_on(async {
            let (base, _) = serve_once("403 Forbidden", r#"{"message": "API rate limit exceeded"}"#).await;
            GitHubClient::new(&base).unwrap().fetch_repos("someone").await
        });
        assert!(matches!(outcome, Err(FetchError::Status(StatusCode::FORBIDDEN))));

        let mut page = Page::new("someone", &map());
        rt.block_on(async {
            let (base, _) = serve_once("403 Forbidden", "{}").await;
            let client = GitHubClient::new(&base).unwrap();
            load_and_render(&client, "someone", &map(), &mut page).await;
        });

        for grid in page.grids() {
            assert_eq!(grid.cards, vec![Card::load_failed()]);
        }
    }

    #[test]
    fn test_fetch_and_render_curated_sections() {
        const BODY: &str = r#"[
            {"name": "Neighborhood-watch", "html_url": "https://github.com/someone/Neighborhood-watch",
             "description": "<b>watch</b>", "language": null, "created_at": "2023-03-04T10:00:00Z"},
            {"name": "security-scripts", "html_url": "https://github.com/someone/security-scripts",
             "description": null, "language": "Shell", "created_at": "2022-01-02T00:00:00Z"}
        ]"#;
        let rt = Runtime::new().unwrap();
        let mut page = Page::new("someone", &map());

        let request = rt.block_on(async {
            let (base, request) = serve_once("200 OK", BODY).await;
            let client = GitHubClient::new(&base).unwrap();
            load_and_render(&client, "someone", &map(), &mut page).await;
            request.await.unwrap()
        });

        assert!(request.starts_with("GET /users/someone/repos?per_page=200 HTTP/1.1"));
        assert!(!request.to_lowercase().contains("authorization"));
        assert_eq!(
            titles(&page, SectionName::Security),
            vec!["security-scripts", "Neighborhood-watch"]
        );
        assert_eq!(
            titles(&page, SectionName::Blockchain),
            vec!["Neighborhood-watch", "security-scripts"]
        );
        let html = page.to_html();
        assert!(html.contains("<p>&lt;b&gt;watch&lt;/b&gt;</p>"));
        assert!(html.contains("<span class=\"tag\">Shell</span>"));
    }
}
